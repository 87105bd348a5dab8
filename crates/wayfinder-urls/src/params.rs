//! Path param values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::encoding::{decode, encode_param};

/// Value of a single path param.
///
/// Repeatable params (`:ids+`, `:ids*`) hold a list, every other param holds
/// a single string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
	/// A single segment value.
	Single(String),
	/// One value per repeated segment.
	List(Vec<String>),
}

impl ParamValue {
	/// Returns the value as a single string, if it is one.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Single(value) => Some(value),
			Self::List(_) => None,
		}
	}

	/// Returns the values as a slice. A single value yields a one-element slice.
	pub fn as_slice(&self) -> &[String] {
		match self {
			Self::Single(value) => std::slice::from_ref(value),
			Self::List(values) => values,
		}
	}

	/// Returns `true` for an empty string or an empty list.
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Single(value) => value.is_empty(),
			Self::List(values) => values.is_empty(),
		}
	}

	/// Applies `f` to every contained string.
	pub fn map(&self, f: impl Fn(&str) -> String) -> Self {
		match self {
			Self::Single(value) => Self::Single(f(value)),
			Self::List(values) => Self::List(values.iter().map(|v| f(v)).collect()),
		}
	}

	/// Compares two values treating `"a"` and `["a"]` as equivalent.
	pub fn is_equivalent(&self, other: &Self) -> bool {
		self.as_slice() == other.as_slice()
	}
}

impl From<&str> for ParamValue {
	fn from(value: &str) -> Self {
		Self::Single(value.to_string())
	}
}

impl From<String> for ParamValue {
	fn from(value: String) -> Self {
		Self::Single(value)
	}
}

impl From<Vec<String>> for ParamValue {
	fn from(values: Vec<String>) -> Self {
		Self::List(values)
	}
}

impl From<Vec<&str>> for ParamValue {
	fn from(values: Vec<&str>) -> Self {
		Self::List(values.into_iter().map(str::to_string).collect())
	}
}

impl<const N: usize> From<[&str; N]> for ParamValue {
	fn from(values: [&str; N]) -> Self {
		Self::List(values.iter().map(|v| v.to_string()).collect())
	}
}

/// Ordered map of param name to value.
pub type PathParams = IndexMap<String, ParamValue>;

/// Percent-encodes every value with [`encode_param`].
pub fn encode_params(params: &PathParams) -> PathParams {
	params
		.iter()
		.map(|(key, value)| (key.clone(), value.map(encode_param)))
		.collect()
}

/// Decodes every value with [`decode`].
pub fn decode_params(params: &PathParams) -> PathParams {
	params
		.iter()
		.map(|(key, value)| (key.clone(), value.map(|v| decode(v).into_owned())))
		.collect()
}

/// Compares two param maps, treating single values and one-element lists as
/// equivalent.
pub fn is_same_params(a: &PathParams, b: &PathParams) -> bool {
	a.len() == b.len()
		&& a.iter().all(|(key, value)| {
			b.get(key)
				.is_some_and(|other| value.is_equivalent(other))
		})
}
