//! Query string parsing and serialization.
//!
//! A [`LocationQuery`] keeps keys in insertion order and supports repeated
//! keys and keys without a value (`?flag`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::encoding::{decode, encode_query_key, encode_query_value};

/// Value stored under a query key.
///
/// `None` represents a key present without `=` (`?flag`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
	/// The key appeared once.
	Single(Option<String>),
	/// The key appeared several times.
	List(Vec<Option<String>>),
}

impl QueryValue {
	/// Returns the first value, skipping nothing.
	pub fn first(&self) -> Option<&str> {
		match self {
			Self::Single(value) => value.as_deref(),
			Self::List(values) => values.first().and_then(|v| v.as_deref()),
		}
	}

	fn push(&mut self, value: Option<String>) {
		match self {
			Self::Single(current) => {
				let first = current.take();
				*self = Self::List(vec![first, value]);
			}
			Self::List(values) => values.push(value),
		}
	}
}

impl From<&str> for QueryValue {
	fn from(value: &str) -> Self {
		Self::Single(Some(value.to_string()))
	}
}

impl From<String> for QueryValue {
	fn from(value: String) -> Self {
		Self::Single(Some(value))
	}
}

impl From<Option<String>> for QueryValue {
	fn from(value: Option<String>) -> Self {
		Self::Single(value)
	}
}

impl From<Vec<&str>> for QueryValue {
	fn from(values: Vec<&str>) -> Self {
		Self::List(values.into_iter().map(|v| Some(v.to_string())).collect())
	}
}

impl From<Vec<String>> for QueryValue {
	fn from(values: Vec<String>) -> Self {
		Self::List(values.into_iter().map(Some).collect())
	}
}

/// Ordered multi-value query map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationQuery(IndexMap<String, QueryValue>);

impl LocationQuery {
	/// Creates an empty query.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insertion, replacing any existing value.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
		self.insert(key, value);
		self
	}

	/// Inserts a value, replacing any existing value for `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
		self.0.insert(key.into(), value.into());
	}

	/// Appends a value, turning an existing single value into a list.
	pub fn append(&mut self, key: impl Into<String>, value: Option<String>) {
		match self.0.entry(key.into()) {
			indexmap::map::Entry::Occupied(mut entry) => entry.get_mut().push(value),
			indexmap::map::Entry::Vacant(entry) => {
				entry.insert(QueryValue::Single(value));
			}
		}
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&QueryValue> {
		self.0.get(key)
	}

	/// Returns the first string value stored under `key`.
	pub fn get_first(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(QueryValue::first)
	}

	/// Removes `key`, returning its value.
	pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
		self.0.shift_remove(key)
	}

	/// Returns `true` when `key` is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Iterates over entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &QueryValue)> {
		self.0.iter()
	}

	/// Number of distinct keys.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when there are no keys.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for LocationQuery {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		)
	}
}

/// Parses a search string, with or without its leading `?`.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::query::{QueryValue, parse_query};
///
/// let query = parse_query("?a=1&a=2&b&c=x+y");
/// assert_eq!(
///     query.get("a"),
///     Some(&QueryValue::List(vec![Some("1".into()), Some("2".into())]))
/// );
/// assert_eq!(query.get("b"), Some(&QueryValue::Single(None)));
/// assert_eq!(query.get_first("c"), Some("x y"));
/// ```
pub fn parse_query(search: &str) -> LocationQuery {
	let mut query = LocationQuery::new();
	let search = search.strip_prefix('?').unwrap_or(search);
	if search.is_empty() {
		return query;
	}
	for pair in search.split('&') {
		let pair = pair.replace('+', " ");
		let (key, value) = match pair.find('=') {
			Some(eq) => (
				decode(&pair[..eq]).into_owned(),
				Some(decode(&pair[eq + 1..]).into_owned()),
			),
			None => (decode(&pair).into_owned(), None),
		};
		query.append(key, value);
	}
	query
}

/// Serializes a query without the leading `?`.
///
/// `None` values render as the bare key.
pub fn stringify_query(query: &LocationQuery) -> String {
	let mut search = String::new();
	let mut push = |key: &str, value: Option<&str>| {
		if !search.is_empty() {
			search.push('&');
		}
		search.push_str(key);
		if let Some(value) = value {
			search.push('=');
			search.push_str(&encode_query_value(value));
		}
	};
	for (key, value) in query.iter() {
		let key = encode_query_key(key);
		match value {
			QueryValue::Single(value) => push(&key, value.as_deref()),
			QueryValue::List(values) => {
				for value in values {
					push(&key, value.as_deref());
				}
			}
		}
	}
	search
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("")]
	#[case("?")]
	fn test_parse_empty(#[case] search: &str) {
		assert!(parse_query(search).is_empty());
	}

	#[rstest]
	fn test_parse_keeps_empty_value_distinct_from_missing() {
		let query = parse_query("a=&b");
		assert_eq!(query.get("a"), Some(&QueryValue::Single(Some(String::new()))));
		assert_eq!(query.get("b"), Some(&QueryValue::Single(None)));
	}

	#[rstest]
	fn test_parse_decodes_plus_and_percent() {
		let query = parse_query("q=a+b%2Bc&%C3%A9=1");
		assert_eq!(query.get_first("q"), Some("a b+c"));
		assert_eq!(query.get_first("é"), Some("1"));
	}

	#[rstest]
	fn test_stringify_lists_and_nulls() {
		let mut query = LocationQuery::new();
		query.insert("a", vec!["1", "2"]);
		query.insert("flag", QueryValue::Single(None));
		query.insert("q", "a b&c");
		query.insert("k=y", "v");
		assert_eq!(stringify_query(&query), "a=1&a=2&flag&q=a+b%26c&k%3Dy=v");
	}

	#[rstest]
	fn test_stringify_parse_round_trip() {
		let query = LocationQuery::new()
			.with("text", "hello world + more")
			.with("tags", vec!["x", "y"]);
		assert_eq!(parse_query(&stringify_query(&query)), query);
	}
}
