//! Raw navigation targets and resolved locations.

use std::sync::Arc;

use serde_json::Value;
use wayfinder_history::HistoryState;
use wayfinder_urls::{LocationQuery, ParamValue, PathParams, QueryValue, is_same_params, stringify_query};

use crate::record::{RouteMeta, RouteRecord};

/// What a raw location points at.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationTarget {
	/// An encoded `path?query#hash` string, possibly relative.
	Url(String),
	/// An encoded path. Params given alongside a path are ignored.
	Path {
		/// The path, possibly relative.
		path: String,
		/// Ignored, kept to report the mistake.
		params: PathParams,
	},
	/// A registered route name and its (decoded) params.
	Named {
		/// Route name.
		name: String,
		/// Params merged over the inherited ones.
		params: PathParams,
	},
	/// The current route with some params replaced.
	Relative {
		/// Params merged over the current ones.
		params: PathParams,
	},
}

/// A navigation target as written by callers, guards and redirects.
///
/// # Examples
///
/// ```
/// use wayfinder_router::RouteLocationRaw;
///
/// let to = RouteLocationRaw::named("user")
///     .with_param("id", "42")
///     .with_query_param("tab", "posts")
///     .replacing();
/// assert!(to.replace);
///
/// let to: RouteLocationRaw = "/users/42?tab=posts".into();
/// assert!(!to.force);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLocationRaw {
	/// Target.
	pub target: LocationTarget,
	/// Query. `None` keeps the query of a string target, or inherits on
	/// redirects.
	pub query: Option<LocationQuery>,
	/// Decoded hash including `#`. `None` behaves like `query`.
	pub hash: Option<String>,
	/// Navigate even when the target equals the current location.
	pub force: bool,
	/// Replace the current history entry instead of pushing one.
	pub replace: bool,
	/// State stored with the history entry.
	pub state: Option<HistoryState>,
}

impl RouteLocationRaw {
	fn with_target(target: LocationTarget) -> Self {
		Self {
			target,
			query: None,
			hash: None,
			force: false,
			replace: false,
			state: None,
		}
	}

	/// A `path?query#hash` string.
	pub fn url(url: impl Into<String>) -> Self {
		Self::with_target(LocationTarget::Url(url.into()))
	}

	/// A path, with query and hash given separately.
	pub fn path(path: impl Into<String>) -> Self {
		Self::with_target(LocationTarget::Path {
			path: path.into(),
			params: PathParams::new(),
		})
	}

	/// A named route.
	pub fn named(name: impl Into<String>) -> Self {
		Self::with_target(LocationTarget::Named {
			name: name.into(),
			params: PathParams::new(),
		})
	}

	/// The current route with other params, query or hash.
	pub fn relative() -> Self {
		Self::with_target(LocationTarget::Relative {
			params: PathParams::new(),
		})
	}

	/// Sets a param. Has no effect on string targets.
	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
		match &mut self.target {
			LocationTarget::Path { params, .. }
			| LocationTarget::Named { params, .. }
			| LocationTarget::Relative { params } => {
				params.insert(name.into(), value.into());
			}
			LocationTarget::Url(_) => {}
		}
		self
	}

	/// Sets every param in `params`.
	pub fn with_params(self, params: PathParams) -> Self {
		params
			.into_iter()
			.fold(self, |location, (name, value)| location.with_param(name, value))
	}

	/// Sets the query.
	pub fn with_query(mut self, query: LocationQuery) -> Self {
		self.query = Some(query);
		self
	}

	/// Sets one query key, keeping the others.
	pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
		self.query.get_or_insert_with(LocationQuery::new).insert(key, value);
		self
	}

	/// Sets the decoded hash. A missing leading `#` is added.
	pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
		let hash = hash.into();
		self.hash = Some(if hash.is_empty() || hash.starts_with('#') {
			hash
		} else {
			format!("#{hash}")
		});
		self
	}

	/// Stores `state` with the history entry.
	pub fn with_state(mut self, state: HistoryState) -> Self {
		self.state = Some(state);
		self
	}

	/// Navigates even to the current location.
	pub fn forced(mut self) -> Self {
		self.force = true;
		self
	}

	/// Replaces the current history entry.
	pub fn replacing(mut self) -> Self {
		self.replace = true;
		self
	}
}

impl From<&str> for RouteLocationRaw {
	fn from(url: &str) -> Self {
		Self::url(url)
	}
}

impl From<String> for RouteLocationRaw {
	fn from(url: String) -> Self {
		Self::url(url)
	}
}

impl From<&RouteLocation> for RouteLocationRaw {
	fn from(location: &RouteLocation) -> Self {
		Self::url(location.full_path.clone())
	}
}

/// A fully resolved location.
#[derive(Debug, Clone)]
pub struct RouteLocation {
	/// Encoded path.
	pub path: String,
	/// Encoded `path?query#hash`.
	pub full_path: String,
	/// Decoded query.
	pub query: LocationQuery,
	/// Decoded hash including `#`, or an empty string.
	pub hash: String,
	/// Name of the matched route.
	pub name: Option<String>,
	/// Decoded params.
	pub params: PathParams,
	/// Matched records from root to leaf. Empty when nothing matched.
	pub matched: Vec<Arc<RouteRecord>>,
	/// Meta of every matched record merged from root to leaf.
	pub meta: RouteMeta,
	/// First location of the redirect chain that led here.
	pub redirected_from: Option<Box<RouteLocation>>,
	/// `full_path` as a link href, including the history base.
	pub href: String,
}

impl RouteLocation {
	/// The location every router starts at, before its first navigation.
	pub fn start() -> Self {
		Self {
			path: "/".to_string(),
			full_path: "/".to_string(),
			query: LocationQuery::new(),
			hash: String::new(),
			name: None,
			params: PathParams::new(),
			matched: Vec::new(),
			meta: RouteMeta::new(),
			redirected_from: None,
			href: "/".to_string(),
		}
	}

	/// `true` for the start location.
	pub fn is_start(&self) -> bool {
		self.matched.is_empty() && self.full_path == "/" && self.name.is_none() && self.href == "/"
	}

	/// `true` when no route matched.
	pub fn is_not_found(&self) -> bool {
		self.matched.is_empty()
	}

	/// Leaf record.
	pub fn leaf(&self) -> Option<&Arc<RouteRecord>> {
		self.matched.last()
	}

	/// Looks up a merged meta field.
	pub fn meta_value(&self, key: &str) -> Option<&Value> {
		self.meta.get(key)
	}

	/// Single-valued param.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name).and_then(ParamValue::as_str)
	}
}

/// Whether `a` and `b` point at the same route with the same params, query
/// and hash. Locations that matched nothing are never the same.
pub fn is_same_route_location(a: &RouteLocation, b: &RouteLocation) -> bool {
	match (a.leaf(), b.leaf()) {
		(Some(leaf_a), Some(leaf_b)) => {
			a.matched.len() == b.matched.len()
				&& leaf_a.is_same_record(leaf_b)
				&& is_same_params(&a.params, &b.params)
				&& stringify_query(&a.query) == stringify_query(&b.query)
				&& a.hash == b.hash
		}
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_hash_prefix_added() {
		assert_eq!(RouteLocationRaw::path("/").with_hash("top").hash.as_deref(), Some("#top"));
		assert_eq!(RouteLocationRaw::path("/").with_hash("#top").hash.as_deref(), Some("#top"));
		assert_eq!(RouteLocationRaw::path("/").with_hash("").hash.as_deref(), Some(""));
	}

	#[rstest]
	fn test_params_ignored_on_url_targets() {
		let raw = RouteLocationRaw::url("/a").with_param("id", "1");
		assert_eq!(raw.target, LocationTarget::Url("/a".to_string()));
	}

	#[rstest]
	fn test_unmatched_locations_never_same() {
		let start = RouteLocation::start();
		assert!(!is_same_route_location(&start, &start.clone()));
	}

	#[rstest]
	fn test_start_location() {
		let start = RouteLocation::start();
		assert!(start.is_start());
		assert!(start.is_not_found());
		assert_eq!(start.full_path, "/");
	}
}
