//! Splitting locations into path, query and hash, and relative path resolution.

use crate::encoding::decode;
use crate::query::{LocationQuery, parse_query, stringify_query};

/// A location string split into its sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
	/// `path?search#hash` as it should appear in the URL.
	pub full_path: String,
	/// The (encoded) path, resolved against the current path when relative.
	pub path: String,
	/// The parsed query.
	pub query: LocationQuery,
	/// The decoded hash, including its leading `#`, or an empty string.
	pub hash: String,
}

/// Splits `location` into path, query and hash.
///
/// A relative path is resolved against `current_path`. A `?` appearing after
/// the `#` belongs to the hash.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::url::parse_url;
///
/// let url = parse_url("settings?tab=2#top", "/users/42/profile");
/// assert_eq!(url.path, "/users/42/settings");
/// assert_eq!(url.query.get_first("tab"), Some("2"));
/// assert_eq!(url.hash, "#top");
/// assert_eq!(url.full_path, "/users/42/settings?tab=2#top");
/// ```
pub fn parse_url(location: &str, current_path: &str) -> ParsedUrl {
	let hash_pos = location.find('#');
	let search_pos = match (location.find('?'), hash_pos) {
		(Some(search), Some(hash)) if hash < search => None,
		(search, _) => search,
	};

	let mut path: Option<&str> = None;
	let mut search = "";
	let mut query = LocationQuery::new();
	let mut hash = "";

	if let Some(search_pos) = search_pos {
		path = Some(&location[..search_pos]);
		search = &location[search_pos + 1..hash_pos.unwrap_or(location.len())];
		query = parse_query(search);
	}
	if let Some(hash_pos) = hash_pos {
		path = path.or(Some(&location[..hash_pos]));
		hash = &location[hash_pos..];
	}

	let path = resolve_relative_path(path.unwrap_or(location), current_path);
	let mut full_path = path.clone();
	if !search.is_empty() {
		full_path.push('?');
		full_path.push_str(search);
	}
	full_path.push_str(hash);

	ParsedUrl {
		full_path,
		path,
		query,
		hash: decode(hash).into_owned(),
	}
}

/// Joins an already-encoded path, a query and an already-encoded hash.
pub fn stringify_url(path: &str, query: &LocationQuery, hash: &str) -> String {
	let search = stringify_query(query);
	let mut url = String::with_capacity(path.len() + search.len() + hash.len() + 1);
	url.push_str(path);
	if !search.is_empty() {
		url.push('?');
		url.push_str(&search);
	}
	url.push_str(hash);
	url
}

/// Resolves `to` against `from` the way a browser resolves a relative link,
/// supporting `.` and `..` segments.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::url::resolve_relative_path;
///
/// assert_eq!(resolve_relative_path("../b", "/a/c/d"), "/a/b");
/// assert_eq!(resolve_relative_path("./x", "/a/b"), "/a/x");
/// assert_eq!(resolve_relative_path("/abs", "/a/b"), "/abs");
/// assert_eq!(resolve_relative_path("", "/a/b"), "/a/b");
/// ```
pub fn resolve_relative_path(to: &str, from: &str) -> String {
	if to.starts_with('/') {
		return to.to_string();
	}
	if !from.starts_with('/') {
		tracing::warn!(
			to,
			from,
			"cannot resolve a relative location without an absolute path"
		);
		return to.to_string();
	}
	if to.is_empty() {
		return from.to_string();
	}

	let from_segments: Vec<&str> = from.split('/').collect();
	let mut to_segments: Vec<&str> = to.split('/').collect();
	if matches!(to_segments.last(), Some(&"..") | Some(&".")) {
		to_segments.push("");
	}

	let mut position = from_segments.len() - 1;
	let mut to_position = 0;
	while to_position < to_segments.len() {
		match to_segments[to_position] {
			"." => {}
			".." => {
				if position > 1 {
					position -= 1;
				}
			}
			_ => break,
		}
		to_position += 1;
	}

	format!(
		"{}/{}",
		from_segments[..position].join("/"),
		to_segments[to_position..].join("/")
	)
}

/// Removes `base` from the start of `pathname`, ignoring ASCII case.
///
/// Returns `/` when nothing is left.
pub fn strip_base(pathname: &str, base: &str) -> String {
	let has_base = !base.is_empty()
		&& pathname.len() >= base.len()
		&& pathname.is_char_boundary(base.len())
		&& pathname[..base.len()].eq_ignore_ascii_case(base);
	if !has_base {
		return pathname.to_string();
	}
	let rest = &pathname[base.len()..];
	if rest.is_empty() {
		"/".to_string()
	} else {
		rest.to_string()
	}
}
