//! Route matcher: compiled records in an arena, kept sorted by score.
//!
//! Records are addressed by [`RecordId`], an index into the arena that is
//! never reused. Children keep the id of their parent, so ancestor walks
//! need no back pointers.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use wayfinder_urls::{PathParams, PathParser};

use crate::error::{MatcherError, MatcherResult};
use crate::options::RouterOptions;
use crate::record::{RecordId, RouteMeta, RouteRecord, RouteRecordRaw, join_paths};

#[derive(Debug)]
struct MatcherEntry {
	record: Arc<RouteRecord>,
	parser: PathParser,
	children: Vec<RecordId>,
	aliases: Vec<RecordId>,
}

/// A location understood by the matcher. Params are encoded.
#[derive(Debug, Clone, Copy)]
pub enum MatcherLocation<'a> {
	/// An absolute encoded path.
	Path(&'a str),
	/// A registered name.
	Named {
		/// Route name.
		name: &'a str,
		/// Params overriding the inherited ones.
		params: &'a PathParams,
	},
	/// The current route with some params replaced.
	Relative {
		/// Params overriding the current ones.
		params: &'a PathParams,
	},
}

/// The parts of the current location the matcher inherits from.
#[derive(Debug, Clone, Copy)]
pub struct MatcherCurrent<'a> {
	/// Name of the current route.
	pub name: Option<&'a str>,
	/// Encoded path.
	pub path: &'a str,
	/// Encoded params.
	pub params: &'a PathParams,
}

/// Result of a matcher resolution.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
	/// Leaf name.
	pub name: Option<String>,
	/// Encoded path.
	pub path: String,
	/// Encoded params.
	pub params: PathParams,
	/// Records from root to leaf, empty when nothing matched.
	pub matched: Vec<Arc<RouteRecord>>,
	/// Merged meta.
	pub meta: RouteMeta,
}

/// Owns every compiled record.
#[derive(Debug)]
pub struct RouterMatcher {
	options: RouterOptions,
	entries: Vec<Option<MatcherEntry>>,
	/// Matchable records, most specific first.
	matchers: Vec<RecordId>,
	names: HashMap<String, RecordId>,
}

impl RouterMatcher {
	/// Creates an empty matcher.
	pub fn new(options: RouterOptions) -> Self {
		Self {
			options,
			entries: Vec::new(),
			matchers: Vec::new(),
			names: HashMap::new(),
		}
	}

	fn entry(&self, id: RecordId) -> Option<&MatcherEntry> {
		self.entries.get(id.0).and_then(Option::as_ref)
	}

	fn entry_mut(&mut self, id: RecordId) -> Option<&mut MatcherEntry> {
		self.entries.get_mut(id.0).and_then(Option::as_mut)
	}

	/// Compiles `raw` with its aliases and children, under `parent` if given.
	///
	/// Nothing is registered when an error is returned.
	///
	/// # Errors
	///
	/// Fails on an invalid pattern, a duplicate name, a legacy `*` path or an
	/// alias declaring other params than its record.
	pub fn add_route(&mut self, raw: &RouteRecordRaw, parent: Option<RecordId>) -> MatcherResult<RecordId> {
		let mut created = Vec::new();
		match self.insert_record(raw, parent, None, &mut created) {
			Ok(id) => Ok(id),
			Err(err) => {
				for id in created.into_iter().rev() {
					self.remove_record(id);
				}
				Err(err)
			}
		}
	}

	/// Compiles `raw` under the route named `parent`.
	///
	/// # Errors
	///
	/// Same as [`add_route`](Self::add_route), plus
	/// [`MatcherError::UnknownParent`].
	pub fn add_child_route(&mut self, parent: &str, raw: &RouteRecordRaw) -> MatcherResult<RecordId> {
		let parent_id = self
			.names
			.get(parent)
			.copied()
			.ok_or_else(|| MatcherError::UnknownParent(parent.to_string()))?;
		self.add_route(raw, Some(parent_id))
	}

	fn insert_record(
		&mut self,
		raw: &RouteRecordRaw,
		parent: Option<RecordId>,
		original: Option<RecordId>,
		created: &mut Vec<RecordId>,
	) -> MatcherResult<RecordId> {
		if let Some(path) = std::iter::once(&raw.path)
			.chain(&raw.alias)
			.find(|path| path.as_str() == "*")
		{
			return Err(MatcherError::LegacyCatchAll(path.clone()));
		}
		if original.is_none() {
			if let Some(name) = &raw.name {
				if self.names.contains_key(name) {
					return Err(MatcherError::DuplicateName(name.clone()));
				}
			}
		}

		let main = self.insert_one(raw, &raw.path, parent, original, created)?;
		let origin = original.unwrap_or(main);
		for alias in &raw.alias {
			self.insert_one(raw, alias, parent, Some(origin), created)?;
		}
		Ok(main)
	}

	fn insert_one(
		&mut self,
		raw: &RouteRecordRaw,
		path: &str,
		parent: Option<RecordId>,
		alias_of: Option<RecordId>,
		created: &mut Vec<RecordId>,
	) -> MatcherResult<RecordId> {
		let parent_path = parent.and_then(|p| self.entry(p)).map(|p| p.record.path.clone());
		let full_path = join_paths(parent_path.as_deref(), path);
		let parser = PathParser::new(
			&full_path,
			self.options.parser_options(raw.strict, raw.sensitive, raw.end),
		)
		.map_err(|source| MatcherError::Pattern {
			path: full_path.clone(),
			source,
		})?;

		if let Some(original) = alias_of.and_then(|id| self.entry(id)) {
			if !same_param_names(&parser, &original.parser) {
				return Err(MatcherError::AliasParamsMismatch {
					alias: full_path,
					original: original.record.path.clone(),
				});
			}
		}

		let id = RecordId(self.entries.len());
		let record = Arc::new(RouteRecord {
			id,
			parent,
			alias_of,
			path: full_path,
			name: raw.name.clone(),
			redirect: raw.redirect.clone(),
			meta: raw.meta.clone(),
			components: raw.components.clone(),
			props: raw.props.clone(),
			before_enter: raw.before_enter.clone(),
			before_leave: raw.before_leave.clone(),
			before_update: raw.before_update.clone(),
		});
		tracing::debug!(
			path = %record.path,
			name = ?record.name,
			alias_of = ?alias_of,
			"adding route"
		);

		let matchable = record.is_matchable();
		let name = record.name.clone();
		self.entries.push(Some(MatcherEntry {
			record,
			parser,
			children: Vec::new(),
			aliases: Vec::new(),
		}));
		created.push(id);

		if let Some(parent) = parent.and_then(|p| self.entry_mut(p)) {
			parent.children.push(id);
		}
		match alias_of {
			Some(original) => {
				if let Some(original) = self.entry_mut(original) {
					original.aliases.push(id);
				}
			}
			None => {
				if let Some(name) = name {
					self.names.insert(name, id);
				}
			}
		}
		if matchable {
			self.insert_matcher(id);
		}

		for (index, child) in raw.children.iter().enumerate() {
			let child_original = alias_of
				.and_then(|original| self.entry(original))
				.and_then(|original| original.children.get(index).copied());
			self.insert_record(child, Some(id), child_original, created)?;
		}
		Ok(id)
	}

	fn insert_matcher(&mut self, id: RecordId) {
		let Some(entry) = self.entry(id) else {
			return;
		};
		let mut lower = 0;
		let mut upper = self.matchers.len();
		while lower != upper {
			let mid = (lower + upper) / 2;
			let other = self.entry(self.matchers[mid]).map(|e| entry.parser.compare(&e.parser));
			if other == Some(Ordering::Less) {
				upper = mid;
			} else {
				lower = mid + 1;
			}
		}
		// A child ranking the same as a matchable ancestor goes first, so the
		// match keeps the whole chain.
		if let Some(ancestor) = self.insertion_ancestor(entry) {
			if let Some(position) = self.matchers[..upper].iter().rposition(|m| *m == ancestor) {
				upper = position;
			}
		}
		self.matchers.insert(upper, id);
	}

	fn insertion_ancestor(&self, entry: &MatcherEntry) -> Option<RecordId> {
		let mut current = entry.record.parent;
		while let Some(ancestor) = current.and_then(|id| self.entry(id)) {
			if ancestor.record.is_matchable()
				&& entry.parser.compare(&ancestor.parser) == Ordering::Equal
			{
				return Some(ancestor.record.id);
			}
			current = ancestor.record.parent;
		}
		None
	}

	/// Removes a record with its children and aliases. Unknown ids are
	/// ignored.
	pub fn remove_record(&mut self, id: RecordId) {
		let Some(entry) = self.entries.get_mut(id.0).and_then(Option::take) else {
			return;
		};
		tracing::debug!(path = %entry.record.path, name = ?entry.record.name, "removing route");

		if entry.record.alias_of.is_none() {
			if let Some(name) = &entry.record.name {
				if self.names.get(name) == Some(&id) {
					self.names.remove(name);
				}
			}
		}
		self.matchers.retain(|m| *m != id);
		if let Some(parent) = entry.record.parent.and_then(|p| self.entry_mut(p)) {
			parent.children.retain(|c| *c != id);
		}
		if let Some(original) = entry.record.alias_of.and_then(|o| self.entry_mut(o)) {
			original.aliases.retain(|a| *a != id);
		}
		for child in entry.children {
			self.remove_record(child);
		}
		for alias in entry.aliases {
			self.remove_record(alias);
		}
	}

	/// Removes the route named `name`. Returns `false` when there is none.
	pub fn remove_route(&mut self, name: &str) -> bool {
		match self.names.get(name).copied() {
			Some(id) => {
				self.remove_record(id);
				true
			}
			None => false,
		}
	}

	/// Removes every route.
	pub fn clear_routes(&mut self) {
		self.entries.iter_mut().for_each(|entry| *entry = None);
		self.matchers.clear();
		self.names.clear();
	}

	/// Matchable records, most specific first.
	pub fn get_routes(&self) -> Vec<Arc<RouteRecord>> {
		self.matchers
			.iter()
			.filter_map(|id| self.entry(*id))
			.map(|entry| entry.record.clone())
			.collect()
	}

	/// Record registered under `name`.
	pub fn get_record_matcher(&self, name: &str) -> Option<Arc<RouteRecord>> {
		self.names
			.get(name)
			.and_then(|id| self.entry(*id))
			.map(|entry| entry.record.clone())
	}

	/// Whether a route is registered under `name`.
	pub fn has_route(&self, name: &str) -> bool {
		self.names.contains_key(name)
	}

	/// Record by id.
	pub fn record(&self, id: RecordId) -> Option<Arc<RouteRecord>> {
		self.entry(id).map(|entry| entry.record.clone())
	}

	/// Compiled pattern of a record.
	pub fn parser(&self, id: RecordId) -> Option<&PathParser> {
		self.entry(id).map(|entry| &entry.parser)
	}

	/// Resolves a location to its records.
	///
	/// A path nothing matches yields an empty `matched` chain.
	///
	/// # Errors
	///
	/// Fails for unknown names, for relative locations without a current
	/// location that matches a route, and when a path cannot be built from
	/// the params.
	pub fn resolve(
		&self,
		location: MatcherLocation<'_>,
		current: Option<MatcherCurrent<'_>>,
	) -> MatcherResult<MatchedRoute> {
		let (entry, path, params) = match location {
			MatcherLocation::Named { name, params } => {
				let entry = self
					.names
					.get(name)
					.and_then(|id| self.entry(*id))
					.ok_or_else(|| MatcherError::UnknownName(name.to_string()))?;

				let mut merged = PathParams::new();
				if let Some(current) = current {
					let parent_keys = entry
						.record
						.parent
						.and_then(|p| self.entry(p))
						.map(|p| p.parser.keys())
						.unwrap_or_default();
					let inherited = entry
						.parser
						.keys()
						.iter()
						.filter(|key| !key.optional)
						.chain(parent_keys.iter().filter(|key| key.optional));
					for key in inherited {
						if let Some(value) = current.params.get(&key.name) {
							merged.insert(key.name.clone(), value.clone());
						}
					}
				}
				for key in entry.parser.keys() {
					if let Some(value) = params.get(&key.name) {
						merged.insert(key.name.clone(), value.clone());
					}
				}
				if let Some(unknown) = params.keys().find(|k| !entry.parser.keys().iter().any(|key| &key.name == *k)) {
					tracing::warn!(route = name, param = %unknown, "discarding param unknown to the route");
				}

				let path = entry.parser.stringify(&merged).map_err(|source| MatcherError::Build {
					route: name.to_string(),
					source,
				})?;
				(Some(entry), path, merged)
			}
			MatcherLocation::Path(path) => {
				let found = self
					.matchers
					.iter()
					.filter_map(|id| self.entry(*id))
					.find_map(|entry| entry.parser.parse(path).map(|params| (entry, params)));
				match found {
					Some((entry, params)) => (Some(entry), path.to_string(), params),
					None => (None, path.to_string(), PathParams::new()),
				}
			}
			MatcherLocation::Relative { params } => {
				let current = current.ok_or_else(|| MatcherError::UnresolvableCurrent(String::new()))?;
				let entry = match current.name {
					Some(name) => self.names.get(name).and_then(|id| self.entry(*id)),
					None => self
						.matchers
						.iter()
						.filter_map(|id| self.entry(*id))
						.find(|entry| entry.parser.re().is_match(current.path)),
				}
				.ok_or_else(|| MatcherError::UnresolvableCurrent(current.path.to_string()))?;

				let merged: PathParams = entry
					.parser
					.keys()
					.iter()
					.filter_map(|key| {
						params
							.get(&key.name)
							.or_else(|| current.params.get(&key.name))
							.map(|value| (key.name.clone(), value.clone()))
					})
					.collect();
				let path = entry.parser.stringify(&merged).map_err(|source| MatcherError::Build {
					route: entry.record.name.clone().unwrap_or_else(|| entry.record.path.clone()),
					source,
				})?;
				(Some(entry), path, merged)
			}
		};

		let matched = entry.map(|entry| self.matched_chain(entry)).unwrap_or_default();
		let meta = matched.iter().fold(RouteMeta::new(), |mut meta, record| {
			meta.extend(record.meta.iter().map(|(k, v)| (k.clone(), v.clone())));
			meta
		});
		Ok(MatchedRoute {
			name: entry.and_then(|entry| entry.record.name.clone()),
			path,
			params,
			matched,
			meta,
		})
	}

	fn matched_chain(&self, entry: &MatcherEntry) -> Vec<Arc<RouteRecord>> {
		let mut chain = vec![entry.record.clone()];
		let mut parent = entry.record.parent;
		while let Some(ancestor) = parent.and_then(|id| self.entry(id)) {
			chain.push(ancestor.record.clone());
			parent = ancestor.record.parent;
		}
		chain.reverse();
		chain
	}
}

fn same_param_names(a: &PathParser, b: &PathParser) -> bool {
	let names = |parser: &PathParser| {
		let mut names: Vec<String> = parser.keys().iter().map(|k| k.name.clone()).collect();
		names.sort();
		names
	};
	names(a) == names(b)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use wayfinder_urls::PatternError;

	fn matcher() -> RouterMatcher {
		RouterMatcher::new(RouterOptions::default())
	}

	fn route(path: &str, name: &str) -> RouteRecordRaw {
		RouteRecordRaw::new(path).name(name)
	}

	fn resolve_path(matcher: &RouterMatcher, path: &str) -> MatchedRoute {
		matcher.resolve(MatcherLocation::Path(path), None).unwrap()
	}

	#[rstest]
	fn test_static_wins_regardless_of_order() {
		for order in [["/users/:id", "/users/new"], ["/users/new", "/users/:id"]] {
			let mut m = matcher();
			for path in order {
				m.add_route(&route(path, path), None).unwrap();
			}
			assert_eq!(resolve_path(&m, "/users/new").name.as_deref(), Some("/users/new"));
			assert_eq!(resolve_path(&m, "/users/3").name.as_deref(), Some("/users/:id"));
		}
	}

	#[rstest]
	fn test_not_found_has_empty_chain() {
		let mut m = matcher();
		m.add_route(&route("/a", "a"), None).unwrap();
		let resolved = resolve_path(&m, "/nope");
		assert!(resolved.matched.is_empty());
		assert_eq!(resolved.path, "/nope");
		assert!(resolved.name.is_none());
	}

	#[rstest]
	fn test_duplicate_name_rejected_and_nothing_registered() {
		let mut m = matcher();
		m.add_route(&route("/a", "a"), None).unwrap();
		let err = m
			.add_route(&RouteRecordRaw::new("/b").component("B").child(route("c", "a")), None)
			.unwrap_err();
		assert_eq!(err, MatcherError::DuplicateName("a".to_string()));
		assert!(resolve_path(&m, "/b").matched.is_empty());
		assert_eq!(m.get_routes().len(), 1);
	}

	#[rstest]
	fn test_remove_then_reregister() {
		let mut m = matcher();
		m.add_route(&route("/a", "a"), None).unwrap();
		assert!(m.remove_route("a"));
		assert!(!m.remove_route("a"));
		m.add_route(&route("/other", "a"), None).unwrap();
		assert_eq!(m.get_record_matcher("a").unwrap().path, "/other");
	}

	#[rstest]
	fn test_remove_is_recursive() {
		let mut m = matcher();
		m.add_route(
			&route("/parent", "parent").child(route("child", "child")).alias("/p"),
			None,
		)
		.unwrap();
		assert_eq!(m.get_routes().len(), 4);
		m.remove_route("parent");
		assert!(m.get_routes().is_empty());
		assert!(!m.has_route("child"));
	}

	#[rstest]
	fn test_children_join_paths_and_merge_meta() {
		let mut m = matcher();
		m.add_route(
			&RouteRecordRaw::new("/users")
				.meta("section", "users")
				.meta("auth", false)
				.child(route(":id", "user").meta("auth", true))
				.child(route("/absolute", "absolute")),
			None,
		)
		.unwrap();

		let resolved = resolve_path(&m, "/users/7");
		assert_eq!(resolved.matched.len(), 2);
		assert_eq!(resolved.matched[0].path, "/users");
		assert_eq!(resolved.matched[1].path, "/users/:id");
		assert_eq!(resolved.meta["section"], "users");
		assert_eq!(resolved.meta["auth"], true);

		// grouping parent without name or view does not match on its own
		assert!(resolve_path(&m, "/users").matched.is_empty());
		assert_eq!(resolve_path(&m, "/absolute").matched.len(), 2);
	}

	#[rstest]
	fn test_empty_child_path_keeps_full_chain() {
		let mut m = matcher();
		m.add_route(
			&route("/settings", "settings-layout").child(route("", "settings")),
			None,
		)
		.unwrap();
		let resolved = resolve_path(&m, "/settings");
		assert_eq!(resolved.name.as_deref(), Some("settings"));
		assert_eq!(resolved.matched.len(), 2);
	}

	#[rstest]
	fn test_aliases_share_identity() {
		let mut m = matcher();
		m.add_route(
			&route("/users/:id", "user")
				.alias("/u/:id")
				.child(route("posts", "posts")),
			None,
		)
		.unwrap();

		let original = resolve_path(&m, "/users/1/posts");
		let aliased = resolve_path(&m, "/u/1/posts");
		assert_eq!(aliased.name.as_deref(), Some("posts"));
		assert!(aliased.matched[1].is_same_record(&original.matched[1]));
		assert!(aliased.matched[0].is_same_record(&original.matched[0]));
		assert_ne!(aliased.matched[1].id(), original.matched[1].id());
		assert_eq!(m.get_record_matcher("user").unwrap().path, "/users/:id");
	}

	#[rstest]
	fn test_alias_params_must_match() {
		let mut m = matcher();
		let err = m
			.add_route(&route("/users/:id", "user").alias("/u/:slug"), None)
			.unwrap_err();
		assert!(matches!(err, MatcherError::AliasParamsMismatch { .. }));
		assert!(!m.has_route("user"));
	}

	#[rstest]
	#[case("/a\\")]
	#[case("/files/:name\\")]
	fn test_trailing_escape_rejected(#[case] path: &str) {
		let mut m = matcher();
		m.add_route(&route("/a", "a"), None).unwrap();

		let err = m.add_route(&route(path, "broken"), None).unwrap_err();

		assert_eq!(
			err,
			MatcherError::Pattern {
				path: path.to_string(),
				source: PatternError::DanglingEscape(path.to_string()),
			}
		);
		assert!(!m.has_route("broken"));
		assert_eq!(m.get_routes().len(), 1);
	}

	#[rstest]
	#[case("*")]
	fn test_legacy_catch_all(#[case] path: &str) {
		assert_eq!(
			matcher().add_route(&route(path, "all"), None).unwrap_err(),
			MatcherError::LegacyCatchAll("*".to_string())
		);
	}

	#[rstest]
	fn test_named_inherits_required_params() {
		let mut m = matcher();
		m.add_route(
			&route("/users/:id", "user")
				.child(route("posts/:post?", "posts"))
				.child(route("settings", "settings")),
			None,
		)
		.unwrap();

		let mut current_params = PathParams::new();
		current_params.insert("id".to_string(), "9".into());
		current_params.insert("post".to_string(), "3".into());
		let current = MatcherCurrent {
			name: Some("posts"),
			path: "/users/9/posts/3",
			params: &current_params,
		};

		let empty = PathParams::new();
		let settings = m
			.resolve(MatcherLocation::Named { name: "settings", params: &empty }, Some(current))
			.unwrap();
		assert_eq!(settings.path, "/users/9/settings");

		let mut params = PathParams::new();
		params.insert("id".to_string(), "2".into());
		params.insert("bogus".to_string(), "x".into());
		let user = m
			.resolve(MatcherLocation::Named { name: "user", params: &params }, Some(current))
			.unwrap();
		assert_eq!(user.path, "/users/2");
		assert!(!user.params.contains_key("bogus"));
	}

	#[rstest]
	fn test_named_errors() {
		let mut m = matcher();
		m.add_route(&route("/users/:id", "user"), None).unwrap();
		let empty = PathParams::new();
		assert_eq!(
			m.resolve(MatcherLocation::Named { name: "nope", params: &empty }, None)
				.unwrap_err(),
			MatcherError::UnknownName("nope".to_string())
		);
		assert!(matches!(
			m.resolve(MatcherLocation::Named { name: "user", params: &empty }, None),
			Err(MatcherError::Build { .. })
		));
	}

	#[rstest]
	fn test_relative_merges_params() {
		let mut m = matcher();
		m.add_route(&route("/users/:id/:tab", "user"), None).unwrap();
		let mut current_params = PathParams::new();
		current_params.insert("id".to_string(), "1".into());
		current_params.insert("tab".to_string(), "info".into());
		let current = MatcherCurrent {
			name: None,
			path: "/users/1/info",
			params: &current_params,
		};
		let mut params = PathParams::new();
		params.insert("tab".to_string(), "posts".into());
		let resolved = m
			.resolve(MatcherLocation::Relative { params: &params }, Some(current))
			.unwrap();
		assert_eq!(resolved.path, "/users/1/posts");
		assert_eq!(resolved.name.as_deref(), Some("user"));

		assert!(matches!(
			m.resolve(MatcherLocation::Relative { params: &params }, None),
			Err(MatcherError::UnresolvableCurrent(_))
		));
	}

	#[rstest]
	fn test_add_child_route_by_name() {
		let mut m = matcher();
		m.add_route(&route("/admin", "admin"), None).unwrap();
		m.add_child_route("admin", &route("stats", "stats")).unwrap();
		assert_eq!(resolve_path(&m, "/admin/stats").matched.len(), 2);
		assert_eq!(
			m.add_child_route("missing", &route("x", "x")).unwrap_err(),
			MatcherError::UnknownParent("missing".to_string())
		);
	}

	#[rstest]
	fn test_clear_routes() {
		let mut m = matcher();
		m.add_route(&route("/a", "a"), None).unwrap();
		m.clear_routes();
		assert!(m.get_routes().is_empty());
		assert!(!m.has_route("a"));
	}
}
