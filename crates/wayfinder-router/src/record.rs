//! Route declarations and their normalized records.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::guard::{GuardResult, SharedGuard, guard_fn};
use crate::location::{RouteLocation, RouteLocationRaw};

/// Free-form data attached to a route, merged from root to leaf on
/// resolution.
pub type RouteMeta = Map<String, Value>;

type RedirectFn = Arc<dyn Fn(&RouteLocation) -> RouteLocationRaw + Send + Sync>;

/// Where a redirect record sends navigations.
#[derive(Clone)]
pub enum RedirectTarget {
	/// A fixed location. Relative targets resolve against the redirecting
	/// location.
	Location(RouteLocationRaw),
	/// Computed from the location being redirected.
	Dynamic(RedirectFn),
}

impl RedirectTarget {
	/// Redirect computed from a closure.
	pub fn dynamic<F>(redirect: F) -> Self
	where
		F: Fn(&RouteLocation) -> RouteLocationRaw + Send + Sync + 'static,
	{
		Self::Dynamic(Arc::new(redirect))
	}

	pub(crate) fn target_for(&self, to: &RouteLocation) -> RouteLocationRaw {
		match self {
			Self::Location(location) => location.clone(),
			Self::Dynamic(redirect) => redirect(to),
		}
	}
}

impl fmt::Debug for RedirectTarget {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Location(location) => f.debug_tuple("Location").field(location).finish(),
			Self::Dynamic(_) => f.write_str("Dynamic(..)"),
		}
	}
}

impl From<&str> for RedirectTarget {
	fn from(url: &str) -> Self {
		Self::Location(RouteLocationRaw::url(url))
	}
}

impl From<RouteLocationRaw> for RedirectTarget {
	fn from(location: RouteLocationRaw) -> Self {
		Self::Location(location)
	}
}

/// A route as declared by the application.
///
/// # Examples
///
/// ```
/// use wayfinder_router::RouteRecordRaw;
///
/// let users = RouteRecordRaw::new("/users")
///     .component("UsersLayout")
///     .meta("requires_auth", true)
///     .child(RouteRecordRaw::new("").name("users").component("UserList"))
///     .child(RouteRecordRaw::new(":id(\\d+)").name("user").component("UserDetail"))
///     .alias("/people");
/// assert_eq!(users.children.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct RouteRecordRaw {
	/// Path pattern. Child paths not starting with `/` are relative to the
	/// parent path.
	pub path: String,
	/// Unique name.
	pub name: Option<String>,
	/// Redirect applied when this record is the leaf of a match.
	pub redirect: Option<RedirectTarget>,
	/// Nested routes.
	pub children: Vec<RouteRecordRaw>,
	/// Extra patterns resolving to this record.
	pub alias: Vec<String>,
	/// Free-form data.
	pub meta: RouteMeta,
	/// Identifiers of the views this route renders.
	pub components: Vec<String>,
	/// Props policy, passed through to the view layer.
	pub props: Option<Value>,
	/// Overrides [`RouterOptions::strict`](crate::RouterOptions::strict).
	pub strict: Option<bool>,
	/// Overrides [`RouterOptions::sensitive`](crate::RouterOptions::sensitive).
	pub sensitive: Option<bool>,
	/// Overrides [`RouterOptions::end`](crate::RouterOptions::end).
	pub end: Option<bool>,
	pub(crate) before_enter: Vec<SharedGuard>,
	pub(crate) before_leave: Vec<SharedGuard>,
	pub(crate) before_update: Vec<SharedGuard>,
}

impl fmt::Debug for RouteRecordRaw {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteRecordRaw")
			.field("path", &self.path)
			.field("name", &self.name)
			.field("redirect", &self.redirect)
			.field("children", &self.children)
			.field("alias", &self.alias)
			.field("meta", &self.meta)
			.field("components", &self.components)
			.finish_non_exhaustive()
	}
}

impl RouteRecordRaw {
	/// Declares a route at `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			..Default::default()
		}
	}

	/// Sets the name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Adds a view identifier.
	pub fn component(mut self, component: impl Into<String>) -> Self {
		self.components.push(component.into());
		self
	}

	/// Sets the redirect.
	pub fn redirect(mut self, target: impl Into<RedirectTarget>) -> Self {
		self.redirect = Some(target.into());
		self
	}

	/// Adds a nested route.
	pub fn child(mut self, child: RouteRecordRaw) -> Self {
		self.children.push(child);
		self
	}

	/// Adds nested routes.
	pub fn children(mut self, children: impl IntoIterator<Item = RouteRecordRaw>) -> Self {
		self.children.extend(children);
		self
	}

	/// Adds an alias pattern.
	pub fn alias(mut self, alias: impl Into<String>) -> Self {
		self.alias.push(alias.into());
		self
	}

	/// Sets a meta field.
	pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.meta.insert(key.into(), value.into());
		self
	}

	/// Sets the props policy.
	pub fn props(mut self, props: impl Into<Value>) -> Self {
		self.props = Some(props.into());
		self
	}

	/// Overrides trailing slash strictness.
	pub fn strict(mut self, strict: bool) -> Self {
		self.strict = Some(strict);
		self
	}

	/// Overrides case sensitivity.
	pub fn sensitive(mut self, sensitive: bool) -> Self {
		self.sensitive = Some(sensitive);
		self
	}

	/// Overrides end anchoring.
	pub fn end(mut self, end: bool) -> Self {
		self.end = Some(end);
		self
	}

	/// Guard run when a navigation enters this route.
	pub fn before_enter<F, Fut, R>(mut self, guard: F) -> Self
	where
		F: Fn(Arc<RouteLocation>, Arc<RouteLocation>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = R> + Send + 'static,
		R: Into<GuardResult>,
	{
		self.before_enter.push(guard_fn(guard));
		self
	}

	/// Guard run when a navigation leaves this route.
	pub fn before_leave<F, Fut, R>(mut self, guard: F) -> Self
	where
		F: Fn(Arc<RouteLocation>, Arc<RouteLocation>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = R> + Send + 'static,
		R: Into<GuardResult>,
	{
		self.before_leave.push(guard_fn(guard));
		self
	}

	/// Guard run when a navigation stays on this route with other params,
	/// query or hash.
	pub fn before_update<F, Fut, R>(mut self, guard: F) -> Self
	where
		F: Fn(Arc<RouteLocation>, Arc<RouteLocation>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = R> + Send + 'static,
		R: Into<GuardResult>,
	{
		self.before_update.push(guard_fn(guard));
		self
	}
}

/// Identity of a normalized record inside a router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) usize);

/// A normalized record, shared by every location it matches.
pub struct RouteRecord {
	pub(crate) id: RecordId,
	pub(crate) parent: Option<RecordId>,
	pub(crate) alias_of: Option<RecordId>,
	/// Full path pattern, joined with the parent paths.
	pub path: String,
	/// Name. Alias records carry the name of the record they alias.
	pub name: Option<String>,
	/// Redirect, if any.
	pub redirect: Option<RedirectTarget>,
	/// Own meta, not merged.
	pub meta: RouteMeta,
	/// View identifiers.
	pub components: Vec<String>,
	/// Props policy.
	pub props: Option<Value>,
	pub(crate) before_enter: Vec<SharedGuard>,
	pub(crate) before_leave: Vec<SharedGuard>,
	pub(crate) before_update: Vec<SharedGuard>,
}

impl fmt::Debug for RouteRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RouteRecord")
			.field("id", &self.id)
			.field("path", &self.path)
			.field("name", &self.name)
			.field("parent", &self.parent)
			.field("alias_of", &self.alias_of)
			.field("redirect", &self.redirect)
			.field("meta", &self.meta)
			.finish_non_exhaustive()
	}
}

impl RouteRecord {
	/// This record's id.
	pub fn id(&self) -> RecordId {
		self.id
	}

	/// Parent record.
	pub fn parent(&self) -> Option<RecordId> {
		self.parent
	}

	/// Record this one is an alias of.
	pub fn alias_of(&self) -> Option<RecordId> {
		self.alias_of
	}

	/// Id shared by a record and all of its aliases.
	pub fn original_id(&self) -> RecordId {
		self.alias_of.unwrap_or(self.id)
	}

	/// Whether two records are the same route, looking through aliases.
	pub fn is_same_record(&self, other: &RouteRecord) -> bool {
		self.original_id() == other.original_id()
	}

	/// Records without a name, view or redirect only group children and
	/// never match on their own.
	pub fn is_matchable(&self) -> bool {
		self.name.is_some() || !self.components.is_empty() || self.redirect.is_some()
	}
}

/// Joins a child path to its parent path.
pub(crate) fn join_paths(parent: Option<&str>, child: &str) -> String {
	match parent {
		_ if child.starts_with('/') => child.to_string(),
		None => child.to_string(),
		Some(parent) if child.is_empty() => parent.to_string(),
		Some(parent) if parent.ends_with('/') => format!("{parent}{child}"),
		Some(parent) => format!("{parent}/{child}"),
	}
}
