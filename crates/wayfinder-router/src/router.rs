//! The router handle: route registry, resolution and navigation entry points.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use wayfinder_history::{ListenerId, MemoryHistory, RouterHistory};
use wayfinder_urls::{
	PathParams, decode_params, encode_hash, encode_params, parse_url, resolve_relative_path,
	stringify_url,
};

use crate::callbacks::{CallbackList, Unregister};
use crate::error::{MatcherError, MatcherResult, NavigationError};
use crate::failure::NavigationFailure;
use crate::guard::{AfterEachHook, ErrorHandler, GuardResult, SharedGuard, ViewResolver, guard_fn};
use crate::location::{LocationTarget, RouteLocation, RouteLocationRaw};
use crate::matcher::{MatchedRoute, MatcherCurrent, MatcherLocation, RouterMatcher};
use crate::navigation::NavigationResult;
use crate::options::RouterOptions;
use crate::record::{RecordId, RouteRecord, RouteRecordRaw};

/// Progress of the first navigation of a router.
#[derive(Debug, Clone)]
pub enum ReadyState {
	/// Nothing committed or failed yet.
	Pending,
	/// The first navigation committed or ended with a failure.
	Ready,
	/// The first navigation rejected with an error.
	Failed(NavigationError),
}

pub(crate) struct RouterInner {
	pub(crate) weak: Weak<RouterInner>,
	pub(crate) options: RouterOptions,
	pub(crate) matcher: RwLock<RouterMatcher>,
	pub(crate) history: Arc<dyn RouterHistory>,
	pub(crate) view_resolver: Option<Arc<dyn ViewResolver>>,
	pub(crate) before_guards: RwLock<CallbackList<SharedGuard>>,
	pub(crate) resolve_guards: RwLock<CallbackList<SharedGuard>>,
	pub(crate) after_hooks: RwLock<CallbackList<AfterEachHook>>,
	pub(crate) error_handlers: RwLock<CallbackList<ErrorHandler>>,
	pub(crate) current: watch::Sender<Arc<RouteLocation>>,
	pub(crate) ready: watch::Sender<ReadyState>,
	/// Bumped by every navigation attempt. An attempt holding an older value
	/// has been superseded.
	pub(crate) generation: AtomicU64,
	pub(crate) committed: AtomicBool,
	pub(crate) listening: AtomicBool,
	pub(crate) history_listener: Mutex<Option<ListenerId>>,
}

impl RouterInner {
	pub(crate) fn current(&self) -> Arc<RouteLocation> {
		self.current.borrow().clone()
	}

	/// Resolves `raw` against `current` without following record redirects.
	pub(crate) fn resolve_location(
		&self,
		raw: &RouteLocationRaw,
		current: &RouteLocation,
	) -> MatcherResult<RouteLocation> {
		let current_params = encode_params(&current.params);
		let context = MatcherCurrent {
			name: current.name.as_deref(),
			path: &current.path,
			params: &current_params,
		};

		let matcher = self.matcher.read();
		let (matched, query, hash, full_path) = match &raw.target {
			LocationTarget::Url(url) => {
				let parsed = parse_url(url, &current.path);
				let matched = matcher.resolve(MatcherLocation::Path(&parsed.path), Some(context))?;
				if raw.query.is_none() && raw.hash.is_none() {
					(matched, parsed.query, parsed.hash, parsed.full_path)
				} else {
					let query = raw.query.clone().unwrap_or(parsed.query);
					let hash = raw.hash.clone().unwrap_or(parsed.hash);
					let full_path = stringify_url(&matched.path, &query, &encode_hash(&hash));
					(matched, query, hash, full_path)
				}
			}
			LocationTarget::Path { path, params } => {
				if !params.is_empty() {
					tracing::warn!(path = %path, "params given together with a path are discarded");
				}
				let path = resolve_relative_path(path, &current.path);
				let matched = matcher.resolve(MatcherLocation::Path(&path), Some(context))?;
				let query = raw.query.clone().unwrap_or_default();
				let hash = raw.hash.clone().unwrap_or_default();
				let full_path = stringify_url(&matched.path, &query, &encode_hash(&hash));
				(matched, query, hash, full_path)
			}
			LocationTarget::Named { name, params } => {
				let params = encode_params(params);
				let matched = matcher.resolve(
					MatcherLocation::Named {
						name,
						params: &params,
					},
					Some(context),
				)?;
				let query = raw.query.clone().unwrap_or_default();
				let hash = raw.hash.clone().unwrap_or_default();
				let full_path = stringify_url(&matched.path, &query, &encode_hash(&hash));
				(matched, query, hash, full_path)
			}
			LocationTarget::Relative { params } => {
				let params = encode_params(params);
				let matched =
					matcher.resolve(MatcherLocation::Relative { params: &params }, Some(context))?;
				let query = raw.query.clone().unwrap_or_else(|| current.query.clone());
				let hash = raw.hash.clone().unwrap_or_else(|| current.hash.clone());
				let full_path = stringify_url(&matched.path, &query, &encode_hash(&hash));
				(matched, query, hash, full_path)
			}
		};
		drop(matcher);

		let MatchedRoute {
			name,
			path,
			params,
			matched,
			meta,
		} = matched;
		Ok(RouteLocation {
			href: self.history.create_href(&full_path),
			path,
			full_path,
			query,
			hash,
			name,
			params: decode_params(&params),
			matched,
			meta,
			redirected_from: None,
		})
	}

	/// Target of the redirect declared by the leaf of `to`, if any.
	///
	/// Relative paths resolve against `to`. The query and hash of `to` carry
	/// over unless the target sets its own, and so do its params when the
	/// target is a name without params.
	pub(crate) fn redirect_target(&self, to: &RouteLocation) -> MatcherResult<Option<RouteLocationRaw>> {
		let Some(redirect) = to.leaf().and_then(|record| record.redirect.as_ref()) else {
			return Ok(None);
		};
		let mut target = redirect.target_for(to);
		let placeholder = LocationTarget::Relative {
			params: PathParams::new(),
		};
		target.target = match std::mem::replace(&mut target.target, placeholder) {
			LocationTarget::Url(url) if url.contains(['?', '#']) => {
				let parsed = parse_url(&url, &to.path);
				target.query.get_or_insert(parsed.query);
				target.hash.get_or_insert(parsed.hash);
				LocationTarget::Path {
					path: parsed.path,
					params: PathParams::new(),
				}
			}
			LocationTarget::Url(path) => LocationTarget::Path {
				path: resolve_relative_path(&path, &to.path),
				params: PathParams::new(),
			},
			LocationTarget::Path { path, params } => LocationTarget::Path {
				path: resolve_relative_path(&path, &to.path),
				params,
			},
			LocationTarget::Named { name, params } if params.is_empty() => LocationTarget::Named {
				name,
				params: to.params.clone(),
			},
			named @ LocationTarget::Named { .. } => named,
			LocationTarget::Relative { .. } => {
				return Err(MatcherError::InvalidRedirect(to.full_path.clone()));
			}
		};
		target.query.get_or_insert_with(|| to.query.clone());
		target.hash.get_or_insert_with(|| to.hash.clone());
		Ok(Some(target))
	}

	/// Resolves `raw` and follows record redirects.
	pub(crate) fn resolve_following(
		&self,
		raw: &RouteLocationRaw,
		current: &RouteLocation,
	) -> MatcherResult<RouteLocation> {
		let mut location = self.resolve_location(raw, current)?;
		let mut first: Option<RouteLocation> = None;
		let mut hops = 0;
		while let Some(target) = self.redirect_target(&location)? {
			hops += 1;
			if hops > self.options.max_redirects {
				return Err(MatcherError::RedirectLimit {
					from: first.map_or(location.full_path, |first| first.full_path),
					limit: self.options.max_redirects,
				});
			}
			let next = self.resolve_location(&target, &location)?;
			first.get_or_insert(location);
			location = next;
		}
		location.redirected_from = first.map(Box::new);
		Ok(location)
	}

	pub(crate) fn mark_ready(&self, error: Option<NavigationError>) {
		self.ready.send_if_modified(move |state| {
			if !matches!(state, ReadyState::Pending) {
				return false;
			}
			*state = match error {
				Some(error) => ReadyState::Failed(error),
				None => ReadyState::Ready,
			};
			true
		});
	}
}

/// Builder for [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
	options: Option<RouterOptions>,
	history: Option<Arc<dyn RouterHistory>>,
	routes: Vec<RouteRecordRaw>,
	view_resolver: Option<Arc<dyn ViewResolver>>,
}

impl RouterBuilder {
	/// Sets the options. Defaults to [`RouterOptions::default`].
	pub fn options(mut self, options: RouterOptions) -> Self {
		self.options = Some(options);
		self
	}

	/// Sets the history backend. Defaults to a [`MemoryHistory`].
	pub fn history<H: RouterHistory + 'static>(self, history: H) -> Self {
		self.shared_history(Arc::new(history))
	}

	/// Sets a history backend shared with other owners.
	pub fn shared_history(mut self, history: Arc<dyn RouterHistory>) -> Self {
		self.history = Some(history);
		self
	}

	/// Adds a top-level route.
	pub fn route(mut self, route: RouteRecordRaw) -> Self {
		self.routes.push(route);
		self
	}

	/// Adds top-level routes.
	pub fn routes(mut self, routes: impl IntoIterator<Item = RouteRecordRaw>) -> Self {
		self.routes.extend(routes);
		self
	}

	/// Sets the collaborator awaited before the before-resolve guards.
	pub fn view_resolver<V: ViewResolver + 'static>(mut self, resolver: V) -> Self {
		self.view_resolver = Some(Arc::new(resolver));
		self
	}

	/// Compiles the routes and creates the router.
	///
	/// # Errors
	///
	/// Returns the first [`MatcherError`] raised by a route.
	pub fn build(self) -> MatcherResult<Router> {
		let options = self.options.unwrap_or_default();
		let mut matcher = RouterMatcher::new(options);
		for route in &self.routes {
			matcher.add_route(route, None)?;
		}
		let history = self
			.history
			.unwrap_or_else(|| Arc::new(MemoryHistory::new(None)));
		let inner = Arc::new_cyclic(|weak| RouterInner {
			weak: weak.clone(),
			options,
			matcher: RwLock::new(matcher),
			history,
			view_resolver: self.view_resolver,
			before_guards: RwLock::new(CallbackList::default()),
			resolve_guards: RwLock::new(CallbackList::default()),
			after_hooks: RwLock::new(CallbackList::default()),
			error_handlers: RwLock::new(CallbackList::default()),
			current: watch::Sender::new(Arc::new(RouteLocation::start())),
			ready: watch::Sender::new(ReadyState::Pending),
			generation: AtomicU64::new(0),
			committed: AtomicBool::new(false),
			listening: AtomicBool::new(true),
			history_listener: Mutex::new(None),
		});
		Ok(Router { inner })
	}
}

/// A navigation resolver bound to a history backend.
///
/// Cloning is cheap; clones share every registry and the current route.
///
/// # Examples
///
/// ```
/// use wayfinder_router::{RouteRecordRaw, Router};
///
/// # tokio_test::block_on(async {
/// let router = Router::builder()
///     .route(RouteRecordRaw::new("/").name("home").component("Home"))
///     .route(RouteRecordRaw::new("/users/:id").name("user").component("User"))
///     .build()
///     .unwrap();
///
/// let failure = router.push("/users/42?tab=posts").await.unwrap();
/// assert!(failure.is_none());
/// let current = router.current_route();
/// assert_eq!(current.name.as_deref(), Some("user"));
/// assert_eq!(current.param("id"), Some("42"));
/// assert_eq!(current.query.get_first("tab"), Some("posts"));
/// # });
/// ```
#[derive(Clone)]
pub struct Router {
	inner: Arc<RouterInner>,
}

impl fmt::Debug for Router {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Router")
			.field("options", &self.inner.options)
			.field("current", &self.inner.current().full_path)
			.finish_non_exhaustive()
	}
}

impl Router {
	/// Returns a builder.
	pub fn builder() -> RouterBuilder {
		RouterBuilder::default()
	}

	/// Router over `routes` with default options and a [`MemoryHistory`].
	///
	/// # Errors
	///
	/// Returns the first [`MatcherError`] raised by a route.
	pub fn new(routes: impl IntoIterator<Item = RouteRecordRaw>) -> MatcherResult<Self> {
		Self::builder().routes(routes).build()
	}

	/// The options the router was built with.
	pub fn options(&self) -> &RouterOptions {
		&self.inner.options
	}

	/// The history backend.
	pub fn history(&self) -> &Arc<dyn RouterHistory> {
		&self.inner.history
	}

	fn route_remover(&self, id: RecordId) -> Unregister {
		Unregister::new(self.inner.weak.clone(), move |inner: &RouterInner| {
			inner.matcher.write().remove_record(id)
		})
	}

	/// Adds a top-level route. The returned handle removes it again.
	///
	/// # Errors
	///
	/// Fails like [`RouterMatcher::add_route`]; nothing is registered then.
	pub fn add_route(&self, route: RouteRecordRaw) -> MatcherResult<Unregister> {
		let id = self.inner.matcher.write().add_route(&route, None)?;
		Ok(self.route_remover(id))
	}

	/// Adds a route under the route named `parent`.
	///
	/// # Errors
	///
	/// Fails like [`RouterMatcher::add_child_route`].
	pub fn add_child_route(&self, parent: &str, route: RouteRecordRaw) -> MatcherResult<Unregister> {
		let id = self.inner.matcher.write().add_child_route(parent, &route)?;
		Ok(self.route_remover(id))
	}

	/// Removes the route named `name` with its children and aliases.
	pub fn remove_route(&self, name: &str) -> bool {
		self.inner.matcher.write().remove_route(name)
	}

	/// Whether a route is registered under `name`.
	pub fn has_route(&self, name: &str) -> bool {
		self.inner.matcher.read().has_route(name)
	}

	/// Matchable records, most specific first.
	pub fn get_routes(&self) -> Vec<Arc<RouteRecord>> {
		self.inner.matcher.read().get_routes()
	}

	/// Removes every route.
	pub fn clear_routes(&self) {
		self.inner.matcher.write().clear_routes()
	}

	/// Resolves a location against the current route, following record
	/// redirects.
	///
	/// A path nothing matches resolves to a location with an empty `matched`
	/// chain.
	///
	/// # Errors
	///
	/// Fails on unknown names, unbuildable paths, invalid redirects and
	/// redirect chains longer than [`RouterOptions::max_redirects`].
	pub fn resolve(&self, to: impl Into<RouteLocationRaw>) -> MatcherResult<RouteLocation> {
		let current = self.inner.current();
		self.inner.resolve_following(&to.into(), &current)
	}

	/// Navigates to `to`, adding a history entry.
	///
	/// Resolves to `Ok(None)` once committed and to `Ok(Some(failure))` when
	/// the navigation was aborted, cancelled or duplicated.
	///
	/// # Errors
	///
	/// Rejects when the target cannot be resolved, a guard or the view
	/// resolver raises an error, or the history backend refuses the entry.
	pub async fn push(&self, to: impl Into<RouteLocationRaw>) -> NavigationResult {
		self.inner.push_with_redirect(to.into(), None).await
	}

	/// Navigates to `to`, replacing the current history entry.
	///
	/// # Errors
	///
	/// Same as [`push`](Self::push).
	pub async fn replace(&self, to: impl Into<RouteLocationRaw>) -> NavigationResult {
		self.inner.push_with_redirect(to.into().replacing(), None).await
	}

	/// Navigates to the location the history backend currently shows.
	///
	/// # Errors
	///
	/// Same as [`push`](Self::push).
	pub async fn initialize(&self) -> NavigationResult {
		let location = self.inner.history.location();
		self.push(location).await
	}

	/// Moves `delta` entries through the history. The router navigates once
	/// the backend reports the move.
	pub fn go(&self, delta: i64) {
		self.inner.history.go(delta, true);
	}

	/// Same as `go(-1)`.
	pub fn back(&self) {
		self.go(-1);
	}

	/// Same as `go(1)`.
	pub fn forward(&self) {
		self.go(1);
	}

	/// Registers a guard run for every navigation, after the leave and
	/// update guards and before the enter guards.
	pub fn before_each<F, Fut, R>(&self, guard: F) -> Unregister
	where
		F: Fn(Arc<RouteLocation>, Arc<RouteLocation>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = R> + Send + 'static,
		R: Into<GuardResult>,
	{
		let id = self.inner.before_guards.write().add(guard_fn(guard));
		Unregister::new(self.inner.weak.clone(), move |inner: &RouterInner| {
			inner.before_guards.write().remove(id)
		})
	}

	/// Registers a guard run for every navigation once views are resolved,
	/// right before the commit.
	pub fn before_resolve<F, Fut, R>(&self, guard: F) -> Unregister
	where
		F: Fn(Arc<RouteLocation>, Arc<RouteLocation>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = R> + Send + 'static,
		R: Into<GuardResult>,
	{
		let id = self.inner.resolve_guards.write().add(guard_fn(guard));
		Unregister::new(self.inner.weak.clone(), move |inner: &RouterInner| {
			inner.resolve_guards.write().remove(id)
		})
	}

	/// Registers an observer run after every navigation that did not error.
	pub fn after_each<F>(&self, hook: F) -> Unregister
	where
		F: Fn(&RouteLocation, &RouteLocation, Option<&NavigationFailure>) + Send + Sync + 'static,
	{
		let hook: AfterEachHook = Arc::new(hook);
		let id = self.inner.after_hooks.write().add(hook);
		Unregister::new(self.inner.weak.clone(), move |inner: &RouterInner| {
			inner.after_hooks.write().remove(id)
		})
	}

	/// Registers an observer of navigation errors, run before the navigation
	/// rejects.
	pub fn on_error<F>(&self, handler: F) -> Unregister
	where
		F: Fn(&NavigationError, &RouteLocation, &RouteLocation) + Send + Sync + 'static,
	{
		let handler: ErrorHandler = Arc::new(handler);
		let id = self.inner.error_handlers.write().add(handler);
		Unregister::new(self.inner.weak.clone(), move |inner: &RouterInner| {
			inner.error_handlers.write().remove(id)
		})
	}

	/// The last committed location.
	pub fn current_route(&self) -> Arc<RouteLocation> {
		self.inner.current()
	}

	/// Receiver notified on every commit.
	pub fn subscribe(&self) -> watch::Receiver<Arc<RouteLocation>> {
		self.inner.current.subscribe()
	}

	/// Completes once the first navigation committed or ended with a
	/// failure.
	///
	/// # Errors
	///
	/// Returns the error the first navigation rejected with.
	pub async fn is_ready(&self) -> Result<(), NavigationError> {
		let mut ready = self.inner.ready.subscribe();
		let state = match ready
			.wait_for(|state| !matches!(state, ReadyState::Pending))
			.await
		{
			Ok(state) => state.clone(),
			Err(_) => return Ok(()),
		};
		match state {
			ReadyState::Failed(error) => Err(error),
			ReadyState::Pending | ReadyState::Ready => Ok(()),
		}
	}

	/// Current readiness without waiting.
	pub fn ready_state(&self) -> ReadyState {
		self.inner.ready.borrow().clone()
	}

	/// Pauses or resumes reacting to history changes. While paused, changes
	/// reported by the backend are ignored.
	pub fn set_listening(&self, listening: bool) {
		self.inner.listening.store(listening, Ordering::SeqCst);
	}

	/// Whether history changes trigger navigations.
	pub fn is_listening(&self) -> bool {
		self.inner.listening.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use wayfinder_urls::LocationQuery;

	fn router() -> Router {
		Router::new([
			RouteRecordRaw::new("/").name("home").component("Home"),
			RouteRecordRaw::new("/users/:id")
				.name("user")
				.component("User")
				.child(RouteRecordRaw::new("posts/:post?").name("posts").component("Posts")),
			RouteRecordRaw::new("/old/:id").redirect(RouteLocationRaw::named("user")),
			RouteRecordRaw::new("/legacy").redirect("/users/1?from=legacy"),
			RouteRecordRaw::new("/loop-a").redirect("/loop-b"),
			RouteRecordRaw::new("/loop-b").redirect("/loop-a"),
		])
		.unwrap()
	}

	#[rstest]
	fn test_resolve_string_decodes_params_and_hash() {
		let location = router().resolve("/users/a%20b?x=1#t%C3%A9").unwrap();
		assert_eq!(location.name.as_deref(), Some("user"));
		assert_eq!(location.param("id"), Some("a b"));
		assert_eq!(location.path, "/users/a%20b");
		assert_eq!(location.hash, "#té");
		assert_eq!(location.full_path, "/users/a%20b?x=1#t%C3%A9");
		assert_eq!(location.href, "/users/a%20b?x=1#t%C3%A9");
	}

	#[rstest]
	fn test_resolve_named_encodes_params() {
		let location = router()
			.resolve(
				RouteLocationRaw::named("user")
					.with_param("id", "a/b")
					.with_query(LocationQuery::new().with("q", "x y"))
					.with_hash("top"),
			)
			.unwrap();
		assert_eq!(location.path, "/users/a%2Fb");
		assert_eq!(location.param("id"), Some("a/b"));
		assert_eq!(location.full_path, "/users/a%2Fb?q=x+y#top");
	}

	#[rstest]
	fn test_resolve_path_discards_params() {
		let location = router()
			.resolve(RouteLocationRaw::path("/users/1").with_param("id", "2"))
			.unwrap();
		assert_eq!(location.param("id"), Some("1"));
	}

	#[rstest]
	fn test_resolve_unknown_path_is_not_found() {
		let location = router().resolve("/nowhere").unwrap();
		assert!(location.is_not_found());
		assert_eq!(location.full_path, "/nowhere");
	}

	#[rstest]
	fn test_resolve_follows_redirects() {
		let location = router().resolve("/old/7?keep=1").unwrap();
		assert_eq!(location.name.as_deref(), Some("user"));
		assert_eq!(location.param("id"), Some("7"));
		assert_eq!(location.query.get_first("keep"), Some("1"));
		assert_eq!(
			location.redirected_from.as_ref().map(|from| from.full_path.as_str()),
			Some("/old/7?keep=1")
		);

		let location = router().resolve("/legacy#h").unwrap();
		assert_eq!(location.full_path, "/users/1?from=legacy");
	}

	#[rstest]
	fn test_resolve_redirect_loop_is_bounded() {
		let err = router().resolve("/loop-a").unwrap_err();
		assert_eq!(
			err,
			MatcherError::RedirectLimit {
				from: "/loop-a".to_string(),
				limit: 16,
			}
		);
	}

	#[rstest]
	fn test_add_route_handle_removes() {
		let router = router();
		let handle = router
			.add_route(RouteRecordRaw::new("/extra").name("extra").component("Extra"))
			.unwrap();
		assert!(router.has_route("extra"));
		handle.unregister();
		assert!(!router.has_route("extra"));
		assert!(router.resolve("/extra").unwrap().is_not_found());
	}

	#[rstest]
	fn test_listening_toggle() {
		let router = router();
		assert!(router.is_listening());
		router.set_listening(false);
		assert!(!router.is_listening());
	}
}
