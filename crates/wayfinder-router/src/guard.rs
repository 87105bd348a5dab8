//! Guard results, the guard trait and observer hooks.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::{GuardError, NavigationError};
use crate::failure::NavigationFailure;
use crate::location::{RouteLocation, RouteLocationRaw};

/// What a guard decided.
#[derive(Debug, Clone)]
pub enum GuardResult {
	/// Let the navigation go on.
	Continue,
	/// Stop the navigation with an aborted failure.
	Abort,
	/// Restart the navigation towards another location.
	Redirect(RouteLocationRaw),
	/// Reject the navigation with an error.
	Error(GuardError),
}

impl From<()> for GuardResult {
	fn from(_: ()) -> Self {
		Self::Continue
	}
}

impl From<bool> for GuardResult {
	fn from(allow: bool) -> Self {
		if allow { Self::Continue } else { Self::Abort }
	}
}

impl From<RouteLocationRaw> for GuardResult {
	fn from(location: RouteLocationRaw) -> Self {
		Self::Redirect(location)
	}
}

impl From<&str> for GuardResult {
	fn from(url: &str) -> Self {
		Self::Redirect(RouteLocationRaw::url(url))
	}
}

impl From<String> for GuardResult {
	fn from(url: String) -> Self {
		Self::Redirect(RouteLocationRaw::url(url))
	}
}

impl From<Option<RouteLocationRaw>> for GuardResult {
	fn from(location: Option<RouteLocationRaw>) -> Self {
		location.map_or(Self::Continue, Self::Redirect)
	}
}

impl From<GuardError> for GuardResult {
	fn from(error: GuardError) -> Self {
		Self::Error(error)
	}
}

impl<T, E> From<Result<T, E>> for GuardResult
where
	T: Into<GuardResult>,
	E: Into<GuardError>,
{
	fn from(result: Result<T, E>) -> Self {
		match result {
			Ok(value) => value.into(),
			Err(error) => Self::Error(error.into()),
		}
	}
}

/// A check run before a navigation commits.
///
/// Implemented for every `Fn(to, from) -> impl Future<Output = impl
/// Into<GuardResult>>`.
pub trait NavigationGuard: Send + Sync {
	/// Decides on the navigation from `from` to `to`.
	fn check(&self, to: Arc<RouteLocation>, from: Arc<RouteLocation>) -> BoxFuture<'static, GuardResult>;
}

impl<F, Fut, R> NavigationGuard for F
where
	F: Fn(Arc<RouteLocation>, Arc<RouteLocation>) -> Fut + Send + Sync,
	Fut: Future<Output = R> + Send + 'static,
	R: Into<GuardResult>,
{
	fn check(&self, to: Arc<RouteLocation>, from: Arc<RouteLocation>) -> BoxFuture<'static, GuardResult> {
		let fut = self(to, from);
		Box::pin(async move { fut.await.into() })
	}
}

pub(crate) type SharedGuard = Arc<dyn NavigationGuard>;

/// Boxes a guard closure.
pub(crate) fn guard_fn<F, Fut, R>(guard: F) -> SharedGuard
where
	F: Fn(Arc<RouteLocation>, Arc<RouteLocation>) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = R> + Send + 'static,
	R: Into<GuardResult>,
{
	Arc::new(guard)
}

/// Observer run after every navigation, with its failure if any.
pub type AfterEachHook =
	Arc<dyn Fn(&RouteLocation, &RouteLocation, Option<&NavigationFailure>) + Send + Sync>;

/// Observer run when a navigation rejects with an error.
pub type ErrorHandler = Arc<dyn Fn(&NavigationError, &RouteLocation, &RouteLocation) + Send + Sync>;

/// Resolves the views of a target before the before-resolve guards run,
/// typically loading lazy view definitions.
#[async_trait]
pub trait ViewResolver: Send + Sync {
	/// Completes once every view of `to.matched` is available.
	async fn resolve_views(&self, to: &RouteLocation) -> Result<(), GuardError>;
}
