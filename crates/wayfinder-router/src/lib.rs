//! Route matching and navigation for the Wayfinder navigation resolver.
//!
//! A [`Router`] owns a set of [`RouteRecordRaw`] declarations compiled into a
//! score-sorted matcher, the current [`RouteLocation`] and the guard
//! registries. Navigations run through leave, update, global, enter and
//! before-resolve guards before they commit to a [`RouterHistory`] backend.
//!
//! ```
//! use wayfinder_router::{NavigationFailureKind, RouteRecordRaw, Router};
//!
//! # tokio_test::block_on(async {
//! let router = Router::new([
//!     RouteRecordRaw::new("/").name("home").component("Home"),
//!     RouteRecordRaw::new("/admin").name("admin").component("Admin"),
//! ])
//! .unwrap();
//!
//! let _guard = router.before_each(|to, _from| async move { to.path != "/admin" });
//!
//! let failure = router.push("/admin").await.unwrap().unwrap();
//! assert!(failure.is(NavigationFailureKind::Aborted));
//! assert!(router.current_route().is_start());
//! # });
//! ```
//!
//! [`RouterHistory`]: wayfinder_history::RouterHistory

mod callbacks;
pub mod error;
pub mod failure;
pub mod guard;
pub mod location;
pub mod matcher;
pub mod navigation;
pub mod options;
pub mod record;
pub mod router;

pub use callbacks::Unregister;
pub use error::{GuardError, MatcherError, MatcherResult, NavigationError, OptionsError};
pub use failure::{AbortReason, NavigationFailure, NavigationFailureKind};
pub use guard::{AfterEachHook, ErrorHandler, GuardResult, NavigationGuard, ViewResolver};
pub use location::{LocationTarget, RouteLocation, RouteLocationRaw, is_same_route_location};
pub use matcher::{MatchedRoute, MatcherCurrent, MatcherLocation, RouterMatcher};
pub use navigation::{NavigationPhase, NavigationResult};
pub use options::{DEFAULT_MAX_REDIRECTS, RouterOptions, RouterOptionsBuilder};
pub use record::{RecordId, RedirectTarget, RouteMeta, RouteRecord, RouteRecordRaw};
pub use router::{ReadyState, Router, RouterBuilder};
