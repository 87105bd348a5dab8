//! # Wayfinder
//!
//! A client-side navigation resolver: it turns URLs and named targets into
//! matched route locations and drives guarded navigations against a history
//! backend.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All layers
//! - `minimal` - URL codec and path patterns only
//! - `history` - History backend contract and [`MemoryHistory`](history::MemoryHistory)
//! - `router` - Route matcher and navigation pipeline (implies `history`)
//!
//! ## Quick Start
//!
//! ```
//! # #[cfg(feature = "router")]
//! # tokio_test::block_on(async {
//! use wayfinder::router::{RouteRecordRaw, Router};
//!
//! let router = Router::new([
//!     RouteRecordRaw::new("/").name("home").component("Home"),
//!     RouteRecordRaw::new("/users/:id").name("user").component("User"),
//! ])
//! .unwrap();
//!
//! router.push("/users/42?tab=posts").await.unwrap();
//! let current = router.current_route();
//! assert_eq!(current.name.as_deref(), Some("user"));
//! assert_eq!(current.param("id"), Some("42"));
//! # });
//! ```

pub use wayfinder_urls as urls;

#[cfg(feature = "history")]
pub use wayfinder_history as history;

#[cfg(feature = "router")]
pub use wayfinder_router as router;

/// Commonly used types.
pub mod prelude {
	pub use wayfinder_urls::{
		LocationQuery, ParamValue, PathParams, PathParser, PathParserOptions, QueryValue,
	};

	#[cfg(feature = "history")]
	pub use wayfinder_history::{HistoryState, MemoryHistory, RouterHistory};

	#[cfg(feature = "router")]
	pub use wayfinder_router::{
		NavigationFailure, NavigationFailureKind, RouteLocation, RouteLocationRaw,
		RouteRecordRaw, Router, RouterOptions,
	};
}
