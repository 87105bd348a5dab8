//! History backends for the Wayfinder navigation resolver.
//!
//! The router only talks to a [`RouterHistory`]. Platform backends (browser
//! URL, browser hash) implement the trait outside this crate;
//! [`MemoryHistory`] serves hosts without a platform history and tests.

pub mod error;
pub mod history;
pub mod memory;

pub use error::{HistoryError, HistoryResult};
pub use history::{
	HistoryLocation, HistoryState, ListenerId, NavigationCallback, NavigationDirection,
	NavigationInformation, NavigationType, RouterHistory, create_href, normalize_base,
};
pub use memory::{MemoryHistory, START};
