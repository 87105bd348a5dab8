//! The contract every history backend fulfills.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HistoryResult;

/// A location as stored by a backend: `path?query#hash`, without the base.
pub type HistoryLocation = String;

/// How the current entry changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationType {
	/// The platform moved through existing entries (back/forward).
	Pop,
	/// A new entry was written programmatically.
	Push,
}

/// Direction of a [`NavigationType::Pop`] change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationDirection {
	/// Towards older entries.
	Back,
	/// Towards newer entries.
	Forward,
	/// The backend could not tell.
	Unknown,
}

/// Information passed to history listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationInformation {
	/// Kind of change.
	#[serde(rename = "type")]
	pub kind: NavigationType,
	/// Direction of the change.
	pub direction: NavigationDirection,
	/// Number of entries moved. Negative values go back.
	pub delta: i64,
}

impl NavigationInformation {
	/// Information for a platform-originated move of `delta` entries.
	pub fn pop(delta: i64) -> Self {
		let direction = match delta {
			d if d < 0 => NavigationDirection::Back,
			d if d > 0 => NavigationDirection::Forward,
			_ => NavigationDirection::Unknown,
		};
		Self {
			kind: NavigationType::Pop,
			direction,
			delta,
		}
	}
}

/// Opaque state stored alongside a history entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryState(Map<String, Value>);

impl HistoryState {
	/// Creates an empty state.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insertion.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(key.into(), value.into());
		self
	}

	/// Returns the value under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Merges `other` into `self`, overwriting existing keys.
	pub fn merge(&mut self, other: HistoryState) {
		self.0.extend(other.0);
	}
}

impl From<Map<String, Value>> for HistoryState {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

/// Callback invoked with `(to, from, info)` when the platform changes the
/// current entry.
pub type NavigationCallback =
	Arc<dyn Fn(&str, &str, NavigationInformation) + Send + Sync>;

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
	/// Wraps a raw id. Backends outside this crate use it to mint ids.
	pub fn from_raw(id: u64) -> Self {
		Self(id)
	}
}

/// A history backend.
///
/// Writes are awaitable so backends can confirm them asynchronously. `go`
/// is fire-and-forget: its effect is reported to listeners.
#[async_trait]
pub trait RouterHistory: Send + Sync {
	/// Normalized base prepended to every URL, see [`normalize_base`].
	fn base(&self) -> &str;

	/// Current location, without the base.
	fn location(&self) -> HistoryLocation;

	/// State of the current entry.
	fn state(&self) -> HistoryState;

	/// Writes a new entry after the current one, dropping forward entries.
	async fn push(&self, to: &str, state: Option<HistoryState>) -> HistoryResult<()>;

	/// Replaces the current entry.
	async fn replace(&self, to: &str, state: Option<HistoryState>) -> HistoryResult<()>;

	/// Moves `delta` entries. Listeners are notified only when
	/// `trigger_listeners` is set.
	fn go(&self, delta: i64, trigger_listeners: bool);

	/// Registers a listener for platform-originated changes.
	fn listen(&self, callback: NavigationCallback) -> ListenerId;

	/// Removes a listener. Unknown ids are ignored.
	fn unlisten(&self, id: ListenerId);

	/// Href of `location` as it would appear in a link.
	fn create_href(&self, location: &str) -> String {
		create_href(self.base(), location)
	}

	/// Drops every listener and releases the backend.
	fn destroy(&self);
}

/// Normalizes a base: an empty base becomes `/`, a leading `/` is added
/// unless the base starts with `/` or `#`, and the trailing `/` is removed.
///
/// # Examples
///
/// ```
/// use wayfinder_history::normalize_base;
///
/// assert_eq!(normalize_base(None), "");
/// assert_eq!(normalize_base(Some("app/")), "/app");
/// assert_eq!(normalize_base(Some("#")), "#");
/// ```
pub fn normalize_base(base: Option<&str>) -> String {
	let base = match base {
		Some(base) if !base.is_empty() => base,
		_ => "/",
	};
	let mut base = if base.starts_with('/') || base.starts_with('#') {
		base.to_string()
	} else {
		format!("/{base}")
	};
	if base.ends_with('/') {
		base.pop();
	}
	base
}

/// Builds an href from a normalized base and a location.
///
/// Anything in front of a `#` in the base is dropped so hash-style bases
/// render relative hrefs.
///
/// # Examples
///
/// ```
/// use wayfinder_history::create_href;
///
/// assert_eq!(create_href("/app", "/users"), "/app/users");
/// assert_eq!(create_href("/app/#", "/users"), "#/users");
/// ```
pub fn create_href(base: &str, location: &str) -> String {
	let base = match base.find('#') {
		Some(index) if index > 0 => &base[index..],
		_ => base,
	};
	format!("{base}{location}")
}
