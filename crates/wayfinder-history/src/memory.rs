//! In-memory history backend for hosts without a platform history.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::error::HistoryResult;
use crate::history::{
	HistoryLocation, HistoryState, ListenerId, NavigationCallback, NavigationInformation,
	RouterHistory, normalize_base,
};

/// Location of the single entry a fresh backend starts with.
pub const START: &str = "";

#[derive(Debug)]
struct Entries {
	queue: Vec<(HistoryLocation, HistoryState)>,
	position: usize,
}

impl Entries {
	fn new() -> Self {
		Self {
			queue: vec![(START.to_string(), HistoryState::new())],
			position: 0,
		}
	}

	fn current(&self) -> &(HistoryLocation, HistoryState) {
		&self.queue[self.position]
	}

	fn set_location(&mut self, location: &str, state: HistoryState) {
		self.position += 1;
		self.queue.truncate(self.position);
		self.queue.push((location.to_string(), state));
	}
}

/// History kept in a vector of entries and a cursor.
///
/// Pushing and replacing drop every entry after the cursor, replacing also
/// swaps the entry under it. `go` clamps the cursor to the queue. Listeners are
/// only notified by `go`.
///
/// # Examples
///
/// ```
/// use wayfinder_history::{MemoryHistory, RouterHistory};
///
/// # tokio_test::block_on(async {
/// let history = MemoryHistory::new(None);
/// history.push("/a", None).await.unwrap();
/// history.push("/b", None).await.unwrap();
/// history.go(-1, false);
/// assert_eq!(history.location(), "/a");
/// # });
/// ```
pub struct MemoryHistory {
	base: String,
	entries: Mutex<Entries>,
	listeners: RwLock<Vec<(ListenerId, NavigationCallback)>>,
	next_listener: AtomicU64,
}

impl std::fmt::Debug for MemoryHistory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let entries = self.entries.lock();
		f.debug_struct("MemoryHistory")
			.field("base", &self.base)
			.field("position", &entries.position)
			.field("length", &entries.queue.len())
			.field("listeners", &self.listeners.read().len())
			.finish()
	}
}

impl MemoryHistory {
	/// Creates a backend holding a single empty entry.
	pub fn new(base: Option<&str>) -> Self {
		Self {
			base: normalize_base(base),
			entries: Mutex::new(Entries::new()),
			listeners: RwLock::new(Vec::new()),
			next_listener: AtomicU64::new(0),
		}
	}

	/// Cursor into the entry queue.
	pub fn position(&self) -> usize {
		self.entries.lock().position
	}

	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.entries.lock().queue.len()
	}

	/// Always `false`: a backend holds at least one entry.
	pub fn is_empty(&self) -> bool {
		false
	}

	fn trigger_listeners(&self, to: &str, from: &str, info: NavigationInformation) {
		// Callbacks may call back into the backend.
		let listeners: Vec<NavigationCallback> = self
			.listeners
			.read()
			.iter()
			.map(|(_, callback)| callback.clone())
			.collect();
		for callback in listeners {
			callback(to, from, info);
		}
	}
}

impl Default for MemoryHistory {
	fn default() -> Self {
		Self::new(None)
	}
}

#[async_trait]
impl RouterHistory for MemoryHistory {
	fn base(&self) -> &str {
		&self.base
	}

	fn location(&self) -> HistoryLocation {
		self.entries.lock().current().0.clone()
	}

	fn state(&self) -> HistoryState {
		self.entries.lock().current().1.clone()
	}

	async fn push(&self, to: &str, state: Option<HistoryState>) -> HistoryResult<()> {
		let mut entries = self.entries.lock();
		entries.set_location(to, state.unwrap_or_default());
		tracing::trace!(to, position = entries.position, "memory history push");
		Ok(())
	}

	async fn replace(&self, to: &str, state: Option<HistoryState>) -> HistoryResult<()> {
		let mut entries = self.entries.lock();
		let position = entries.position;
		entries.queue.truncate(position);
		entries.queue.push((to.to_string(), state.unwrap_or_default()));
		tracing::trace!(to, position = entries.position, "memory history replace");
		Ok(())
	}

	fn go(&self, delta: i64, trigger_listeners: bool) {
		let (from, to) = {
			let mut entries = self.entries.lock();
			let from = entries.current().0.clone();
			let last = entries.queue.len() as i64 - 1;
			let target = (entries.position as i64 + delta).clamp(0, last);
			entries.position = target as usize;
			(from, entries.current().0.clone())
		};
		tracing::trace!(delta, from, to, "memory history go");
		if trigger_listeners {
			self.trigger_listeners(&to, &from, NavigationInformation::pop(delta));
		}
	}

	fn listen(&self, callback: NavigationCallback) -> ListenerId {
		let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
		self.listeners.write().push((id, callback));
		id
	}

	fn unlisten(&self, id: ListenerId) {
		self.listeners.write().retain(|(listener, _)| *listener != id);
	}

	fn destroy(&self) {
		self.listeners.write().clear();
		*self.entries.lock() = Entries::new();
	}
}
