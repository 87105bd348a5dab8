//! Registration lists for guards and observers.

use std::sync::Weak;

/// Ordered list of callbacks addressed by a registration id.
#[derive(Debug)]
pub(crate) struct CallbackList<T> {
	next_id: u64,
	entries: Vec<(u64, T)>,
}

impl<T> Default for CallbackList<T> {
	fn default() -> Self {
		Self {
			next_id: 0,
			entries: Vec::new(),
		}
	}
}

impl<T: Clone> CallbackList<T> {
	pub(crate) fn add(&mut self, callback: T) -> u64 {
		let id = self.next_id;
		self.next_id += 1;
		self.entries.push((id, callback));
		id
	}

	pub(crate) fn remove(&mut self, id: u64) {
		self.entries.retain(|(entry, _)| *entry != id);
	}

	/// Snapshot in registration order, so callbacks run without the lock held.
	pub(crate) fn list(&self) -> Vec<T> {
		self.entries.iter().map(|(_, c)| c.clone()).collect()
	}
}

/// Removes a registered route, guard or observer when
/// [`unregister`](Self::unregister) is called. Dropping the handle keeps the
/// registration.
#[must_use = "dropping the handle keeps the registration; call `unregister` to remove it"]
pub struct Unregister {
	remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl std::fmt::Debug for Unregister {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Unregister")
			.field("pending", &self.remove.is_some())
			.finish()
	}
}

impl Unregister {
	pub(crate) fn new<S, F>(owner: Weak<S>, remove: F) -> Self
	where
		S: Send + Sync + 'static,
		F: FnOnce(&S) + Send + Sync + 'static,
	{
		Self {
			remove: Some(Box::new(move || {
				if let Some(owner) = owner.upgrade() {
					remove(&owner);
				}
			})),
		}
	}

	/// Removes the registration. Does nothing once the router is gone.
	pub fn unregister(mut self) {
		if let Some(remove) = self.remove.take() {
			remove();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex;
	use rstest::rstest;
	use std::sync::Arc;

	#[rstest]
	fn test_list_keeps_registration_order() {
		let mut list = CallbackList::default();
		let a = list.add("a");
		list.add("b");
		list.add("c");
		list.remove(a);
		assert_eq!(list.list(), vec!["b", "c"]);
		assert_eq!(list.list().len(), 2);
	}

	#[rstest]
	fn test_unregister_removes_entry() {
		let owner = Arc::new(Mutex::new(CallbackList::default()));
		let id = owner.lock().add(1u8);
		let handle = Unregister::new(Arc::downgrade(&owner), move |list: &Mutex<CallbackList<u8>>| {
			list.lock().remove(id)
		});
		handle.unregister();
		assert!(owner.lock().list().is_empty());
	}
}
