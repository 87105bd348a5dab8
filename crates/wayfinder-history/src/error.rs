//! Error types for history backends.

use thiserror::Error;

/// Errors reported by a [`RouterHistory`](crate::RouterHistory) backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
	/// The backend was destroyed and no longer accepts entries.
	#[error("history backend has been destroyed")]
	Destroyed,

	/// The platform refused the change.
	#[error("history backend rejected the navigation to \"{location}\": {reason}")]
	Rejected {
		/// Location that was being written.
		location: String,
		/// Backend message.
		reason: String,
	},
}

/// Result alias for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;
