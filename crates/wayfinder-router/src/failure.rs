//! Expected, non-error navigation outcomes.

use std::fmt;
use std::sync::Arc;

use crate::location::RouteLocation;

/// Why a navigation did not commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationFailureKind {
	/// A guard stopped it, or its redirects went on for too long.
	Aborted,
	/// A newer navigation started before it finished.
	Cancelled,
	/// The target equals the current location.
	Duplicated,
}

/// Detail attached to [`NavigationFailureKind::Aborted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortReason {
	/// A guard returned `false`.
	Guard,
	/// More than `hops` redirects were followed.
	RedirectLimit {
		/// The configured bound.
		hops: usize,
	},
}

/// A navigation that ended without committing and without an error.
#[derive(Debug, Clone)]
pub struct NavigationFailure {
	/// Failure kind.
	pub kind: NavigationFailureKind,
	/// Current location when the navigation started.
	pub from: Arc<RouteLocation>,
	/// Target of the navigation.
	pub to: Arc<RouteLocation>,
	/// Set for aborted navigations.
	pub reason: Option<AbortReason>,
}

impl NavigationFailure {
	pub(crate) fn new(
		kind: NavigationFailureKind,
		from: Arc<RouteLocation>,
		to: Arc<RouteLocation>,
	) -> Self {
		let reason = (kind == NavigationFailureKind::Aborted).then_some(AbortReason::Guard);
		Self {
			kind,
			from,
			to,
			reason,
		}
	}

	pub(crate) fn redirect_limit(
		from: Arc<RouteLocation>,
		to: Arc<RouteLocation>,
		hops: usize,
	) -> Self {
		Self {
			kind: NavigationFailureKind::Aborted,
			from,
			to,
			reason: Some(AbortReason::RedirectLimit { hops }),
		}
	}

	/// `true` when the failure is of `kind`.
	pub fn is(&self, kind: NavigationFailureKind) -> bool {
		self.kind == kind
	}
}

impl fmt::Display for NavigationFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (from, to) = (&self.from.full_path, &self.to.full_path);
		match (self.kind, self.reason) {
			(NavigationFailureKind::Aborted, Some(AbortReason::RedirectLimit { hops })) => write!(
				f,
				"navigation from \"{from}\" to \"{to}\" aborted after {hops} redirects"
			),
			(NavigationFailureKind::Aborted, _) => write!(
				f,
				"navigation from \"{from}\" to \"{to}\" aborted by a navigation guard"
			),
			(NavigationFailureKind::Cancelled, _) => write!(
				f,
				"navigation from \"{from}\" to \"{to}\" cancelled by a newer navigation"
			),
			(NavigationFailureKind::Duplicated, _) => {
				write!(f, "avoided redundant navigation to current location \"{to}\"")
			}
		}
	}
}
