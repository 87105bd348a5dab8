//! Error types for matching and navigation.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use wayfinder_history::HistoryError;
use wayfinder_urls::PatternError;

/// Configuration and resolution errors raised by the route matcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatcherError {
	/// The name is already registered to another record.
	#[error("a route named \"{0}\" is already registered")]
	DuplicateName(String),

	/// A record path does not compile.
	#[error("invalid route path \"{path}\": {source}")]
	Pattern {
		/// Full path of the record.
		path: String,
		/// Compiler error.
		#[source]
		source: PatternError,
	},

	/// An alias does not declare the params of the record it aliases.
	#[error("alias \"{alias}\" must have the exact same params as \"{original}\"")]
	AliasParamsMismatch {
		/// Alias path.
		alias: String,
		/// Aliased record path.
		original: String,
	},

	/// A bare `*` path.
	#[error("catch-all route \"{0}\" must be written with a param and a custom regex, e.g. \"/:path(.*)*\"")]
	LegacyCatchAll(String),

	/// Children were added under a name nobody registered.
	#[error("cannot add a child to unknown route \"{0}\"")]
	UnknownParent(String),

	/// Named resolution of a name nobody registered.
	#[error("no route named \"{0}\"")]
	UnknownName(String),

	/// Relative resolution without a current location that matches a route.
	#[error("cannot resolve a relative location from \"{0}\": it matches no route")]
	UnresolvableCurrent(String),

	/// Building the path of a named or relative location failed.
	#[error("cannot build the path of \"{route}\": {source}")]
	Build {
		/// Route name or path.
		route: String,
		/// Builder error.
		#[source]
		source: PatternError,
	},

	/// A chain of redirect records is longer than the configured bound.
	#[error("redirect from \"{from}\" exceeded the limit of {limit} redirects")]
	RedirectLimit {
		/// First location of the chain.
		from: String,
		/// Configured bound.
		limit: usize,
	},

	/// A redirect target with neither a path nor a name.
	#[error("invalid redirect from \"{0}\": the target needs a path or a name")]
	InvalidRedirect(String),
}

/// Result alias for matcher operations.
pub type MatcherResult<T> = Result<T, MatcherError>;

/// Error raised by a navigation guard or a view resolver.
#[derive(Clone)]
pub struct GuardError {
	message: String,
	source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl GuardError {
	/// Creates an error from a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			source: None,
		}
	}

	/// Wraps an underlying error.
	pub fn from_source<E>(message: impl Into<String>, source: E) -> Self
	where
		E: std::error::Error + Send + Sync + 'static,
	{
		Self {
			message: message.into(),
			source: Some(Arc::new(source)),
		}
	}

	/// The error message.
	pub fn message(&self) -> &str {
		&self.message
	}
}

impl fmt::Debug for GuardError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GuardError")
			.field("message", &self.message)
			.field("has_source", &self.source.is_some())
			.finish()
	}
}

impl fmt::Display for GuardError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message)
	}
}

impl std::error::Error for GuardError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.source
			.as_deref()
			.map(|e| e as &(dyn std::error::Error + 'static))
	}
}

impl From<&str> for GuardError {
	fn from(message: &str) -> Self {
		Self::new(message)
	}
}

impl From<String> for GuardError {
	fn from(message: String) -> Self {
		Self::new(message)
	}
}

/// Errors a navigation rejects with.
///
/// Expected outcomes (aborted, cancelled, duplicated) are not errors, see
/// [`NavigationFailure`](crate::NavigationFailure).
#[derive(Debug, Clone, Error)]
pub enum NavigationError {
	/// A guard raised an error.
	#[error("navigation guard failed: {0}")]
	Guard(#[from] GuardError),

	/// The target could not be resolved.
	#[error(transparent)]
	Matcher(#[from] MatcherError),

	/// The history backend refused the commit.
	#[error(transparent)]
	History(#[from] HistoryError),

	/// The view resolver failed.
	#[error("view resolution failed: {0}")]
	ViewResolution(#[source] GuardError),
}

/// Errors raised while loading [`RouterOptions`](crate::RouterOptions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
	/// The TOML document could not be parsed.
	#[error("failed to parse router options: {message}")]
	Parse {
		/// Parser message.
		message: String,
	},

	/// A value is out of range.
	#[error("invalid router options: {0}")]
	Invalid(String),
}
