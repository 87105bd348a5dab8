//! Error types for path patterns.

use thiserror::Error;

/// Errors raised while compiling a path pattern or building a path from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
	/// Non-empty patterns must be absolute.
	#[error("invalid path \"{0}\": route paths must start with \"/\"")]
	NotAbsolute(String),

	/// A `+`/`*` param shares its segment with other tokens.
	#[error("a repeatable param ({0}) must be alone in its segment, e.g. \"/:ids+\"")]
	RepeatableNotAlone(String),

	/// A `(` opened a custom regex that is never closed.
	#[error("unfinished custom regex for param \"{0}\"")]
	UnfinishedRegex(String),

	/// The pattern ends with a `\` that escapes nothing.
	#[error("invalid path \"{0}\": trailing \"\\\" escapes nothing")]
	DanglingEscape(String),

	/// A custom regex does not compile.
	#[error("invalid custom regex for param \"{param}\" ({regex}): {reason}")]
	InvalidRegex {
		/// Param carrying the regex.
		param: String,
		/// The offending expression.
		regex: String,
		/// Compiler message.
		reason: String,
	},

	/// The whole pattern failed to compile.
	#[error("failed to compile pattern \"{pattern}\": {reason}")]
	Compile {
		/// The route path.
		pattern: String,
		/// Compiler message.
		reason: String,
	},

	/// The pattern is longer than [`MAX_PATTERN_LENGTH`](crate::pattern::MAX_PATTERN_LENGTH).
	#[error("pattern length {length} exceeds maximum allowed length of {max} bytes")]
	TooLong {
		/// Actual length.
		length: usize,
		/// Allowed length.
		max: usize,
	},

	/// The pattern has more segments than [`MAX_PATH_SEGMENTS`](crate::pattern::MAX_PATH_SEGMENTS).
	#[error("pattern has {count} path segments, exceeding maximum of {max}")]
	TooManySegments {
		/// Actual segment count.
		count: usize,
		/// Allowed segment count.
		max: usize,
	},

	/// Building a path without a value for a required param.
	#[error("missing required param \"{0}\"")]
	MissingParam(String),

	/// Building a path with a list for a param without `+`/`*`.
	#[error("provided param \"{0}\" is a list but it is not repeatable (* or + modifiers)")]
	NotRepeatable(String),
}

/// Result alias for pattern operations.
pub type PatternResult<T> = Result<T, PatternError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_pattern_error_display() {
		assert_eq!(
			PatternError::MissingParam("id".to_string()).to_string(),
			"missing required param \"id\""
		);
		let err = PatternError::TooLong {
			length: 2000,
			max: 1024,
		};
		assert!(err.to_string().contains("exceeds maximum allowed length"));
	}
}
