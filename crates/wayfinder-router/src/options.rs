//! Router configuration.
//!
//! Options load from TOML the way the rest of the workspace loads
//! configuration:
//!
//! ```toml
//! strict = false
//! sensitive = false
//! end = true
//! max_redirects = 16
//! ```

use serde::{Deserialize, Serialize};
use wayfinder_urls::PathParserOptions;

use crate::error::OptionsError;

/// Default bound on consecutive redirects of one navigation.
pub const DEFAULT_MAX_REDIRECTS: usize = 16;

/// Router-wide options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
	/// Reject a trailing slash that a pattern does not declare.
	pub strict: bool,
	/// Match paths case-sensitively.
	pub sensitive: bool,
	/// Require patterns to match the whole path.
	pub end: bool,
	/// Bound on consecutive redirects, from records and guards alike.
	pub max_redirects: usize,
}

impl Default for RouterOptions {
	fn default() -> Self {
		Self {
			strict: false,
			sensitive: false,
			end: true,
			max_redirects: DEFAULT_MAX_REDIRECTS,
		}
	}
}

impl RouterOptions {
	/// Returns a builder starting from the defaults.
	pub fn builder() -> RouterOptionsBuilder {
		RouterOptionsBuilder::default()
	}

	/// Parses options from a TOML document. Missing keys keep their default.
	///
	/// # Errors
	///
	/// Returns [`OptionsError::Parse`] for malformed documents and
	/// [`OptionsError::Invalid`] when `max_redirects` is zero.
	pub fn from_toml_str(content: &str) -> Result<Self, OptionsError> {
		let options: Self = toml::from_str(content).map_err(|e| OptionsError::Parse {
			message: e.to_string(),
		})?;
		options.validate()?;
		Ok(options)
	}

	fn validate(&self) -> Result<(), OptionsError> {
		if self.max_redirects == 0 {
			return Err(OptionsError::Invalid(
				"max_redirects must be at least 1".to_string(),
			));
		}
		Ok(())
	}

	/// Compile flags for a record, applying its overrides.
	pub fn parser_options(
		&self,
		strict: Option<bool>,
		sensitive: Option<bool>,
		end: Option<bool>,
	) -> PathParserOptions {
		PathParserOptions {
			strict: strict.unwrap_or(self.strict),
			sensitive: sensitive.unwrap_or(self.sensitive),
			end: end.unwrap_or(self.end),
		}
	}
}

/// Builder for [`RouterOptions`].
#[derive(Debug, Default)]
pub struct RouterOptionsBuilder {
	strict: Option<bool>,
	sensitive: Option<bool>,
	end: Option<bool>,
	max_redirects: Option<usize>,
}

impl RouterOptionsBuilder {
	/// Set trailing slash strictness
	pub fn strict(mut self, strict: bool) -> Self {
		self.strict = Some(strict);
		self
	}

	/// Set case sensitivity
	pub fn sensitive(mut self, sensitive: bool) -> Self {
		self.sensitive = Some(sensitive);
		self
	}

	/// Set end anchoring
	pub fn end(mut self, end: bool) -> Self {
		self.end = Some(end);
		self
	}

	/// Set the redirect bound
	pub fn max_redirects(mut self, max: usize) -> Self {
		self.max_redirects = Some(max);
		self
	}

	/// Build the options
	///
	/// # Errors
	///
	/// Returns [`OptionsError::Invalid`] if `max_redirects` is zero.
	pub fn build(self) -> Result<RouterOptions, OptionsError> {
		let defaults = RouterOptions::default();
		let options = RouterOptions {
			strict: self.strict.unwrap_or(defaults.strict),
			sensitive: self.sensitive.unwrap_or(defaults.sensitive),
			end: self.end.unwrap_or(defaults.end),
			max_redirects: self.max_redirects.unwrap_or(defaults.max_redirects),
		};
		options.validate()?;
		Ok(options)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let options = RouterOptions::default();
		assert!(!options.strict);
		assert!(!options.sensitive);
		assert!(options.end);
		assert_eq!(options.max_redirects, DEFAULT_MAX_REDIRECTS);
	}

	#[rstest]
	fn test_from_toml_partial() {
		let options = RouterOptions::from_toml_str("sensitive = true\nmax_redirects = 4\n").unwrap();
		assert!(options.sensitive);
		assert!(!options.strict);
		assert_eq!(options.max_redirects, 4);
	}

	#[rstest]
	#[case("strict = \"yes\"")]
	#[case("max_redirects = -1")]
	fn test_from_toml_parse_errors(#[case] content: &str) {
		assert!(matches!(
			RouterOptions::from_toml_str(content),
			Err(OptionsError::Parse { .. })
		));
	}

	#[rstest]
	fn test_zero_redirects_rejected() {
		assert!(matches!(
			RouterOptions::from_toml_str("max_redirects = 0"),
			Err(OptionsError::Invalid(_))
		));
		assert!(RouterOptions::builder().max_redirects(0).build().is_err());
	}

	#[rstest]
	fn test_builder_and_overrides() {
		let options = RouterOptions::builder().strict(true).build().unwrap();
		let flags = options.parser_options(None, Some(true), Some(false));
		assert!(flags.strict);
		assert!(flags.sensitive);
		assert!(!flags.end);
	}
}
