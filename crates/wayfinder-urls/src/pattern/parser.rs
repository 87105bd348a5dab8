//! Compiles tokenized patterns into a regex, a key list and a score.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::score::{self, Score};
use super::tokenizer::{Segment, Token, tokenize_path};
use super::{MAX_PATH_SEGMENTS, MAX_PATTERN_LENGTH, MAX_REGEX_SIZE};
use crate::error::{PatternError, PatternResult};
use crate::params::{ParamValue, PathParams};

/// Expression used by params without a custom one.
pub const BASE_PARAM_PATTERN: &str = "[^/]+?";

/// Compile-time matching flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathParserOptions {
	/// Reject a trailing slash that the pattern does not declare.
	pub strict: bool,
	/// Match case-sensitively.
	pub sensitive: bool,
	/// Require the whole path to match.
	pub end: bool,
}

impl Default for PathParserOptions {
	fn default() -> Self {
		Self {
			strict: false,
			sensitive: false,
			end: true,
		}
	}
}

/// Descriptor of a param captured by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
	/// Param name.
	pub name: String,
	/// `+` or `*`.
	pub repeatable: bool,
	/// `?` or `*`.
	pub optional: bool,
}

/// A compiled path pattern.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::pattern::{PathParser, PathParserOptions};
///
/// let parser = PathParser::new("/users/:id(\\d+)/:tab?", PathParserOptions::default()).unwrap();
/// let params = parser.parse("/users/42").unwrap();
/// assert_eq!(params["id"].as_str(), Some("42"));
/// assert!(!params.contains_key("tab"));
/// assert!(parser.parse("/users/abc").is_none());
/// assert_eq!(parser.stringify(&params).unwrap(), "/users/42");
/// ```
#[derive(Debug, Clone)]
pub struct PathParser {
	pattern: String,
	re: Regex,
	score: Score,
	keys: Vec<ParamKey>,
	segments: Vec<Segment>,
	options: PathParserOptions,
}

fn group_name(index: usize) -> String {
	format!("p{index}")
}

impl PathParser {
	/// Compiles `pattern`.
	///
	/// # Errors
	///
	/// Returns a [`PatternError`] when the pattern is too long, has too many
	/// segments, cannot be tokenized, or carries an invalid custom expression.
	pub fn new(pattern: &str, options: PathParserOptions) -> PatternResult<Self> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(PatternError::TooLong {
				length: pattern.len(),
				max: MAX_PATTERN_LENGTH,
			});
		}
		let segment_count = pattern.split('/').count();
		if segment_count > MAX_PATH_SEGMENTS {
			return Err(PatternError::TooManySegments {
				count: segment_count,
				max: MAX_PATH_SEGMENTS,
			});
		}

		let segments = tokenize_path(pattern)?;
		let mut source = String::from("^");
		let mut score: Score = Vec::with_capacity(segments.len());
		let mut keys = Vec::new();

		for segment in &segments {
			let mut segment_scores = if segment.is_empty() {
				vec![score::ROOT]
			} else {
				Vec::with_capacity(segment.len())
			};
			if options.strict && segment.is_empty() {
				source.push('/');
			}

			for (index, token) in segment.iter().enumerate() {
				let mut weight = score::SEGMENT;
				if options.sensitive {
					weight += score::BONUS_CASE_SENSITIVE;
				}
				match token {
					Token::Static(text) => {
						if index == 0 {
							source.push('/');
						}
						source.push_str(&regex::escape(text));
						weight += score::STATIC;
					}
					Token::Param(param) => {
						let re = param.regexp.as_deref().unwrap_or(BASE_PARAM_PATTERN);
						if param.regexp.is_some() {
							weight += score::BONUS_CUSTOM_REGEXP;
							Regex::new(&format!("({re})")).map_err(|e| {
								PatternError::InvalidRegex {
									param: param.name.clone(),
									regex: re.to_string(),
									reason: e.to_string(),
								}
							})?;
						}

						let group = group_name(keys.len());
						let mut sub = if param.repeatable {
							format!("(?P<{group}>(?:{re})(?:/(?:{re}))*)")
						} else {
							format!("(?P<{group}>{re})")
						};
						if index == 0 {
							sub = if param.optional && segment.len() < 2 {
								format!("(?:/{sub})")
							} else {
								format!("/{sub}")
							};
						}
						if param.optional {
							sub.push('?');
						}
						source.push_str(&sub);

						weight += score::DYNAMIC;
						if param.optional {
							weight += score::BONUS_OPTIONAL;
						}
						if param.repeatable {
							weight += score::BONUS_REPEATABLE;
						}
						if re == ".*" {
							weight += score::BONUS_WILDCARD;
						}
						keys.push(ParamKey {
							name: param.name.clone(),
							repeatable: param.repeatable,
							optional: param.optional,
						});
					}
				}
				segment_scores.push(weight);
			}
			score.push(segment_scores);
		}

		if options.strict && options.end {
			if let Some(last) = score.last_mut().and_then(|segment| segment.last_mut()) {
				*last += score::BONUS_STRICT;
			}
		}

		if !options.strict {
			source.push_str("/?");
		}
		if options.end {
			source.push('$');
		} else if options.strict && !source.ends_with('/') {
			source.push_str("(?:/|$)");
		}

		let re = RegexBuilder::new(&source)
			.case_insensitive(!options.sensitive)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| PatternError::Compile {
				pattern: pattern.to_string(),
				reason: e.to_string(),
			})?;

		Ok(Self {
			pattern: pattern.to_string(),
			re,
			score,
			keys,
			segments,
			options,
		})
	}

	/// Matches `path` and extracts its params.
	///
	/// Optional params that did not match are left out of the result and
	/// repeatable values are split on `/`. Returns `None` when the path does
	/// not match.
	pub fn parse(&self, path: &str) -> Option<PathParams> {
		let captures = self.re.captures(path)?;
		let mut params = PathParams::with_capacity(self.keys.len());
		for (index, key) in self.keys.iter().enumerate() {
			let value = captures
				.name(&group_name(index))
				.map(|m| m.as_str())
				.unwrap_or_default();
			if value.is_empty() {
				if !key.optional {
					params.insert(key.name.clone(), ParamValue::Single(String::new()));
				}
				continue;
			}
			let value = if key.repeatable {
				ParamValue::List(value.split('/').map(str::to_string).collect())
			} else {
				ParamValue::Single(value.to_string())
			};
			params.insert(key.name.clone(), value);
		}
		Some(params)
	}

	/// Builds a path from `params`. Values are inserted as given, so they
	/// should already be encoded.
	///
	/// # Errors
	///
	/// Returns [`PatternError::MissingParam`] when a required param is absent
	/// or empty, and [`PatternError::NotRepeatable`] when a list is given to a
	/// param without `+`/`*`.
	pub fn stringify(&self, params: &PathParams) -> PatternResult<String> {
		let mut path = String::new();
		let mut avoid_duplicated_slash = false;

		for segment in &self.segments {
			if !avoid_duplicated_slash || !path.ends_with('/') {
				path.push('/');
			}
			avoid_duplicated_slash = false;

			for token in segment {
				match token {
					Token::Static(text) => path.push_str(text),
					Token::Param(param) => {
						let text = match params.get(&param.name) {
							None => String::new(),
							Some(ParamValue::Single(value)) => value.clone(),
							Some(ParamValue::List(values)) => {
								if !param.repeatable {
									return Err(PatternError::NotRepeatable(param.name.clone()));
								}
								values.join("/")
							}
						};
						if text.is_empty() {
							if !param.optional {
								return Err(PatternError::MissingParam(param.name.clone()));
							}
							if segment.len() < 2 {
								if path.ends_with('/') {
									path.pop();
								} else {
									avoid_duplicated_slash = true;
								}
							}
						}
						path.push_str(&text);
					}
				}
			}
		}

		if path.is_empty() {
			path.push('/');
		}
		Ok(path)
	}

	/// The source pattern.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// The compiled expression.
	pub fn re(&self) -> &Regex {
		&self.re
	}

	/// Specificity score.
	pub fn score(&self) -> &Score {
		&self.score
	}

	/// Param descriptors, in pattern order.
	pub fn keys(&self) -> &[ParamKey] {
		&self.keys
	}

	/// Flags the pattern was compiled with.
	pub fn options(&self) -> PathParserOptions {
		self.options
	}

	/// Ranks `self` against `other`. [`Ordering::Less`](std::cmp::Ordering::Less)
	/// means `self` is tried first.
	pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
		score::compare_path_parser_score(&self.score, &other.score)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn parser(pattern: &str) -> PathParser {
		PathParser::new(pattern, PathParserOptions::default()).unwrap()
	}

	fn params(entries: &[(&str, ParamValue)]) -> PathParams {
		entries
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect()
	}

	#[rstest]
	#[case("/", "^//?$")]
	#[case("", "^/?$")]
	#[case("/a", "^/a/?$")]
	#[case("/:id", "^/(?P<p0>[^/]+?)/?$")]
	#[case("/:id?", "^(?:/(?P<p0>[^/]+?))?/?$")]
	#[case("/:ids+", "^/(?P<p0>(?:[^/]+?)(?:/(?:[^/]+?))*)/?$")]
	fn test_compiled_source(#[case] pattern: &str, #[case] expected: &str) {
		assert_eq!(parser(pattern).re().as_str(), expected);
	}

	#[rstest]
	fn test_strict_and_end_flags() {
		let strict = PathParser::new(
			"/a/",
			PathParserOptions {
				strict: true,
				..Default::default()
			},
		)
		.unwrap();
		assert!(strict.parse("/a/").is_some());
		assert!(strict.parse("/a").is_none());

		let loose = parser("/a/");
		assert!(loose.parse("/a").is_some());

		let prefix = PathParser::new(
			"/a",
			PathParserOptions {
				end: false,
				..Default::default()
			},
		)
		.unwrap();
		assert!(prefix.parse("/a/b").is_some());
	}

	#[rstest]
	fn test_sensitive_flag() {
		assert!(parser("/About").parse("/about").is_some());
		let sensitive = PathParser::new(
			"/About",
			PathParserOptions {
				sensitive: true,
				..Default::default()
			},
		)
		.unwrap();
		assert!(sensitive.parse("/about").is_none());
		assert!(sensitive.parse("/About").is_some());
	}

	#[rstest]
	fn test_parse_repeatable_and_optional() {
		let p = parser("/files/:path*");
		assert_eq!(
			p.parse("/files/a/b/c").unwrap(),
			params(&[("path", vec!["a", "b", "c"].into())])
		);
		assert_eq!(p.parse("/files").unwrap(), PathParams::new());

		let plus = parser("/tags/:tags+");
		assert!(plus.parse("/tags").is_none());
	}

	#[rstest]
	fn test_parse_multiple_params_in_segment() {
		let p = parser("/:name.:ext");
		assert_eq!(
			p.parse("/photo.jpg").unwrap(),
			params(&[("name", "photo".into()), ("ext", "jpg".into())])
		);
	}

	#[rstest]
	fn test_custom_regex_with_inner_groups() {
		let p = parser("/:lang(en|fr)/:page");
		assert_eq!(
			p.parse("/fr/home").unwrap(),
			params(&[("lang", "fr".into()), ("page", "home".into())])
		);
		assert!(p.parse("/de/home").is_none());
	}

	#[rstest]
	#[case("/users/:id", &[("id", ParamValue::from("7"))], "/users/7")]
	#[case("/users/:id?", &[], "/users")]
	#[case("/:a?/:b", &[("b", ParamValue::from("x"))], "/x")]
	#[case("/files/:p*", &[("p", ParamValue::from(vec!["a", "b"]))], "/files/a/b")]
	#[case("/", &[], "/")]
	#[case("/a/", &[], "/a/")]
	fn test_stringify(
		#[case] pattern: &str,
		#[case] entries: &[(&str, ParamValue)],
		#[case] expected: &str,
	) {
		assert_eq!(parser(pattern).stringify(&params(entries)).unwrap(), expected);
	}

	#[rstest]
	fn test_stringify_errors() {
		assert_eq!(
			parser("/users/:id").stringify(&PathParams::new()).unwrap_err(),
			PatternError::MissingParam("id".to_string())
		);
		assert_eq!(
			parser("/users/:id")
				.stringify(&params(&[("id", vec!["1", "2"].into())]))
				.unwrap_err(),
			PatternError::NotRepeatable("id".to_string())
		);
	}

	#[rstest]
	fn test_limits() {
		let long = format!("/{}", "a".repeat(MAX_PATTERN_LENGTH));
		assert!(matches!(
			PathParser::new(&long, PathParserOptions::default()),
			Err(PatternError::TooLong { .. })
		));
		let deep = "/a".repeat(MAX_PATH_SEGMENTS + 1);
		assert!(matches!(
			PathParser::new(&deep, PathParserOptions::default()),
			Err(PatternError::TooManySegments { .. })
		));
	}

	#[rstest]
	fn test_invalid_custom_regex() {
		assert!(matches!(
			PathParser::new("/:id([)", PathParserOptions::default()),
			Err(PatternError::InvalidRegex { .. })
		));
	}

	#[rstest]
	fn test_score_values() {
		assert_eq!(parser("/").score(), &vec![vec![8000]]);
		assert_eq!(parser("/:id").score(), &vec![vec![6000]]);
		assert_eq!(parser("/:id(\\d+)").score(), &vec![vec![7000]]);
		assert_eq!(parser("/:p(.*)").score(), &vec![vec![2000]]);
		assert_eq!(parser("/:id?").score(), &vec![vec![5200]]);
		assert_eq!(parser("/a/").score(), &vec![vec![8000], vec![9000]]);
	}
}
