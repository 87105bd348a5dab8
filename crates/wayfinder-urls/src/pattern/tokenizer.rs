//! Splits a path pattern into segments of static and param tokens.

use crate::error::{PatternError, PatternResult};

/// A param token such as `:id`, `:id(\d+)`, `:ids+`, `:id?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamToken {
	/// Param name.
	pub name: String,
	/// Custom expression from `(...)`, if any.
	pub regexp: Option<String>,
	/// `+` or `*`.
	pub repeatable: bool,
	/// `?` or `*`.
	pub optional: bool,
}

/// One token of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// Literal text.
	Static(String),
	/// Dynamic param.
	Param(ParamToken),
}

/// Tokens of one `/`-separated segment. An empty segment stands for a
/// trailing slash.
pub type Segment = Vec<Token>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Static,
	Param,
	ParamRegExp,
	ParamRegExpEnd,
	EscapeNext,
}

fn is_param_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

fn is_modifier(c: char) -> bool {
	matches!(c, '*' | '?' | '+')
}

struct Tokenizer {
	state: State,
	segments: Vec<Segment>,
	segment: Option<Segment>,
	buffer: String,
	custom_re: String,
	current: char,
}

impl Tokenizer {
	fn finalize_segment(&mut self) {
		if let Some(segment) = self.segment.take() {
			self.segments.push(segment);
		}
		self.segment = Some(Vec::new());
	}

	fn consume_buffer(&mut self, path: &str) -> PatternResult<()> {
		if self.buffer.is_empty() {
			return Ok(());
		}
		let buffer = std::mem::take(&mut self.buffer);
		let segment = self.segment.get_or_insert_with(Vec::new);
		match self.state {
			State::Static => segment.push(Token::Static(buffer)),
			State::Param | State::ParamRegExp | State::ParamRegExpEnd => {
				let repeatable = matches!(self.current, '*' | '+');
				if repeatable && !segment.is_empty() {
					return Err(PatternError::RepeatableNotAlone(buffer));
				}
				let regexp = (!self.custom_re.is_empty()).then(|| self.custom_re.clone());
				segment.push(Token::Param(ParamToken {
					name: buffer,
					regexp,
					repeatable,
					optional: matches!(self.current, '*' | '?'),
				}));
			}
			State::EscapeNext => return Err(PatternError::DanglingEscape(path.to_string())),
		}
		Ok(())
	}
}

/// Tokenizes a path pattern.
///
/// `""` yields a single empty segment and `"/"` a single segment with an
/// empty static token. A `\` escapes the next character outside of custom
/// expressions.
///
/// # Errors
///
/// Fails when the path does not start with `/`, a repeatable param is not
/// alone in its segment, a custom expression is not closed or the pattern
/// ends with a lone `\`.
pub fn tokenize_path(path: &str) -> PatternResult<Vec<Segment>> {
	if path.is_empty() {
		return Ok(vec![Vec::new()]);
	}
	if path == "/" {
		return Ok(vec![vec![Token::Static(String::new())]]);
	}
	if !path.starts_with('/') {
		return Err(PatternError::NotAbsolute(path.to_string()));
	}

	let chars: Vec<char> = path.chars().collect();
	let mut tokenizer = Tokenizer {
		state: State::Static,
		segments: Vec::new(),
		segment: None,
		buffer: String::new(),
		custom_re: String::new(),
		current: '\0',
	};
	let mut previous_state = State::Static;
	let mut i = 0;

	while i < chars.len() {
		let c = chars[i];
		tokenizer.current = c;
		i += 1;

		if c == '\\' && tokenizer.state != State::ParamRegExp {
			previous_state = tokenizer.state;
			tokenizer.state = State::EscapeNext;
			continue;
		}

		match tokenizer.state {
			State::Static => {
				if c == '/' {
					tokenizer.consume_buffer(path)?;
					tokenizer.finalize_segment();
				} else if c == ':' {
					tokenizer.consume_buffer(path)?;
					tokenizer.state = State::Param;
				} else {
					tokenizer.buffer.push(c);
				}
			}
			State::EscapeNext => {
				tokenizer.buffer.push(c);
				tokenizer.state = previous_state;
			}
			State::Param => {
				if c == '(' {
					tokenizer.state = State::ParamRegExp;
				} else if is_param_char(c) {
					tokenizer.buffer.push(c);
				} else {
					tokenizer.consume_buffer(path)?;
					tokenizer.state = State::Static;
					// re-read anything that is not a modifier
					if !is_modifier(c) {
						i -= 1;
					}
				}
			}
			State::ParamRegExp => {
				if c == ')' {
					if tokenizer.custom_re.ends_with('\\') {
						tokenizer.custom_re.pop();
						tokenizer.custom_re.push(c);
					} else {
						tokenizer.state = State::ParamRegExpEnd;
					}
				} else {
					tokenizer.custom_re.push(c);
				}
			}
			State::ParamRegExpEnd => {
				tokenizer.consume_buffer(path)?;
				tokenizer.state = State::Static;
				if !is_modifier(c) {
					i -= 1;
				}
				tokenizer.custom_re.clear();
			}
		}
	}

	if tokenizer.state == State::ParamRegExp {
		return Err(PatternError::UnfinishedRegex(tokenizer.buffer));
	}
	if tokenizer.state == State::EscapeNext {
		return Err(PatternError::DanglingEscape(path.to_string()));
	}
	tokenizer.consume_buffer(path)?;
	tokenizer.finalize_segment();

	Ok(tokenizer.segments)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn param(name: &str, regexp: Option<&str>, repeatable: bool, optional: bool) -> Token {
		Token::Param(ParamToken {
			name: name.to_string(),
			regexp: regexp.map(str::to_string),
			repeatable,
			optional,
		})
	}

	fn text(value: &str) -> Token {
		Token::Static(value.to_string())
	}

	#[rstest]
	fn test_root_and_empty() {
		assert_eq!(tokenize_path("").unwrap(), vec![Vec::<Token>::new()]);
		assert_eq!(tokenize_path("/").unwrap(), vec![vec![text("")]]);
	}

	#[rstest]
	fn test_static_segments_and_trailing_slash() {
		assert_eq!(
			tokenize_path("/users/").unwrap(),
			vec![vec![text("users")], vec![]]
		);
	}

	#[rstest]
	#[case("/:id", param("id", None, false, false))]
	#[case("/:id?", param("id", None, false, true))]
	#[case("/:id+", param("id", None, true, false))]
	#[case("/:id*", param("id", None, true, true))]
	#[case("/:id(\\d+)", param("id", Some("\\d+"), false, false))]
	#[case("/:id(\\d+)*", param("id", Some("\\d+"), true, true))]
	#[case("/:p(.*)", param("p", Some(".*"), false, false))]
	fn test_param_modifiers(#[case] path: &str, #[case] expected: Token) {
		assert_eq!(tokenize_path(path).unwrap(), vec![vec![expected]]);
	}

	#[rstest]
	fn test_mixed_segment() {
		assert_eq!(
			tokenize_path("/file-:name.:ext").unwrap(),
			vec![vec![
				text("file-"),
				param("name", None, false, false),
				text("."),
				param("ext", None, false, false),
			]]
		);
	}

	#[rstest]
	fn test_escaped_characters() {
		assert_eq!(
			tokenize_path("/\\:not-a-param").unwrap(),
			vec![vec![text(":not-a-param")]]
		);
		assert_eq!(
			tokenize_path("/:id(a\\)b)").unwrap(),
			vec![vec![param("id", Some("a)b"), false, false)]]
		);
	}

	#[rstest]
	#[case("users", PatternError::NotAbsolute("users".to_string()))]
	#[case("/a-:ids+", PatternError::RepeatableNotAlone("ids".to_string()))]
	#[case("/:id(\\d+", PatternError::UnfinishedRegex("id".to_string()))]
	#[case("/a\\", PatternError::DanglingEscape("/a\\".to_string()))]
	#[case("/\\", PatternError::DanglingEscape("/\\".to_string()))]
	#[case("/:id\\", PatternError::DanglingEscape("/:id\\".to_string()))]
	fn test_errors(#[case] path: &str, #[case] expected: PatternError) {
		assert_eq!(tokenize_path(path).unwrap_err(), expected);
	}
}
