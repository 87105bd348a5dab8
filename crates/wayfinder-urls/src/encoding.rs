//! Section-aware percent-encoding.
//!
//! Each section of a URL reserves a different set of delimiters, so each one
//! gets its own encode set. All sets start from the characters a browser's
//! `encodeURI` encodes and then add or remove characters:
//!
//! | Function | Extra encoded | Left as is |
//! |----------|---------------|------------|
//! | [`encode_path`] | `#` `?` | `[` `]` `\|` |
//! | [`encode_param`] | `#` `?` `/` | `[` `]` `\|` |
//! | [`encode_query_value`] | `#` `&` `+` (space becomes `+`) | `[` `]` `\|` `` ` `` `{` `}` `^` |
//! | [`encode_query_key`] | as value, plus `=` | as value |
//! | [`encode_hash`] | nothing | `[` `]` `\|` `{` `}` `^` |
//!
//! The RFC 3986 unreserved characters (`A-Z a-z 0-9 - . _ ~`) are never
//! touched, control characters are always encoded, and non-ASCII text is
//! encoded as UTF-8 bytes with uppercase hex digits.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Characters encoded by a browser's `encodeURI`.
const ENCODE_URI: &AsciiSet = &CONTROLS
	.add(b' ')
	.add(b'"')
	.add(b'%')
	.add(b'<')
	.add(b'>')
	.add(b'[')
	.add(b'\\')
	.add(b']')
	.add(b'^')
	.add(b'`')
	.add(b'{')
	.add(b'|')
	.add(b'}');

/// Browsers leave brackets and pipes alone in every section.
const COMMON: &AsciiSet = &ENCODE_URI.remove(b'|').remove(b'[').remove(b']');

const PATH: &AsciiSet = &COMMON.add(b'#').add(b'?');

const PARAM: &AsciiSet = &PATH.add(b'/');

const HASH: &AsciiSet = &COMMON.remove(b'{').remove(b'}').remove(b'^');

const QUERY_VALUE: &AsciiSet = &COMMON
	.add(b'+')
	.add(b'#')
	.add(b'&')
	.remove(b'`')
	.remove(b'{')
	.remove(b'}')
	.remove(b'^');

const QUERY_KEY: &AsciiSet = &QUERY_VALUE.add(b'=');

/// Encodes text for the path section.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::encoding::encode_path;
///
/// assert_eq!(encode_path("/a b/#?[x]"), "/a%20b/%23%3F[x]");
/// ```
pub fn encode_path(text: &str) -> String {
	utf8_percent_encode(text, PATH).to_string()
}

/// Encodes a single path param value. Unlike [`encode_path`] a `/` is encoded
/// so the value can never introduce a new segment.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::encoding::encode_param;
///
/// assert_eq!(encode_param("é"), "%C3%A9");
/// assert_eq!(encode_param("a/b"), "a%2Fb");
/// ```
pub fn encode_param(text: &str) -> String {
	utf8_percent_encode(text, PARAM).to_string()
}

/// Encodes a query value. A space becomes `+` and a literal `+` becomes `%2B`.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::encoding::encode_query_value;
///
/// assert_eq!(encode_query_value(" "), "+");
/// assert_eq!(encode_query_value("+"), "%2B");
/// assert_eq!(encode_query_value("a&b=c"), "a%26b=c");
/// ```
pub fn encode_query_value(text: &str) -> String {
	// A literal `%` is encoded as `%25`, so every `%20` left in the output
	// comes from a space.
	utf8_percent_encode(text, QUERY_VALUE)
		.to_string()
		.replace("%20", "+")
}

/// Encodes a query key: same rules as [`encode_query_value`] plus `=`.
pub fn encode_query_key(text: &str) -> String {
	utf8_percent_encode(text, QUERY_KEY)
		.to_string()
		.replace("%20", "+")
}

/// Encodes text for the hash section.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::encoding::encode_hash;
///
/// assert_eq!(encode_hash("#a=1&b={x}"), "#a=1&b={x}");
/// assert_eq!(encode_hash("# é"), "#%20%C3%A9");
/// ```
pub fn encode_hash(text: &str) -> String {
	utf8_percent_encode(text, HASH).to_string()
}

/// Decodes percent-encoded text.
///
/// Malformed input (a `%` not followed by two hex digits, or escapes that do
/// not form valid UTF-8) is returned unchanged and logged.
///
/// # Examples
///
/// ```
/// use wayfinder_urls::encoding::decode;
///
/// assert_eq!(decode("%C3%A9t%C3%A9"), "été");
/// assert_eq!(decode("100%"), "100%");
/// ```
pub fn decode(text: &str) -> Cow<'_, str> {
	if !has_well_formed_escapes(text) {
		tracing::warn!(text, "malformed percent-encoding, using original value");
		return Cow::Borrowed(text);
	}
	match percent_decode_str(text).decode_utf8() {
		Ok(decoded) => decoded,
		Err(err) => {
			tracing::warn!(text, error = %err, "percent-decoded bytes are not UTF-8, using original value");
			Cow::Borrowed(text)
		}
	}
}

fn has_well_formed_escapes(text: &str) -> bool {
	let bytes = text.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			let well_formed = bytes
				.get(i + 1..i + 3)
				.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
			if !well_formed {
				return false;
			}
			i += 3;
		} else {
			i += 1;
		}
	}
	true
}
