//! URL handling for the Wayfinder navigation resolver.
//!
//! - [`encoding`]: section-aware percent-encoding and decoding
//! - [`query`]: ordered multi-value query strings
//! - [`url`]: splitting locations into path, query and hash
//! - [`params`]: path param values
//! - [`pattern`]: the path pattern compiler and its ranking
//!
//! ## Quick Start
//!
//! ```
//! use wayfinder_urls::{PathParams, PathParser, PathParserOptions, encode_params};
//!
//! let parser = PathParser::new("/users/:name", PathParserOptions::default()).unwrap();
//! let mut params = PathParams::new();
//! params.insert("name".to_string(), "jane doe".into());
//! let path = parser.stringify(&encode_params(&params)).unwrap();
//! assert_eq!(path, "/users/jane%20doe");
//! assert_eq!(parser.parse(&path).unwrap()["name"].as_str(), Some("jane%20doe"));
//! ```

pub mod encoding;
pub mod error;
pub mod params;
pub mod pattern;
pub mod query;
pub mod url;

pub use encoding::{decode, encode_hash, encode_param, encode_path, encode_query_key, encode_query_value};
pub use error::{PatternError, PatternResult};
pub use params::{ParamValue, PathParams, decode_params, encode_params, is_same_params};
pub use pattern::{ParamKey, PathParser, PathParserOptions, compare_path_parser_score};
pub use query::{LocationQuery, QueryValue, parse_query, stringify_query};
pub use url::{ParsedUrl, parse_url, resolve_relative_path, stringify_url, strip_base};
