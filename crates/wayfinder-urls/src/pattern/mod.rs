//! Path pattern compiler.
//!
//! Patterns use `:name` params with optional modifiers and custom
//! expressions:
//!
//! - `/users/:id` - one segment
//! - `/users/:id(\d+)` - one segment matching `\d+`
//! - `/users/:id?` - optional segment
//! - `/files/:path+` - one or more segments
//! - `/files/:path*` - zero or more segments
//! - `/:catch(.*)` - everything, including `/`
//!
//! A compiled [`PathParser`] matches paths, builds paths from params and
//! carries a score used to rank patterns against each other.

mod parser;
pub mod score;
mod tokenizer;

pub use parser::{BASE_PARAM_PATTERN, ParamKey, PathParser, PathParserOptions};
pub use score::{Score, compare_path_parser_score, compare_score_array};
pub use tokenizer::{ParamToken, Segment, Token, tokenize_path};

/// Maximum allowed length for a path pattern in bytes.
pub const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of `/`-separated segments in a path pattern.
pub const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled pattern (in bytes).
pub const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB
