//! Specificity scores of compiled patterns and their total order.
//!
//! A score holds one vector per segment with one weight per token. Higher
//! weights are more specific. Comparing two parsers yields [`Ordering::Less`]
//! when the first one must be tried first.

use std::cmp::Ordering;

/// Weight of an empty segment (the root or a trailing slash).
pub const ROOT: i32 = 9000;
/// Base weight of any token.
pub const SEGMENT: i32 = 4000;
/// Added for static text.
pub const STATIC: i32 = 4000;
/// Added for params.
pub const DYNAMIC: i32 = 2000;
/// Added for params with a custom expression.
pub const BONUS_CUSTOM_REGEXP: i32 = 1000;
/// Added for `(.*)` params, cancelling the custom expression bonus.
pub const BONUS_WILDCARD: i32 = -4000 - BONUS_CUSTOM_REGEXP;
/// Added for `+`/`*` params.
pub const BONUS_REPEATABLE: i32 = -2000;
/// Added for `?`/`*` params.
pub const BONUS_OPTIONAL: i32 = -800;
/// Added to the last token of strict, end-anchored patterns.
pub const BONUS_STRICT: i32 = 70;
/// Added to every token of case-sensitive patterns.
pub const BONUS_CASE_SENSITIVE: i32 = 25;

/// Score of a pattern: per segment, per token weights.
pub type Score = Vec<Vec<i32>>;

const SINGLE_STATIC: i32 = STATIC + SEGMENT;

/// Compares the weights of one segment.
///
/// A segment made of a single static token ranks before a longer segment
/// sharing its prefix (`/a` before `/a-:b`).
pub fn compare_score_array(a: &[i32], b: &[i32]) -> Ordering {
	for (x, y) in a.iter().zip(b) {
		match y.cmp(x) {
			Ordering::Equal => {}
			other => return other,
		}
	}
	match a.len().cmp(&b.len()) {
		Ordering::Less if a.len() == 1 && a[0] == SINGLE_STATIC => Ordering::Less,
		Ordering::Less => Ordering::Greater,
		Ordering::Greater if b.len() == 1 && b[0] == SINGLE_STATIC => Ordering::Greater,
		Ordering::Greater => Ordering::Less,
		Ordering::Equal => Ordering::Equal,
	}
}

fn is_last_score_negative(score: &[Vec<i32>]) -> bool {
	score
		.last()
		.and_then(|segment| segment.last())
		.is_some_and(|weight| *weight < 0)
}

/// Total order over pattern scores.
///
/// Segments are compared pairwise first. When one score has exactly one more
/// segment, a negative trailing weight (a wildcard) ranks that score last.
/// Otherwise the score with more segments wins.
pub fn compare_path_parser_score(a: &[Vec<i32>], b: &[Vec<i32>]) -> Ordering {
	for (x, y) in a.iter().zip(b) {
		match compare_score_array(x, y) {
			Ordering::Equal => {}
			other => return other,
		}
	}
	if a.len().abs_diff(b.len()) == 1 {
		if is_last_score_negative(a) {
			return Ordering::Greater;
		}
		if is_last_score_negative(b) {
			return Ordering::Less;
		}
	}
	b.len().cmp(&a.len())
}
