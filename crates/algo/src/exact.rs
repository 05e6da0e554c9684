//! Anchored and substring matching primitives.

use crate::chars::Chars;
use crate::fuzzy::ascii_fuzzy_index;
use crate::normalize::normalize_char;
use crate::score::{
	BONUS_BOUNDARY, BONUS_FIRST_CHAR_MULTIPLIER, SCORE_MATCH, bonus_at, calculate_score, index_at,
	to_lower,
};
use crate::slab::Slab;
use crate::{MatchSpan, Positions};

/// Naive substring search that prefers the occurrence with the best bonus
/// at its first character, so `foo` lands on ` foo` rather than `xfoo` when
/// both are present.
pub fn exact_match_naive(
	case_sensitive: bool,
	normalize: bool,
	forward: bool,
	text: &Chars,
	pattern: &[char],
	_with_pos: bool,
	_slab: &mut Slab,
) -> (Option<MatchSpan>, Positions) {
	if pattern.is_empty() {
		return (Some(MatchSpan::empty()), None);
	}
	let len_runes = text.len();
	let len_pattern = pattern.len();
	if len_runes < len_pattern {
		return (None, None);
	}
	if ascii_fuzzy_index(text, pattern, case_sensitive).is_none() {
		return (None, None);
	}

	let mut pidx = 0usize;
	let mut best_pos: Option<usize> = None;
	let mut bonus = 0i16;
	let mut best_bonus = -1i16;
	let mut index = 0usize;
	while index < len_runes {
		let index_ = index_at(index, len_runes, forward);
		let mut c = text.get(index_);
		if !case_sensitive {
			c = to_lower(c);
		}
		if normalize {
			c = normalize_char(c);
		}
		let pidx_ = index_at(pidx, len_pattern, forward);
		if c == pattern[pidx_] {
			if pidx_ == 0 {
				bonus = bonus_at(text, index_);
			}
			pidx += 1;
			if pidx == len_pattern {
				if bonus > best_bonus {
					best_pos = Some(index);
					best_bonus = bonus;
				}
				if bonus == BONUS_BOUNDARY {
					break;
				}
				index -= pidx - 1;
				pidx = 0;
				bonus = 0;
			}
		} else {
			index -= pidx;
			pidx = 0;
			bonus = 0;
		}
		index += 1;
	}

	let Some(best_pos) = best_pos else {
		return (None, None);
	};
	let (sidx, eidx) = if forward {
		(best_pos + 1 - len_pattern, best_pos + 1)
	} else {
		(len_runes - (best_pos + 1), len_runes - (best_pos + 1 - len_pattern))
	};
	let (score, _) = calculate_score(case_sensitive, normalize, text, pattern, sidx, eidx, false);
	(
		Some(MatchSpan {
			begin: sidx,
			end: eidx,
			score,
		}),
		None,
	)
}

/// Match the pattern against the very start of the text.
pub fn prefix_match(
	case_sensitive: bool,
	normalize: bool,
	_forward: bool,
	text: &Chars,
	pattern: &[char],
	_with_pos: bool,
	_slab: &mut Slab,
) -> (Option<MatchSpan>, Positions) {
	if pattern.is_empty() {
		return (Some(MatchSpan::empty()), None);
	}
	if text.len() < pattern.len() {
		return (None, None);
	}
	for (idx, &pchar) in pattern.iter().enumerate() {
		let mut c = text.get(idx);
		if !case_sensitive {
			c = to_lower(c);
		}
		if normalize {
			c = normalize_char(c);
		}
		if c != pchar {
			return (None, None);
		}
	}
	let (score, _) = calculate_score(case_sensitive, normalize, text, pattern, 0, pattern.len(), false);
	(
		Some(MatchSpan {
			begin: 0,
			end: pattern.len(),
			score,
		}),
		None,
	)
}

/// Match the pattern against the end of the text, ignoring trailing
/// whitespace.
pub fn suffix_match(
	case_sensitive: bool,
	normalize: bool,
	_forward: bool,
	text: &Chars,
	pattern: &[char],
	_with_pos: bool,
	_slab: &mut Slab,
) -> (Option<MatchSpan>, Positions) {
	let trimmed_len = usize::from(text.trim_length());
	if pattern.is_empty() {
		return (
			Some(MatchSpan {
				begin: trimmed_len,
				end: trimmed_len,
				score: 0,
			}),
			None,
		);
	}
	if trimmed_len < pattern.len() {
		return (None, None);
	}
	let diff = trimmed_len - pattern.len();
	for (idx, &pchar) in pattern.iter().enumerate() {
		let mut c = text.get(idx + diff);
		if !case_sensitive {
			c = to_lower(c);
		}
		if normalize {
			c = normalize_char(c);
		}
		if c != pchar {
			return (None, None);
		}
	}
	let (score, _) = calculate_score(case_sensitive, normalize, text, pattern, diff, trimmed_len, false);
	(
		Some(MatchSpan {
			begin: diff,
			end: trimmed_len,
			score,
		}),
		None,
	)
}

/// Match the whole text, modulo surrounding whitespace unless the pattern
/// itself is anchored in whitespace.
pub fn equal_match(
	case_sensitive: bool,
	normalize: bool,
	_forward: bool,
	text: &Chars,
	pattern: &[char],
	_with_pos: bool,
	_slab: &mut Slab,
) -> (Option<MatchSpan>, Positions) {
	let len_pattern = pattern.len();
	let Some((&first, &last)) = pattern.first().zip(pattern.last()) else {
		return (None, None);
	};
	let trimmed_start = if first.is_whitespace() {
		0
	} else {
		text.leading_whitespace()
	};
	let trimmed_end = if last.is_whitespace() {
		0
	} else {
		text.trailing_whitespace()
	};
	if text.len() < trimmed_start + trimmed_end
		|| text.len() - trimmed_start - trimmed_end != len_pattern
	{
		return (None, None);
	}
	for (idx, &pchar) in pattern.iter().enumerate() {
		let mut c = text.get(trimmed_start + idx);
		if !case_sensitive {
			c = to_lower(c);
		}
		let matches = if normalize {
			normalize_char(c) == normalize_char(pchar)
		} else {
			c == pchar
		};
		if !matches {
			return (None, None);
		}
	}
	let score = i32::from(SCORE_MATCH + BONUS_BOUNDARY) * len_pattern as i32
		+ i32::from((BONUS_FIRST_CHAR_MULTIPLIER - 1) * BONUS_BOUNDARY);
	(
		Some(MatchSpan {
			begin: trimmed_start,
			end: trimmed_start + len_pattern,
			score,
		}),
		None,
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn span(f: impl Fn(bool, bool, bool, &Chars, &[char], bool, &mut Slab) -> (Option<MatchSpan>, Positions), text: &str, pattern: &str, case_sensitive: bool) -> Option<MatchSpan> {
		let chars = Chars::from(text);
		let pattern: Vec<char> = pattern.chars().collect();
		let mut slab = Slab::default();
		f(case_sensitive, false, true, &chars, &pattern, false, &mut slab).0
	}

	#[test]
	fn exact_finds_substring() {
		let m = span(exact_match_naive, "hello world", "lo wo", true).unwrap();
		assert_eq!((m.begin, m.end), (3, 8));
		assert!(span(exact_match_naive, "hello world", "low", true).is_none());
	}

	#[test]
	fn exact_prefers_word_boundary_occurrence() {
		// "foo" appears mid-word first, then at a word boundary.
		let m = span(exact_match_naive, "xfoox foo", "foo", true).unwrap();
		assert_eq!((m.begin, m.end), (6, 9));
	}

	#[test]
	fn exact_is_case_insensitive_on_request() {
		assert!(span(exact_match_naive, "Hello", "hello", false).is_some());
		assert!(span(exact_match_naive, "Hello", "hello", true).is_none());
	}

	#[test]
	fn prefix_anchors_to_start() {
		let m = span(prefix_match, "The book", "The", true).unwrap();
		assert_eq!((m.begin, m.end), (0, 3));
		assert!(span(prefix_match, "a The book", "The", true).is_none());
	}

	#[test]
	fn suffix_anchors_to_trimmed_end() {
		let m = span(suffix_match, "slice of pie  ", "pie", true).unwrap();
		assert_eq!((m.begin, m.end), (9, 12));
		assert!(span(suffix_match, "pie slice", "pie", true).is_none());
	}

	#[test]
	fn equal_requires_whole_text() {
		let m = span(equal_match, "  foo ", "foo", true).unwrap();
		assert_eq!((m.begin, m.end), (2, 5));
		assert!(span(equal_match, "foox", "foo", true).is_none());
		assert!(span(equal_match, "fo", "foo", true).is_none());
	}
}
