//! Non-anchored fuzzy matching.
//!
//! Two interchangeable implementations share the scoring model from
//! [`crate::score`]:
//!
//! - [`fuzzy_match_v1`] scans forward greedily, then sweeps backward once to
//!   shrink the span. Fast, allocation-free, occasionally picks a
//!   suboptimal alignment.
//! - [`fuzzy_match_v2`] runs a gap-affine dynamic program over the scratch
//!   slab and returns the best-scoring alignment. It falls back to v1 when
//!   the slab cannot hold its matrices.

use memchr::memchr;

use crate::chars::Chars;
use crate::normalize::normalize_char;
use crate::score::{
	BONUS_BOUNDARY, BONUS_CONSECUTIVE, BONUS_FIRST_CHAR_MULTIPLIER, CharClass, SCORE_GAP_EXTENSION,
	SCORE_GAP_START, SCORE_MATCH, bonus_for, calculate_score, char_class_of, index_at, to_lower,
};
use crate::slab::Slab;
use crate::{MatchSpan, Positions};

/// Find the next occurrence of `b` (or its uppercase form when folding)
/// at or after `from`.
fn try_skip(bytes: &[u8], case_sensitive: bool, b: u8, from: usize) -> Option<usize> {
	let slice = &bytes[from..];
	let mut idx = memchr(b, slice);
	if !case_sensitive && b.is_ascii_lowercase() {
		let upper = memchr(b.to_ascii_uppercase(), slice);
		idx = match (idx, upper) {
			(Some(lower), Some(upper)) => Some(lower.min(upper)),
			(lower, upper) => lower.or(upper),
		};
	}
	idx.map(|idx| idx + from)
}

/// Cheap subsequence prefilter over the raw bytes of ASCII text.
///
/// Returns the index to start scanning from, or `None` when the pattern
/// cannot possibly match. Non-ASCII text is not inspected and yields 0.
pub(crate) fn ascii_fuzzy_index(text: &Chars, pattern: &[char], case_sensitive: bool) -> Option<usize> {
	let Some(bytes) = text.ascii_bytes() else {
		return Some(0);
	};
	if pattern.iter().any(|c| !c.is_ascii()) {
		return None;
	}

	let mut first_idx = 0usize;
	let mut idx = 0usize;
	for (pidx, &pchar) in pattern.iter().enumerate() {
		idx = try_skip(bytes, case_sensitive, pchar as u8, idx)?;
		if pidx == 0 && idx > 0 {
			first_idx = idx - 1;
		}
		idx += 1;
	}
	Some(first_idx)
}

/// Greedy forward scan plus one backward sweep.
pub fn fuzzy_match_v1(
	case_sensitive: bool,
	normalize: bool,
	forward: bool,
	text: &Chars,
	pattern: &[char],
	with_pos: bool,
	_slab: &mut Slab,
) -> (Option<MatchSpan>, Positions) {
	if pattern.is_empty() {
		return (Some(MatchSpan::empty()), None);
	}
	if ascii_fuzzy_index(text, pattern, case_sensitive).is_none() {
		return (None, None);
	}

	let len_runes = text.len();
	let len_pattern = pattern.len();
	let fold = |mut c: char| {
		if !case_sensitive {
			c = to_lower(c);
		}
		if normalize {
			c = normalize_char(c);
		}
		c
	};

	let mut pidx = 0usize;
	let mut sidx = usize::MAX;
	let mut eidx = usize::MAX;
	for index in 0..len_runes {
		let c = fold(text.get(index_at(index, len_runes, forward)));
		if c == pattern[index_at(pidx, len_pattern, forward)] {
			if sidx == usize::MAX {
				sidx = index;
			}
			pidx += 1;
			if pidx == len_pattern {
				eidx = index + 1;
				break;
			}
		}
	}
	if eidx == usize::MAX {
		return (None, None);
	}

	// Sweep backward to pull the start of the span as far right as possible.
	let mut pidx = len_pattern - 1;
	for index in (sidx..eidx).rev() {
		let c = fold(text.get(index_at(index, len_runes, forward)));
		if c == pattern[index_at(pidx, len_pattern, forward)] {
			if pidx == 0 {
				sidx = index;
				break;
			}
			pidx -= 1;
		}
	}

	let (sidx, eidx) = if forward {
		(sidx, eidx)
	} else {
		(len_runes - eidx, len_runes - sidx)
	};
	let (score, pos) =
		calculate_score(case_sensitive, normalize, text, pattern, sidx, eidx, with_pos);
	(
		Some(MatchSpan {
			begin: sidx,
			end: eidx,
			score,
		}),
		pos,
	)
}

/// Optimal-alignment fuzzy match.
///
/// Phase 1 folds the text, records per-position bonuses and verifies the
/// pattern is a subsequence at all. Phase 2 fills a banded score/run-length
/// matrix between the first and last plausible columns. Phase 3 backtracks
/// through the matrix when positions were requested.
pub fn fuzzy_match_v2(
	case_sensitive: bool,
	normalize: bool,
	forward: bool,
	text: &Chars,
	pattern: &[char],
	with_pos: bool,
	slab: &mut Slab,
) -> (Option<MatchSpan>, Positions) {
	let m = pattern.len();
	if m == 0 {
		return (Some(MatchSpan::empty()), with_pos.then(Vec::new));
	}
	let n = text.len();
	if n < m {
		return (None, None);
	}
	if 3 * n + 2 * n * m > slab.i16s.len() || n + m > slab.u32s.len() {
		return fuzzy_match_v1(case_sensitive, normalize, forward, text, pattern, with_pos, slab);
	}
	let Some(first_col) = ascii_fuzzy_index(text, pattern, case_sensitive) else {
		return (None, None);
	};

	let (h0, rest16) = slab.i16s.split_at_mut(n);
	let (c0, rest16) = rest16.split_at_mut(n);
	let (b, rest16) = rest16.split_at_mut(n);
	let (t, rest32) = slab.u32s.split_at_mut(n);
	let (f, _) = rest32.split_at_mut(m);

	// Phase 1: fold characters, assign bonuses, locate pattern characters.
	let mut max_score = 0i16;
	let mut max_score_pos = 0usize;
	let mut pidx = 0usize;
	let mut last_idx = 0usize;
	let pchar0 = pattern[0];
	let mut pchar = pattern[0];
	let mut prev_h0 = 0i16;
	let mut prev_class = CharClass::NonWord;
	let mut in_gap = false;
	for col in first_col..n {
		let mut c = text.get(col);
		let class = char_class_of(c);
		if !case_sensitive {
			c = to_lower(c);
		}
		if normalize {
			c = normalize_char(c);
		}
		t[col] = c as u32;
		let bonus = bonus_for(prev_class, class);
		b[col] = bonus;
		prev_class = class;

		if c == pchar {
			if pidx < m {
				f[pidx] = col as u32;
				pidx += 1;
				pchar = pattern[pidx.min(m - 1)];
			}
			last_idx = col;
		}
		if c == pchar0 {
			let score = SCORE_MATCH + bonus * BONUS_FIRST_CHAR_MULTIPLIER;
			h0[col] = score;
			c0[col] = 1;
			if m == 1 && ((forward && score > max_score) || (!forward && score >= max_score)) {
				max_score = score;
				max_score_pos = col;
				if forward && bonus == BONUS_BOUNDARY {
					break;
				}
			}
			in_gap = false;
		} else {
			h0[col] = if in_gap {
				(prev_h0 + SCORE_GAP_EXTENSION).max(0)
			} else {
				(prev_h0 + SCORE_GAP_START).max(0)
			};
			c0[col] = 0;
			in_gap = true;
		}
		prev_h0 = h0[col];
	}
	if pidx != m {
		return (None, None);
	}
	if m == 1 {
		let span = MatchSpan {
			begin: max_score_pos,
			end: max_score_pos + 1,
			score: i32::from(max_score),
		};
		return (Some(span), with_pos.then(|| vec![max_score_pos]));
	}

	// Phase 2: banded score matrix between the first and last plausible
	// columns. Row `i` only ranges over columns where pattern[..=i] can
	// still complete.
	let f0 = f[0] as usize;
	let width = last_idx - f0 + 1;
	let (h, rest16) = rest16.split_at_mut(width * m);
	let (c, _) = rest16.split_at_mut(width * m);
	h[..width].copy_from_slice(&h0[f0..=last_idx]);
	c[..width].copy_from_slice(&c0[f0..=last_idx]);

	let mut max_score = 0i16;
	let mut max_score_pos = 0usize;
	for pi in 1..m {
		let fcur = f[pi] as usize;
		let pchar = pattern[pi] as u32;
		let row = pi * width;
		let prev_row = row - width;
		let mut in_gap = false;
		for col in fcur..=last_idx {
			let j = col - f0;
			let left = if col == fcur { 0 } else { h[row + j - 1] };
			let s2 = left
				+ if in_gap {
					SCORE_GAP_EXTENSION
				} else {
					SCORE_GAP_START
				};
			let mut s1 = 0i16;
			let mut consecutive = 0i16;
			if t[col] == pchar {
				s1 = h[prev_row + j - 1] + SCORE_MATCH;
				let mut bonus = b[col];
				consecutive = c[prev_row + j - 1] + 1;
				if bonus == BONUS_BOUNDARY {
					consecutive = 1;
				} else if consecutive > 1 {
					// A run inherits the bonus of its first character.
					bonus = bonus
						.max(BONUS_CONSECUTIVE)
						.max(b[col + 1 - consecutive as usize]);
				}
				if s1 + bonus < s2 {
					s1 += b[col];
					consecutive = 0;
				} else {
					s1 += bonus;
				}
			}
			c[row + j] = consecutive;
			in_gap = s1 < s2;
			let score = s1.max(s2).max(0);
			if pi == m - 1 && ((forward && score > max_score) || (!forward && score >= max_score)) {
				max_score = score;
				max_score_pos = col;
			}
			h[row + j] = score;
		}
	}

	// Phase 3: backtrack for the matched positions. Without positions the
	// span start is approximated by the first plausible column.
	let mut begin = f0;
	let positions = if with_pos {
		let mut pos = Vec::with_capacity(m);
		let mut i = m - 1;
		let mut j = max_score_pos;
		let mut prefer_match = true;
		loop {
			let row = i * width;
			let jj = j - f0;
			let s = h[row + jj];
			let s1 = if i > 0 && j >= f[i] as usize {
				h[row - width + jj - 1]
			} else {
				0
			};
			let s2 = if j > f[i] as usize { h[row + jj - 1] } else { 0 };
			if s > s1 && (s > s2 || (s == s2 && prefer_match)) {
				pos.push(j);
				if i == 0 {
					break;
				}
				i -= 1;
			}
			prefer_match = c[row + jj] > 1
				|| (row + width + jj + 1 < c.len() && c[row + width + jj + 1] > 0);
			j -= 1;
		}
		begin = j;
		Some(pos)
	} else {
		None
	};
	(
		Some(MatchSpan {
			begin,
			end: max_score_pos + 1,
			score: i32::from(max_score),
		}),
		positions,
	)
}
