//! Ranking vectors and result ordering.
//!
//! Every match is condensed into four 16-bit values, one per configured
//! criterion, packed so that a plain lexicographic comparison of the
//! vector (most significant slot first) orders results from best to
//! worst. Lower is always better; unused slots stay at `u16::MAX`.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::item::Item;
use crate::store::Chunk;

/// Sort criteria, applied in order. At most [`MAX_CRITERIA`] are used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
	/// Match score; higher scores rank first.
	Score,
	/// Trimmed item length; shorter items rank first.
	Length,
	/// Distance of the match from the start of the item.
	Begin,
	/// Distance of the match from the end of the item.
	End,
}

/// Number of slots in a ranking vector.
pub const MAX_CRITERIA: usize = 4;

/// Half-open character span of one term-set match within an item.
/// `begin == end` marks the placeholder produced by inverse terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Offset {
	pub begin: u32,
	pub end: u32,
}

impl Offset {
	#[must_use]
	pub fn is_valid(self) -> bool {
		self.begin < self.end
	}
}

/// A matched item plus its packed ranking vector. Results are the unit of
/// caching and of final ordering; they stay valid for as long as the chunk
/// they point into, which they keep alive themselves.
#[derive(Clone, Debug)]
pub struct MatchResult {
	chunk: Arc<Chunk>,
	item_index: u32,
	points: [u16; 4],
}

impl MatchResult {
	pub(crate) fn new(chunk: Arc<Chunk>, item_index: usize, points: [u16; 4]) -> Self {
		Self {
			chunk,
			item_index: item_index as u32,
			points,
		}
	}

	#[must_use]
	pub fn item(&self) -> &Item {
		&self.chunk.items()[self.item_index as usize]
	}

	/// Position of the item inside its chunk.
	#[must_use]
	pub fn item_index(&self) -> usize {
		self.item_index as usize
	}

	/// Ordinal index of the item in the input stream.
	#[must_use]
	pub fn index(&self) -> u32 {
		self.item().index()
	}

	#[must_use]
	pub fn points(&self) -> [u16; 4] {
		self.points
	}

	/// The matched item's text.
	#[must_use]
	pub fn text(&self) -> String {
		self.item().text().to_string()
	}
}

fn as_u16(val: i64) -> u16 {
	val.clamp(0, i64::from(u16::MAX)) as u16
}

/// Pack the configured criteria into a ranking vector. Criterion `idx`
/// lands in slot `3 - idx` so that slot 3 is the most significant.
#[must_use]
pub fn build_points(criteria: &[Criterion], item: &Item, offsets: &[Offset], score: i32) -> [u16; 4] {
	let mut sorted;
	let offsets = if offsets.len() > 1 {
		sorted = offsets.to_vec();
		sorted.sort_by(|a, b| a.begin.cmp(&b.begin).then(a.end.cmp(&b.end)));
		&sorted[..]
	} else {
		offsets
	};

	let num_chars = item.text().len();
	let mut min_begin = usize::from(u16::MAX);
	let mut min_end = usize::from(u16::MAX);
	let mut max_end = 0usize;
	let mut valid_offset_found = false;
	for offset in offsets {
		if offset.is_valid() {
			min_begin = min_begin.min(offset.begin as usize);
			min_end = min_end.min(offset.end as usize);
			max_end = max_end.max(offset.end as usize);
			valid_offset_found = true;
		}
	}

	let mut points = [u16::MAX; 4];
	for (idx, criterion) in criteria.iter().take(MAX_CRITERIA).enumerate() {
		let val = match criterion {
			Criterion::Score => u16::MAX - as_u16(i64::from(score)),
			Criterion::Length => item.trim_length(),
			Criterion::Begin | Criterion::End => {
				if !valid_offset_found {
					u16::MAX
				} else {
					let mut white_prefix_len = 0usize;
					for idx in 0..num_chars {
						white_prefix_len = idx;
						if idx == min_begin || !item.text().get(idx).is_whitespace() {
							break;
						}
					}
					if *criterion == Criterion::Begin {
						as_u16((min_end - white_prefix_len) as i64)
					} else {
						let trim_length = i64::from(item.trim_length()).max(1);
						let max = i64::from(u16::MAX);
						as_u16(max - max * (max_end - white_prefix_len) as i64 / trim_length)
					}
				}
			}
		};
		points[3 - idx] = val;
	}
	points
}

/// Compare two results over their ranking vectors, most significant slot
/// first; ties fall back to the ordinal item index, which `tac` reverses.
#[must_use]
pub fn compare_ranks(a: &MatchResult, b: &MatchResult, tac: bool) -> Ordering {
	for idx in (0..4).rev() {
		let ord = a.points[idx].cmp(&b.points[idx]);
		if ord != Ordering::Equal {
			return ord;
		}
	}
	let ord = a.index().cmp(&b.index());
	if tac { ord.reverse() } else { ord }
}
