//! Low-level string matching primitives for the `sift` search engine.
//!
//! Everything here is pure CPU work over a [`Chars`] buffer: the engine
//! above decides *what* to match (query parsing, field selection, caching,
//! ranking) while this crate decides *whether and where* a single pattern
//! matches a single piece of text, and how good that match is.
//!
//! All primitives share one signature, [`MatchFn`], so the engine can
//! dispatch on term type without trait objects:
//!
//! ```
//! use sift_algo::{Chars, Slab, fuzzy_match_v2};
//!
//! let text = Chars::from("src/main.rs");
//! let pattern: Vec<char> = "smain".chars().collect();
//! let mut slab = Slab::default();
//! let (span, _) = fuzzy_match_v2(false, false, true, &text, &pattern, false, &mut slab);
//! assert!(span.is_some());
//! ```

mod chars;
mod exact;
mod fuzzy;
mod normalize;
mod score;
mod slab;

pub use chars::Chars;
pub use exact::{equal_match, exact_match_naive, prefix_match, suffix_match};
pub use fuzzy::{fuzzy_match_v1, fuzzy_match_v2};
pub use normalize::{normalize_char, normalize_chars};
pub use score::{
	BONUS_BOUNDARY, BONUS_CAMEL_123, BONUS_CONSECUTIVE, BONUS_FIRST_CHAR_MULTIPLIER,
	BONUS_NON_WORD, SCORE_GAP_EXTENSION, SCORE_GAP_START, SCORE_MATCH,
};
pub use slab::{SLAB_16_SIZE, SLAB_32_SIZE, Slab};

/// Matched character positions, present only when they were requested.
pub type Positions = Option<Vec<usize>>;

/// A successful match: a half-open character span plus its score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchSpan {
	pub begin: usize,
	pub end: usize,
	pub score: i32,
}

impl MatchSpan {
	/// The zero-width span an empty pattern produces.
	#[must_use]
	pub fn empty() -> Self {
		Self {
			begin: 0,
			end: 0,
			score: 0,
		}
	}
}

/// Common signature of every matching primitive:
/// `(case_sensitive, normalize, forward, text, pattern, with_pos, slab)`.
pub type MatchFn =
	fn(bool, bool, bool, &Chars, &[char], bool, &mut Slab) -> (Option<MatchSpan>, Positions);

/// Which algorithm backs non-anchored fuzzy terms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FuzzyAlgorithm {
	/// Greedy scan; cheap and allocation-free.
	V1,
	/// Optimal alignment over the scratch slab.
	#[default]
	V2,
}

impl FuzzyAlgorithm {
	#[must_use]
	pub fn match_fn(self) -> MatchFn {
		match self {
			Self::V1 => fuzzy_match_v1,
			Self::V2 => fuzzy_match_v2,
		}
	}
}
