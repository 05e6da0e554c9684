//! `sift` is an embeddable fuzzy search engine: hand it a query and a list
//! of candidate lines and it returns the matching lines, ranked.
//!
//! The query language is the familiar interactive-filter syntax: terms are
//! fuzzy by default, `'term` is exact, `^term`/`term$` anchor to the ends,
//! `!term` inverts, and `|` builds OR groups between AND-ed terms.
//!
//! ```
//! let corpus = [
//! 	"Her daily goal was to improve on yesterday.",
//! 	"The book is in front of the table.",
//! ];
//! let hits = sift::search("daily", corpus);
//! assert_eq!(hits, vec!["Her daily goal was to improve on yesterday.".to_string()]);
//! ```
//!
//! For anything beyond a one-shot query, build a [`Searcher`] and a
//! [`ChunkList`]: the list can be appended to while searches run, and the
//! searcher memoizes parsed patterns and per-chunk results so that
//! interactive query editing reuses earlier work.
//!
//! ```
//! use sift::{ChunkList, SearchOptions, Searcher, default_item_builder};
//!
//! let searcher = Searcher::new(SearchOptions {
//! 	cacheable: true,
//! 	..SearchOptions::default()
//! });
//! let list = ChunkList::new(default_item_builder());
//! for line in ["alpha", "beta", "gamma"] {
//! 	list.push(line.as_bytes());
//! }
//! let results = searcher.search(&list, "al");
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].text(), "alpha");
//! ```

pub mod cache;
pub mod engine;
pub mod history;
pub mod item;
pub mod matcher;
pub mod pattern;
pub mod rank;
pub mod store;
pub mod tokenize;

pub use sift_algo as algo;

pub use crate::cache::ChunkCache;
pub use crate::engine::{
	CaseMatching, SearchOptions, Searcher, default_item_builder, search, search_bytes,
};
pub use crate::history::{History, HistoryError};
pub use crate::item::Item;
pub use crate::matcher::ItemMatch;
pub use crate::pattern::{Pattern, PatternCache, Term, TermKind, TermSet};
pub use crate::rank::{Criterion, MatchResult, Offset, compare_ranks};
pub use crate::store::{CHUNK_SIZE, Chunk, ChunkList, ItemBuilder};
pub use crate::tokenize::{Delimiter, FieldRange, Token};
