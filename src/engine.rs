//! The search engine: options, caches and the per-query fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sift_algo::{Chars, FuzzyAlgorithm, Slab};

use crate::cache::ChunkCache;
use crate::item::Item;
use crate::pattern::{Pattern, PatternCache};
use crate::rank::{Criterion, MAX_CRITERIA, MatchResult, compare_ranks};
use crate::store::{ChunkList, ItemBuilder};
use crate::tokenize::{Delimiter, FieldRange};

/// Case sensitivity of a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseMatching {
	/// Case-sensitive only for query tokens that contain an uppercase
	/// character.
	#[default]
	Smart,
	/// Never case-sensitive.
	Ignore,
	/// Always case-sensitive.
	Respect,
}

/// Knobs for building patterns and ordering results. Fixed for the
/// lifetime of a [`Searcher`].
#[derive(Clone, Debug)]
pub struct SearchOptions {
	/// Use the fuzzy algorithm for unquoted terms; exact otherwise.
	pub fuzzy: bool,
	/// Which fuzzy algorithm backs fuzzy terms.
	pub fuzzy_algorithm: FuzzyAlgorithm,
	/// Enable the extended query syntax.
	pub extended: bool,
	pub case: CaseMatching,
	/// Fold Latin diacritics on both sides of the match.
	pub normalize: bool,
	/// Scan forward; backward scanning prefers spans near the end.
	pub forward: bool,
	/// Allow narrowing the search scope from cached results.
	pub cacheable: bool,
	/// Field ranges to match against; empty means the whole line.
	pub nth: Vec<FieldRange>,
	pub delimiter: Delimiter,
	/// Reverse the index tie-break so newer items win ties.
	pub tac: bool,
	/// Sort criteria, most significant first (at most four).
	pub criteria: Vec<Criterion>,
}

impl Default for SearchOptions {
	fn default() -> Self {
		Self {
			fuzzy: true,
			fuzzy_algorithm: FuzzyAlgorithm::V2,
			extended: true,
			case: CaseMatching::Smart,
			normalize: true,
			forward: true,
			cacheable: false,
			nth: Vec::new(),
			delimiter: Delimiter::default(),
			tac: false,
			criteria: vec![Criterion::Score, Criterion::Length],
		}
	}
}

/// Item builder that decodes lines as-is and numbers them in push order.
#[must_use]
pub fn default_item_builder() -> ItemBuilder {
	let next_index = AtomicU32::new(0);
	Box::new(move |bytes| {
		let mut text = Chars::new(bytes);
		text.index = next_index.fetch_add(1, Ordering::Relaxed);
		Some(Item::new(text))
	})
}

/// A configured engine: search options plus the pattern and result caches
/// that outlive individual queries.
pub struct Searcher {
	options: SearchOptions,
	patterns: PatternCache,
	cache: ChunkCache,
}

impl Searcher {
	#[must_use]
	pub fn new(mut options: SearchOptions) -> Self {
		options.criteria.truncate(MAX_CRITERIA);
		Self {
			options,
			patterns: PatternCache::new(),
			cache: ChunkCache::new(),
		}
	}

	#[must_use]
	pub fn options(&self) -> &SearchOptions {
		&self.options
	}

	/// Parse a query, reusing the cached pattern when the same query was
	/// seen before.
	#[must_use]
	pub fn pattern(&self, query: &str) -> Arc<Pattern> {
		self.patterns.pattern(&self.options, query)
	}

	/// Drop all cached patterns and results, e.g. after clearing the
	/// candidate list.
	pub fn clear_caches(&self) {
		self.patterns.clear();
		self.cache.clear();
	}

	/// Run one query against the list: snapshot, match every chunk (in
	/// parallel, one scratch slab per worker), then order the results.
	#[must_use]
	pub fn search(&self, list: &ChunkList, query: &str) -> Vec<MatchResult> {
		let pattern = self.pattern(query);
		if pattern.is_empty() {
			return Vec::new();
		}
		let (chunks, item_count) = list.snapshot();
		debug!(
			"matching {item_count} item(s) across {} chunk(s) for {:?}",
			chunks.len(),
			pattern.as_string()
		);
		let mut results: Vec<MatchResult> = chunks
			.par_iter()
			.map_init(Slab::default, |slab, chunk| {
				pattern.match_chunk(chunk, &self.cache, &self.options.criteria, slab)
			})
			.collect::<Vec<_>>()
			.into_iter()
			.flatten()
			.collect();
		if pattern.is_sortable() {
			results.sort_unstable_by(|a, b| compare_ranks(a, b, self.options.tac));
		} else if self.options.tac {
			results.reverse();
		}
		debug!("{} item(s) matched", results.len());
		results
	}
}

impl Default for Searcher {
	fn default() -> Self {
		Self::new(SearchOptions::default())
	}
}

/// One-shot convenience search over string candidates with the default
/// options, returning the matched lines best-first.
///
/// ```
/// let lines = ["src/main.rs", "README.md", "tests/search.rs"];
/// let hits = sift::search("rs$", lines);
/// assert_eq!(hits, vec!["src/main.rs".to_string(), "tests/search.rs".to_string()]);
/// ```
pub fn search<I, S>(query: &str, lines: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let searcher = Searcher::default();
	let list = ChunkList::new(default_item_builder());
	for line in lines {
		list.push(line.as_ref().as_bytes());
	}
	searcher
		.search(&list, query)
		.iter()
		.map(MatchResult::text)
		.collect()
}

/// Like [`search`] but over raw byte candidates, returning bytes.
pub fn search_bytes<I, B>(query: &str, lines: I) -> Vec<Vec<u8>>
where
	I: IntoIterator<Item = B>,
	B: AsRef<[u8]>,
{
	let searcher = Searcher::default();
	let list = ChunkList::new(default_item_builder());
	for line in lines {
		list.push(line.as_ref());
	}
	searcher
		.search(&list, query)
		.iter()
		.map(|result| {
			let item = result.item();
			item.orig_text()
				.map_or_else(|| item.text().to_bytes(), <[u8]>::to_vec)
		})
		.collect()
}
