//! Matching a pattern against items and chunks.
//!
//! The basic path runs the configured algorithm once over the item. The
//! extended path evaluates every term set: within a set, terms are tried in
//! order and the first non-inverse hit wins; a set containing inverse terms
//! is satisfied only when none of their bodies occur. An item matches when
//! every set is satisfied; per-set offsets are collected and scores summed.

use std::sync::Arc;

use log::trace;
use sift_algo::{Chars, MatchFn, Slab, exact_match_naive};

use crate::cache::ChunkCache;
use crate::item::Item;
use crate::pattern::Pattern;
use crate::rank::{Criterion, MatchResult, Offset, build_points};
use crate::store::Chunk;
use crate::tokenize::{tokenize, transform};

/// A slice of an item's text to match against, with the number of
/// characters that precede it in the full line.
struct Region<'a> {
	text: &'a Chars,
	prefix_length: u32,
}

/// Outcome of matching one item: per-term-set offsets, the summed score
/// and, when requested, the matched character positions (unordered).
#[derive(Clone, Debug)]
pub struct ItemMatch {
	pub offsets: Vec<Offset>,
	pub score: i32,
	pub positions: Option<Vec<usize>>,
}

fn iter_regions(
	pfun: MatchFn,
	regions: &[Region<'_>],
	case_sensitive: bool,
	normalize: bool,
	forward: bool,
	pattern: &[char],
	with_pos: bool,
	slab: &mut Slab,
) -> (Option<(Offset, i32)>, Option<Vec<usize>>) {
	for region in regions {
		let (span, positions) = pfun(
			case_sensitive,
			normalize,
			forward,
			region.text,
			pattern,
			with_pos,
			slab,
		);
		if let Some(span) = span {
			let offset = Offset {
				begin: span.begin as u32 + region.prefix_length,
				end: span.end as u32 + region.prefix_length,
			};
			let positions = positions.map(|positions| {
				positions
					.into_iter()
					.map(|pos| pos + region.prefix_length as usize)
					.collect()
			});
			return (Some((offset, span.score)), positions);
		}
	}
	(None, None)
}

impl Pattern {
	/// Match every item of a chunk, consulting and feeding the result
	/// cache. Results are returned in item order.
	#[must_use]
	pub fn match_chunk(
		&self,
		chunk: &Arc<Chunk>,
		cache: &ChunkCache,
		criteria: &[Criterion],
		slab: &mut Slab,
	) -> Vec<MatchResult> {
		let key = self.cache_key();
		if self.is_cacheable()
			&& let Some(cached) = cache.lookup(chunk, key)
		{
			trace!("cache hit for {key:?}");
			return cached;
		}

		let mut build = |idx: usize, item: &Item| {
			self.match_item(item, false, slab).map(|matched| {
				let points = build_points(criteria, item, &matched.offsets, matched.score);
				MatchResult::new(Arc::clone(chunk), idx, points)
			})
		};
		let matches: Vec<MatchResult> = match cache.search(chunk, key) {
			Some(scope) => scope
				.iter()
				.filter_map(|seed| {
					let idx = seed.item_index();
					build(idx, &chunk.items()[idx])
				})
				.collect(),
			None => chunk
				.items()
				.iter()
				.enumerate()
				.filter_map(|(idx, item)| build(idx, item))
				.collect(),
		};

		if self.is_cacheable() {
			cache.add(chunk, key, &matches);
		}
		matches
	}

	/// Match a single item. Returns `None` when the item does not satisfy
	/// the pattern.
	#[must_use]
	pub fn match_item(&self, item: &Item, with_pos: bool, slab: &mut Slab) -> Option<ItemMatch> {
		if self.extended {
			let (offsets, score, positions) = self.extended_match(item, with_pos, slab);
			if offsets.len() == self.term_sets.len() {
				return Some(ItemMatch {
					offsets,
					score,
					positions,
				});
			}
			return None;
		}
		let (hit, positions) = self.basic_match(item, with_pos, slab);
		let (offset, score) = hit?;
		Some(ItemMatch {
			offsets: vec![offset],
			score,
			positions,
		})
	}

	fn regions<'a>(&self, item: &'a Item) -> Vec<Region<'a>> {
		if self.nth.is_empty() {
			return vec![Region {
				text: item.text(),
				prefix_length: 0,
			}];
		}
		item.transformed_tokens(|| {
			transform(
				&tokenize(&item.text().to_string(), &self.delimiter),
				&self.nth,
			)
		})
		.iter()
		.map(|token| Region {
			text: &token.text,
			prefix_length: token.prefix_length,
		})
		.collect()
	}

	fn basic_match(
		&self,
		item: &Item,
		with_pos: bool,
		slab: &mut Slab,
	) -> (Option<(Offset, i32)>, Option<Vec<usize>>) {
		let regions = self.regions(item);
		let pfun = if self.fuzzy {
			self.fuzzy_algorithm.match_fn()
		} else {
			exact_match_naive as MatchFn
		};
		iter_regions(
			pfun,
			&regions,
			self.case_sensitive,
			self.normalize,
			self.forward,
			&self.text,
			with_pos,
			slab,
		)
	}

	fn extended_match(
		&self,
		item: &Item,
		with_pos: bool,
		slab: &mut Slab,
	) -> (Vec<Offset>, i32, Option<Vec<usize>>) {
		let regions = self.regions(item);
		let mut offsets = Vec::with_capacity(self.term_sets.len());
		let mut total_score = 0i32;
		let mut all_positions = with_pos.then(Vec::new);
		for term_set in &self.term_sets {
			let mut positive: Option<(Offset, i32)> = None;
			let mut set_positions: Option<Vec<usize>> = None;
			let mut absence_confirmed = false;
			let mut inverse_hit = false;
			for term in term_set.terms() {
				let pfun = self.matcher_for(term.kind());
				let (hit, positions) = iter_regions(
					pfun,
					&regions,
					term.is_case_sensitive(),
					self.normalize,
					self.forward,
					term.text(),
					with_pos,
					slab,
				);
				if let Some((offset, score)) = hit {
					if term.is_inverse() {
						inverse_hit = true;
						continue;
					}
					if with_pos {
						set_positions = Some(positions.unwrap_or_else(|| {
							(offset.begin as usize..offset.end as usize).collect()
						}));
					}
					positive = Some((offset, score));
					break;
				} else if term.is_inverse() {
					absence_confirmed = true;
				}
			}
			let satisfied = positive.is_some() || (absence_confirmed && !inverse_hit);
			if satisfied {
				let (offset, score) = positive.unwrap_or((Offset::default(), 0));
				offsets.push(offset);
				total_score += score;
				if let (Some(all), Some(found)) = (all_positions.as_mut(), set_positions) {
					all.extend(found);
				}
			}
		}
		(offsets, total_score, all_positions)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::{SearchOptions, default_item_builder};
	use crate::store::{CHUNK_SIZE, ChunkList};
	use crate::tokenize::{Delimiter, FieldRange};

	fn item(text: &str) -> Item {
		Item::new(Chars::from(text))
	}

	fn matches(options: &SearchOptions, query: &str, text: &str) -> bool {
		let pattern = Pattern::parse(options, query);
		let mut slab = Slab::default();
		pattern.match_item(&item(text), false, &mut slab).is_some()
	}

	fn extended_matches(query: &str, text: &str) -> bool {
		matches(&SearchOptions::default(), query, text)
	}

	#[test]
	fn term_sets_are_anded() {
		assert!(extended_matches("quick fox", "the quick brown fox"));
		assert!(!extended_matches("quick cat", "the quick brown fox"));
	}

	#[test]
	fn terms_within_a_set_are_ored() {
		assert!(extended_matches("cat | fox", "the quick brown fox"));
		assert!(!extended_matches("cat | dog", "the quick brown fox"));
	}

	#[test]
	fn inverse_terms_veto_matches() {
		assert!(extended_matches("fox !cat", "the quick brown fox"));
		assert!(!extended_matches("fox !quick", "the quick brown fox"));
	}

	#[test]
	fn inverse_only_set_requires_every_body_absent() {
		// Present in either order, one body occurring spoils the set.
		assert!(!extended_matches("!quick | !fox", "the quick brown fox"));
		assert!(!extended_matches("!fox | !quick", "the quick brown fox"));
		assert!(extended_matches("!cat | !dog", "the quick brown fox"));
	}

	#[test]
	fn inverse_only_pattern_matches_on_absence() {
		assert!(extended_matches("!cat", "the quick brown fox"));
		assert!(!extended_matches("!fox", "the quick brown fox"));
	}

	#[test]
	fn anchored_terms() {
		assert!(extended_matches("^the", "the quick brown fox"));
		assert!(!extended_matches("^quick", "the quick brown fox"));
		assert!(extended_matches("fox$", "the quick brown fox"));
		assert!(!extended_matches("the$", "the quick brown fox"));
		assert!(extended_matches("^exact$", "exact"));
		assert!(!extended_matches("^exact$", "exactly"));
	}

	#[test]
	fn scores_accumulate_across_sets() {
		let pattern = Pattern::parse(&SearchOptions::default(), "quick fox");
		let mut slab = Slab::default();
		let both = pattern
			.match_item(&item("the quick brown fox"), false, &mut slab)
			.unwrap();
		assert_eq!(both.offsets.len(), 2);

		let single = Pattern::parse(&SearchOptions::default(), "quick");
		let single = single
			.match_item(&item("the quick brown fox"), false, &mut slab)
			.unwrap();
		assert!(both.score > single.score);
	}

	#[test]
	fn positions_cover_every_matched_set() {
		let pattern = Pattern::parse(&SearchOptions::default(), "'quick fox");
		let mut slab = Slab::default();
		let matched = pattern
			.match_item(&item("the quick brown fox"), true, &mut slab)
			.unwrap();
		let mut positions = matched.positions.unwrap();
		positions.sort_unstable();
		assert_eq!(positions, vec![4, 5, 6, 7, 8, 16, 17, 18]);
	}

	#[test]
	fn field_selection_restricts_matching() {
		let options = SearchOptions {
			nth: vec![FieldRange::single(2)],
			delimiter: Delimiter::default(),
			..SearchOptions::default()
		};
		assert!(matches(&options, "bar", "foo bar baz"));
		assert!(!matches(&options, "foo", "foo bar baz"));

		// Offsets are shifted back onto the whole line.
		let pattern = Pattern::parse(&options, "bar");
		let mut slab = Slab::default();
		let matched = pattern
			.match_item(&item("foo bar baz"), false, &mut slab)
			.unwrap();
		assert_eq!(matched.offsets[0], Offset { begin: 4, end: 7 });
	}

	#[test]
	fn out_of_range_fields_match_nothing() {
		let options = SearchOptions {
			nth: vec![FieldRange::single(9)],
			..SearchOptions::default()
		};
		assert!(!matches(&options, "foo", "foo bar baz"));
	}

	#[test]
	fn basic_mode_matches_the_whole_query() {
		let options = SearchOptions {
			extended: false,
			..SearchOptions::default()
		};
		assert!(matches(&options, "qbf", "the quick brown fox"));
		assert!(!matches(&options, "qfb", "the quick brown fox"));
	}

	#[test]
	fn empty_pattern_matches_everything_at_this_level() {
		let pattern = Pattern::parse(&SearchOptions::default(), "");
		let mut slab = Slab::default();
		assert!(pattern.match_item(&item("anything"), false, &mut slab).is_some());
	}

	#[test]
	fn seeded_chunk_match_equals_full_scan() {
		let options = SearchOptions {
			cacheable: true,
			..SearchOptions::default()
		};
		let list = ChunkList::new(default_item_builder());
		for idx in 0..CHUNK_SIZE {
			// A few lines contain "needle"; the rest do not.
			let line = if idx % 9 == 0 {
				format!("needle-{idx}")
			} else {
				format!("straw-{idx}")
			};
			assert!(list.push(line.as_bytes()));
		}
		let (chunks, _) = list.snapshot();
		let chunk = &chunks[0];
		let cache = ChunkCache::new();
		let criteria = [Criterion::Score, Criterion::Length];
		let mut slab = Slab::default();

		let short = Pattern::parse(&options, "needle");
		let full_scan = short.match_chunk(chunk, &cache, &criteria, &mut slab);
		assert!(!full_scan.is_empty());
		// The shorter query is now cached; the longer one is seeded from it.
		let long = Pattern::parse(&options, "needle-1");
		let seeded = long.match_chunk(chunk, &cache, &criteria, &mut slab);

		let fresh_cache = ChunkCache::new();
		let scanned = long.match_chunk(chunk, &fresh_cache, &criteria, &mut slab);
		let indices = |results: &[MatchResult]| -> Vec<usize> {
			results.iter().map(MatchResult::item_index).collect()
		};
		assert_eq!(indices(&seeded), indices(&scanned));
	}

	#[test]
	fn cached_chunk_match_is_returned_verbatim() {
		let options = SearchOptions {
			cacheable: true,
			..SearchOptions::default()
		};
		let list = ChunkList::new(default_item_builder());
		for idx in 0..CHUNK_SIZE {
			assert!(list.push(format!("row-{idx}").as_bytes()));
		}
		let (chunks, _) = list.snapshot();
		let chunk = &chunks[0];
		let cache = ChunkCache::new();
		let criteria = [Criterion::Score, Criterion::Length];
		let mut slab = Slab::default();

		let pattern = Pattern::parse(&options, "row-7");
		let first = pattern.match_chunk(chunk, &cache, &criteria, &mut slab);
		let second = pattern.match_chunk(chunk, &cache, &criteria, &mut slab);
		assert_eq!(
			first.iter().map(MatchResult::item_index).collect::<Vec<_>>(),
			second.iter().map(MatchResult::item_index).collect::<Vec<_>>()
		);
	}
}
