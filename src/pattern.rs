//! Query parsing.
//!
//! The extended syntax splits a query on whitespace into terms and reads a
//! little punctuation off each one:
//!
//! ```text
//! sbtrkt       fuzzy
//! 'wild        exact
//! ^music       prefix-exact
//! .mp3$        suffix-exact
//! !fire        inverse-exact
//! !^music      inverse-prefix-exact
//! ^core$       equal (anchored on both sides)
//! a | b        OR within one term set
//! ```
//!
//! Adjacent term sets are AND-ed. Besides the terms themselves a pattern
//! carries everything derived from them: case sensitivity, whether results
//! can be sorted meaningfully, and whether the search scope may be narrowed
//! from cached results of a related query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use log::debug;
use regex::Regex;
use sift_algo::{
	FuzzyAlgorithm, MatchFn, equal_match, exact_match_naive, normalize_chars, prefix_match,
	suffix_match,
};

use crate::engine::{CaseMatching, SearchOptions};
use crate::tokenize::{Delimiter, FieldRange};

/// How a single term matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermKind {
	Fuzzy,
	Exact,
	Prefix,
	Suffix,
	Equal,
}

/// One parsed search term.
#[derive(Clone, Debug)]
pub struct Term {
	kind: TermKind,
	inverse: bool,
	text: Vec<char>,
	case_sensitive: bool,
}

impl Term {
	#[must_use]
	pub fn kind(&self) -> TermKind {
		self.kind
	}

	/// An inverse term matches when its body does not.
	#[must_use]
	pub fn is_inverse(&self) -> bool {
		self.inverse
	}

	#[must_use]
	pub fn text(&self) -> &[char] {
		&self.text
	}

	#[must_use]
	pub fn is_case_sensitive(&self) -> bool {
		self.case_sensitive
	}
}

/// A disjunction of terms; the set matches when any term does.
#[derive(Clone, Debug)]
pub struct TermSet {
	terms: Vec<Term>,
}

impl TermSet {
	#[must_use]
	pub fn terms(&self) -> &[Term] {
		&self.terms
	}
}

/// A parsed query: a conjunction of [`TermSet`]s plus derived flags.
#[derive(Debug)]
pub struct Pattern {
	pub(crate) fuzzy: bool,
	pub(crate) fuzzy_algorithm: FuzzyAlgorithm,
	pub(crate) extended: bool,
	pub(crate) case_sensitive: bool,
	pub(crate) normalize: bool,
	pub(crate) forward: bool,
	pub(crate) text: Vec<char>,
	pub(crate) term_sets: Vec<TermSet>,
	sortable: bool,
	cacheable: bool,
	cache_key: String,
	pub(crate) nth: Vec<FieldRange>,
	pub(crate) delimiter: Delimiter,
}

fn split_regex() -> &'static Regex {
	static SPLIT: OnceLock<Regex> = OnceLock::new();
	SPLIT.get_or_init(|| Regex::new(" +").expect("query splitter regex"))
}

fn trim_query(query: &str, extended: bool) -> String {
	if !extended {
		return query.to_string();
	}
	let mut trimmed = query.trim_start_matches(' ').to_string();
	while trimmed.ends_with(' ') && !trimmed.ends_with("\\ ") {
		trimmed.pop();
	}
	trimmed
}

impl Pattern {
	/// Parse a query under the given options. The query is trimmed of
	/// leading spaces and of unescaped trailing spaces first.
	#[must_use]
	pub fn parse(options: &SearchOptions, query: &str) -> Self {
		let mut as_string = trim_query(query, options.extended);

		let mut case_sensitive = true;
		let mut sortable = true;
		let mut cacheable = options.cacheable;
		let mut term_sets = Vec::new();

		if options.extended {
			term_sets = parse_terms(options.fuzzy, options.case, options.normalize, &as_string);
			// Purely inverse queries produce no meaningful ranking.
			sortable = false;
			'sets: for term_set in &term_sets {
				for (idx, term) in term_set.terms.iter().enumerate() {
					if !term.inverse {
						sortable = true;
					}
					// OR groups, inverse terms and anchored terms break the
					// guarantee that extending the query shrinks the result
					// set, so they disable scope caching.
					if !cacheable
						|| idx > 0 || term.inverse
						|| (options.fuzzy && term.kind != TermKind::Fuzzy)
						|| (!options.fuzzy && term.kind != TermKind::Exact)
					{
						cacheable = false;
						if sortable {
							// Keep scanning until a non-inverse term proves
							// the pattern sortable.
							break 'sets;
						}
					}
				}
			}
		} else {
			let lower = as_string.to_lowercase();
			case_sensitive = options.case == CaseMatching::Respect
				|| (options.case == CaseMatching::Smart && lower != as_string);
			if !case_sensitive {
				as_string = lower;
			}
		}

		let mut pattern = Self {
			fuzzy: options.fuzzy,
			fuzzy_algorithm: options.fuzzy_algorithm,
			extended: options.extended,
			case_sensitive,
			normalize: options.normalize,
			forward: options.forward,
			text: as_string.chars().collect(),
			term_sets,
			sortable,
			cacheable,
			cache_key: String::new(),
			nth: options.nth.clone(),
			delimiter: options.delimiter.clone(),
		};
		pattern.cache_key = pattern.build_cache_key();
		debug!(
			"parsed pattern {:?}: {} set(s), sortable={}, cacheable={}",
			as_string_of(&pattern.text),
			pattern.term_sets.len(),
			pattern.sortable,
			pattern.cacheable
		);
		pattern
	}

	/// True when parsing left nothing to match: the query was empty or
	/// reduced to empty terms.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		if !self.extended {
			return self.text.is_empty();
		}
		self.term_sets.is_empty()
	}

	/// The trimmed query text.
	#[must_use]
	pub fn as_string(&self) -> String {
		as_string_of(&self.text)
	}

	#[must_use]
	pub fn term_sets(&self) -> &[TermSet] {
		&self.term_sets
	}

	/// Whether results of this pattern are worth sorting; false when every
	/// term is inverse.
	#[must_use]
	pub fn is_sortable(&self) -> bool {
		self.sortable
	}

	/// Whether the search scope may be narrowed from cached results.
	#[must_use]
	pub fn is_cacheable(&self) -> bool {
		self.cacheable
	}

	/// Key identifying this pattern's cacheable semantics: the query text
	/// in basic mode, the tab-joined cacheable term texts in extended mode.
	#[must_use]
	pub fn cache_key(&self) -> &str {
		&self.cache_key
	}

	fn build_cache_key(&self) -> String {
		if !self.extended {
			return self.as_string();
		}
		let cacheable_terms: Vec<String> = self
			.term_sets
			.iter()
			.filter_map(|set| match set.terms() {
				[term]
					if !term.inverse
						&& (self.fuzzy || term.kind == TermKind::Exact) =>
				{
					Some(term.text.iter().collect())
				}
				_ => None,
			})
			.collect();
		cacheable_terms.join("\t")
	}

	pub(crate) fn matcher_for(&self, kind: TermKind) -> MatchFn {
		match kind {
			TermKind::Fuzzy => self.fuzzy_algorithm.match_fn(),
			TermKind::Exact => exact_match_naive,
			TermKind::Prefix => prefix_match,
			TermKind::Suffix => suffix_match,
			TermKind::Equal => equal_match,
		}
	}
}

fn as_string_of(text: &[char]) -> String {
	text.iter().collect()
}

fn parse_terms(fuzzy: bool, case: CaseMatching, normalize: bool, query: &str) -> Vec<TermSet> {
	// Escaped spaces survive tokenization as tabs.
	let sanitized = query.replace("\\ ", "\t");
	let mut sets: Vec<TermSet> = Vec::new();
	let mut set: Vec<Term> = Vec::new();
	let mut switch_set = false;
	let mut after_bar = false;
	for token in split_regex().split(&sanitized) {
		let mut kind = if fuzzy { TermKind::Fuzzy } else { TermKind::Exact };
		let mut inverse = false;
		let mut text = token.replace('\t', " ");
		let lower = text.to_lowercase();
		let case_sensitive = case == CaseMatching::Respect
			|| (case == CaseMatching::Smart && text != lower);
		if !case_sensitive {
			text = lower;
		}

		if !set.is_empty() && !after_bar && text == "|" {
			switch_set = false;
			after_bar = true;
			continue;
		}
		after_bar = false;

		if let Some(stripped) = text.strip_prefix('!') {
			inverse = true;
			kind = TermKind::Exact;
			text = stripped.to_string();
		}

		if text != "$" && text.ends_with('$') {
			kind = TermKind::Suffix;
			text.pop();
		}

		if let Some(stripped) = text.strip_prefix('\'') {
			// Quoting flips exactness.
			kind = if fuzzy && !inverse {
				TermKind::Exact
			} else {
				TermKind::Fuzzy
			};
			text = stripped.to_string();
		} else if let Some(stripped) = text.strip_prefix('^') {
			kind = if kind == TermKind::Suffix {
				TermKind::Equal
			} else {
				TermKind::Prefix
			};
			text = stripped.to_string();
		}

		if !text.is_empty() {
			if switch_set {
				sets.push(TermSet { terms: set });
				set = Vec::new();
			}
			let mut text: Vec<char> = text.chars().collect();
			if normalize {
				text = normalize_chars(&text);
			}
			set.push(Term {
				kind,
				inverse,
				text,
				case_sensitive,
			});
			switch_set = true;
		}
	}
	if !set.is_empty() {
		sets.push(TermSet { terms: set });
	}
	sets
}

/// Cache of parsed patterns, keyed by the trimmed query string. Parsing the
/// same query twice hands back the same [`Arc`], which also makes pattern
/// identity a cheap equality check for embedders.
#[derive(Default)]
pub struct PatternCache {
	map: Mutex<HashMap<String, Arc<Pattern>>>,
}

impl PatternCache {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse `query` or return the cached pattern for it. Valid for as long
	/// as the options do not change, which the owning searcher guarantees.
	#[must_use]
	pub fn pattern(&self, options: &SearchOptions, query: &str) -> Arc<Pattern> {
		let key = trim_query(query, options.extended);
		let mut map = self.map.lock().unwrap();
		if let Some(cached) = map.get(&key) {
			return Arc::clone(cached);
		}
		let pattern = Arc::new(Pattern::parse(options, &key));
		map.insert(key, Arc::clone(&pattern));
		pattern
	}

	pub fn clear(&self) {
		self.map.lock().unwrap().clear();
	}
}
