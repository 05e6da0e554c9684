//! End-to-end searches over a small prose corpus.

use sift::{CaseMatching, ChunkList, SearchOptions, Searcher, default_item_builder, search};

const CORPUS: [&str; 10] = [
	"When nobody is around, the trees gossip about the people who have walked under them",
	"She had the gift of being able to paint songs.",
	"He was willing to find the depths of the rabbit hole in order to be with her.",
	"The tortoise jumped into the lake with dreams of becoming a sea turtle.",
	"It didn't make sense unless you had the power to eat colors.",
	"Sometimes I stare at a door or a wall and I wonder what is this reality, why am I alive, and what is this all about?",
	"The book is in front of the table.",
	"Her daily goal was to improve on yesterday.",
	"It was at that moment that he learned there are certain parts of the body that you should never Nair.",
	"There are few things better in life than a slice of pie.",
];

#[test]
fn finds_a_fuzzy_term() {
	let hits = search("daily", CORPUS);
	assert!(hits.contains(&CORPUS[7].to_string()));
}

#[test]
fn finds_every_line_containing_the_term() {
	let hits = search("about", CORPUS);
	assert!(hits.contains(&CORPUS[0].to_string()));
	assert!(hits.contains(&CORPUS[5].to_string()));
}

#[test]
fn empty_query_returns_nothing() {
	assert!(search("", CORPUS).is_empty());
	assert!(search("   ", CORPUS).is_empty());
}

#[test]
fn inverse_term_excludes_lines_in_input_order() {
	let hits = search("!daily", CORPUS);
	let expected: Vec<String> = CORPUS
		.iter()
		.filter(|line| **line != CORPUS[7])
		.map(|line| (*line).to_string())
		.collect();
	assert_eq!(hits, expected);
}

#[test]
fn caret_selects_lines_by_prefix() {
	let hits = search("^The", CORPUS);
	let mut sorted = hits.clone();
	sorted.sort();
	let mut expected: Vec<String> =
		[CORPUS[3], CORPUS[6], CORPUS[9]].iter().map(|l| (*l).to_string()).collect();
	expected.sort();
	assert_eq!(sorted, expected);
	// Ties on score resolve by trimmed length, shortest first.
	assert_eq!(hits[0], CORPUS[6]);
}

#[test]
fn dollar_selects_lines_by_suffix() {
	let hits = search("them$", CORPUS);
	assert_eq!(hits, vec![CORPUS[0].to_string()]);
}

#[test]
fn or_groups_collect_alternatives() {
	let hits = search("'gossip | 'goal", CORPUS);
	let mut sorted = hits.clone();
	sorted.sort();
	let mut expected: Vec<String> =
		[CORPUS[0], CORPUS[7]].iter().map(|l| (*l).to_string()).collect();
	expected.sort();
	assert_eq!(sorted, expected);
}

#[test]
fn terms_are_anded_across_sets() {
	let hits = search("daily improve", CORPUS);
	assert_eq!(hits, vec![CORPUS[7].to_string()]);
	assert!(search("daily gossip", CORPUS).is_empty());
}

#[test]
fn quoting_disables_fuzzy_transpositions() {
	// The characters of "dialy" appear in order across the daily line.
	assert!(search("dialy", CORPUS).contains(&CORPUS[7].to_string()));
	assert!(search("'dialy", CORPUS).is_empty());
}

#[test]
fn smart_case_only_binds_on_uppercase_queries() {
	assert!(search("nair", CORPUS).contains(&CORPUS[8].to_string()));
	assert!(search("'NAIR", CORPUS).is_empty());
	assert!(search("'Nair", CORPUS).contains(&CORPUS[8].to_string()));
}

#[test]
fn escaped_spaces_join_terms() {
	let hits = search("sea\\ turtle", CORPUS);
	assert_eq!(hits, vec![CORPUS[3].to_string()]);
}

#[test]
fn diacritics_fold_onto_ascii_queries() {
	let mut corpus: Vec<&str> = CORPUS.to_vec();
	corpus.push("crème brûlée for dessert");
	let hits = search("'creme", &corpus);
	assert_eq!(hits, vec!["crème brûlée for dessert".to_string()]);
}

#[test]
fn respect_case_rejects_differing_case() {
	let searcher = Searcher::new(SearchOptions {
		case: CaseMatching::Respect,
		..SearchOptions::default()
	});
	let list = ChunkList::new(default_item_builder());
	for line in CORPUS {
		assert!(list.push(line.as_bytes()));
	}
	assert!(searcher.search(&list, "'nair").is_empty());
	assert_eq!(searcher.search(&list, "'Nair").len(), 1);
}

#[test]
fn repeated_queries_hit_the_pattern_cache() {
	let searcher = Searcher::default();
	let list = ChunkList::new(default_item_builder());
	for line in CORPUS {
		assert!(list.push(line.as_bytes()));
	}
	let first = searcher.search(&list, "about");
	let second = searcher.search(&list, "about");
	assert_eq!(
		first.iter().map(|r| r.index()).collect::<Vec<_>>(),
		second.iter().map(|r| r.index()).collect::<Vec<_>>()
	);
}

#[test]
fn results_rank_tighter_matches_first() {
	let corpus = ["a deep subdirectory/path", "adp"];
	let hits = search("adp", corpus);
	assert_eq!(hits.len(), 2);
	// The exact short line outranks the scattered long one.
	assert_eq!(hits[0], "adp");
}
