//! Field tokenization and `nth`-range selection.
//!
//! Items can be matched against a subset of their fields instead of the
//! whole line. [`tokenize`] splits a line into fields (AWK-style by
//! default, or by a literal/regex delimiter), and [`transform`] selects and
//! joins fields according to a list of [`FieldRange`] expressions. Each
//! resulting [`Token`] remembers how many characters precede it so match
//! offsets can be mapped back onto the original line.

use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sift_algo::Chars;
use thiserror::Error;

/// Open endpoint in a range expression, as in `..3` or `2..`.
pub const RANGE_ELLIPSIS: i32 = 0;

/// A 1-based field range. Negative endpoints count from the last field;
/// [`RANGE_ELLIPSIS`] leaves the endpoint open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRange {
	pub begin: i32,
	pub end: i32,
}

impl FieldRange {
	/// Range selecting the single field `n`.
	#[must_use]
	pub fn single(n: i32) -> Self {
		Self { begin: n, end: n }
	}
}

/// A range expression that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid field range: {0:?}")]
pub struct ParseRangeError(String);

impl FromStr for FieldRange {
	type Err = ParseRangeError;

	/// Parse the forms `N`, `N..`, `..N`, `N..M` and `..`, where endpoints
	/// are non-zero and may be negative.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ParseRangeError(s.to_string());
		let endpoint = |part: &str| -> Result<i32, ParseRangeError> {
			match part.parse::<i32>() {
				Ok(0) | Err(_) => Err(err()),
				Ok(n) => Ok(n),
			}
		};
		if s == ".." {
			return Ok(Self {
				begin: RANGE_ELLIPSIS,
				end: RANGE_ELLIPSIS,
			});
		}
		if let Some(rest) = s.strip_prefix("..") {
			return Ok(Self {
				begin: RANGE_ELLIPSIS,
				end: endpoint(rest)?,
			});
		}
		if let Some(rest) = s.strip_suffix("..") {
			return Ok(Self {
				begin: endpoint(rest)?,
				end: RANGE_ELLIPSIS,
			});
		}
		if let Some((begin, end)) = s.split_once("..") {
			return Ok(Self {
				begin: endpoint(begin)?,
				end: endpoint(end)?,
			});
		}
		let n = endpoint(s)?;
		Ok(Self::single(n))
	}
}

/// How a line is split into fields. The default splits AWK-style on runs
/// of spaces and tabs, keeping trailing whitespace attached to each field.
#[derive(Clone, Debug, Default)]
pub struct Delimiter {
	text: Option<String>,
	regex: Option<Regex>,
}

impl Delimiter {
	/// Split after every occurrence of a literal separator.
	#[must_use]
	pub fn literal(sep: impl Into<String>) -> Self {
		Self {
			text: Some(sep.into()),
			regex: None,
		}
	}

	/// Split after every match of a regular expression.
	pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
		Ok(Self {
			text: None,
			regex: Some(Regex::new(pattern)?),
		})
	}
}

/// One field of a line, plus the number of characters preceding it.
#[derive(Clone, Debug)]
pub struct Token {
	pub text: Chars,
	pub prefix_length: u32,
}

fn with_prefix_lengths(parts: Vec<&str>, begin: usize) -> Vec<Token> {
	let mut prefix_length = begin;
	parts
		.into_iter()
		.map(|part| {
			let text = Chars::from(part);
			let token = Token {
				prefix_length: prefix_length as u32,
				text,
			};
			prefix_length += token.text.len();
			token
		})
		.collect()
}

/// Split on runs of spaces and tabs, keeping each run attached to the
/// preceding field. Returns the fields and the length of the leading
/// whitespace.
fn awk_tokenizer(input: &str) -> (Vec<&str>, usize) {
	enum State {
		Leading,
		Word,
		Trailing,
	}
	let mut ret = Vec::new();
	let mut prefix_length = 0usize;
	let mut state = State::Leading;
	let (mut begin, mut end) = (0usize, 0usize);
	for (idx, &byte) in input.as_bytes().iter().enumerate() {
		let white = byte == b'\t' || byte == b' ';
		match state {
			State::Leading => {
				if white {
					prefix_length += 1;
				} else {
					state = State::Word;
					begin = idx;
					end = idx + 1;
				}
			}
			State::Word => {
				end = idx + 1;
				if white {
					state = State::Trailing;
				}
			}
			State::Trailing => {
				if white {
					end = idx + 1;
				} else {
					ret.push(&input[begin..end]);
					state = State::Word;
					begin = idx;
					end = idx + 1;
				}
			}
		}
	}
	if begin < end {
		ret.push(&input[begin..end]);
	}
	(ret, prefix_length)
}

fn split_after<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
	if sep.is_empty() {
		return text
			.char_indices()
			.map(|(idx, c)| &text[idx..idx + c.len_utf8()])
			.collect();
	}
	let mut out = Vec::new();
	let mut rest = text;
	while let Some(pos) = rest.find(sep) {
		let cut = pos + sep.len();
		out.push(&rest[..cut]);
		rest = &rest[cut..];
	}
	out.push(rest);
	out
}

/// Split `text` into tokens using the delimiter.
#[must_use]
pub fn tokenize(text: &str, delimiter: &Delimiter) -> Vec<Token> {
	if let Some(regex) = &delimiter.regex {
		let mut parts = Vec::new();
		let mut rest = text;
		while !rest.is_empty() {
			let cut = match regex.find(rest) {
				None => rest.len(),
				// An empty match still has to consume one character.
				Some(m) if m.end() == 0 => {
					rest.chars().next().map_or(rest.len(), char::len_utf8)
				}
				Some(m) => m.end(),
			};
			let (part, remainder) = rest.split_at(cut);
			parts.push(part);
			rest = remainder;
		}
		return with_prefix_lengths(parts, 0);
	}
	if let Some(sep) = &delimiter.text {
		return with_prefix_lengths(split_after(text, sep), 0);
	}
	let (parts, prefix_length) = awk_tokenizer(text);
	with_prefix_lengths(parts, prefix_length)
}

/// Concatenate token texts back into one string.
#[must_use]
pub fn join_tokens(tokens: &[Token]) -> String {
	let mut out = String::new();
	for token in tokens {
		out.push_str(&token.text.to_string());
	}
	out
}

/// Select and join fields per the given ranges. Out-of-range indices yield
/// empty tokens; each output token keeps the prefix length of the first
/// field it covers.
#[must_use]
pub fn transform(tokens: &[Token], with_nth: &[FieldRange]) -> Vec<Token> {
	let num_tokens = tokens.len() as i32;
	let mut trans_tokens = Vec::with_capacity(with_nth.len());
	for range in with_nth {
		let mut parts: Vec<Chars> = Vec::new();
		let mut min_idx = 0i32;
		if range.begin == range.end {
			let mut idx = range.begin;
			if idx == RANGE_ELLIPSIS {
				parts.push(Chars::from(join_tokens(tokens).as_str()));
			} else {
				if idx < 0 {
					idx += num_tokens + 1;
				}
				if idx >= 1 && idx <= num_tokens {
					min_idx = idx - 1;
					parts.push(tokens[(idx - 1) as usize].text.clone());
				}
			}
		} else {
			let (mut begin, mut end) = (range.begin, range.end);
			if begin == RANGE_ELLIPSIS {
				begin = 1;
				if end < 0 {
					end += num_tokens + 1;
				}
			} else if end == RANGE_ELLIPSIS {
				end = num_tokens;
				if begin < 0 {
					begin += num_tokens + 1;
				}
			} else {
				if begin < 0 {
					begin += num_tokens + 1;
				}
				if end < 0 {
					end += num_tokens + 1;
				}
			}
			min_idx = begin.max(1) - 1;
			for idx in begin.max(1)..=end.min(num_tokens) {
				parts.push(tokens[(idx - 1) as usize].text.clone());
			}
		}
		let merged = match parts.len() {
			0 => Chars::default(),
			1 => parts.swap_remove(0),
			_ => {
				let mut joined = String::new();
				for part in &parts {
					joined.push_str(&part.to_string());
				}
				Chars::from(joined.as_str())
			}
		};
		let prefix_length = if min_idx < num_tokens && min_idx >= 0 {
			tokens[min_idx as usize].prefix_length
		} else {
			0
		};
		trans_tokens.push(Token {
			text: merged,
			prefix_length,
		});
	}
	trans_tokens
}
