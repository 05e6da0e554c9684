//! A single search candidate.

use std::sync::OnceLock;

use sift_algo::Chars;

use crate::tokenize::Token;

/// One candidate line. The transformed-field cache is filled on first use
/// and shared by every subsequent match against the item; the engine only
/// ever uses one field selection per session, so the cache never has to be
/// invalidated.
#[derive(Clone, Debug)]
pub struct Item {
	text: Chars,
	transformed: OnceLock<Vec<Token>>,
	orig_text: Option<Box<[u8]>>,
}

impl Item {
	#[must_use]
	pub fn new(text: Chars) -> Self {
		Self {
			text,
			transformed: OnceLock::new(),
			orig_text: None,
		}
	}

	/// Attach the original raw bytes when upstream decoding changed them.
	#[must_use]
	pub fn with_orig_text(text: Chars, orig_text: impl Into<Box<[u8]>>) -> Self {
		Self {
			text,
			transformed: OnceLock::new(),
			orig_text: Some(orig_text.into()),
		}
	}

	/// Ordinal index of the item in the input stream.
	#[must_use]
	pub fn index(&self) -> u32 {
		self.text.index
	}

	#[must_use]
	pub fn text(&self) -> &Chars {
		&self.text
	}

	#[must_use]
	pub fn trim_length(&self) -> u16 {
		self.text.trim_length()
	}

	/// Raw bytes as delivered by the upstream reader, when they differ from
	/// the decoded text.
	#[must_use]
	pub fn orig_text(&self) -> Option<&[u8]> {
		self.orig_text.as_deref()
	}

	pub(crate) fn transformed_tokens(&self, build: impl FnOnce() -> Vec<Token>) -> &[Token] {
		self.transformed.get_or_init(build)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tokenize::{Delimiter, FieldRange, tokenize, transform};

	#[test]
	fn transformed_tokens_are_computed_once() {
		let item = Item::new(Chars::from("one two"));
		let build = || {
			transform(
				&tokenize(&item.text().to_string(), &Delimiter::default()),
				&[FieldRange::single(2)],
			)
		};
		let first = item.transformed_tokens(build).as_ptr();
		let second = item
			.transformed_tokens(|| panic!("must reuse the cached tokens"))
			.as_ptr();
		assert_eq!(first, second);
	}

	#[test]
	fn orig_text_is_optional() {
		let plain = Item::new(Chars::from("abc"));
		assert!(plain.orig_text().is_none());
		let decoded = Item::with_orig_text(Chars::from("abc"), &b"abc\xff"[..]);
		assert_eq!(decoded.orig_text(), Some(&b"abc\xff"[..]));
	}
}
