//! Character buffer shared by the matching primitives.
//!
//! Candidate lines are overwhelmingly ASCII, so the buffer keeps the raw
//! bytes in that case and only decodes into a rune vector when it has to.
//! Either way the public surface is character-addressed: lengths, per-index
//! access and offsets all count characters, never bytes.

use std::fmt;
use std::sync::OnceLock;

#[derive(Clone, Debug)]
enum Storage {
	/// ASCII-only input, kept as raw bytes.
	Bytes(Box<[u8]>),
	/// Decoded characters for anything non-ASCII.
	Runes(Box<[char]>),
}

/// A candidate's text plus its ordinal position in the input stream.
#[derive(Clone, Debug)]
pub struct Chars {
	storage: Storage,
	/// Ordinal index of the owning item in the input stream.
	pub index: u32,
	trim_length: OnceLock<u16>,
}

impl Chars {
	/// Decode raw bytes into a character buffer. Invalid UTF-8 sequences are
	/// replaced rather than rejected, matching how candidate lines are read
	/// from untrusted byte streams.
	#[must_use]
	pub fn new(bytes: &[u8]) -> Self {
		let storage = if bytes.is_ascii() {
			Storage::Bytes(bytes.into())
		} else {
			let decoded: Box<[char]> = String::from_utf8_lossy(bytes).chars().collect();
			Storage::Runes(decoded)
		};
		Self {
			storage,
			index: 0,
			trim_length: OnceLock::new(),
		}
	}

	/// Number of characters in the buffer.
	#[must_use]
	pub fn len(&self) -> usize {
		match &self.storage {
			Storage::Bytes(bytes) => bytes.len(),
			Storage::Runes(runes) => runes.len(),
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Character at `idx`. Panics when out of bounds, like slice indexing.
	#[must_use]
	pub fn get(&self, idx: usize) -> char {
		match &self.storage {
			Storage::Bytes(bytes) => bytes[idx] as char,
			Storage::Runes(runes) => runes[idx],
		}
	}

	/// Raw byte view, available only for ASCII-backed buffers.
	#[must_use]
	pub fn ascii_bytes(&self) -> Option<&[u8]> {
		match &self.storage {
			Storage::Bytes(bytes) => Some(bytes),
			Storage::Runes(_) => None,
		}
	}

	/// Re-encode the buffer as UTF-8 bytes.
	#[must_use]
	pub fn to_bytes(&self) -> Vec<u8> {
		match &self.storage {
			Storage::Bytes(bytes) => bytes.to_vec(),
			Storage::Runes(_) => self.to_string().into_bytes(),
		}
	}

	pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
		(0..self.len()).map(|idx| self.get(idx))
	}

	/// Character count with trailing whitespace removed, saturated to
	/// 16 bits. Computed once and cached; ranking reads it per match.
	#[must_use]
	pub fn trim_length(&self) -> u16 {
		*self.trim_length.get_or_init(|| {
			(self.len() - self.trailing_whitespace()).min(u16::MAX as usize) as u16
		})
	}

	/// Number of leading whitespace characters.
	#[must_use]
	pub fn leading_whitespace(&self) -> usize {
		(0..self.len())
			.take_while(|&idx| self.get(idx).is_whitespace())
			.count()
	}

	/// Number of trailing whitespace characters.
	#[must_use]
	pub fn trailing_whitespace(&self) -> usize {
		(0..self.len())
			.rev()
			.take_while(|&idx| self.get(idx).is_whitespace())
			.count()
	}
}

impl Default for Chars {
	fn default() -> Self {
		Self::new(b"")
	}
}

impl From<&str> for Chars {
	fn from(text: &str) -> Self {
		Self::new(text.as_bytes())
	}
}

impl fmt::Display for Chars {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.storage {
			Storage::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
			Storage::Runes(runes) => runes.iter().try_for_each(|&c| fmt::Write::write_char(f, c)),
		}
	}
}
