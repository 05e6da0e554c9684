//! Append-only candidate store.
//!
//! Items are grouped into fixed-size chunks. A chunk that reaches capacity
//! never changes again, which makes its identity a stable key for the
//! result cache and lets snapshot readers share it without locking. Only
//! the partial tail chunk is ever mutated, and snapshots copy it by value.

use std::sync::{Arc, Mutex};

use crate::item::Item;

/// Capacity of each chunk.
pub const CHUNK_SIZE: usize = 100;

/// Builds an [`Item`] from one raw input line, or rejects it.
pub type ItemBuilder = Box<dyn Fn(&[u8]) -> Option<Item> + Send + Sync>;

/// A fixed-capacity run of items. Full chunks are immutable.
#[derive(Clone, Debug, Default)]
pub struct Chunk {
	items: Vec<Item>,
}

impl Chunk {
	fn new() -> Self {
		Self {
			items: Vec::with_capacity(CHUNK_SIZE),
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	#[must_use]
	pub fn is_full(&self) -> bool {
		self.items.len() == CHUNK_SIZE
	}

	#[must_use]
	pub fn items(&self) -> &[Item] {
		&self.items
	}

	fn push(&mut self, builder: &ItemBuilder, data: &[u8]) -> bool {
		match builder(data) {
			Some(item) => {
				self.items.push(item);
				true
			}
			None => false,
		}
	}
}

struct ListState {
	full: Vec<Arc<Chunk>>,
	tail: Chunk,
}

/// Mutex-guarded, append-only list of chunks.
pub struct ChunkList {
	state: Mutex<ListState>,
	builder: ItemBuilder,
}

impl ChunkList {
	#[must_use]
	pub fn new(builder: ItemBuilder) -> Self {
		Self {
			state: Mutex::new(ListState {
				full: Vec::new(),
				tail: Chunk::new(),
			}),
			builder,
		}
	}

	/// Append one input line. Returns whether the builder accepted it.
	pub fn push(&self, data: &[u8]) -> bool {
		let mut state = self.state.lock().unwrap();
		let accepted = state.tail.push(&self.builder, data);
		if state.tail.is_full() {
			let full = std::mem::replace(&mut state.tail, Chunk::new());
			state.full.push(Arc::new(full));
		}
		accepted
	}

	/// Drop every stored item.
	pub fn clear(&self) {
		let mut state = self.state.lock().unwrap();
		state.full.clear();
		state.tail = Chunk::new();
	}

	/// A stable view of the list: full chunks are shared, the partial tail
	/// is copied so later pushes cannot disturb readers. Also returns the
	/// total item count.
	#[must_use]
	pub fn snapshot(&self) -> (Vec<Arc<Chunk>>, usize) {
		let state = self.state.lock().unwrap();
		let mut chunks = state.full.clone();
		if !state.tail.is_empty() {
			chunks.push(Arc::new(state.tail.clone()));
		}
		let count = count_items(&chunks);
		(chunks, count)
	}
}

/// Total number of items across a snapshot; every chunk but the last is
/// known to be full.
#[must_use]
pub fn count_items(chunks: &[Arc<Chunk>]) -> usize {
	match chunks.last() {
		None => 0,
		Some(last) => CHUNK_SIZE * (chunks.len() - 1) + last.len(),
	}
}
