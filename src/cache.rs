//! Per-chunk memoization of match results.
//!
//! Keyed on chunk identity and the pattern's cache key. Only full chunks
//! are admitted (partial chunks are still growing), and only sufficiently
//! selective result lists (at most a fifth of the chunk) are stored, since
//! near-complete scans are barely cheaper to replay than to redo.
//!
//! Besides exact lookups the cache answers prefix/suffix probes: when a
//! query grows or shrinks by a few characters, a previously cached result
//! list for a shorter key is a valid superset to re-match against.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::trace;

use crate::rank::MatchResult;
use crate::store::{CHUNK_SIZE, Chunk};

/// Result lists larger than this are not cached.
pub const QUERY_CACHE_MAX: usize = CHUNK_SIZE / 5;

type QueryCache = HashMap<String, Vec<MatchResult>>;

struct ChunkEntry {
	// Keeps the chunk alive so its address cannot be recycled while it is
	// used as a key.
	_chunk: Arc<Chunk>,
	queries: QueryCache,
}

/// Two-level map from chunk identity to query key to result list.
#[derive(Default)]
pub struct ChunkCache {
	inner: Mutex<HashMap<usize, ChunkEntry>>,
}

fn chunk_key(chunk: &Arc<Chunk>) -> usize {
	Arc::as_ptr(chunk) as usize
}

impl ChunkCache {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Store a result list, subject to the admission gates.
	pub fn add(&self, chunk: &Arc<Chunk>, key: &str, list: &[MatchResult]) {
		if key.is_empty() || !chunk.is_full() || list.len() > QUERY_CACHE_MAX {
			return;
		}
		let mut inner = self.inner.lock().unwrap();
		let entry = inner.entry(chunk_key(chunk)).or_insert_with(|| ChunkEntry {
			_chunk: Arc::clone(chunk),
			queries: QueryCache::new(),
		});
		entry.queries.insert(key.to_string(), list.to_vec());
	}

	/// Exact lookup for `(chunk, key)`.
	#[must_use]
	pub fn lookup(&self, chunk: &Arc<Chunk>, key: &str) -> Option<Vec<MatchResult>> {
		if key.is_empty() || !chunk.is_full() {
			return None;
		}
		let inner = self.inner.lock().unwrap();
		inner
			.get(&chunk_key(chunk))
			.and_then(|entry| entry.queries.get(key))
			.cloned()
	}

	/// Probe inner-shrinking prefixes and suffixes of `key` and return the
	/// first cached list found. The caller treats it as a search scope, not
	/// as an answer.
	#[must_use]
	pub fn search(&self, chunk: &Arc<Chunk>, key: &str) -> Option<Vec<MatchResult>> {
		if key.is_empty() || !chunk.is_full() {
			return None;
		}
		let inner = self.inner.lock().unwrap();
		let queries = &inner.get(&chunk_key(chunk))?.queries;
		for idx in 1..key.len() {
			let prefix_end = key.len() - idx;
			if key.is_char_boundary(prefix_end)
				&& let Some(cached) = queries.get(&key[..prefix_end])
			{
				trace!("seeding {key:?} from cached prefix {:?}", &key[..prefix_end]);
				return Some(cached.clone());
			}
			if key.is_char_boundary(idx)
				&& let Some(cached) = queries.get(&key[idx..])
			{
				trace!("seeding {key:?} from cached suffix {:?}", &key[idx..]);
				return Some(cached.clone());
			}
		}
		None
	}

	/// Drop every cached entry.
	pub fn clear(&self) {
		self.inner.lock().unwrap().clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::default_item_builder;
	use crate::rank::MatchResult;
	use crate::store::ChunkList;

	fn full_chunk() -> Arc<Chunk> {
		let list = ChunkList::new(default_item_builder());
		for idx in 0..CHUNK_SIZE {
			assert!(list.push(format!("line-{idx}").as_bytes()));
		}
		let (chunks, _) = list.snapshot();
		Arc::clone(&chunks[0])
	}

	fn partial_chunk() -> Arc<Chunk> {
		let list = ChunkList::new(default_item_builder());
		assert!(list.push(b"alone"));
		let (chunks, _) = list.snapshot();
		Arc::clone(&chunks[0])
	}

	fn results(chunk: &Arc<Chunk>, count: usize) -> Vec<MatchResult> {
		(0..count)
			.map(|idx| MatchResult::new(Arc::clone(chunk), idx, [0; 4]))
			.collect()
	}

	#[test]
	fn add_and_lookup_round_trip() {
		let cache = ChunkCache::new();
		let chunk = full_chunk();
		let list = results(&chunk, 3);
		cache.add(&chunk, "abc", &list);
		let cached = cache.lookup(&chunk, "abc").unwrap();
		assert_eq!(cached.len(), 3);
		assert!(cache.lookup(&chunk, "abd").is_none());
	}

	#[test]
	fn rejects_partial_chunks_and_empty_keys() {
		let cache = ChunkCache::new();
		let partial = partial_chunk();
		cache.add(&partial, "abc", &results(&partial, 1));
		assert!(cache.lookup(&partial, "abc").is_none());

		let full = full_chunk();
		cache.add(&full, "", &results(&full, 1));
		assert!(cache.lookup(&full, "").is_none());
	}

	#[test]
	fn rejects_low_selectivity_lists() {
		let cache = ChunkCache::new();
		let chunk = full_chunk();
		cache.add(&chunk, "e", &results(&chunk, QUERY_CACHE_MAX + 1));
		assert!(cache.lookup(&chunk, "e").is_none());
		cache.add(&chunk, "ee", &results(&chunk, QUERY_CACHE_MAX));
		assert!(cache.lookup(&chunk, "ee").is_some());
	}

	#[test]
	fn search_probes_prefixes_and_suffixes() {
		let cache = ChunkCache::new();
		let chunk = full_chunk();
		cache.add(&chunk, "abc", &results(&chunk, 2));

		// Longer queries seed from the cached prefix...
		assert_eq!(cache.search(&chunk, "abcd").unwrap().len(), 2);
		// ...and from the cached suffix.
		assert_eq!(cache.search(&chunk, "xabc").unwrap().len(), 2);
		// Exact key is not probed; unrelated keys miss.
		assert!(cache.search(&chunk, "abc").is_none());
		assert!(cache.search(&chunk, "zzzz").is_none());
	}

	#[test]
	fn inner_probes_prefer_longer_keys() {
		let cache = ChunkCache::new();
		let chunk = full_chunk();
		cache.add(&chunk, "ab", &results(&chunk, 5));
		cache.add(&chunk, "abc", &results(&chunk, 2));
		// "abcd" probes "abc" before "ab".
		assert_eq!(cache.search(&chunk, "abcd").unwrap().len(), 2);
	}

	#[test]
	fn distinct_chunks_do_not_share_entries() {
		let cache = ChunkCache::new();
		let (a, b) = (full_chunk(), full_chunk());
		cache.add(&a, "abc", &results(&a, 1));
		assert!(cache.lookup(&b, "abc").is_none());
	}
}
