//! Tracks which fixed-size chunks of a progressively-loaded stream have
//! arrived, and serves byte-level reads out of whatever has been cached so
//! far. Shared by the HTTP stream implementations; a local file stream has
//! no need for it since every byte is available immediately.

use super::error::{PDFError, PDFResult};
use rustc_hash::FxHashMap;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_MAX_CACHED_CHUNKS: usize = 10;

/// Bookkeeping for a single chunk's presence and recency.
struct ChunkEntry {
    data: Vec<u8>,
    last_accessed: u64,
}

/// Chunk-granularity cache over a stream of known total `length`.
pub struct ChunkManager {
    length: usize,
    chunk_size: usize,
    max_cached_chunks: usize,
    chunks: FxHashMap<usize, ChunkEntry>,
    clock: u64,
}

impl ChunkManager {
    /// Creates a manager for a stream of `length` bytes. `chunk_size`
    /// defaults to 64 KiB, `max_cached_chunks` to 10 when `None`.
    pub fn new(length: usize, chunk_size: Option<usize>, max_cached_chunks: Option<usize>) -> Self {
        ChunkManager {
            length,
            chunk_size: chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE).max(1),
            max_cached_chunks: max_cached_chunks.unwrap_or(DEFAULT_MAX_CACHED_CHUNKS).max(1),
            chunks: FxHashMap::default(),
            clock: 0,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Total number of chunks covering the stream.
    pub fn num_chunks(&self) -> usize {
        if self.length == 0 {
            0
        } else {
            (self.length + self.chunk_size - 1) / self.chunk_size
        }
    }

    /// Which chunk a byte position falls into.
    pub fn get_chunk_number(&self, pos: usize) -> usize {
        pos / self.chunk_size
    }

    pub fn has_chunk(&self, chunk_num: usize) -> bool {
        self.chunks.contains_key(&chunk_num)
    }

    /// Bumps the recency clock for an already-cached chunk without
    /// re-fetching it.
    pub fn mark_chunk_accessed(&mut self, chunk_num: usize) {
        self.clock += 1;
        let clock = self.clock;
        if let Some(entry) = self.chunks.get_mut(&chunk_num) {
            entry.last_accessed = clock;
        }
    }

    /// Records newly-downloaded chunk data, evicting the least-recently-used
    /// chunk if the cache is now over capacity.
    pub fn on_receive_data(&mut self, chunk_num: usize, data: Vec<u8>) -> PDFResult<()> {
        self.clock += 1;
        let clock = self.clock;
        self.chunks.insert(
            chunk_num,
            ChunkEntry {
                data,
                last_accessed: clock,
            },
        );

        if self.chunks.len() > self.max_cached_chunks {
            if let Some((&evict, _)) = self
                .chunks
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
            {
                self.chunks.remove(&evict);
            }
        }

        Ok(())
    }

    /// The raw bytes of a cached chunk, if present.
    pub fn get_chunk(&self, chunk_num: usize) -> Option<&Vec<u8>> {
        self.chunks.get(&chunk_num).map(|entry| &entry.data)
    }

    /// Reads a single byte out of the cache, failing if its chunk hasn't
    /// arrived yet.
    pub fn get_byte_from_cache(&self, pos: usize) -> PDFResult<u8> {
        let chunk_num = self.get_chunk_number(pos);
        let entry = self
            .chunks
            .get(&chunk_num)
            .ok_or(PDFError::DataNotLoaded { chunk: chunk_num })?;
        let offset = pos - chunk_num * self.chunk_size;
        entry
            .data
            .get(offset)
            .copied()
            .ok_or(PDFError::DataNotLoaded { chunk: chunk_num })
    }

    pub fn num_chunks_loaded(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_data_loaded(&self) -> bool {
        self.num_chunks_loaded() >= self.num_chunks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_chunk_count_from_length() {
        let manager = ChunkManager::new(150, Some(64), None);
        assert_eq!(manager.num_chunks(), 3);
        assert_eq!(manager.get_chunk_number(63), 0);
        assert_eq!(manager.get_chunk_number(64), 1);
    }

    #[test]
    fn evicts_least_recently_used_chunk_over_capacity() {
        let mut manager = ChunkManager::new(1000, Some(10), Some(2));
        manager.on_receive_data(0, vec![0; 10]).unwrap();
        manager.on_receive_data(1, vec![1; 10]).unwrap();
        manager.mark_chunk_accessed(0);
        manager.on_receive_data(2, vec![2; 10]).unwrap();

        assert!(manager.has_chunk(0));
        assert!(!manager.has_chunk(1));
        assert!(manager.has_chunk(2));
    }

    #[test]
    fn missing_chunk_reports_data_not_loaded() {
        let manager = ChunkManager::new(100, Some(10), None);
        let err = manager.get_byte_from_cache(5).unwrap_err();
        assert!(matches!(err, PDFError::DataNotLoaded { chunk: 0 }));
    }
}
