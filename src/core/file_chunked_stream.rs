//! The primary byte source (C1): a local file read lazily in fixed-size
//! chunks through a [`ChunkManager`], rather than loaded into memory whole.
//!
//! Reads never raise `DataMissing` — unlike the HTTP sources, a local seek
//! is effectively free, so a missing chunk is simply read from disk
//! on-demand inside the same call. The chunk cache still bounds how much of
//! the file is held in memory at once and lets repeated reads of the same
//! region (the header, the trailer, a hot object) skip the syscall.

use super::base_stream::BaseStream;
use super::chunk_manager::ChunkManager;
use super::error::{PDFError, PDFResult};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Arc, Mutex};

struct Shared {
    file: Mutex<File>,
    manager: Mutex<ChunkManager>,
}

impl Shared {
    fn ensure_chunk(&self, chunk_num: usize) -> PDFResult<()> {
        {
            let mut manager = self.manager.lock().unwrap();
            if manager.has_chunk(chunk_num) {
                manager.mark_chunk_accessed(chunk_num);
                return Ok(());
            }
        }

        let (chunk_size, total_length) = {
            let manager = self.manager.lock().unwrap();
            (manager.chunk_size(), manager.length())
        };
        let start = chunk_num * chunk_size;
        let end = (start + chunk_size).min(total_length);
        if start >= end {
            return Err(PDFError::InvalidByteRange { begin: start, end });
        }

        let mut buf = vec![0u8; end - start];
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(start as u64))?;
        file.read_exact(&mut buf)?;
        drop(file);

        let mut manager = self.manager.lock().unwrap();
        manager.on_receive_data(chunk_num, buf)
    }
}

/// A seekable, chunk-cached view over a local PDF file.
pub struct FileChunkedStream {
    shared: Arc<Shared>,
    start: usize,
    length: usize,
    pos: usize,
}

impl FileChunkedStream {
    /// Opens `path`, sizing the chunk cache from `chunk_size` (bytes,
    /// default 1 MiB) and `max_cached_chunks` (default 64).
    pub fn open(
        path: impl AsRef<Path>,
        chunk_size: Option<usize>,
        max_cached_chunks: Option<usize>,
    ) -> PDFResult<Self> {
        let file = File::open(path)?;
        let length = file.metadata()?.len() as usize;
        let manager = ChunkManager::new(
            length,
            Some(chunk_size.unwrap_or(1024 * 1024)),
            Some(max_cached_chunks.unwrap_or(64)),
        );

        Ok(FileChunkedStream {
            shared: Arc::new(Shared {
                file: Mutex::new(file),
                manager: Mutex::new(manager),
            }),
            start: 0,
            length,
            pos: 0,
        })
    }

    fn absolute_pos(&self) -> usize {
        self.start + self.pos
    }

    /// Reads `[begin, end)` absolute-to-the-file, pulling in whatever
    /// chunks the range spans.
    fn read_absolute_range(&self, begin: usize, end: usize) -> PDFResult<Vec<u8>> {
        if begin > end {
            return Err(PDFError::InvalidByteRange { begin, end });
        }
        if end > self.shared.manager.lock().unwrap().length() {
            return Err(PDFError::InvalidByteRange { begin, end });
        }
        if begin == end {
            return Ok(Vec::new());
        }

        let chunk_size = self.shared.manager.lock().unwrap().chunk_size();
        let first_chunk = begin / chunk_size;
        let last_chunk = (end - 1) / chunk_size;

        let mut out = Vec::with_capacity(end - begin);
        for chunk_num in first_chunk..=last_chunk {
            self.shared.ensure_chunk(chunk_num)?;
            let manager = self.shared.manager.lock().unwrap();
            let chunk_start = chunk_num * chunk_size;
            let data = manager
                .get_chunk(chunk_num)
                .ok_or(PDFError::DataNotLoaded { chunk: chunk_num })?;
            let lo = begin.max(chunk_start) - chunk_start;
            let hi = end.min(chunk_start + data.len()) - chunk_start;
            out.extend_from_slice(&data[lo..hi]);
        }
        Ok(out)
    }

    /// Number of chunks currently resident in the cache.
    pub fn num_chunks_loaded(&self) -> usize {
        self.shared.manager.lock().unwrap().num_chunks_loaded()
    }
}

impl BaseStream for FileChunkedStream {
    fn length(&self) -> usize {
        self.length
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) -> PDFResult<()> {
        if pos > self.length {
            return Err(PDFError::InvalidPosition {
                pos,
                length: self.length,
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn is_data_loaded(&self) -> bool {
        self.shared.manager.lock().unwrap().is_data_loaded()
    }

    fn get_byte(&mut self) -> PDFResult<u8> {
        if self.pos >= self.length {
            return Err(PDFError::UnexpectedEndOfStream);
        }
        let abs = self.absolute_pos();
        let bytes = self.read_absolute_range(abs, abs + 1)?;
        self.pos += 1;
        Ok(bytes[0])
    }

    fn get_bytes(&mut self, length: usize) -> PDFResult<Vec<u8>> {
        let actual_length = length.min(self.length - self.pos);
        let abs = self.absolute_pos();
        let bytes = self.read_absolute_range(abs, abs + actual_length)?;
        self.pos += bytes.len();
        Ok(bytes)
    }

    fn get_byte_range(&self, begin: usize, end: usize) -> PDFResult<Vec<u8>> {
        if begin > end || end > self.length {
            return Err(PDFError::InvalidByteRange { begin, end });
        }
        self.read_absolute_range(self.start + begin, self.start + end)
    }

    fn reset(&mut self) -> PDFResult<()> {
        self.pos = 0;
        Ok(())
    }

    fn move_start(&mut self) -> PDFResult<()> {
        if self.pos > 0 {
            self.start += self.pos;
            self.length -= self.pos;
            self.pos = 0;
        }
        Ok(())
    }

    fn make_sub_stream(&self, start: usize, length: usize) -> PDFResult<Box<dyn BaseStream>> {
        if start + length > self.length {
            return Err(PDFError::InvalidByteRange {
                begin: start,
                end: start + length,
            });
        }
        Ok(Box::new(FileChunkedStream {
            shared: Arc::clone(&self.shared),
            start: self.start + start,
            length,
            pos: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_across_chunk_boundary() {
        let data: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
        let file = write_temp(&data);
        let mut stream = FileChunkedStream::open(file.path(), Some(1024), Some(2)).unwrap();

        let got = stream.get_byte_range(1000, 1100).unwrap();
        assert_eq!(got, data[1000..1100]);
    }

    #[test]
    fn sub_stream_is_relative_to_parent() {
        let data: Vec<u8> = (0..100u8).collect();
        let file = write_temp(&data);
        let stream = FileChunkedStream::open(file.path(), Some(16), Some(4)).unwrap();
        let mut sub = stream.make_sub_stream(10, 20).unwrap();

        assert_eq!(sub.get_bytes(5).unwrap(), data[10..15]);
    }

    #[test]
    fn evicts_chunks_beyond_cache_size() {
        let data: Vec<u8> = (0..200u8).cycle().take(10_000).collect();
        let file = write_temp(&data);
        let mut stream = FileChunkedStream::open(file.path(), Some(1024), Some(2)).unwrap();

        for offset in (0..data.len()).step_by(1024) {
            let _ = stream.get_byte_range(offset, (offset + 1).min(data.len()));
        }
        assert!(stream.num_chunks_loaded() <= 2);
    }
}
