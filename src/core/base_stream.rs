//! The `BaseStream` trait: the single seam every byte source (local file,
//! in-memory buffer, HTTP range source) implements. Everything above this
//! layer — the lexer, the xref scanner, `process_in_chunks` — talks to a
//! `dyn BaseStream` and never a concrete source type.

use super::error::PDFResult;

/// A random-access, possibly-partially-loaded byte source.
///
/// Implementations that stream data progressively (e.g. over HTTP) may
/// return [`crate::core::error::PDFError::DataMissing`] from any read method
/// when the requested bytes haven't arrived yet; callers use
/// `retry_on_data_missing!` to fetch the missing range and retry. Local
/// sources such as [`super::file_chunked_stream::FileChunkedStream`] always
/// have all bytes available and never raise it.
pub trait BaseStream: Send {
    /// Total length of the stream in bytes, if known.
    fn length(&self) -> usize;

    /// Whether the stream has zero length.
    fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Current read position.
    fn pos(&self) -> usize;

    /// Moves the read position. Does not itself fetch data.
    fn set_pos(&mut self, pos: usize) -> PDFResult<()>;

    /// Whether every byte in the stream is currently resident in memory.
    fn is_data_loaded(&self) -> bool;

    /// Reads one byte at the current position and advances by one.
    fn get_byte(&mut self) -> PDFResult<u8>;

    /// Reads `length` bytes starting at the current position and advances.
    fn get_bytes(&mut self, length: usize) -> PDFResult<Vec<u8>>;

    /// Reads the half-open range `[begin, end)` without disturbing `pos()`.
    fn get_byte_range(&self, begin: usize, end: usize) -> PDFResult<Vec<u8>>;

    /// Resets the read position to the start of the stream.
    fn reset(&mut self) -> PDFResult<()>;

    /// Marks the current position as the logical start of the stream (used
    /// when a stream is re-sliced after skipping a header).
    fn move_start(&mut self) -> PDFResult<()>;

    /// Creates an independent view over `[start, start + length)` of this
    /// stream, sharing the underlying data rather than copying it.
    fn make_sub_stream(&self, start: usize, length: usize) -> PDFResult<Box<dyn BaseStream>>;

    /// The chain of underlying streams this one is layered on, innermost
    /// last, for sources composed of several decoded/filtered layers.
    /// Direct byte sources (files, buffers) return `None`.
    fn get_base_streams(&self) -> Option<Vec<Box<dyn BaseStream>>> {
        None
    }

    /// The unfiltered stream this one was derived from, if any.
    fn get_original_stream(&self) -> Option<&dyn BaseStream> {
        None
    }
}
