//! Error taxonomy for the PDF object store.
//!
//! Every error that can surface from opening a file, walking the xref chain,
//! resolving an object, or extracting a page range is represented here. The
//! taxonomy splits fatal failures (the document cannot be used at all) from
//! recoverable conditions (the caller can skip, retry, or fall back).

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type PDFResult<T> = Result<T, PDFError>;

/// All errors the object store can produce.
///
/// Recoverability is documented per-variant; see the component design notes
/// in the crate's top-level documentation for how each layer reacts to each
/// kind.
#[derive(Debug, Error)]
pub enum PDFError {
    /// The file has neither a `%PDF-` header nor any `N G obj` envelope
    /// found by the fallback scanner. Terminal.
    #[error("not a PDF file: no header or object envelopes found")]
    NotAPdf,

    /// `startxref` could not be located in the trailing bytes of the file.
    /// Terminal.
    #[error("missing startxref marker")]
    MissingStartXref,

    /// The xref table could not be parsed even with liberal tolerance.
    /// Recoverable via the fallback scanner.
    #[error("malformed cross-reference table: {0}")]
    MalformedXRef(String),

    /// The xref at `startxref` is a cross-reference *stream*, which this
    /// store does not decode. Recoverable via the fallback scanner.
    #[error("unsupported xref stream at offset {0}")]
    UnsupportedXRefStream(u64),

    /// No entry exists for an `(object, generation)` pair. The caller may
    /// skip the object.
    #[error("object {0} {1} not found in xref table")]
    MissingObject(u32, u32),

    /// The envelope at the xref-reported offset did not parse, or the
    /// generation in the envelope did not match the request.
    #[error("malformed object {0} {1}: {2}")]
    MalformedObject(u32, u32, String),

    /// The xref entry is a compressed (object-stream) entry. Terminal until
    /// xref-stream / object-stream decoding is implemented.
    #[error("object {0} {1} is compressed in object stream {2}, unsupported")]
    CompressedObject(u32, u32, u32),

    /// No trailer in the `Prev` chain carried a `/Root` entry. Terminal.
    #[error("no /Root found in any trailer")]
    MissingRoot,

    /// The page tree (or an inheritable-property walk) revisited an object
    /// already on the current path. The caller skips the revisit.
    #[error("circular reference detected at object {0} {1}")]
    CircularReference(u32, u32),

    /// Performing the requested read would exceed `max_memory`. The caller
    /// may release resources and retry.
    #[error("memory budget exhausted: {current} + {requested} > {max}")]
    MemoryExhausted {
        current: u64,
        requested: u64,
        max: u64,
    },

    /// The requested byte range falls outside the stream's bounds.
    #[error("invalid byte range {begin}..{end}")]
    InvalidByteRange { begin: usize, end: usize },

    /// A seek moved past the end of the stream.
    #[error("invalid position {pos} (length {length})")]
    InvalidPosition { pos: usize, length: usize },

    /// Read past the end of the underlying byte source.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// A chunk required to answer the read has not been fetched yet. Used by
    /// progressive (network) sources; local file sources never raise this.
    #[error("data missing at position {position} (need {length} bytes)")]
    DataMissing { position: usize, length: usize },

    /// A chunk number was referenced that the chunk manager never received.
    #[error("chunk {chunk} not loaded")]
    DataNotLoaded { chunk: usize },

    /// Underlying I/O (open/seek/read) failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure reaching a network byte source.
    #[error("stream error: {0}")]
    StreamError(String),

    /// The caller's cancellation handle was observed between chunks/pages.
    #[error("operation cancelled")]
    Cancelled,

    /// Catch-all for malformed syntax inside the object grammar (arrays,
    /// dictionaries, streams) that doesn't warrant its own variant.
    #[error("{0}")]
    Generic(String),
}

impl PDFError {
    /// Whether a caller can reasonably continue after this error (skip the
    /// item, fall back, or retry) rather than aborting the whole operation.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            PDFError::NotAPdf | PDFError::MissingStartXref | PDFError::MissingRoot
        )
    }
}
