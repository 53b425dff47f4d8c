//! # pdf-lazy-store: a lazy, random-access PDF object store
//!
//! Opens a PDF byte source, resolves its cross-reference table, and serves
//! individual indirect objects and page ranges on demand — without ever
//! materializing the whole file in memory at once.
//!
//! ## Quick start
//!
//! ```no_run
//! use pdf_lazy_store::core::{ObjectParserOptions, PageRange, ExtractOptions};
//! use pdf_lazy_store::PdfStore;
//!
//! let bytes = std::fs::read("document.pdf")?;
//! let store = PdfStore::from_bytes(bytes, ObjectParserOptions::default())?;
//!
//! println!("PDF has {} pages", store.page_count()?);
//!
//! let extracted = store.extract_range(
//!     &[PageRange { start: 1, end: 1 }],
//!     &ExtractOptions::default(),
//! )?;
//! for (page_num, page) in &extracted.pages {
//!     println!("page {}: MediaBox {:?}", page_num, page.media_box);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! Six components, each independently testable:
//!
//! 1. **Byte source (C1)** — [`core::BaseStream`] and its implementations
//!    ([`core::FileChunkedStream`], [`core::Stream`], and an HTTP-backed one
//!    behind the `async` feature) provide chunked, seekable access to the
//!    underlying bytes.
//! 2. **Cache (C2)** — [`core::Cache`] is a thread-safe, fixed-capacity LRU
//!    used to keep hot objects resident.
//! 3. **XRef resolver (C3)** — [`core::XRef`] locates `startxref`, walks the
//!    `/Prev` chain of incremental updates, and exposes object offsets.
//! 4. **Object parser (C4)** — [`core::ObjectStore`] resolves `(n, g)` pairs
//!    to parsed [`core::PDFObject`]s against the memory budget, falling back
//!    to a whole-file pattern scan when the xref table itself is unusable.
//! 5. **Page-tree walker (C5)** — [`core::PageIndex`] maps page numbers to
//!    page objects by descending `/Pages` → `/Kids`.
//! 6. **Page-range extractor (C6)** — [`core::Extractor`] validates a
//!    requested set of page ranges and resolves each page's geometry and
//!    content/resource references.
//!
//! Interpreting content streams into text, images, or form fields is left to
//! external collaborators; this crate's job ends at handing them the right
//! object ids.
//!
//! For progressive loading over HTTP, file-chunked access, and other usage
//! patterns, see the `demos/` directory.

pub mod core;

pub use crate::core::{
    BaseStream, Cache, CacheStats, CancellationHandle, ContentType, ExtractOptions,
    ExtractedContent, ExtractionStatus, Extractor, ExtractorOptions, FileChunkedStream, Lexer,
    MemoryStats, ObjectParserOptions, ObjectStore, OutputFormat, PDFError, PDFObject, PageContent,
    PageIndex, PageRange, PageResources, PageResult, Parser, Ref, Stream, SubStream, Token,
    Trailer, XRef, XRefEntry,
};

#[cfg(feature = "async")]
pub use crate::core::{AsyncHttpChunkedStream, HttpChunkedStream, ProgressCallback};

use crate::core::error::PDFResult;
use std::path::Path;
use std::sync::Mutex;

/// The top-level handle a consumer opens once per file.
///
/// Owns the byte source, the resolved xref table, the object cache (all
/// inside [`ObjectStore`]), and a lazily-built [`PageIndex`]. Cheap to query
/// from multiple threads: every method here takes `&self`.
pub struct PdfStore {
    store: ObjectStore,
    page_index: Mutex<Option<PageIndex>>,
    extractor: Extractor,
}

impl PdfStore {
    /// Opens `byte_source`, parsing the xref table (or falling back to a
    /// whole-file scan on a recoverable xref failure). The page tree is not
    /// walked yet — that happens lazily on first `page_count`,
    /// `page_object`, or `extract_range` call.
    pub fn open(byte_source: Box<dyn BaseStream>, options: ObjectParserOptions) -> PDFResult<Self> {
        Self::open_with_extractor_options(byte_source, options, ExtractorOptions::default())
    }

    /// Like [`PdfStore::open`], with extractor tunables (`max_cache_size`,
    /// `enable_caching`, `preload_objects`) supplied up front.
    pub fn open_with_extractor_options(
        byte_source: Box<dyn BaseStream>,
        options: ObjectParserOptions,
        extractor_options: ExtractorOptions,
    ) -> PDFResult<Self> {
        let store = ObjectStore::open(byte_source, options)?;
        Ok(PdfStore {
            store,
            page_index: Mutex::new(None),
            extractor: Extractor::new(extractor_options),
        })
    }

    /// Opens an in-memory PDF. Convenience wrapper over [`Stream::from_bytes`].
    pub fn from_bytes(bytes: Vec<u8>, options: ObjectParserOptions) -> PDFResult<Self> {
        Self::open(Box::new(Stream::from_bytes(bytes)), options)
    }

    /// Opens a PDF from disk via chunked, seekable file access.
    pub fn from_path<P: AsRef<Path>>(path: P, options: ObjectParserOptions) -> PDFResult<Self> {
        let stream = FileChunkedStream::open(path, Some(options.chunk_size_bytes()), None)?;
        Self::open(Box::new(stream), options)
    }

    /// Random-access fetch of one indirect object.
    pub fn get_object(&self, n: u32, g: u32) -> PDFResult<PDFObject> {
        self.store.get_object(n, g)
    }

    /// Total page count, walking (and caching) the page tree on first call.
    pub fn page_count(&self) -> PDFResult<u32> {
        self.ensure_page_index()?;
        Ok(self.page_index.lock().unwrap().as_ref().unwrap().total_pages)
    }

    /// The `(number, generation)` id of the page object backing page
    /// `page` (1-indexed).
    pub fn page_object(&self, page: u32) -> PDFResult<(u32, u32)> {
        self.ensure_page_index()?;
        let guard = self.page_index.lock().unwrap();
        guard
            .as_ref()
            .unwrap()
            .page_object
            .get(&page)
            .copied()
            .ok_or(PDFError::MissingObject(page, 0))
    }

    /// Validates `ranges` against the page count, assembles the needed
    /// object set, optionally preloads it, and resolves each selected page.
    /// See [`Extractor::extract_range`] for the full pipeline.
    pub fn extract_range(
        &self,
        ranges: &[PageRange],
        options: &ExtractOptions,
    ) -> PDFResult<ExtractedContent> {
        self.extract_range_cancellable(ranges, options, None)
    }

    /// Like [`PdfStore::extract_range`], checking `cancel` between pages.
    pub fn extract_range_cancellable(
        &self,
        ranges: &[PageRange],
        options: &ExtractOptions,
        cancel: Option<&crate::core::CancellationHandle>,
    ) -> PDFResult<ExtractedContent> {
        self.ensure_page_index()?;
        let guard = self.page_index.lock().unwrap();
        let index = guard.as_ref().unwrap();
        self.extractor
            .extract_range_cancellable(&self.store, index, ranges, options, cancel)
    }

    /// A lazy, finite sequence of per-page results over the whole document,
    /// resolved one page at a time rather than eagerly like
    /// [`PdfStore::extract_range`]. Walks (and caches) the page tree on
    /// first call, same as [`PdfStore::page_count`].
    ///
    /// Holds the page-index lock for as long as the returned iterator is
    /// alive (read-mostly per §5, but re-entrant calls to `page_count` or
    /// `extract_range` from the same thread while iterating would deadlock;
    /// drop the iterator first).
    pub fn stream_pages<'a>(
        &'a self,
        options: &'a ExtractOptions,
        cancel: Option<&'a crate::core::CancellationHandle>,
    ) -> PDFResult<impl Iterator<Item = crate::core::PageResult> + 'a> {
        self.ensure_page_index()?;
        // The guard is moved into the closure below, so it (and the
        // `PageIndex` it dereferences to) lives exactly as long as the
        // iterator itself — no unsafe lifetime extension needed.
        let guard = self.page_index.lock().unwrap();
        let mut page_numbers: Vec<u32> = guard.as_ref().unwrap().page_object.keys().copied().collect();
        page_numbers.sort_unstable();
        let mut next = 0usize;

        Ok(std::iter::from_fn(move || loop {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return None;
            }
            let page_num = *page_numbers.get(next)?;
            next += 1;
            let index = guard.as_ref().unwrap();
            let page_id = match index.page_object.get(&page_num) {
                Some(id) => *id,
                None => continue,
            };
            return Some(crate::core::PageResult {
                page_number: page_num,
                content: self.extractor.resolve_one_page(&self.store, index, page_num, page_id, options),
            });
        }))
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.store.memory_stats()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.store.cache_stats()
    }

    /// Drops cached objects without invalidating the xref table or page
    /// index. Memory falls back to the at-rest value of zero.
    pub fn clear_caches(&self) {
        self.store.clear_caches();
    }

    /// Consumes the handle, releasing the byte source and every cache. A
    /// bare `drop(store)` has the same effect; this exists for callers who
    /// want the release to read as an explicit step.
    pub fn close(self) {}

    fn ensure_page_index(&self) -> PDFResult<()> {
        let mut guard = self.page_index.lock().unwrap();
        if guard.is_none() {
            *guard = Some(PageIndex::build(&self.store)?);
        }
        Ok(())
    }
}
