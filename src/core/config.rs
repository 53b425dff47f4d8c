//! Named, enumerated configuration for the object store and extractor.
//!
//! Every tunable the store exposes has a documented default so a caller can
//! construct `ObjectParserOptions::default()` and get sane behavior, then
//! override only what their environment demands (a tiny file vs. a
//! multi-hundred-megabyte scan target).

/// Options controlling the xref resolver and object parser (C3/C4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectParserOptions {
    /// Size of each chunk `process_in_chunks` reads, in megabytes.
    pub chunk_size_mb: usize,
    /// Hard ceiling on bytes held by in-flight chunk copies.
    pub max_memory_mb: usize,
    /// Capacity of the xref-lookup cache (currently informational; the xref
    /// table itself is a flat map, not an LRU).
    pub xref_cache_size: usize,
    /// Capacity of the resolved-object LRU cache.
    pub object_cache_size: usize,
    /// Utilization fraction (0, 1] at which the parser hints the runtime to
    /// reclaim buffers.
    pub gc_trigger: f64,
    /// Number of scratch buffers kept in the chunk-read buffer pool.
    pub buffer_pool_size: usize,
}

impl Default for ObjectParserOptions {
    fn default() -> Self {
        ObjectParserOptions {
            chunk_size_mb: 1,
            max_memory_mb: 64,
            xref_cache_size: 1000,
            object_cache_size: 500,
            gc_trigger: 0.8,
            buffer_pool_size: 10,
        }
    }
}

impl ObjectParserOptions {
    /// Clamps fields to documented valid ranges. Called once by `XRef::open`.
    pub fn normalized(mut self) -> Self {
        if self.gc_trigger <= 0.0 || self.gc_trigger > 1.0 {
            self.gc_trigger = ObjectParserOptions::default().gc_trigger;
        }
        if self.chunk_size_mb == 0 {
            self.chunk_size_mb = 1;
        }
        if self.max_memory_mb == 0 {
            self.max_memory_mb = ObjectParserOptions::default().max_memory_mb;
        }
        self
    }

    pub fn chunk_size_bytes(&self) -> usize {
        self.chunk_size_mb * 1024 * 1024
    }

    pub fn max_memory_bytes(&self) -> u64 {
        self.max_memory_mb as u64 * 1024 * 1024
    }
}

/// Options controlling the page-range extractor (C6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractorOptions {
    /// Soft cap, in bytes, applied to the extractor's own object cache.
    pub max_cache_size: usize,
    /// Whether resolved objects are cached at all.
    pub enable_caching: bool,
    /// Whether the planned object set is warmed before per-page extraction.
    pub preload_objects: bool,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        ExtractorOptions {
            max_cache_size: 50 * 1024 * 1024,
            enable_caching: true,
            preload_objects: true,
        }
    }
}

/// The kinds of content a caller can request per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Text,
    Images,
    Forms,
    Metadata,
}

/// Serialization shape requested for extracted content. The core only
/// produces structured data; formatting to one of these is left to callers,
/// but the option is threaded through so a consumer's formatter knows what
/// was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Xml,
    Plain,
}

/// Per-call extraction options (payload of an `extract_range` request).
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub content_types: Vec<ContentType>,
    pub preserve_formatting: bool,
    pub extract_images: bool,
    pub extract_forms: bool,
    pub output_format: OutputFormat,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            content_types: vec![ContentType::Text],
            preserve_formatting: false,
            extract_images: false,
            extract_forms: false,
            output_format: OutputFormat::Plain,
        }
    }
}

impl ExtractOptions {
    pub fn wants(&self, kind: ContentType) -> bool {
        self.content_types.contains(&kind)
    }
}
