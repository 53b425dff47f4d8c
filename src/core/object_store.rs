//! The streaming object parser (C4): resolves `(n, g)` to a parsed object
//! by seeking to the xref-reported offset and extracting the `N G obj …
//! endobj` envelope, enforces the process-wide memory budget, and serves
//! objects through the thread-safe LRU [`Cache`] (C2).
//!
//! When the xref resolver (C3) cannot build a table at all, [`ObjectStore::open`]
//! falls back to [`ObjectStore::build_basic_xref`], which scans the whole
//! file for `N G obj` envelopes directly.

use super::base_stream::BaseStream;
use super::cache::Cache;
use super::cancellation::CancellationHandle;
use super::config::ObjectParserOptions;
use super::error::{PDFError, PDFResult};
use super::lexer::Lexer;
use super::parser::{Parser, PDFObject};
use super::xref::{XRef, XRefEntry};
use lazy_static::lazy_static;
use regex::bytes::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

/// Initial envelope-scan window, in bytes.
const INITIAL_WINDOW: usize = 4 * 1024;
/// Hard ceiling the envelope window is doubled up to before giving up.
const MAX_WINDOW: usize = 1024 * 1024;
/// Chunk overlap used by the fallback scanner so envelopes straddling a
/// chunk boundary are not missed.
const SCAN_OVERLAP: usize = 1024;

lazy_static! {
    static ref ENVELOPE_RE: Regex =
        Regex::new(r"(?s)(\d+)[ \t\r\n\x00\x0c]+(\d+)[ \t\r\n\x00\x0c]+obj(.*?)endobj").unwrap();
    static ref SCAN_RE: Regex =
        Regex::new(r"(\d+)[ \t\r\n\x00\x0c]+(\d+)[ \t\r\n\x00\x0c]+obj").unwrap();
}

/// Point-in-time memory accounting for the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub current_bytes: u64,
    pub max_bytes: u64,
}

/// Resolves indirect objects on demand, in bounded memory, with an LRU
/// cache in front of the file.
///
/// Constructed once per open file. The byte source is single-reader
/// (guarded by a mutex); the xref table is construct-once-then-read-mostly
/// (a reader-writer lock); the cache is independently thread-safe.
pub struct ObjectStore {
    stream: Mutex<Box<dyn BaseStream>>,
    xref: RwLock<XRef>,
    cache: Cache<String, PDFObject>,
    options: ObjectParserOptions,
    current_memory: AtomicU64,
}

impl ObjectStore {
    /// Opens `stream`, building the xref table via [`XRef::open`] or, on a
    /// recoverable xref failure, via [`ObjectStore::build_basic_xref`].
    pub fn open(mut stream: Box<dyn BaseStream>, options: ObjectParserOptions) -> PDFResult<Self> {
        let options = options.normalized();

        let xref = match XRef::open(stream.as_mut()) {
            Ok(xref) => xref,
            Err(e) if e.is_recoverable() => {
                log::warn!("xref parse failed ({}), falling back to envelope scan", e);
                Self::build_basic_xref(stream.as_mut())?
            }
            Err(e) => return Err(e),
        };

        Ok(ObjectStore {
            stream: Mutex::new(stream),
            xref: RwLock::new(xref),
            cache: Cache::new(options.object_cache_size),
            options,
            current_memory: AtomicU64::new(0),
        })
    }

    /// Scans the whole file for `N G obj` envelopes and records each one as
    /// an in-use entry, generation 0. No trailer is produced — callers that
    /// need `/Root` must fall back further (the page-tree walker's own
    /// pattern scan, §4.4).
    pub fn build_basic_xref(stream: &mut dyn BaseStream) -> PDFResult<XRef> {
        let length = stream.length();
        let chunk_size = 1024 * 1024;
        let mut entries = rustc_hash::FxHashMap::default();

        let mut pos = 0usize;
        while pos < length {
            let end = (pos + chunk_size).min(length);
            let window_start = pos.saturating_sub(SCAN_OVERLAP);
            let bytes = stream.get_byte_range(window_start, end)?;

            for caps in SCAN_RE.captures_iter(&bytes) {
                let m = caps.get(0).unwrap();
                let abs_offset = window_start + m.start();
                let num: u32 = match std::str::from_utf8(&caps[1]).ok().and_then(|s| s.parse().ok()) {
                    Some(n) => n,
                    None => continue,
                };
                entries.entry(num).or_insert(XRefEntry::InUse {
                    offset: abs_offset as u64,
                    generation: 0,
                });
            }

            pos = end;
        }

        if entries.is_empty() {
            return Err(PDFError::NotAPdf);
        }

        Ok(XRef::from_scanned_entries(entries))
    }

    /// Resolves `(n, g)`, serving from the cache when possible.
    pub fn get_object(&self, n: u32, g: u32) -> PDFResult<PDFObject> {
        let key = format!("{}_{}", n, g);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let entry = {
            let xref = self.xref.read().unwrap();
            xref.entry(n, g).copied()
        };

        let entry = entry.ok_or(PDFError::MissingObject(n, g))?;

        let obj = match entry {
            XRefEntry::Free { .. } => PDFObject::Null,
            XRefEntry::Compressed {
                stream_object_number,
                ..
            } => return Err(PDFError::CompressedObject(n, g, stream_object_number)),
            XRefEntry::InUse { offset, .. } => self.parse_envelope(offset, n, g)?,
        };

        self.cache.put(key, obj.clone());
        Ok(obj)
    }

    fn parse_envelope(&self, offset: u64, n: u32, g: u32) -> PDFResult<PDFObject> {
        let (envelope_num, envelope_gen, obj) = self.parse_envelope_discover(offset, n, g)?;
        if envelope_num != n || envelope_gen != g {
            return Err(PDFError::MalformedObject(
                n,
                g,
                format!(
                    "envelope header is {} {} obj, expected {} {} obj",
                    envelope_num, envelope_gen, n, g
                ),
            ));
        }
        Ok(obj)
    }

    /// Finds the `N G obj … endobj` envelope at `offset` and parses its
    /// body, without requiring the header's `N G` to match anything in
    /// particular. `report_n`/`report_g` are only used to label errors —
    /// callers that already know the expected id pass it through so
    /// `get_object` can still blame the right object; the fallback scanner
    /// (which discovers ids as it goes) passes `(0, 0)`.
    fn parse_envelope_discover(
        &self,
        offset: u64,
        report_n: u32,
        report_g: u32,
    ) -> PDFResult<(u32, u32, PDFObject)> {
        let start = offset as usize;
        let mut window = INITIAL_WINDOW;

        loop {
            let length = {
                let stream = self.stream.lock().unwrap();
                stream.length()
            };
            let end = (start + window).min(length);
            let bytes = self.read_range(start, end)?;

            if let Some(caps) = ENVELOPE_RE.captures(&bytes) {
                let envelope_num: u32 = std::str::from_utf8(&caps[1])
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        PDFError::MalformedObject(report_n, report_g, "unparseable object number".into())
                    })?;
                let envelope_gen: u32 = std::str::from_utf8(&caps[2])
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        PDFError::MalformedObject(report_n, report_g, "unparseable generation".into())
                    })?;

                let body = trim_body(&caps[3]);
                let sub = Box::new(super::stream::Stream::from_bytes(body.to_vec()));
                let lexer = Lexer::new(sub)?;
                let mut parser = Parser::new(lexer)?;
                let obj = parser
                    .get_object()
                    .map_err(|e| PDFError::MalformedObject(report_n, report_g, e.to_string()))?;
                return Ok((envelope_num, envelope_gen, obj));
            }

            if end == length || window >= MAX_WINDOW {
                return Err(PDFError::MalformedObject(
                    report_n,
                    report_g,
                    format!("no 'endobj' found within {} byte window", window),
                ));
            }
            window *= 2;
        }
    }

    /// Scans the whole file for `N G obj` envelopes and parses each one,
    /// in encounter order, regardless of what (if anything) the xref table
    /// says about it.
    ///
    /// Used by the page-tree walker (§4.4) when the structural walk from
    /// `/Root` finds zero pages even though the xref table itself parsed
    /// fine (a broken or missing `/Pages` subtree) — a different failure
    /// mode than [`ObjectStore::build_basic_xref`], which only runs when
    /// the xref table itself couldn't be parsed at all.
    pub fn scan_all_objects(&self) -> PDFResult<Vec<((u32, u32), PDFObject)>> {
        let length = {
            let stream = self.stream.lock().unwrap();
            stream.length()
        };
        let chunk_size = 1024 * 1024;
        let mut results = Vec::new();
        let mut seen = rustc_hash::FxHashSet::default();

        let mut pos = 0usize;
        while pos < length {
            let end = (pos + chunk_size).min(length);
            let window_start = pos.saturating_sub(SCAN_OVERLAP);
            let bytes = self.read_range(window_start, end)?;

            for caps in SCAN_RE.captures_iter(&bytes) {
                let m = caps.get(0).unwrap();
                let abs_offset = (window_start + m.start()) as u64;
                let num: u32 = match std::str::from_utf8(&caps[1]).ok().and_then(|s| s.parse().ok()) {
                    Some(n) => n,
                    None => continue,
                };
                if !seen.insert(abs_offset) {
                    continue;
                }
                if let Ok((envelope_num, envelope_gen, obj)) =
                    self.parse_envelope_discover(abs_offset, num, 0)
                {
                    results.push(((envelope_num, envelope_gen), obj));
                }
            }

            pos = end;
        }

        Ok(results)
    }

    fn read_range(&self, begin: usize, end: usize) -> PDFResult<Vec<u8>> {
        let requested = (end - begin) as u64;
        self.acquire_memory(requested)?;
        let result = {
            let stream = self.stream.lock().unwrap();
            stream.get_byte_range(begin, end)
        };
        self.release_memory(requested);
        result
    }

    fn acquire_memory(&self, requested: u64) -> PDFResult<()> {
        let max = self.options.max_memory_bytes();
        let current = self.current_memory.fetch_add(requested, Ordering::SeqCst);
        if current + requested > max {
            self.current_memory.fetch_sub(requested, Ordering::SeqCst);
            return Err(PDFError::MemoryExhausted {
                current,
                requested,
                max,
            });
        }
        Ok(())
    }

    fn release_memory(&self, amount: u64) {
        self.current_memory
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                Some(c.saturating_sub(amount))
            })
            .ok();
    }

    /// Reads the whole stream once in `chunk_size_bytes()`-sized chunks,
    /// invoking `f` with each chunk and its starting offset. Chunks are
    /// delivered in order with no gaps or overlap.
    pub fn process_in_chunks<F>(&self, f: F) -> PDFResult<()>
    where
        F: FnMut(&[u8], u64) -> PDFResult<()>,
    {
        self.process_in_chunks_cancellable(f, None)
    }

    /// Like [`ObjectStore::process_in_chunks`], but checks `cancel` before
    /// each chunk read. Observing cancellation returns `Err(Cancelled)`
    /// immediately; per-chunk memory already released by that point stays
    /// released (§5's "no built-in timeouts" — callers impose them by
    /// cancelling).
    pub fn process_in_chunks_cancellable<F>(
        &self,
        mut f: F,
        cancel: Option<&CancellationHandle>,
    ) -> PDFResult<()>
    where
        F: FnMut(&[u8], u64) -> PDFResult<()>,
    {
        let chunk_size = self.options.chunk_size_bytes();
        let length = {
            let stream = self.stream.lock().unwrap();
            stream.length()
        };

        let mut pos = 0usize;
        while pos < length {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(PDFError::Cancelled);
            }
            let end = (pos + chunk_size).min(length);
            let bytes = self.read_range(pos, end)?;
            f(&bytes, pos as u64)?;
            pos = end;
        }
        Ok(())
    }

    /// Streams through the file looking for `needle`, overlapping successive
    /// reads by `needle.len() - 1` bytes so that matches straddling a chunk
    /// boundary are still found whole. A match inside the overlap region may
    /// be seen by two consecutive windows; final dedup collapses it to one.
    /// Returns absolute offsets in ascending order.
    pub fn find_pattern(&self, needle: &[u8]) -> PDFResult<Vec<u64>> {
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.options.chunk_size_bytes();
        let overlap = needle.len() - 1;
        let length = {
            let stream = self.stream.lock().unwrap();
            stream.length()
        };

        let mut offsets = Vec::new();
        let mut pos = 0usize;
        while pos < length {
            let end = (pos + chunk_size).min(length);
            let window_start = pos.saturating_sub(overlap);
            let bytes = self.read_range(window_start, end)?;

            let mut search_from = 0usize;
            while let Some(rel) = find_subslice(&bytes[search_from..], needle) {
                let abs = window_start + search_from + rel;
                offsets.push(abs as u64);
                search_from += rel + 1;
            }

            pos = end;
        }

        offsets.sort_unstable();
        offsets.dedup();
        Ok(offsets)
    }

    /// Drops all cached objects and resets hit/miss counters.
    pub fn clear_caches(&self) {
        self.cache.clear();
    }

    pub fn memory_stats(&self) -> MemoryStats {
        MemoryStats {
            current_bytes: self.current_memory.load(Ordering::SeqCst),
            max_bytes: self.options.max_memory_bytes(),
        }
    }

    pub fn cache_stats(&self) -> super::cache::CacheStats {
        self.cache.stats()
    }

    pub fn xref(&self) -> std::sync::RwLockReadGuard<'_, XRef> {
        self.xref.read().unwrap()
    }

    /// Resolves `obj` if it is an indirect reference, otherwise returns it
    /// unchanged.
    pub fn fetch_if_ref(&self, obj: &PDFObject) -> PDFResult<PDFObject> {
        match obj {
            PDFObject::Ref(r) => self.get_object(r.num, r.generation),
            other => Ok(other.clone()),
        }
    }
}

fn trim_body(body: &[u8]) -> &[u8] {
    let start = body.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(body.len());
    let end = body.iter().rposition(|b| !b.is_ascii_whitespace()).map(|i| i + 1).unwrap_or(start);
    &body[start..end]
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::Stream;

    fn options() -> ObjectParserOptions {
        ObjectParserOptions::default()
    }

    fn simple_pdf() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"%PDF-1.4\n");
        let obj1_off = data.len();
        data.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let obj2_off = data.len();
        data.extend_from_slice(b"2 0 obj\n(hello world)\nendobj\n");
        let xref_off = data.len();
        data.extend_from_slice(b"xref\n0 3\n");
        data.extend_from_slice(b"0000000000 65535 f \n");
        data.extend_from_slice(format!("{:010} 00000 n \n", obj1_off).as_bytes());
        data.extend_from_slice(format!("{:010} 00000 n \n", obj2_off).as_bytes());
        data.extend_from_slice(b"trailer\n<< /Size 3 /Root 1 0 R >>\n");
        data.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());
        data
    }

    #[test]
    fn resolves_object_by_envelope() {
        let store =
            ObjectStore::open(Box::new(Stream::from_bytes(simple_pdf())), options()).unwrap();
        let obj = store.get_object(2, 0).unwrap();
        assert_eq!(obj, PDFObject::String(b"hello world".to_vec()));
    }

    #[test]
    fn idempotent_get_hits_cache_on_second_call() {
        let store =
            ObjectStore::open(Box::new(Stream::from_bytes(simple_pdf())), options()).unwrap();
        let first = store.get_object(2, 0).unwrap();
        let before = store.cache_stats().hits;
        let second = store.get_object(2, 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.cache_stats().hits, before + 1);
    }

    #[test]
    fn missing_object_is_reported() {
        let store =
            ObjectStore::open(Box::new(Stream::from_bytes(simple_pdf())), options()).unwrap();
        let err = store.get_object(99, 0).unwrap_err();
        assert!(matches!(err, PDFError::MissingObject(99, 0)));
    }

    #[test]
    fn falls_back_to_basic_scan_on_broken_xref() {
        let mut data = simple_pdf();
        // Corrupt the startxref integer so XRef::open fails.
        let tail_start = data.len() - 30;
        for b in data[tail_start..].iter_mut() {
            if b.is_ascii_digit() {
                *b = b'9';
            }
        }
        let store = ObjectStore::open(Box::new(Stream::from_bytes(data)), options()).unwrap();
        let obj = store.get_object(2, 0).unwrap();
        assert_eq!(obj, PDFObject::String(b"hello world".to_vec()));
    }

    #[test]
    fn memory_at_rest_is_zero() {
        let store =
            ObjectStore::open(Box::new(Stream::from_bytes(simple_pdf())), options()).unwrap();
        let _ = store.get_object(2, 0).unwrap();
        assert_eq!(store.memory_stats().current_bytes, 0);
    }

    #[test]
    fn find_pattern_locates_needle_straddling_a_chunk_boundary() {
        // A present but unparseable xref section (MalformedXRef) is
        // recoverable: ObjectStore::open falls back to the basic envelope
        // scanner, which only needs `N G obj` patterns to succeed.
        let mut opts = options();
        opts.chunk_size_mb = 1;
        let chunk = opts.chunk_size_bytes();

        let straddle_pos = chunk - 3;
        let mut data = b"1 0 obj\n(x)\nendobj\n".to_vec();
        data.resize(straddle_pos, b'x');
        data.extend_from_slice(b"NEEDLE");
        data.extend_from_slice(&vec![b'y'; 4096]);
        data.push(b'\n');
        let xref_off = data.len();
        data.extend_from_slice(b"xref\nnot a valid section\n");
        data.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());

        let store = ObjectStore::open(Box::new(Stream::from_bytes(data)), opts).unwrap();
        let offsets = store.find_pattern(b"NEEDLE").unwrap();
        assert_eq!(offsets, vec![straddle_pos as u64]);
    }

    #[test]
    fn process_in_chunks_stops_when_cancelled_between_chunks() {
        use crate::core::cancellation::CancellationHandle;

        let mut opts = options();
        opts.chunk_size_mb = 1;
        let chunk = opts.chunk_size_bytes();
        let data = vec![b'x'; chunk * 4];
        let store = ObjectStore::open(Box::new(Stream::from_bytes(data)), opts).unwrap();

        let handle = CancellationHandle::new();
        let mut seen_chunks = 0;
        let result = store.process_in_chunks_cancellable(
            |_bytes, _offset| {
                seen_chunks += 1;
                if seen_chunks == 2 {
                    handle.cancel();
                }
                Ok(())
            },
            Some(&handle),
        );

        assert!(matches!(result, Err(PDFError::Cancelled)));
        assert_eq!(seen_chunks, 2);
    }

    #[test]
    fn find_pattern_on_real_file_returns_increasing_offsets() {
        let data = simple_pdf();
        let store =
            ObjectStore::open(Box::new(Stream::from_bytes(data)), options()).unwrap();
        let offsets = store.find_pattern(b"obj").unwrap();
        assert!(offsets.len() >= 2);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }
}
