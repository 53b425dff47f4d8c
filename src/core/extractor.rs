//! The page-range extractor (C6): accepts a list of page ranges, validates
//! them against the page count, assembles the transitively-referenced
//! object set, optionally preloads it through the object store, and
//! produces per-page structural content plus extraction metadata.
//!
//! Interpreting content streams into text/images/forms is explicitly out of
//! scope here — that's left to external collaborators (§6); this module's
//! job is to resolve *which* objects make up a page (its content streams,
//! its resources, its geometry) so a caller can hand them to one.

use super::cancellation::CancellationHandle;
use super::config::{ExtractOptions, ExtractorOptions};
use super::error::{PDFError, PDFResult};
use super::object_store::ObjectStore;
use super::page_tree::PageIndex;
use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::time::Instant;

/// Bound on `/Parent` hops walked to find an inherited `/MediaBox`,
/// `/CropBox`, or `/Rotate`.
const MAX_INHERITANCE_HOPS: usize = 10;

/// US Letter, in points — the documented fallback when no `/MediaBox` is
/// reachable.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// An inclusive page range as supplied by a caller, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

/// Structural content resolved for one page: its geometry and the object
/// ids a content-stream interpreter would need next.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub page_number: u32,
    pub page_object: (u32, u32),
    pub media_box: [f64; 4],
    pub crop_box: Option<[f64; 4]>,
    pub rotate: i32,
    pub content_refs: Vec<(u32, u32)>,
    pub resources_ref: Option<(u32, u32)>,
}

/// Overall outcome of an `extract_range` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// Every selected page was resolved.
    Complete,
    /// Some selected pages failed to resolve; the rest are present.
    Partial,
    /// No page in the validated range set could be resolved (or the
    /// validated set was empty to begin with).
    Empty,
}

/// One item of [`Extractor::stream_pages`]'s lazy sequence.
#[derive(Debug)]
pub struct PageResult {
    pub page_number: u32,
    pub content: PDFResult<PageContent>,
}

/// The complete, eager result of a page-range extraction.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub pages: FxHashMap<u32, PageContent>,
    pub ranges: Vec<PageRange>,
    pub warnings: Vec<String>,
    pub processing_time_ms: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub objects_parsed: u64,
    pub current_memory_bytes: u64,
    pub status: ExtractionStatus,
}

/// Stateless over any one call; holds only the tunables from
/// `ExtractorOptions`. Constructed once per handle, reused across calls.
pub struct Extractor {
    options: ExtractorOptions,
}

impl Extractor {
    pub fn new(options: ExtractorOptions) -> Self {
        Extractor { options }
    }

    /// Runs the full §4.5 pipeline: validate ranges, plan the object set,
    /// optionally preload it, then resolve each selected page in ascending
    /// order.
    pub fn extract_range(
        &self,
        store: &ObjectStore,
        page_index: &PageIndex,
        ranges: &[PageRange],
        options: &ExtractOptions,
    ) -> PDFResult<ExtractedContent> {
        self.extract_range_cancellable(store, page_index, ranges, options, None)
    }

    /// Like [`Extractor::extract_range`], but checks `cancel` before each
    /// page is resolved. Observing cancellation discards the partially
    /// produced result and returns `Err(Cancelled)` (§5, §9).
    pub fn extract_range_cancellable(
        &self,
        store: &ObjectStore,
        page_index: &PageIndex,
        ranges: &[PageRange],
        options: &ExtractOptions,
        cancel: Option<&CancellationHandle>,
    ) -> PDFResult<ExtractedContent> {
        let start_time = Instant::now();
        let mut warnings = Vec::new();

        let validated = Self::validate_ranges(ranges, page_index.total_pages);
        let selected_pages = Self::union_pages(&validated);

        let planned = self.plan_object_set(page_index, &selected_pages);

        let cache_before = store.cache_stats();
        if self.options.preload_objects {
            self.preload(store, &planned, &mut warnings);
        }

        let mut pages = FxHashMap::default();
        for page_num in selected_pages {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(PDFError::Cancelled);
            }
            let page_id = match page_index.page_object.get(&page_num) {
                Some(id) => *id,
                None => {
                    warnings.push(format!("page {} has no known page object", page_num));
                    continue;
                }
            };
            match self.resolve_page(store, page_index, page_num, page_id, options) {
                Ok(content) => {
                    pages.insert(page_num, content);
                }
                Err(e) => {
                    warnings.push(format!("page {} failed to resolve: {}", page_num, e));
                }
            }
        }

        let requested_pages = validated
            .iter()
            .map(|r| (r.end.saturating_sub(r.start) + 1) as usize)
            .sum::<usize>();
        let status = if pages.is_empty() {
            ExtractionStatus::Empty
        } else if pages.len() < requested_pages {
            ExtractionStatus::Partial
        } else {
            ExtractionStatus::Complete
        };

        let cache_after = store.cache_stats();
        let memory = store.memory_stats();

        Ok(ExtractedContent {
            pages,
            ranges: validated,
            warnings,
            processing_time_ms: start_time.elapsed().as_millis() as u64,
            cache_hits: cache_after.hits.saturating_sub(cache_before.hits),
            cache_misses: cache_after.misses.saturating_sub(cache_before.misses),
            objects_parsed: cache_after.misses.saturating_sub(cache_before.misses),
            current_memory_bytes: memory.current_bytes,
            status,
        })
    }

    /// Clamps `start >= 1`, `end <= total_pages`; drops ranges with
    /// `start > end` after clamping. Input order is preserved.
    fn validate_ranges(ranges: &[PageRange], total_pages: u32) -> Vec<PageRange> {
        ranges
            .iter()
            .filter_map(|r| {
                let start = r.start.max(1);
                let end = r.end.min(total_pages);
                if start > end {
                    None
                } else {
                    Some(PageRange { start, end })
                }
            })
            .collect()
    }

    /// The union of every page number covered by any validated range, in
    /// ascending order.
    fn union_pages(ranges: &[PageRange]) -> Vec<u32> {
        let mut set: Vec<u32> = ranges
            .iter()
            .flat_map(|r| r.start..=r.end)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        set.sort_unstable();
        set
    }

    /// One level of content/resource objects for each selected page, plus
    /// the page objects themselves.
    fn plan_object_set(&self, page_index: &PageIndex, pages: &[u32]) -> Vec<(u32, u32)> {
        let mut planned = Vec::new();
        for page_num in pages {
            if let Some(id) = page_index.page_object.get(page_num) {
                planned.push(*id);
            }
            if let Some(refs) = page_index.resources.get(page_num) {
                planned.extend(refs.content_refs.iter().copied());
                planned.extend(refs.resources_ref);
            }
        }
        planned
    }

    fn preload(&self, store: &ObjectStore, planned: &[(u32, u32)], warnings: &mut Vec<String>) {
        for (n, g) in planned {
            if let Err(e) = store.get_object(*n, *g) {
                log::warn!("preload of object {} {} failed: {}", n, g, e);
                warnings.push(format!("preload of object {} {} failed: {}", n, g, e));
            }
        }
    }

    /// A lazy, finite sequence of [`PageResult`]s over `[1, page_index.total_pages]`,
    /// resolved one page at a time as the iterator is driven — unlike
    /// [`Extractor::extract_range`], which is eager and returns a complete
    /// snapshot. Not restartable without building a new iterator (§9);
    /// checks `cancel` between pages and stops (without an `Err` item) once
    /// observed.
    pub fn stream_pages<'a>(
        &'a self,
        store: &'a ObjectStore,
        page_index: &'a PageIndex,
        options: &'a ExtractOptions,
        cancel: Option<&'a CancellationHandle>,
    ) -> impl Iterator<Item = PageResult> + 'a {
        let mut page_numbers: Vec<u32> = page_index.page_object.keys().copied().collect();
        page_numbers.sort_unstable();

        let mut iter = page_numbers.into_iter();
        std::iter::from_fn(move || loop {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return None;
            }
            let page_num = iter.next()?;
            let page_id = match page_index.page_object.get(&page_num) {
                Some(id) => *id,
                None => continue,
            };
            return Some(PageResult {
                page_number: page_num,
                content: self.resolve_page(store, page_index, page_num, page_id, options),
            });
        })
    }

    /// Resolves a single already-located page. Exposed so callers that walk
    /// the page index themselves (e.g. [`crate::PdfStore::stream_pages`])
    /// can resolve one page without going through [`Extractor::extract_range`]'s
    /// eager, whole-range pipeline.
    pub fn resolve_one_page(
        &self,
        store: &ObjectStore,
        page_index: &PageIndex,
        page_num: u32,
        page_id: (u32, u32),
        options: &ExtractOptions,
    ) -> PDFResult<PageContent> {
        self.resolve_page(store, page_index, page_num, page_id, options)
    }

    fn resolve_page(
        &self,
        store: &ObjectStore,
        page_index: &PageIndex,
        page_num: u32,
        page_id: (u32, u32),
        _options: &ExtractOptions,
    ) -> PDFResult<PageContent> {
        let page_obj = store.get_object(page_id.0, page_id.1)?;
        let dict = page_obj
            .as_dictionary()
            .ok_or_else(|| super::error::PDFError::MalformedObject(page_id.0, page_id.1, "page is not a dictionary".into()))?;

        let (media_box, media_box_found) = Self::inherited_rect(store, dict, "MediaBox", MAX_INHERITANCE_HOPS);
        let media_box = match media_box {
            Some(b) => b,
            None => {
                log::warn!(
                    "page {} has no reachable /MediaBox, defaulting to US Letter",
                    page_num
                );
                DEFAULT_MEDIA_BOX
            }
        };
        let _ = media_box_found;

        let (crop_box, _) = Self::inherited_rect(store, dict, "CropBox", MAX_INHERITANCE_HOPS);
        let rotate = Self::inherited_rotate(store, dict, MAX_INHERITANCE_HOPS).unwrap_or(0);

        let refs = page_index.resources.get(&page_num).cloned().unwrap_or_default();
        let resources_ref = refs.resources_ref;
        let content_refs = refs.content_refs;

        Ok(PageContent {
            page_number: page_num,
            page_object: page_id,
            media_box,
            crop_box,
            rotate,
            content_refs,
            resources_ref,
        })
    }

    /// Walks `/Parent` up to `max_hops` times looking for a four-number
    /// rect keyed by `key` (`/MediaBox` or `/CropBox`).
    fn inherited_rect(
        store: &ObjectStore,
        dict: &std::collections::HashMap<String, super::parser::PDFObject>,
        key: &str,
        max_hops: usize,
    ) -> (Option<[f64; 4]>, usize) {
        if let Some(rect) = Self::as_rect(dict.get(key)) {
            return (Some(rect), 0);
        }

        let mut current = dict.get("Parent").and_then(Self::as_ref_tuple);
        let mut hops = 0;
        while let Some((n, g)) = current {
            if hops >= max_hops {
                break;
            }
            hops += 1;
            let parent_obj = match store.get_object(n, g) {
                Ok(o) => o,
                Err(_) => break,
            };
            let parent_dict = match parent_obj.as_dictionary() {
                Some(d) => d,
                None => break,
            };
            if let Some(rect) = Self::as_rect(parent_dict.get(key)) {
                return (Some(rect), hops);
            }
            current = parent_dict.get("Parent").and_then(Self::as_ref_tuple);
        }
        (None, hops)
    }

    fn inherited_rotate(
        store: &ObjectStore,
        dict: &std::collections::HashMap<String, super::parser::PDFObject>,
        max_hops: usize,
    ) -> Option<i32> {
        if let Some(r) = dict.get("Rotate").and_then(|o| o.as_number()) {
            return Some(r as i32);
        }

        let mut current = dict.get("Parent").and_then(Self::as_ref_tuple);
        let mut hops = 0;
        while let Some((n, g)) = current {
            if hops >= max_hops {
                return None;
            }
            hops += 1;
            let parent_obj = store.get_object(n, g).ok()?;
            let parent_dict = parent_obj.as_dictionary()?;
            if let Some(r) = parent_dict.get("Rotate").and_then(|o| o.as_number()) {
                return Some(r as i32);
            }
            current = parent_dict.get("Parent").and_then(Self::as_ref_tuple);
        }
        None
    }

    fn as_ref_tuple(obj: &super::parser::PDFObject) -> Option<(u32, u32)> {
        match obj {
            super::parser::PDFObject::Ref(r) => Some((r.num, r.generation)),
            _ => None,
        }
    }

    fn as_rect(obj: Option<&super::parser::PDFObject>) -> Option<[f64; 4]> {
        use super::parser::PDFObject;
        let arr = match obj {
            Some(PDFObject::Array(arr)) if arr.len() == 4 => arr,
            _ => return None,
        };
        let mut rect = [0.0f64; 4];
        for (i, item) in arr.iter().enumerate() {
            rect[i] = item.as_number()?;
        }
        Some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ObjectParserOptions;
    use crate::core::stream::Stream;

    fn build_store(bytes: Vec<u8>) -> ObjectStore {
        ObjectStore::open(Box::new(Stream::from_bytes(bytes)), ObjectParserOptions::default()).unwrap()
    }

    fn three_page_pdf() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        let mut offsets = vec![0u64; 10];

        offsets[1] = buf.len() as u64;
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets[2] = buf.len() as u64;
        buf.extend_from_slice(
            b"2 0 obj\n<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 /MediaBox [0 0 200 300] >>\nendobj\n",
        );

        for (page_obj, content_obj) in [(3, 6), (4, 7), (5, 8)] {
            offsets[page_obj] = buf.len() as u64;
            buf.extend_from_slice(
                format!(
                    "{} 0 obj\n<< /Type /Page /Parent 2 0 R /Contents {} 0 R /Resources 9 0 R >>\nendobj\n",
                    page_obj, content_obj
                )
                .as_bytes(),
            );
        }

        for content_obj in [6, 7, 8] {
            offsets[content_obj] = buf.len() as u64;
            buf.extend_from_slice(
                format!("{} 0 obj\n<< /Length 4 >>\nstream\nABCD\nendstream\nendobj\n", content_obj)
                    .as_bytes(),
            );
        }

        offsets[9] = buf.len() as u64;
        buf.extend_from_slice(b"9 0 obj\n<< /Font << >> >>\nendobj\n");

        let xref_off = buf.len() as u64;
        buf.extend_from_slice(b"xref\n0 10\n");
        buf.extend_from_slice(b"0000000000 65535 f \n");
        for n in 1..10u32 {
            buf.extend_from_slice(format!("{:010} 00000 n \n", offsets[n as usize]).as_bytes());
        }
        buf.extend_from_slice(b"trailer\n<< /Size 10 /Root 1 0 R >>\n");
        buf.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());
        buf
    }

    #[test]
    fn s1_extracts_requested_pages_with_inherited_media_box() {
        let store = build_store(three_page_pdf());
        let index = PageIndex::build(&store).unwrap();
        let extractor = Extractor::new(ExtractorOptions::default());

        let result = extractor
            .extract_range(
                &store,
                &index,
                &[PageRange { start: 1, end: 2 }],
                &ExtractOptions::default(),
            )
            .unwrap();

        assert_eq!(result.pages.len(), 2);
        assert!(result.pages.contains_key(&1));
        assert!(result.pages.contains_key(&2));
        assert!(!result.pages.contains_key(&3));
        assert_eq!(result.pages[&1].media_box, [0.0, 0.0, 200.0, 300.0]);
        assert_eq!(result.status, ExtractionStatus::Complete);
    }

    #[test]
    fn s2_out_of_range_yields_no_pages_and_no_error() {
        let store = build_store(three_page_pdf());
        let index = PageIndex::build(&store).unwrap();
        let extractor = Extractor::new(ExtractorOptions::default());

        let result = extractor
            .extract_range(
                &store,
                &index,
                &[PageRange { start: 10, end: 20 }],
                &ExtractOptions::default(),
            )
            .unwrap();

        assert!(result.pages.is_empty());
        assert!(result.ranges.is_empty());
        assert_eq!(result.status, ExtractionStatus::Empty);
    }

    #[test]
    fn cancelling_before_any_page_yields_cancelled_error() {
        use crate::core::cancellation::CancellationHandle;

        let store = build_store(three_page_pdf());
        let index = PageIndex::build(&store).unwrap();
        let extractor = Extractor::new(ExtractorOptions::default());

        let handle = CancellationHandle::new();
        handle.cancel();
        let result = extractor.extract_range_cancellable(
            &store,
            &index,
            &[PageRange { start: 1, end: 3 }],
            &ExtractOptions::default(),
            Some(&handle),
        );

        assert!(matches!(result, Err(PDFError::Cancelled)));
    }

    #[test]
    fn stream_pages_visits_every_page_in_ascending_order() {
        let store = build_store(three_page_pdf());
        let index = PageIndex::build(&store).unwrap();
        let extractor = Extractor::new(ExtractorOptions::default());
        let options = ExtractOptions::default();

        let seen: Vec<u32> = extractor
            .stream_pages(&store, &index, &options, None)
            .map(|r| r.page_number)
            .collect();

        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn missing_media_box_anywhere_falls_back_to_us_letter() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        let off1 = buf.len() as u64;
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let off2 = buf.len() as u64;
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
        let off3 = buf.len() as u64;
        buf.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n");
        let xref_off = buf.len() as u64;
        buf.extend_from_slice(b"xref\n0 4\n0000000000 65535 f \n");
        for off in [off1, off2, off3] {
            buf.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
        }
        buf.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\n");
        buf.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());

        let store = build_store(buf);
        let index = PageIndex::build(&store).unwrap();
        let extractor = Extractor::new(ExtractorOptions::default());

        let result = extractor
            .extract_range(
                &store,
                &index,
                &[PageRange { start: 1, end: 1 }],
                &ExtractOptions::default(),
            )
            .unwrap();

        assert_eq!(result.pages[&1].media_box, DEFAULT_MEDIA_BOX);
    }
}
