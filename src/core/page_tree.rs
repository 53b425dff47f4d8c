//! The page-tree walker (C5): starting from the trailer's `/Root`, resolves
//! the catalog, descends `/Pages` → `/Kids` recursively, and produces an
//! ordered `page# → ObjectId` map together with each page's content and
//! resource references.
//!
//! Best-effort by policy: a kid that cannot be resolved is logged and
//! skipped rather than aborting the whole walk. When the structural walk
//! throws or produces zero pages, [`PageIndex::build`] falls back to
//! [`super::object_store::ObjectStore::scan_all_objects`] and records pages
//! in encounter order.

use super::error::PDFResult;
use super::object_store::ObjectStore;
use super::parser::PDFObject;
use rustc_hash::FxHashMap;
use std::collections::HashSet;
use std::time::Instant;

/// Cap on `/Kids` recursion depth. Guards against cyclic page trees.
const MAX_TREE_DEPTH: usize = 64;

/// A page's `/Contents` and `/Resources` references, kept apart rather than
/// concatenated into one list — `/Resources` is frequently absent on the
/// leaf page (it's commonly inherited from the `/Pages` node instead), so
/// there is no reliable positional way to tell the two apart after the fact.
#[derive(Debug, Clone, Default)]
pub struct PageResources {
    pub content_refs: Vec<(u32, u32)>,
    pub resources_ref: Option<(u32, u32)>,
}

/// The page-tree walk's output: a dense, 1-indexed map from page number to
/// the page node's `(number, generation)` id, plus each page's content and
/// resource object ids.
///
/// `page_object` is dense on `[1, total_pages]` when the structural walk
/// succeeds. When the walk fell back to pattern scanning, pages are indexed
/// in encounter order, which may not equal logical reading order — a known
/// weakness, not a bug.
#[derive(Debug, Clone)]
pub struct PageIndex {
    pub total_pages: u32,
    pub page_object: FxHashMap<u32, (u32, u32)>,
    pub resources: FxHashMap<u32, PageResources>,
    pub build_duration_ms: u64,
}

impl PageIndex {
    /// Builds the index once. Callers construct this lazily on first
    /// page-range request and keep it for the handle's lifetime.
    pub fn build(store: &ObjectStore) -> PDFResult<PageIndex> {
        let start = Instant::now();
        let mut page_object = FxHashMap::default();
        let mut resources = FxHashMap::default();

        let structural_ok = match Self::walk_structural(store, &mut page_object, &mut resources) {
            Ok(()) => !page_object.is_empty(),
            Err(e) => {
                log::warn!("structural page-tree walk failed: {}", e);
                false
            }
        };

        if !structural_ok {
            page_object.clear();
            resources.clear();
            log::warn!("falling back to pattern scan for page tree");
            Self::scan_fallback(store, &mut page_object, &mut resources)?;
        }

        let total_pages = page_object.len() as u32;
        Ok(PageIndex {
            total_pages,
            page_object,
            resources,
            build_duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn walk_structural(
        store: &ObjectStore,
        page_object: &mut FxHashMap<u32, (u32, u32)>,
        resources: &mut FxHashMap<u32, PageResources>,
    ) -> PDFResult<()> {
        let (root_n, root_g) = store.xref().root()?;
        let catalog = store.get_object(root_n, root_g)?;
        let catalog_dict = catalog
            .as_dictionary()
            .ok_or_else(|| super::error::PDFError::MissingRoot)?;

        let pages_ref = catalog_dict
            .get("Pages")
            .ok_or(super::error::PDFError::MissingRoot)?;
        let (pages_n, pages_g) = match pages_ref {
            PDFObject::Ref(r) => (r.num, r.generation),
            _ => return Err(super::error::PDFError::MissingRoot),
        };

        let mut visited = HashSet::new();
        let mut next_page_number = 1u32;
        Self::descend(
            store,
            (pages_n, pages_g),
            0,
            &mut visited,
            page_object,
            resources,
            &mut next_page_number,
        );
        Ok(())
    }

    fn descend(
        store: &ObjectStore,
        id: (u32, u32),
        depth: usize,
        visited: &mut HashSet<(u32, u32)>,
        page_object: &mut FxHashMap<u32, (u32, u32)>,
        resources: &mut FxHashMap<u32, PageResources>,
        next_page_number: &mut u32,
    ) {
        if depth > MAX_TREE_DEPTH {
            log::warn!("page tree depth exceeded {} at {:?}, stopping descent", MAX_TREE_DEPTH, id);
            return;
        }
        if !visited.insert(id) {
            log::warn!("page tree cycle detected at {:?}, skipping revisit", id);
            return;
        }

        let obj = match store.get_object(id.0, id.1) {
            Ok(o) => o,
            Err(e) => {
                log::warn!("could not resolve page-tree node {:?}: {}", id, e);
                return;
            }
        };
        let dict = match obj.as_dictionary() {
            Some(d) => d,
            None => {
                log::warn!("page-tree node {:?} is not a dictionary, skipping", id);
                return;
            }
        };

        let type_name = dict.get("Type").and_then(|t| t.as_name());
        let is_leaf = type_name == Some("Page")
            || (type_name != Some("Pages") && !matches!(dict.get("Kids"), Some(PDFObject::Array(_))));

        if is_leaf {
            let page_num = *next_page_number;
            *next_page_number += 1;
            page_object.insert(page_num, id);
            resources.insert(page_num, extract_resources(&obj));
            return;
        }

        let kids = match dict.get("Kids") {
            Some(PDFObject::Array(arr)) => arr,
            _ => {
                log::warn!("intermediate page-tree node {:?} has no /Kids array", id);
                return;
            }
        };

        for kid in kids.iter() {
            let kid_id = match kid.as_ref() {
                PDFObject::Ref(r) => (r.num, r.generation),
                _ => {
                    log::warn!("kid of {:?} is not an indirect reference, skipping", id);
                    continue;
                }
            };
            Self::descend(store, kid_id, depth + 1, visited, page_object, resources, next_page_number);
        }
    }

    fn scan_fallback(
        store: &ObjectStore,
        page_object: &mut FxHashMap<u32, (u32, u32)>,
        resources: &mut FxHashMap<u32, PageResources>,
    ) -> PDFResult<()> {
        let mut next_page_number = 1u32;
        for (id, obj) in store.scan_all_objects()? {
            let dict = match obj.as_dictionary() {
                Some(d) => d,
                None => continue,
            };
            let type_name = dict.get("Type").and_then(|t| t.as_name());
            if type_name != Some("Page") {
                continue;
            }
            let page_num = next_page_number;
            next_page_number += 1;
            page_object.insert(page_num, id);
            resources.insert(page_num, extract_resources(&obj));
        }

        if page_object.is_empty() {
            return Err(super::error::PDFError::Generic(
                "pattern scan found no /Type /Page objects".into(),
            ));
        }
        Ok(())
    }
}

/// Collects the indirect references under `/Contents` (single ref or array)
/// and `/Resources` for one page object, kept apart by field rather than
/// position. Used by both the structural walk and the pattern-scan
/// fallback.
fn extract_resources(page_obj: &PDFObject) -> PageResources {
    let mut out = PageResources::default();
    let dict = match page_obj.as_dictionary() {
        Some(d) => d,
        None => return out,
    };

    match dict.get("Contents") {
        Some(PDFObject::Ref(r)) => out.content_refs.push((r.num, r.generation)),
        Some(PDFObject::Array(arr)) => {
            for item in arr.iter() {
                if let PDFObject::Ref(r) = item.as_ref() {
                    out.content_refs.push((r.num, r.generation));
                }
            }
        }
        _ => {}
    }

    if let Some(PDFObject::Ref(r)) = dict.get("Resources") {
        out.resources_ref = Some((r.num, r.generation));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ObjectParserOptions;
    use crate::core::stream::Stream;

    fn build_store(bytes: Vec<u8>) -> ObjectStore {
        ObjectStore::open(Box::new(Stream::from_bytes(bytes)), ObjectParserOptions::default()).unwrap()
    }

    /// A three-page PDF: catalog (1 0) -> pages (2 0) -> kids [3 0, 4 0, 5 0],
    /// each a leaf page with its own content stream (6, 7, 8) and a shared
    /// resources dict (9 0).
    fn three_page_pdf() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        // offsets[n] holds the byte offset of object `n`; index 0 is unused.
        let mut offsets = vec![0u64; 10];

        offsets[1] = buf.len() as u64;
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets[2] = buf.len() as u64;
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 >>\nendobj\n");

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
    fn s1_three_page_pdf_walks_structurally() {
        let store = build_store(three_page_pdf());
        let index = PageIndex::build(&store).unwrap();
        assert_eq!(index.total_pages, 3);
        assert_eq!(index.page_object.get(&1), Some(&(3, 0)));
        assert_eq!(index.page_object.get(&2), Some(&(4, 0)));
        assert_eq!(index.page_object.get(&3), Some(&(5, 0)));
        let page1_resources = index.resources.get(&1).unwrap();
        assert_eq!(page1_resources.content_refs, vec![(6, 0)]);
        assert_eq!(page1_resources.resources_ref, Some((9, 0)));
    }

    #[test]
    fn falls_back_to_scan_when_root_is_missing() {
        let mut bytes = three_page_pdf();
        // Corrupt the trailer's /Root so the structural walk cannot start.
        let pos = bytes.windows(5).rposition(|w| w == b"/Root").unwrap();
        bytes[pos + 1] = b'X';
        let store = build_store(bytes);
        let index = PageIndex::build(&store).unwrap();
        assert_eq!(index.total_pages, 3);
    }

    #[test]
    fn cyclic_kids_do_not_hang() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        let off1 = buf.len() as u64;
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let off2 = buf.len() as u64;
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [2 0 R] >>\nendobj\n");
        let xref_off = buf.len() as u64;
        buf.extend_from_slice(b"xref\n0 3\n0000000000 65535 f \n");
        buf.extend_from_slice(format!("{:010} 00000 n \n", off1).as_bytes());
        buf.extend_from_slice(format!("{:010} 00000 n \n", off2).as_bytes());
        buf.extend_from_slice(b"trailer\n<< /Size 3 /Root 1 0 R >>\n");
        buf.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());

        let store = build_store(buf);
        // Structural walk yields zero pages (the tree is nothing but a
        // self-referencing /Pages node); scan fallback finds none either,
        // which is the expected best-effort outcome for a degenerate file.
        let index = PageIndex::build(&store);
        assert!(index.is_err() || index.unwrap().total_pages == 0);
    }
}
