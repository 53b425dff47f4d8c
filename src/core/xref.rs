//! The cross-reference resolver (C3): locates `startxref`, parses the
//! traditional xref table (and its `/Prev` chain of incremental updates),
//! and exposes a read-only `(object#, generation) -> offset` lookup plus
//! the trailer dictionary.
//!
//! Cross-reference *streams* (PDF 1.5+) are detected, not decoded: the
//! caller gets back [`PDFError::UnsupportedXRefStream`] and is expected to
//! fall back to [`super::object_store::ObjectStore::build_basic_xref`].

use super::base_stream::BaseStream;
use super::error::{PDFError, PDFResult};
use super::lexer::Lexer;
use super::parser::{Parser, Ref};
use rustc_hash::FxHashMap;
use std::collections::HashSet;

/// Read window scanned for the `startxref` marker, from the end of the file.
const STARTXREF_SCAN_WINDOW: usize = 1024;
/// Hard cap on the number of `/Prev`-chained xref sections followed.
const MAX_PREV_SECTIONS: usize = 64;
/// Hard cap on the total number of entries accumulated across the chain.
const MAX_TOTAL_ENTRIES: usize = 10_000_000;

/// An object's location as recorded by the xref table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XRefEntry {
    /// Free-list entry: next free object number and the generation it will
    /// carry when reused.
    Free { next_free: u64, generation: u32 },
    /// Live, uncompressed object at `offset` in the file.
    InUse { offset: u64, generation: u32 },
    /// Object stored inside an object stream. Unsupported: resolving one
    /// always yields [`PDFError::CompressedObject`].
    Compressed {
        stream_object_number: u32,
        index_within_stream: u32,
    },
}

impl XRefEntry {
    pub fn is_free(&self) -> bool {
        matches!(self, XRefEntry::Free { .. })
    }

    pub fn generation(&self) -> u32 {
        match self {
            XRefEntry::Free { generation, .. } => *generation,
            XRefEntry::InUse { generation, .. } => *generation,
            XRefEntry::Compressed { .. } => 0,
        }
    }
}

/// One trailer dictionary, in traversal order (main section first).
#[derive(Debug, Clone, Default)]
pub struct Trailer {
    pub size: u32,
    pub prev: Option<u64>,
    pub root: Option<(u32, u32)>,
    pub info: Option<(u32, u32)>,
    pub encrypt: Option<(u32, u32)>,
    pub id: Option<[Vec<u8>; 2]>,
    pub xref_stm: Option<u64>,
}

/// The resolved `(object#, generation) -> location` map for one file,
/// together with the chain of trailer dictionaries that produced it.
///
/// Constructed once per open file by [`XRef::open`]; read-only thereafter.
pub struct XRef {
    entries: FxHashMap<u32, XRefEntry>,
    trailers: Vec<Trailer>,
}

impl XRef {
    /// Locates `startxref`, parses the primary section and its `/Prev`
    /// chain. On a structurally broken table returns `Err` (recoverable —
    /// the caller falls back to [`super::object_store::ObjectStore::build_basic_xref`]).
    pub fn open(stream: &mut dyn BaseStream) -> PDFResult<Self> {
        let startxref = Self::locate_startxref(stream)?;
        let mut xref = XRef {
            entries: FxHashMap::default(),
            trailers: Vec::new(),
        };
        xref.parse_chain(stream, startxref)?;
        Ok(xref)
    }

    /// Scans the trailing `STARTXREF_SCAN_WINDOW` bytes for the last
    /// occurrence of `startxref` followed by whitespace and an unsigned
    /// decimal, per §4.2.
    fn locate_startxref(stream: &mut dyn BaseStream) -> PDFResult<u64> {
        let length = stream.length();
        let window_start = length.saturating_sub(STARTXREF_SCAN_WINDOW);
        let tail = stream.get_byte_range(window_start, length)?;

        let mut best: Option<u64> = None;
        let needle = b"startxref";
        let mut i = 0;
        while i + needle.len() <= tail.len() {
            if &tail[i..i + needle.len()] == needle {
                let mut j = i + needle.len();
                while j < tail.len() && tail[j].is_ascii_whitespace() {
                    j += 1;
                }
                let digits_start = j;
                while j < tail.len() && tail[j].is_ascii_digit() {
                    j += 1;
                }
                if j > digits_start {
                    if let Ok(text) = std::str::from_utf8(&tail[digits_start..j]) {
                        if let Ok(n) = text.parse::<u64>() {
                            best = Some(n);
                        }
                    }
                }
            }
            i += 1;
        }

        best.ok_or(PDFError::MissingStartXref)
    }

    fn parse_chain(&mut self, stream: &mut dyn BaseStream, startxref: u64) -> PDFResult<()> {
        let mut pos = startxref;
        let mut visited: HashSet<u64> = HashSet::new();
        let mut sections = 0usize;
        let mut total_entries = 0usize;

        loop {
            if !visited.insert(pos) {
                break;
            }
            sections += 1;
            if sections > MAX_PREV_SECTIONS {
                return Err(PDFError::MalformedXRef(format!(
                    "exceeded {} chained xref sections",
                    MAX_PREV_SECTIONS
                )));
            }

            let offset = pos as usize;
            if offset >= stream.length() {
                return Err(PDFError::MalformedXRef(format!(
                    "xref offset {} beyond end of file",
                    pos
                )));
            }

            // A digit here means a compressed xref stream object (`N 0 obj`),
            // not the `xref` keyword.
            let first_byte = stream.get_byte_range(offset, offset + 1)?[0];
            if first_byte.is_ascii_digit() {
                return Err(PDFError::UnsupportedXRefStream(pos));
            }

            let sub_stream = stream.make_sub_stream(offset, stream.length() - offset)?;
            let lexer = Lexer::new(sub_stream)?;
            let mut parser = Parser::new(lexer)?;

            let keyword = parser.get_object()?;
            if !keyword.is_command("xref") {
                return Err(PDFError::MalformedXRef(
                    "expected 'xref' keyword at startxref offset".to_string(),
                ));
            }

            // `read_subsections` already consumes the `trailer` keyword
            // itself (it's the token that tells it the subsection list is
            // done), so the next object here is the trailer dictionary.
            let entries_read = self.read_subsections(&mut parser, &mut total_entries)?;
            let _ = entries_read;

            let trailer_obj = parser.get_object()?;
            let dict = trailer_obj.as_dictionary().ok_or_else(|| {
                PDFError::MalformedXRef("trailer is not a dictionary".to_string())
            })?;

            let trailer = Self::build_trailer(dict);
            let prev = trailer.prev;
            self.trailers.push(trailer);

            match prev {
                Some(next_pos) => pos = next_pos,
                None => break,
            }
        }

        Ok(())
    }

    fn read_subsections(
        &mut self,
        parser: &mut Parser,
        total_entries: &mut usize,
    ) -> PDFResult<usize> {
        use super::parser::PDFObject;

        let mut read = 0usize;
        loop {
            let first_obj = parser.get_object()?;
            if first_obj.is_command("trailer") {
                // The `trailer` keyword is consumed here; the caller reads
                // the dictionary that follows directly, with no token to
                // push back.
                return Ok(read);
            }

            let first = match first_obj {
                PDFObject::Number(n) if n >= 0.0 => n as u32,
                _ => {
                    return Err(PDFError::MalformedXRef(format!(
                        "expected subsection start, got {:?}",
                        first_obj
                    )))
                }
            };

            let count_obj = parser.get_object()?;
            let count = match count_obj {
                PDFObject::Number(n) if n >= 0.0 => n as u32,
                _ => {
                    return Err(PDFError::MalformedXRef(format!(
                        "expected subsection count, got {:?}",
                        count_obj
                    )))
                }
            };

            for i in 0..count {
                *total_entries += 1;
                if *total_entries > MAX_TOTAL_ENTRIES {
                    return Err(PDFError::MalformedXRef(format!(
                        "exceeded {} total xref entries",
                        MAX_TOTAL_ENTRIES
                    )));
                }

                let entry = match self.read_one_entry(parser) {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("skipping malformed xref entry: {:?}", e);
                        continue;
                    }
                };
                let obj_num = first + i;
                // First occurrence wins: sections are processed newest-first,
                // so whichever section reaches an object number first holds
                // the live entry.
                self.entries.entry(obj_num).or_insert(entry);
                read += 1;
            }
        }
    }

    fn read_one_entry(&self, parser: &mut Parser) -> PDFResult<XRefEntry> {
        use super::parser::PDFObject;

        let offset_obj = parser.get_object()?;
        let offset = match offset_obj {
            PDFObject::Number(n) => n as u64,
            other => {
                return Err(PDFError::MalformedXRef(format!(
                    "expected offset, got {:?}",
                    other
                )))
            }
        };

        let gen_obj = parser.get_object()?;
        let generation = match gen_obj {
            PDFObject::Number(n) => n as u32,
            other => {
                return Err(PDFError::MalformedXRef(format!(
                    "expected generation, got {:?}",
                    other
                )))
            }
        };

        let flag_obj = parser.get_object()?;
        if flag_obj.is_command("f") {
            Ok(XRefEntry::Free {
                next_free: offset,
                generation,
            })
        } else if flag_obj.is_command("n") {
            Ok(XRefEntry::InUse { offset, generation })
        } else {
            // Unknown flag: treat liberally as free per §4.2.
            Ok(XRefEntry::Free {
                next_free: offset,
                generation,
            })
        }
    }

    fn build_trailer(dict: &std::collections::HashMap<String, super::parser::PDFObject>) -> Trailer {
        use super::parser::PDFObject;

        let as_ref = |obj: Option<&PDFObject>| -> Option<(u32, u32)> {
            match obj {
                Some(PDFObject::Ref(Ref { num, generation })) => Some((*num, *generation)),
                _ => None,
            }
        };

        let size = match dict.get("Size") {
            Some(PDFObject::Number(n)) => *n as u32,
            _ => 0,
        };
        let prev = match dict.get("Prev") {
            Some(PDFObject::Number(n)) => Some(*n as u64),
            _ => None,
        };
        let xref_stm = match dict.get("XRefStm") {
            Some(PDFObject::Number(n)) => Some(*n as u64),
            _ => None,
        };
        let id = match dict.get("ID") {
            Some(PDFObject::Array(arr)) if arr.len() == 2 => {
                let a = match arr[0].as_ref() {
                    PDFObject::String(s) | PDFObject::HexString(s) => s.clone(),
                    _ => return Trailer {
                        size,
                        prev,
                        root: as_ref(dict.get("Root")),
                        info: as_ref(dict.get("Info")),
                        encrypt: as_ref(dict.get("Encrypt")),
                        id: None,
                        xref_stm,
                    },
                };
                let b = match arr[1].as_ref() {
                    PDFObject::String(s) | PDFObject::HexString(s) => s.clone(),
                    _ => Vec::new(),
                };
                Some([a, b])
            }
            _ => None,
        };

        Trailer {
            size,
            prev,
            root: as_ref(dict.get("Root")),
            info: as_ref(dict.get("Info")),
            encrypt: as_ref(dict.get("Encrypt")),
            id,
            xref_stm,
        }
    }

    /// Returns the precise entry for `(n, g)` when the xref table carries a
    /// matching generation.
    pub fn entry(&self, n: u32, g: u32) -> Option<&XRefEntry> {
        self.entries
            .get(&n)
            .filter(|e| e.generation() == g || matches!(e, XRefEntry::Compressed { .. }))
    }

    /// Returns the live entry for `n` regardless of generation: the xref
    /// table only ever retains one, the highest-generation in-use entry
    /// across the whole `Prev` chain.
    pub fn latest(&self, n: u32) -> Option<&XRefEntry> {
        self.entries.get(&n)
    }

    /// Total number of distinct object numbers with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `/Root` indirect reference, taken from the first trailer in the
    /// chain (main section first) that carries one.
    pub fn root(&self) -> PDFResult<(u32, u32)> {
        self.trailers
            .iter()
            .find_map(|t| t.root)
            .ok_or(PDFError::MissingRoot)
    }

    /// `/Size` from the main trailer, or 0 if the chain is empty.
    pub fn size(&self) -> u32 {
        self.trailers.first().map(|t| t.size).unwrap_or(0)
    }

    /// The main trailer (first in traversal order), if any was parsed.
    pub fn main_trailer(&self) -> Option<&Trailer> {
        self.trailers.first()
    }

    /// All trailers in traversal order (main section first).
    pub fn trailers(&self) -> &[Trailer] {
        &self.trailers
    }

    /// Builds an `XRef` directly from entries found by a raw envelope scan
    /// (§4.3's `build_basic_xref` fallback). Carries no trailer, so
    /// `root()` always returns `MissingRoot` — the page-tree walker is
    /// expected to fall back to its own pattern scan in that case.
    pub(crate) fn from_scanned_entries(entries: FxHashMap<u32, XRefEntry>) -> XRef {
        XRef {
            entries,
            trailers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::Stream;

    fn build_pdf() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"%PDF-1.4\n");
        let obj1_off = data.len();
        data.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let obj2_off = data.len();
        data.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n");
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
    fn locates_and_parses_single_section() {
        let data = build_pdf();
        let mut stream = Stream::from_bytes(data);
        let xref = XRef::open(&mut stream).unwrap();

        assert_eq!(xref.root().unwrap(), (1, 0));
        assert_eq!(xref.size(), 3);
        assert!(matches!(xref.entry(1, 0), Some(XRefEntry::InUse { .. })));
        assert!(matches!(xref.entry(0, 65535), Some(XRefEntry::Free { .. })));
        assert!(xref.entry(99, 0).is_none());
    }

    #[test]
    fn missing_startxref_is_reported() {
        let data = b"%PDF-1.4\nnot a real tail".to_vec();
        let mut stream = Stream::from_bytes(data);
        let err = XRef::open(&mut stream).unwrap_err();
        assert!(matches!(err, PDFError::MissingStartXref));
    }

    #[test]
    fn detects_xref_stream_as_unsupported() {
        let mut data = Vec::new();
        data.extend_from_slice(b"%PDF-1.5\n");
        let xref_off = data.len();
        data.extend_from_slice(b"3 0 obj\n<< /Type /XRef /Size 1 /W [1 1 1] >>\nstream\n\x01\x00\x00\nendstream\nendobj\n");
        data.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());

        let mut stream = Stream::from_bytes(data);
        let err = XRef::open(&mut stream).unwrap_err();
        assert!(matches!(err, PDFError::UnsupportedXRefStream(_)));
    }

    #[test]
    fn incremental_update_wins_over_original() {
        // S6: object 5 at offset A in the original section, re-defined at
        // offset B by an incremental update whose xref is chained via /Prev
        // and scanned first (newest-first).
        let mut data = Vec::new();
        data.extend_from_slice(b"%PDF-1.4\n");
        let a_off = data.len();
        data.extend_from_slice(b"5 0 obj\n(original)\nendobj\n");
        let orig_xref_off = data.len();
        data.extend_from_slice(b"xref\n0 6\n");
        data.extend_from_slice(b"0000000000 65535 f \n");
        for _ in 0..4 {
            data.extend_from_slice(b"0000000000 00000 f \n");
        }
        data.extend_from_slice(format!("{:010} 00000 n \n", a_off).as_bytes());
        data.extend_from_slice(b"trailer\n<< /Size 6 /Root 1 0 R >>\n");

        let b_off = data.len();
        data.extend_from_slice(b"5 0 obj\n(updated)\nendobj\n");
        let new_xref_off = data.len();
        data.extend_from_slice(b"xref\n5 1\n");
        data.extend_from_slice(format!("{:010} 00000 n \n", b_off).as_bytes());
        data.extend_from_slice(
            format!(
                "trailer\n<< /Size 6 /Root 1 0 R /Prev {} >>\n",
                orig_xref_off
            )
            .as_bytes(),
        );
        data.extend_from_slice(format!("startxref\n{}\n%%EOF", new_xref_off).as_bytes());

        let mut stream = Stream::from_bytes(data);
        let xref = XRef::open(&mut stream).unwrap();
        match xref.latest(5).unwrap() {
            XRefEntry::InUse { offset, .. } => assert_eq!(*offset as usize, b_off),
            other => panic!("expected InUse entry, got {:?}", other),
        }
    }
}
