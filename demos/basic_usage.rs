//! Basic usage: open a PDF, ask for its page count, and pull structural
//! content for the first couple of pages.
//!
//! Run with: cargo run --example basic_usage [pdf_file]

use pdf_lazy_store::{ExtractOptions, ObjectParserOptions, PageRange, PdfStore};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let store = if let Some(path) = args.get(1) {
        println!("Opening {}", path);
        PdfStore::from_path(path, ObjectParserOptions::default())?
    } else {
        eprintln!("No file given, using a synthetic three-page PDF instead.");
        PdfStore::from_bytes(synthetic_pdf(), ObjectParserOptions::default())?
    };

    let page_count = store.page_count()?;
    println!("Page count: {}", page_count);

    let ranges = [PageRange {
        start: 1,
        end: page_count.min(2),
    }];
    let extracted = store.extract_range(&ranges, &ExtractOptions::default())?;

    println!("Extracted {} page(s) in {} ms:", extracted.pages.len(), extracted.processing_time_ms);
    let mut pages: Vec<_> = extracted.pages.values().collect();
    pages.sort_by_key(|p| p.page_number);
    for page in pages {
        println!(
            "  page {}: object {:?}, MediaBox {:?}, rotate {}, {} content ref(s)",
            page.page_number,
            page.page_object,
            page.media_box,
            page.rotate,
            page.content_refs.len(),
        );
    }

    if !extracted.warnings.is_empty() {
        println!("Warnings:");
        for w in &extracted.warnings {
            println!("  - {}", w);
        }
    }

    let mem = store.memory_stats();
    println!("Memory at rest: {}/{} bytes", mem.current_bytes, mem.max_bytes);

    Ok(())
}

fn synthetic_pdf() -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = vec![0u64; 10];

    offsets[1] = buf.len() as u64;
    buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    offsets[2] = buf.len() as u64;
    buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 /MediaBox [0 0 612 792] >>\nendobj\n");
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
            format!("{} 0 obj\n<< /Length 4 >>\nstream\nABCD\nendstream\nendobj\n", content_obj).as_bytes(),
        );
    }
    offsets[9] = buf.len() as u64;
    buf.extend_from_slice(b"9 0 obj\n<< /Font << >> >>\nendobj\n");

    let xref_off = buf.len() as u64;
    buf.extend_from_slice(b"xref\n0 10\n0000000000 65535 f \n");
    for n in 1..10u32 {
        buf.extend_from_slice(format!("{:010} 00000 n \n", offsets[n as usize]).as_bytes());
    }
    buf.extend_from_slice(b"trailer\n<< /Size 10 /Root 1 0 R >>\n");
    buf.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());
    buf
}
