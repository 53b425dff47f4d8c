//! Compares opening a PDF by reading it entirely into memory (`Stream`)
//! against opening it through `FileChunkedStream`, which only touches the
//! chunks a given page request actually needs.
//!
//! Run with: cargo run --example progressive_loading <pdf_file>

use pdf_lazy_store::{BaseStream, ExtractOptions, FileChunkedStream, ObjectParserOptions, PageRange, PdfStore, Stream};
use std::env;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --example progressive_loading <pdf_file>");
        return Ok(());
    }
    let pdf_path = &args[1];

    println!("method 1: read whole file, open via Stream::from_bytes");
    let start = Instant::now();
    let bytes = std::fs::read(pdf_path)?;
    let read_time = start.elapsed();
    println!("  file read: {:?} ({} bytes)", read_time, bytes.len());

    let start = Instant::now();
    let store = PdfStore::from_bytes(bytes, ObjectParserOptions::default())?;
    let open_time = start.elapsed();
    println!("  open: {:?}", open_time);
    let page_count = store.page_count()?;
    println!("  pages: {}", page_count);

    println!("\nmethod 2: open via FileChunkedStream, nothing read up front");
    let start = Instant::now();
    let stream = FileChunkedStream::open(pdf_path, Some(65536), Some(16))?;
    let file_len = stream.length();
    let chunked_open_time = start.elapsed();
    println!("  open: {:?} ({} bytes total, none read yet)", chunked_open_time, file_len);

    let start = Instant::now();
    let chunked_store = PdfStore::open(Box::new(stream), ObjectParserOptions::default())?;
    let chunked_page_count = chunked_store.page_count()?;
    let parse_time = start.elapsed();
    println!("  page-tree build: {:?} ({} pages)", parse_time, chunked_page_count);

    println!("\non-demand page access (chunked store):");
    for page_num in 1..=chunked_page_count.min(3) {
        let start = Instant::now();
        let extracted = chunked_store.extract_range(
            &[PageRange { start: page_num, end: page_num }],
            &ExtractOptions::default(),
        )?;
        println!("  page {}: {:?} ({} resolved)", page_num, start.elapsed(), extracted.pages.len());
    }

    let mem = chunked_store.memory_stats();
    println!(
        "\nmemory at rest: {} bytes tracked (file is {} bytes on disk)",
        mem.current_bytes, file_len
    );

    Ok(())
}
