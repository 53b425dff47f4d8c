//! Chunked file streaming: open a PDF through `FileChunkedStream` so only
//! the chunks actually touched are read off disk, then walk its page tree.
//!
//! Run with: cargo run --example file_chunked_stream <path_to_pdf>

use pdf_lazy_store::{BaseStream, ExtractOptions, FileChunkedStream, ObjectParserOptions, PageRange, PdfStore};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <path_to_pdf>", args[0]);
        std::process::exit(1);
    }
    let file_path = &args[1];

    let options = ObjectParserOptions::default();
    let stream = FileChunkedStream::open(file_path, Some(64 * 1024), Some(10))?;
    println!("file size: {} bytes", stream.length());

    let store = PdfStore::open(Box::new(stream), options)?;
    let page_count = store.page_count()?;
    println!("page count: {}", page_count);

    for page_num in 1..=page_count.min(3) {
        let page_object = store.page_object(page_num)?;
        println!("page {} -> object {:?}", page_num, page_object);
    }

    // Re-requesting page 1 hits the object cache rather than re-parsing.
    let before = store.cache_stats();
    let _ = store.extract_range(&[PageRange { start: 1, end: 1 }], &ExtractOptions::default())?;
    let _ = store.extract_range(&[PageRange { start: 1, end: 1 }], &ExtractOptions::default())?;
    let after = store.cache_stats();
    println!(
        "cache hits went from {} to {} across the repeated request",
        before.hits, after.hits
    );

    Ok(())
}
