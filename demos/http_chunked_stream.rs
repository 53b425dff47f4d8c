//! Progressive PDF loading over HTTP range requests. Requires the `async`
//! feature (it gates the `reqwest`-backed stream types).
//!
//! Run with: cargo run --example http_chunked_stream --features async <pdf_url>

#[cfg(feature = "async")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use pdf_lazy_store::{BaseStream, ExtractOptions, HttpChunkedStream, ObjectParserOptions, PageRange, PdfStore};
    use std::env;

    let args: Vec<String> = env::args().collect();
    let url = match args.get(1) {
        Some(u) => u.as_str(),
        None => {
            eprintln!("Usage: {} <pdf_url>", args[0]);
            std::process::exit(1);
        }
    };

    println!("fetching: {}", url);
    let stream = HttpChunkedStream::open(url, Some(65536), Some(10))?;
    println!(
        "file size: {} bytes across {} chunks of 64 KB (10 kept resident)",
        stream.length(),
        stream.num_chunks()
    );

    let store = PdfStore::open(Box::new(stream), ObjectParserOptions::default())?;
    let page_count = store.page_count()?;
    println!("pages: {}", page_count);

    let ranges = [PageRange { start: 1, end: page_count.min(3) }];
    let extracted = store.extract_range(&ranges, &ExtractOptions::default())?;
    let mut pages: Vec<_> = extracted.pages.values().collect();
    pages.sort_by_key(|p| p.page_number);
    for page in pages {
        println!(
            "  page {}: MediaBox {:?}, rotate {}",
            page.page_number, page.media_box, page.rotate
        );
    }

    println!("fetched {} chunk(s) while resolving those pages", store.cache_stats().size);
    Ok(())
}

#[cfg(not(feature = "async"))]
fn main() {
    eprintln!("this example requires the `async` feature: cargo run --example http_chunked_stream --features async <pdf_url>");
}
