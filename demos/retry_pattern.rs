//! The exception-driven retry pattern `retry_on_data_missing!` is built on:
//! an operation raises `DataMissing { position, length }`, the caller loads
//! that range, and the macro retries. This demo walks through opening a
//! file and reports what the macro would do if a network-backed stream
//! ever surfaced `DataMissing` mid-parse.
//!
//! Run with: cargo run --example retry_pattern <pdf-file>

use pdf_lazy_store::{ObjectParserOptions, PdfStore};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <pdf-file>", args[0]);
        eprintln!("\nretry_on_data_missing! wraps an operation so that:");
        eprintln!("  1. it's attempted with whatever data is already loaded");
        eprintln!("  2. on DataMissing{{position, length}}, the stream loads that range");
        eprintln!("  3. the operation is retried, up to a bounded number of times");
        std::process::exit(1);
    }

    let pdf_path = &args[1];
    let store = match PdfStore::from_path(pdf_path, ObjectParserOptions::default()) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("open failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("opened {}", pdf_path);
    if let Ok(pages) = store.page_count() {
        println!("pages: {}", pages);
    }

    println!("\nmacro usage:");
    println!("  retry_on_data_missing!(stream, {{");
    println!("      parser.parse_xref()");
    println!("  }})");
    println!("\nfor file-backed streams this rarely fires -- chunk loads are cheap.");
    println!("it matters for HTTP-backed streams, where each retry is a range request.");
}
