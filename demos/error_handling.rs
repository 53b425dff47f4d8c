//! Error handling patterns: validating a file before opening it, matching
//! on the error taxonomy, and falling back gracefully when only part of a
//! page range can be resolved.
//!
//! Run with: cargo run --example error_handling <pdf_file>

use pdf_lazy_store::{ExtractOptions, ObjectParserOptions, PDFError, PageRange, PdfStore};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --example error_handling <pdf_file>");
        demonstrate_error_scenarios();
        return;
    }

    let pdf_path = &args[1];
    if !validate_file(pdf_path) {
        return;
    }

    match PdfStore::from_path(pdf_path, ObjectParserOptions::default()) {
        Ok(store) => {
            println!("opened successfully");
            match store.page_count() {
                Ok(n) => println!("page count: {}", n),
                Err(e) => println!("page count unavailable: {} (recoverable: {})", e, e.is_recoverable()),
            }

            let result = store.extract_range(
                &[PageRange { start: 1, end: 1_000_000 }],
                &ExtractOptions::default(),
            );
            match result {
                Ok(extracted) => println!("resolved {} page(s), {} warning(s)", extracted.pages.len(), extracted.warnings.len()),
                Err(e) => println!("extraction failed: {}", e),
            }
        }
        Err(e) => {
            println!("open failed: {}", e);
            match e {
                PDFError::NotAPdf => println!("  tip: file has no %PDF header and no obj envelopes"),
                PDFError::MissingStartXref | PDFError::MalformedXRef(_) => {
                    println!("  tip: xref table is unusable; a fallback scan was attempted and also failed")
                }
                PDFError::MissingRoot => println!("  tip: no trailer carries /Root"),
                other => println!("  recoverable: {}", other.is_recoverable()),
            }
        }
    }
}

fn validate_file(path: &str) -> bool {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            println!("cannot stat {}: {}", path, e);
            return false;
        }
    };
    if metadata.len() == 0 {
        println!("{} is empty", path);
        return false;
    }
    println!("{}: {} bytes", path, metadata.len());
    true
}

fn demonstrate_error_scenarios() {
    println!("Error taxonomy (see PDFError):");
    println!("  NotAPdf, MissingStartXref, MissingRoot        -- fatal, open() fails");
    println!("  MalformedXRef, UnsupportedXRefStream          -- recoverable via fallback scan");
    println!("  MissingObject, MalformedObject                -- recoverable per-object");
    println!("  CompressedObject                              -- terminal until object streams are supported");
    println!("  MemoryExhausted                               -- caller releases resources and retries");
    println!("  CircularReference                             -- page-tree walker skips the revisit");
}
