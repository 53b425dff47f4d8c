//! Benchmarks chunked read patterns against `FileChunkedStream`: small,
//! medium, and large reads, reads spanning several chunk boundaries, and a
//! sequence of small reads typical of object-envelope scanning.

use pdf_lazy_store::{BaseStream, FileChunkedStream};
use std::io::Write;
use std::time::Instant;
use tempfile::NamedTempFile;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== FileChunkedStream read benchmark ===\n");

    let size = 10 * 1024 * 1024;
    println!("creating test file: {} MB", size / 1024 / 1024);

    let mut temp_file = NamedTempFile::new()?;
    let data: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
    temp_file.write_all(&data)?;
    temp_file.flush()?;

    let mut stream = FileChunkedStream::open(temp_file.path(), Some(65536), Some(20))?;
    println!("file size: {} MB, chunk size: 64 KB\n", stream.length() / 1024 / 1024);

    time_read(&mut stream, 0, 100, "100-byte read");
    time_read(&mut stream, 1000, 10 * 1024, "10 KB read");
    time_read(&mut stream, 100_000, 1024 * 1024, "1 MB read (spans ~16 chunks)");
    time_read(&mut stream, 65_000, 320_000, "320 KB read across 5 chunk boundaries");

    println!("\nsequential small reads (100 x 4 KB):");
    stream.set_pos(200_000)?;
    let start = Instant::now();
    for _ in 0..100 {
        let _ = stream.get_bytes(4096)?;
    }
    println!("  total time: {:?}", start.elapsed());

    Ok(())
}

fn time_read(stream: &mut FileChunkedStream, pos: usize, len: usize, label: &str) {
    if stream.set_pos(pos).is_err() {
        println!("{}: seek failed", label);
        return;
    }
    let start = Instant::now();
    match stream.get_bytes(len) {
        Ok(bytes) => println!("{}: {:?} ({} bytes)", label, start.elapsed(), bytes.len()),
        Err(e) => println!("{}: failed ({})", label, e),
    }
}
