//! A fully in-memory [`BaseStream`] over a byte buffer.
//!
//! This is the byte source for documents opened via `PDFDocument::open`
//! (where the whole file was already read into a `Vec<u8>`) and for the
//! small slices the parser peels off to decode filtered content. It never
//! raises `DataMissing`: all bytes are resident from construction.

use super::base_stream::BaseStream;
use super::error::{PDFError, PDFResult};
use std::sync::Arc;

/// An in-memory byte buffer, shared cheaply across clones via `Arc`.
#[derive(Clone)]
pub struct Stream {
    data: Arc<Vec<u8>>,
    start: usize,
    length: usize,
    pos: usize,
}

impl Stream {
    /// Wraps the whole buffer as one stream starting at position 0.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let length = data.len();
        Stream {
            data: Arc::new(data),
            start: 0,
            length,
            pos: 0,
        }
    }

    /// Borrows the full backing buffer (ignores `start`/`length`).
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[self.start..self.start + self.length]
    }

    fn absolute_pos(&self) -> usize {
        self.start + self.pos
    }
}

impl BaseStream for Stream {
    fn length(&self) -> usize {
        self.length
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) -> PDFResult<()> {
        if pos > self.length {
            return Err(PDFError::InvalidPosition {
                pos,
                length: self.length,
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn is_data_loaded(&self) -> bool {
        true
    }

    fn get_byte(&mut self) -> PDFResult<u8> {
        if self.pos >= self.length {
            return Err(PDFError::UnexpectedEndOfStream);
        }
        let byte = self.data[self.absolute_pos()];
        self.pos += 1;
        Ok(byte)
    }

    fn get_bytes(&mut self, length: usize) -> PDFResult<Vec<u8>> {
        let actual_length = length.min(self.length - self.pos);
        let start = self.absolute_pos();
        let bytes = self.data[start..start + actual_length].to_vec();
        self.pos += actual_length;
        Ok(bytes)
    }

    fn get_byte_range(&self, begin: usize, end: usize) -> PDFResult<Vec<u8>> {
        if begin > end || end > self.length {
            return Err(PDFError::InvalidByteRange { begin, end });
        }
        let abs_begin = self.start + begin;
        let abs_end = self.start + end;
        Ok(self.data[abs_begin..abs_end].to_vec())
    }

    fn reset(&mut self) -> PDFResult<()> {
        self.pos = 0;
        Ok(())
    }

    fn move_start(&mut self) -> PDFResult<()> {
        if self.pos > 0 {
            self.start += self.pos;
            self.length -= self.pos;
            self.pos = 0;
        }
        Ok(())
    }

    fn make_sub_stream(&self, start: usize, length: usize) -> PDFResult<Box<dyn BaseStream>> {
        if start + length > self.length {
            return Err(PDFError::InvalidByteRange {
                begin: start,
                end: start + length,
            });
        }
        Ok(Box::new(Stream {
            data: Arc::clone(&self.data),
            start: self.start + start,
            length,
            pos: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_sequential_bytes() {
        let mut stream = Stream::from_bytes(vec![10, 20, 30, 40]);
        assert_eq!(stream.get_byte().unwrap(), 10);
        assert_eq!(stream.get_byte().unwrap(), 20);
        assert_eq!(stream.pos(), 2);
    }

    #[test]
    fn get_byte_range_is_position_independent() {
        let mut stream = Stream::from_bytes(vec![1, 2, 3, 4, 5]);
        stream.set_pos(4).unwrap();
        assert_eq!(stream.get_byte_range(1, 3).unwrap(), vec![2, 3]);
        assert_eq!(stream.pos(), 4);
    }

    #[test]
    fn make_sub_stream_shares_buffer() {
        let stream = Stream::from_bytes(vec![0, 1, 2, 3, 4, 5]);
        let mut sub = stream.make_sub_stream(2, 3).unwrap();
        assert_eq!(sub.get_bytes(3).unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn read_past_end_errors() {
        let mut stream = Stream::from_bytes(vec![1]);
        let _ = stream.get_byte();
        assert!(stream.get_byte().is_err());
    }
}
