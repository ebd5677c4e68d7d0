//! Pattern buffer with tail-search prompt detection.
//!
//! Only the last `search_depth` bytes are searched for a prompt, so long
//! outputs (`show version` on a stacked chassis, `show inventory` on a
//! modular switch) do not make every read quadratic.

use std::fmt;

use bytes::BytesMut;
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Default number of trailing bytes searched for a prompt.
pub const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Accumulates channel output with terminal escape sequences removed.
pub struct PatternBuffer {
    buffer: BytesMut,
    search_depth: usize,
    // Kept across chunks: an escape sequence may be split between reads.
    parser: Parser,
}

/// Collects printable text and line control characters, dropping the rest.
struct AnsiStripper<'a> {
    out: &'a mut BytesMut,
}

impl Perform for AnsiStripper<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

impl PatternBuffer {
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Append raw channel data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut stripper = AnsiStripper {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut stripper, data);
    }

    /// Search the buffer tail. Returns the end offset of the match within
    /// the whole buffer.
    pub fn search_tail(&self, pattern: &Regex) -> Option<usize> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern
            .find(&self.buffer[start..])
            .map(|m| start + m.end())
    }

    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Take the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEPTH)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_ansi_sequences() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"\x1b[1mcore1\x1b[0m#");
        assert_eq!(buffer.as_slice(), b"core1#");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"line one\r\n\x1b[");
        buffer.extend(b"0mcore1#");
        assert_eq!(buffer.as_slice(), b"line one\r\ncore1#");
    }

    #[test]
    fn test_search_tail_only() {
        let pattern = Regex::new(r"(?m)^core1#\s?$").unwrap();
        let mut buffer = PatternBuffer::new(16);
        buffer.extend(b"core1#\n");
        buffer.extend(&[b'x'; 64]);
        assert!(!buffer.tail_contains(&pattern));

        buffer.extend(b"\ncore1#");
        let end = buffer.search_tail(&pattern).unwrap();
        assert_eq!(end, buffer.len());
    }

    #[test]
    fn test_take_resets() {
        let mut buffer = PatternBuffer::default();
        buffer.extend(b"show version\r\n");
        let data = buffer.take();
        assert_eq!(data, b"show version\r\n");
        assert!(buffer.is_empty());
    }
}
