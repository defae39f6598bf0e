//! Accumulating output buffer with terminal escape stripping.
//!
//! The shell writes prompts, echoes and colour codes around the payload.
//! Escape sequences are removed as the bytes arrive so that nothing but
//! printable text and line breaks reaches the payload extractor. The vte
//! parser keeps its state between chunks, so a sequence split across two
//! reads is still removed.

use std::borrow::Cow;

use bytes::{Bytes, BytesMut};

/// Buffer for accumulating cleaned shell output.
pub struct OutputBuffer {
    /// Cleaned output collected so far.
    buffer: BytesMut,

    /// Escape sequence parser, persistent across chunks.
    parser: vte::Parser,

    /// Raw bytes received, before stripping.
    received: usize,
}

impl OutputBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(16 * 1024),
            parser: vte::Parser::new(),
            received: 0,
        }
    }

    /// Append a chunk, dropping escape sequences and control bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.received += data.len();
        let mut sink = Printable {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut sink, data);
    }

    /// Cleaned contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Cleaned contents as text (lossy UTF-8 conversion).
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Number of raw bytes fed in, including stripped sequences.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Get the cleaned length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Freeze the contents into an immutable buffer.
    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// vte performer that keeps printable characters and line structure.
struct Printable<'a> {
    out: &'a mut BytesMut,
}

impl vte::Perform for Printable<'_> {
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
