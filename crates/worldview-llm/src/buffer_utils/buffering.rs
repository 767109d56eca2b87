use anyhow::Result;
use std::collections::VecDeque;

/// Circular buffer for line-based parsing of chunked byte streams
///
/// Chunks may split a line (or a multi-byte character) anywhere; bytes stay
/// buffered until the terminating `\n` arrives.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract next line (up to \n) from buffer, without its line terminator
    ///
    /// Only the trailing `\n` / `\r\n` is stripped: SSE field values keep
    /// their leading and trailing spaces.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let mut line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line_bytes.pop();
        if line_bytes.last() == Some(&b'\r') {
            line_bytes.pop();
        }

        match String::from_utf8(line_bytes) {
            Ok(line) => Some(Ok(line)),
            Err(e) => Some(Err(anyhow::anyhow!("Invalid UTF-8: {}", e))),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
