use anyhow::Result;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;

use super::buffering::CircularLineBuffer;

/// One dispatched server-sent event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// `event:` field; `None` means the default `message` type
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    pub id: Option<String>,
}

impl SseFrame {
    pub fn event_name(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }
}

/// Incremental SSE field decoder
///
/// Feed it lines (terminators already stripped). A blank line dispatches the
/// frame accumulated so far. Unlike browsers, a frame carrying only an
/// `event:` field is still dispatched, so `event: done` with no data arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    seen_field: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => {
                self.event = Some(value.to_string());
                self.seen_field = true;
            }
            "data" => {
                self.data.push(value.to_string());
                self.seen_field = true;
            }
            "id" => self.id = Some(value.to_string()),
            // `retry` and unknown fields carry nothing for us
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if !self.seen_field {
            self.event = None;
            return None;
        }
        self.seen_field = false;
        Some(SseFrame {
            event: self.event.take().filter(|e| !e.is_empty()),
            data: std::mem::take(&mut self.data).join("\n"),
            id: self.id.clone(),
        })
    }
}

/// Decode a chunked byte stream into SSE frames
///
/// A transport error is yielded once and ends the stream. A trailing frame
/// that never saw its blank line is discarded.
pub fn decode_sse_stream<S, B, E>(stream: S) -> Pin<Box<dyn Stream<Item = Result<SseFrame>> + Send>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = CircularLineBuffer::with_capacity(4096);
        let mut decoder = SseDecoder::new();

        while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes.as_ref());

                    while let Some(line_result) = buffer.next_line() {
                        match line_result {
                            Ok(line) => {
                                if let Some(frame) = decoder.feed_line(&line) {
                                    yield Ok(frame);
                                }
                            }
                            Err(e) => yield Err(e),
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    return;
                }
            }
        }
    })
}
