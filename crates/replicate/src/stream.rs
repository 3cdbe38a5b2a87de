//! Incremental decoder for Replicate's server-sent-event streams.
//!
//! Transport chunks do not align with event boundaries, so the decoder
//! buffers input and emits an event only once its terminating blank
//! line has arrived. The sequence is finite and forward-only: after
//! the `[DONE]` sentinel (or a provider `done` event) no further
//! events are produced.

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name from the `event:` line (`message` when absent).
    pub event: String,
    /// Payload assembled from the `data:` lines, joined with `\n`.
    pub data: String,
}

/// Sentinel data payload that terminates a stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Default event name per the SSE specification.
const DEFAULT_EVENT: &str = "message";

/// Stateful chunk-to-event decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the sentinel terminator has been observed. Once true,
    /// [`feed`](Self::feed) never yields another event.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Consume one transport chunk and return every event completed by
    /// it, in arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        if self.done {
            return Vec::new();
        }
        // Normalize CRLF to LF so block detection only has to look
        // for `\n\n`, even when a `\r\n` pair straddles two chunks.
        for ch in String::from_utf8_lossy(chunk).chars() {
            if ch != '\r' {
                self.buffer.push(ch);
            }
        }

        let mut events = Vec::new();
        // A blank line terminates each event block.
        while let Some(pos) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..pos + 2).collect();
            let Some(event) = parse_block(&block) else {
                continue;
            };
            if event.data == DONE_SENTINEL || event.event == "done" {
                self.done = true;
                return events;
            }
            events.push(event);
        }
        events
    }
}

/// Parse one event block (lines up to and including the blank line).
///
/// Returns `None` for blocks with no `data:` line (e.g. comment-only
/// keepalive blocks).
fn parse_block(block: &str) -> Option<SseEvent> {
    let mut event = DEFAULT_EVENT.to_string();
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            event = value.trim_start().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
        // `id:` and comment lines are ignored; the relay has no
        // reconnect protocol so last-event-id is meaningless here.
    }

    if data.is_empty() {
        return None;
    }
    Some(SseEvent {
        event,
        data: data.join("\n"),
    })
}
