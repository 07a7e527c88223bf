//! Server-Sent Events (SSE) stream processing.
//!
//! Every streaming endpoint of the study backend (notes, chat, schedule)
//! frames its events one per line:
//! ```text
//! data: {"subject_name": "Operating Systems"}
//!
//! data: {"text": "## Processes\n"}
//!
//! data: {"done": true}
//! ```
//!
//! [`SseDecoder`] turns raw bytes into [`SseEvent`]s. It keeps partial UTF-8
//! sequences and partial lines between chunks, so the events produced never
//! depend on where the transport happened to split the body.

use std::collections::VecDeque;

use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ClientError;

/// One event recognized in a `data:` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Subject metadata announced at the start of a notes stream.
    Subject(String),
    /// A content delta to append to the accumulated response.
    Text(String),
    /// An in-band failure reported by the backend.
    Error(String),
    /// The backend finished producing content.
    Done,
}

/// Incremental decoder from response bytes to [`SseEvent`]s.
///
/// # Example
/// ```
/// use studykit::sse::{SseDecoder, SseEvent};
///
/// let mut decoder = SseDecoder::new();
/// assert!(decoder.feed(b"data: {\"te").is_empty());
/// assert_eq!(
///     decoder.feed(b"xt\":\"hi\"}\n"),
///     vec![SseEvent::Text("hi".to_string())]
/// );
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    buffer: String,
    /// Length of the prefix of `buffer` already known to hold no newline.
    scanned: usize,
    skipped: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes and return the events of every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.decode(chunk);

        let mut events = Vec::new();
        let unscanned = &self.buffer[self.scanned..];
        let Some(last_newline) = unscanned.rfind('\n').map(|i| self.scanned + i) else {
            self.scanned = self.buffer.len();
            return events;
        };

        let remainder = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, remainder);
        self.scanned = self.buffer.len();

        for line in complete.lines() {
            let Some(payload) = parse_sse_line(line) else {
                continue;
            };
            if payload.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(payload) {
                Ok(value) => events.extend(events_from_payload(&value)),
                Err(e) => {
                    self.skipped += 1;
                    warn!("Skipping malformed SSE frame ({}): {}", e, payload);
                }
            }
        }

        events
    }

    /// End of input. Returns the text of a trailing line that never got its
    /// newline; that frame is not parsed.
    pub fn finish(&mut self) -> Option<String> {
        self.pending.clear();
        self.scanned = 0;
        let rest = std::mem::take(&mut self.buffer);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }

    /// Number of `data:` frames dropped because their payload was not JSON.
    pub fn skipped_frames(&self) -> usize {
        self.skipped
    }

    fn decode(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let mut input = self.pending.as_slice();
        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    self.buffer.push_str(valid);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    self.buffer
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        // Sequence cut by the chunk boundary: wait for the next chunk.
                        None => {
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }

        let consumed = self.pending.len() - input.len();
        self.pending.drain(..consumed);
    }
}

/// Extract the payload of an SSE `data: ` line.
///
/// # Example
/// ```
/// use studykit::sse::parse_sse_line;
///
/// assert_eq!(parse_sse_line("  data: {\"done\": true}\r"), Some("{\"done\": true}"));
/// assert_eq!(parse_sse_line("event: ping"), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.trim().strip_prefix("data: ").map(str::trim)
}

/// JavaScript truthiness of a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn events_from_payload(value: &Value) -> Vec<SseEvent> {
    let mut events = Vec::new();

    if let Some(Value::String(name)) = value.get("subject_name") {
        events.push(SseEvent::Subject(name.clone()));
    }

    if let Some(Value::String(text)) = value.get("text") {
        if !text.is_empty() {
            events.push(SseEvent::Text(text.clone()));
        }
    }

    if let Some(error) = value.get("error").filter(|e| is_truthy(e)) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        events.push(SseEvent::Error(message));
    }

    if value.get("done").is_some_and(is_truthy) {
        events.push(SseEvent::Done);
    }

    events
}

/// Turn a byte stream into a stream of [`SseEvent`]s.
///
/// Transport errors are yielded once and end the stream. Malformed frames are
/// logged and skipped.
pub fn decode_stream<S, B, E>(byte_stream: S) -> impl Stream<Item = Result<SseEvent, ClientError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: Into<ClientError> + Send,
{
    stream::unfold(
        (
            Box::pin(byte_stream),
            SseDecoder::new(),
            VecDeque::<SseEvent>::new(),
            false,
        ),
        |(mut byte_stream, mut decoder, mut queue, mut ended)| async move {
            loop {
                if let Some(event) = queue.pop_front() {
                    return Some((Ok(event), (byte_stream, decoder, queue, ended)));
                }
                if ended {
                    return None;
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => queue.extend(decoder.feed(chunk.as_ref())),
                    Some(Err(e)) => {
                        ended = true;
                        return Some((Err(e.into()), (byte_stream, decoder, queue, ended)));
                    }
                    None => {
                        ended = true;
                        if let Some(dropped) = decoder.finish() {
                            debug!("Dropping unterminated trailing SSE frame: {}", dropped);
                        }
                    }
                }
            }
        },
    )
}

/// Extension trait for `reqwest::Response` to decode its body as SSE events.
///
/// # Example
/// ```ignore
/// use studykit::sse::SSEResponseExt;
///
/// let response = http.post(url).json(&body).send().await?;
/// let mut events = response.sse_events();
/// while let Some(event) = events.next().await {
///     println!("{:?}", event?);
/// }
/// ```
pub trait SSEResponseExt {
    fn sse_events(self) -> impl Stream<Item = Result<SseEvent, ClientError>> + Send;
}

impl SSEResponseExt for reqwest::Response {
    fn sse_events(self) -> impl Stream<Item = Result<SseEvent, ClientError>> + Send {
        decode_stream(self.bytes_stream())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn text(s: &str) -> SseEvent {
        SseEvent::Text(s.to_string())
    }

    fn feed_all(chunks: &[&[u8]]) -> Vec<SseEvent> {
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.feed(chunk));
        }
        decoder.finish();
        events
    }

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: hello"), Some("hello"));
        assert_eq!(parse_sse_line("data: {\"text\":\"a\"}  "), Some("{\"text\":\"a\"}"));
        assert_eq!(parse_sse_line("data:"), None);
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line(""), None);
    }

    #[test]
    fn test_two_frames_in_order() {
        let events = feed_all(&[b"data: {\"text\":\"ab\"}\ndata: {\"text\":\"cd\"}\n"]);
        assert_eq!(events, vec![text("ab"), text("cd")]);

        let events = feed_all(&[b"data: {\"text\":\"ab\"}\n", b"data: {\"text\":\"cd\"}\n"]);
        assert_eq!(events, vec![text("ab"), text("cd")]);
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(
            b"data: {\"text\":\"one\"}\n\ndata: {not json}\n\ndata: {\"text\":\"two\"}\n\n",
        );
        assert_eq!(events, vec![text("one"), text("two")]);
        assert_eq!(decoder.skipped_frames(), 1);
    }

    #[test]
    fn test_error_frame() {
        let events = feed_all(&[b"data: {\"error\":\"boom\"}\n"]);
        assert_eq!(events, vec![SseEvent::Error("boom".to_string())]);
    }

    #[test]
    fn test_trailing_frame_without_newline_is_dropped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"text\":\"kept\"}\ndata: {\"text\":\"lost\"}");
        assert_eq!(events, vec![text("kept")]);
        assert_eq!(decoder.finish().as_deref(), Some("data: {\"text\":\"lost\"}"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_json_split_across_chunks() {
        let events = feed_all(&[b"data: {\"te", b"xt\":\"hi\"}\n", b""]);
        assert_eq!(events, vec![text("hi")]);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let body = "data: {\"text\":\"caf\u{e9} \u{2713}\"}\n".as_bytes();
        let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let events = feed_all(&[&body[..split], &body[split..]]);
        assert_eq!(events, vec![text("caf\u{e9} \u{2713}")]);
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let body = concat!(
            "data: {\"subject_name\":\"Data Structures\"}\n\n",
            "data: {\"text\":\"# \u{1F4DA} Notes\\n\"}\n\n",
            ": keep-alive\n",
            "data: {broken\n\n",
            "data: {\"text\":\"\u{00FC}ber \u{4E2D}\u{6587}\"}\r\n\r\n",
            "data: {\"done\":true}\n\n",
            "data: {\"text\":\"tail\"}"
        )
        .as_bytes();

        let whole = feed_all(&[body]);
        assert_eq!(
            whole,
            vec![
                SseEvent::Subject("Data Structures".to_string()),
                text("# \u{1F4DA} Notes\n"),
                text("\u{00FC}ber \u{4E2D}\u{6587}"),
                SseEvent::Done,
            ]
        );

        for split in 0..=body.len() {
            assert_eq!(feed_all(&[&body[..split], &body[split..]]), whole, "split at {split}");
        }

        let bytewise: Vec<&[u8]> = body.chunks(1).collect();
        assert_eq!(feed_all(&bytewise), whole);
    }

    #[test]
    fn test_long_line_in_small_chunks_scans_only_new_text() {
        let text = "x".repeat(4096);
        let frame = format!("data: {{\"text\": \"{text}\"}}\n");
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();

        for byte in frame.as_bytes() {
            events.extend(decoder.feed(std::slice::from_ref(byte)));
            assert_eq!(decoder.scanned, decoder.buffer.len());
        }

        assert_eq!(events, vec![SseEvent::Text(text)]);
        assert!(decoder.buffer.is_empty());
    }

    #[test]
    fn test_multiple_fields_in_one_frame() {
        let events = feed_all(&[b"data: {\"error\":\"late\",\"text\":\"partial\",\"done\":true}\n"]);
        assert_eq!(
            events,
            vec![text("partial"), SseEvent::Error("late".to_string()), SseEvent::Done]
        );
    }

    #[test]
    fn test_field_truthiness() {
        let events = feed_all(&[
            b"data: {\"text\":\"\"}\n",
            b"data: {\"done\":false}\n",
            b"data: {\"done\":0}\n",
            b"data: {\"error\":null}\n",
            b"data: {\"error\":\"\"}\n",
            b"data: {\"done\":1}\n",
            b"data: {\"error\":{\"code\":500}}\n",
            b"data: [1, 2]\n",
        ]);
        assert_eq!(
            events,
            vec![SseEvent::Done, SseEvent::Error("{\"code\":500}".to_string())]
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let events = feed_all(&[b"data: {\"text\":\"a\xFFb\"}\n"]);
        assert_eq!(events, vec![text("a\u{FFFD}b")]);
    }

    #[tokio::test]
    async fn test_decode_stream_three_chunks() {
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"data: {\"te")),
            Ok(Bytes::from_static(b"xt\":\"hi\"}\n")),
            Ok(Bytes::new()),
        ];
        let events: Vec<SseEvent> = decode_stream(stream::iter(chunks))
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events, vec![text("hi")]);
    }

    #[tokio::test]
    async fn test_decode_stream_transport_error_is_fatal() {
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"data: {\"text\":\"before\"}\n")),
            Err(ClientError::Transport("connection reset".to_string())),
            Ok(Bytes::from_static(b"data: {\"text\":\"after\"}\n")),
        ];
        let results: Vec<_> = decode_stream(stream::iter(chunks)).collect().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &text("before"));
        assert!(matches!(results[1], Err(ClientError::Transport(_))));
    }
}
