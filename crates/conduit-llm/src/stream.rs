//! Streaming response parsing
//!
//! The upstream body arrives as server-sent events. [`LineBuffer`] splits the
//! raw bytes into lines, [`FrameParser`] turns each line into at most one
//! [`ResultDelta`], and [`delta_stream`] drives both lazily: the body is only
//! read when the caller asks for the next delta, and dropping the stream drops
//! the body with it.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;

use crate::convert::{Fragment, chat, completion};
use crate::error::InvokeError;
use crate::protocol::openai::WireStreamChunk;
use crate::request::ApiMode;
use crate::types::ResultDelta;

/// Lazy, single-pass sequence of deltas
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<ResultDelta, InvokeError>> + Send>>;

/// Prefix of every frame that carries data
pub const FRAME_PREFIX: &str = "data: ";

/// Payload marking a clean end of stream
pub const DONE_MARKER: &str = "[DONE]";

/// Outcome of parsing one line
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Keepalive, comment, heartbeat, malformed, or no-op frame
    Skip,
    /// End-of-stream marker
    Done,
    /// A delta to hand to the caller
    Delta(ResultDelta),
}

/// Turns single SSE lines into frames for one endpoint shape
#[derive(Debug, Clone)]
pub struct FrameParser {
    mode: ApiMode,
    model: String,
}

impl FrameParser {
    /// Parser for `mode`; `model` fills in for chunks that omit theirs
    pub fn new(mode: ApiMode, model: impl Into<String>) -> Self {
        Self {
            mode,
            model: model.into(),
        }
    }

    /// Parse one line, without its line terminator
    ///
    /// Malformed JSON is logged and skipped, never reported to the caller.
    pub fn parse_line(&self, line: &str) -> Frame {
        let Some(payload) = line.strip_prefix(FRAME_PREFIX) else {
            return Frame::Skip;
        };

        if payload.trim() == DONE_MARKER {
            return Frame::Done;
        }

        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, data = %payload, "skipping unparseable stream frame");
                return Frame::Skip;
            }
        };

        // Every field is read leniently, so only a non-object payload fails here
        let chunk = WireStreamChunk::deserialize(value).unwrap_or_default();

        let Some(choice) = chunk.choices.as_ref().and_then(|choices| choices.first()) else {
            tracing::debug!("skipping stream frame without choices");
            return Frame::Skip;
        };

        let fragment = match self.mode {
            ApiMode::Chat => chat::fragment_from_choice(choice, chunk.usage.as_ref()),
            ApiMode::Completion => completion::fragment_from_choice(choice, chunk.usage.as_ref()),
        };

        let Some(Fragment {
            message,
            finish_reason,
            usage,
        }) = fragment
        else {
            return Frame::Skip;
        };

        Frame::Delta(ResultDelta {
            model: chunk.model.unwrap_or_else(|| self.model.clone()),
            system_fingerprint: chunk.system_fingerprint.unwrap_or_default(),
            index: choice.index.unwrap_or(0),
            message,
            finish_reason,
            usage,
        })
    }
}

/// Longest line the buffer holds before giving up on the stream
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Splits a byte stream into lines across chunk boundaries
///
/// Lines end at `\r\n`, `\n` or a lone `\r`. Splitting happens on bytes so a
/// multi-byte character split across chunks is reassembled before decoding.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// The previous chunk ended on `\r`; a `\n` opening the next one is part
    /// of the same line end
    after_cr: bool,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed
    ///
    /// Fails once an unterminated line grows past [`MAX_LINE_BYTES`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, InvokeError> {
        let mut chunk = chunk;
        if self.after_cr && !chunk.is_empty() {
            self.after_cr = false;
            chunk = chunk.strip_prefix(b"\n").unwrap_or(chunk);
        }
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n' || b == b'\r') {
            let end = start + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;

            if self.pending[end] == b'\r' {
                match self.pending.get(start) {
                    Some(b'\n') => start += 1,
                    Some(_) => {}
                    None => self.after_cr = true,
                }
            }
        }
        self.pending.drain(..start);

        if self.pending.len() > MAX_LINE_BYTES {
            self.pending.clear();
            return Err(InvokeError::Invocation(format!("stream line exceeds {MAX_LINE_BYTES} bytes")));
        }

        Ok(lines)
    }

    /// The unterminated remainder, if any, once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.pending);
        Some(decode_line(&line))
    }
}

fn decode_line(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}

struct StreamState<S> {
    body: Pin<Box<S>>,
    buffer: LineBuffer,
    lines: VecDeque<String>,
    parser: FrameParser,
    exhausted: bool,
}

/// Turn a response body into a [`DeltaStream`]
///
/// The stream ends at `[DONE]` or at the end of the body. A body read error
/// yields one [`InvokeError::Connection`] and then ends the stream.
pub fn delta_stream<S, E>(body: S, parser: FrameParser) -> DeltaStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = StreamState {
        body: Box::pin(body),
        buffer: LineBuffer::default(),
        lines: VecDeque::new(),
        parser,
        exhausted: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.lines.pop_front() {
                match state.parser.parse_line(&line) {
                    Frame::Skip => continue,
                    Frame::Done => return None,
                    Frame::Delta(delta) => return Some((Ok(delta), state)),
                }
            }

            if state.exhausted {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => match state.buffer.push(&chunk) {
                    Ok(lines) => state.lines.extend(lines),
                    Err(e) => {
                        tracing::error!(error = %e, "abandoning stream");
                        state.exhausted = true;
                        return Some((Err(e), state));
                    }
                },
                Some(Err(e)) => {
                    tracing::error!(error = %e, "stream interrupted");
                    state.exhausted = true;
                    return Some((Err(InvokeError::Connection(format!("stream interrupted: {e}"))), state));
                }
                None => {
                    state.exhausted = true;
                    let rest = state.buffer.finish();
                    state.lines.extend(rest);
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use futures::TryStreamExt;
    use indoc::indoc;

    use super::*;
    use crate::types::{AssistantMessage, ToolInvocation, Usage};

    fn chat_parser() -> FrameParser {
        FrameParser::new(ApiMode::Chat, "gpt-4o-mini")
    }

    fn body(chunks: Vec<Result<&'static str, &'static str>>) -> impl Stream<Item = Result<Bytes, &'static str>> {
        futures::stream::iter(chunks.into_iter().map(|c| c.map(Bytes::from)))
    }

    fn delta_text(frame: &Frame) -> &str {
        match frame {
            Frame::Delta(delta) => &delta.message.content,
            other => panic!("expected a delta, got {other:?}"),
        }
    }

    #[test]
    fn content_frame() {
        let frame = chat_parser().parse_line(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#);
        let Frame::Delta(delta) = frame else {
            panic!("expected a delta");
        };

        assert_eq!(delta.message, AssistantMessage::text("Hi"));
        assert_eq!(delta.model, "gpt-4o-mini");
        assert_eq!(delta.system_fingerprint, "");
        assert_eq!(delta.index, 0);
        assert!(!delta.is_terminal());
    }

    #[test]
    fn chunk_model_and_fingerprint_win() {
        let frame = chat_parser().parse_line(
            r#"data: {"model":"gpt-4o-mini-2024-07-18","system_fingerprint":"fp_1","choices":[{"delta":{"content":"a"}}]}"#,
        );
        let Frame::Delta(delta) = frame else {
            panic!("expected a delta");
        };

        assert_eq!(delta.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(delta.system_fingerprint, "fp_1");
    }

    #[test]
    fn done_marker() {
        assert_eq!(chat_parser().parse_line("data: [DONE]"), Frame::Done);
        assert_eq!(chat_parser().parse_line("data: [DONE]  "), Frame::Done);
    }

    #[test]
    fn non_data_lines_are_skipped() {
        let parser = chat_parser();
        assert_eq!(parser.parse_line(""), Frame::Skip);
        assert_eq!(parser.parse_line(": keepalive"), Frame::Skip);
        assert_eq!(parser.parse_line("event: ping"), Frame::Skip);
        assert_eq!(parser.parse_line(r#"data:{"choices":[{"delta":{"content":"x"}}]}"#), Frame::Skip);
    }

    #[test]
    fn malformed_and_heartbeat_frames_are_skipped() {
        let parser = chat_parser();
        assert_eq!(parser.parse_line("data: not-json"), Frame::Skip);
        assert_eq!(parser.parse_line(r#"data: {"choices":[]}"#), Frame::Skip);
        assert_eq!(parser.parse_line(r#"data: {"id":"x"}"#), Frame::Skip);
        assert_eq!(parser.parse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#), Frame::Skip);
    }

    #[test]
    fn ill_typed_fields_do_not_discard_the_frame() {
        let parser = chat_parser();

        let frame = parser.parse_line(
            r#"data: {"choices":[{"index":0,"delta":{"content":"Hi","tool_calls":[{"index":0,"function":{"arguments":{}}}]}}]}"#,
        );
        assert_eq!(delta_text(&frame), "Hi");

        let frame = parser.parse_line(r#"data: {"usage":{"prompt_tokens":-1},"choices":[{"delta":{"content":"Hi"}}]}"#);
        assert_eq!(delta_text(&frame), "Hi");

        let frame = parser.parse_line(
            r#"data: {"model":7,"choices":[{"index":"0","finish_reason":"stop"}],"usage":{"prompt_tokens":2.5,"total_tokens":9}}"#,
        );
        let Frame::Delta(delta) = frame else {
            panic!("expected a delta");
        };
        assert_eq!(delta.model, "gpt-4o-mini");
        assert_eq!(delta.index, 0);
        assert_eq!(delta.usage, Some(Usage::new(0, 0, 9)));
    }

    #[test]
    fn non_object_payload_is_skipped() {
        let parser = chat_parser();
        assert_eq!(parser.parse_line("data: [1, 2]"), Frame::Skip);
        assert_eq!(parser.parse_line(r#"data: "text""#), Frame::Skip);
        assert_eq!(parser.parse_line(r#"data: {"choices":"none"}"#), Frame::Skip);
    }

    #[test]
    fn explicit_empty_model_is_kept() {
        let frame = chat_parser().parse_line(r#"data: {"model":"","choices":[{"delta":{"content":"a"}}]}"#);
        let Frame::Delta(delta) = frame else {
            panic!("expected a delta");
        };
        assert_eq!(delta.model, "");
    }

    #[test]
    fn empty_usage_object_reads_as_zeros() {
        let frame = chat_parser().parse_line(r#"data: {"choices":[{"finish_reason":"stop"}],"usage":{}}"#);
        let Frame::Delta(delta) = frame else {
            panic!("expected a delta");
        };
        assert_eq!(delta.usage, Some(Usage::default()));
    }

    #[test]
    fn terminal_frame_with_usage() {
        let frame = chat_parser().parse_line(
            r#"data: {"choices":[{"finish_reason":"stop"}],"usage":{"prompt_tokens":5,"completion_tokens":3,"total_tokens":8}}"#,
        );
        let Frame::Delta(delta) = frame else {
            panic!("expected a delta");
        };

        assert_eq!(delta.message.content, "");
        assert_eq!(delta.finish_reason.as_deref(), Some("stop"));
        assert_eq!(delta.usage, Some(Usage::new(5, 3, 8)));
        assert!(delta.is_terminal());
    }

    #[test]
    fn tool_call_fragment_passes_through() {
        let frame = chat_parser().parse_line(
            r#"data: {"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"id":"call_1","type":"function","function":{"name":"weather","arguments":""}}]}}]}"#,
        );
        let Frame::Delta(delta) = frame else {
            panic!("expected a delta");
        };

        assert_eq!(delta.message.content, "");
        assert_eq!(delta.message.tool_calls, vec![ToolInvocation::function("call_1", "weather", "")]);
    }

    #[test]
    fn completion_frames() {
        let parser = FrameParser::new(ApiMode::Completion, "davinci");
        assert_eq!(delta_text(&parser.parse_line(r#"data: {"choices":[{"text":"Hel"}]}"#)), "Hel");
        assert_eq!(parser.parse_line(r#"data: {"choices":[{"text":""}]}"#), Frame::Skip);
        assert_eq!(parser.parse_line(r#"data: {"choices":[{"delta":{"tool_calls":[{}]}}]}"#), Frame::Skip);
    }

    #[test]
    fn line_buffer_handles_split_lines_and_crlf() {
        let mut buffer = LineBuffer::default();
        assert!(buffer.push(b"data: {\"a\"").unwrap().is_empty());
        assert_eq!(
            buffer.push(b":1}\r\n\r\ndata: x").unwrap(),
            vec!["data: {\"a\":1}".to_owned(), String::new()]
        );
        assert_eq!(buffer.finish(), Some("data: x".to_owned()));
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn line_buffer_reassembles_split_characters() {
        let mut buffer = LineBuffer::default();
        let text = "data: é\n".as_bytes();
        assert!(buffer.push(&text[..7]).unwrap().is_empty());
        assert_eq!(buffer.push(&text[7..]).unwrap(), vec!["data: é".to_owned()]);
    }

    #[test]
    fn line_buffer_splits_on_lone_cr() {
        let mut buffer = LineBuffer::default();
        assert_eq!(
            buffer.push(b"data: a\r\rdata: b\r").unwrap(),
            vec!["data: a".to_owned(), String::new(), "data: b".to_owned()]
        );
        assert_eq!(buffer.push(b"data: c\n").unwrap(), vec!["data: c".to_owned()]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn line_buffer_joins_crlf_split_across_chunks() {
        let mut buffer = LineBuffer::default();
        assert_eq!(buffer.push(b"data: a\r").unwrap(), vec!["data: a".to_owned()]);
        assert!(buffer.push(b"").unwrap().is_empty());
        assert_eq!(buffer.push(b"\ndata: b\r\n").unwrap(), vec!["data: b".to_owned()]);
        assert_eq!(buffer.push(b"\n").unwrap(), vec![String::new()]);
    }

    #[test]
    fn line_buffer_rejects_oversized_line() {
        let mut buffer = LineBuffer::default();
        let chunk = vec![b'x'; MAX_LINE_BYTES];
        assert!(buffer.push(&chunk).unwrap().is_empty());

        let err = buffer.push(b"x").unwrap_err();
        assert!(matches!(err, InvokeError::Invocation(_)));
        assert_eq!(buffer.finish(), None);
    }

    #[tokio::test]
    async fn content_then_done() {
        let chunks = body(vec![Ok(indoc! {r#"
            data: {"choices":[{"delta":{"content":"Hi"}}]}

            data: [DONE]

        "#})]);

        let deltas: Vec<ResultDelta> = delta_stream(chunks, chat_parser()).try_collect().await.unwrap();

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].message.content, "Hi");
    }

    #[tokio::test]
    async fn malformed_frame_between_valid_frames() {
        let chunks = body(vec![Ok(indoc! {r#"
            data: {"choices":[{"delta":{"content":"a"}}]}

            data: not-json

            data: {"choices":[{"delta":{"content":"b"}}]}

            data: [DONE]
        "#})]);

        let deltas: Vec<ResultDelta> = delta_stream(chunks, chat_parser()).try_collect().await.unwrap();
        let text: Vec<&str> = deltas.iter().map(|d| d.message.content.as_str()).collect();

        assert_eq!(text, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn frames_split_across_chunks() {
        let chunks = body(vec![
            Ok("data: {\"choices\":[{\"delta\":"),
            Ok("{\"content\":\"Hel\"}}]}\r\n\r\nda"),
            Ok("ta: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\r\n\r\n"),
            Ok("data: [DONE]\r\n\r\n"),
        ]);

        let deltas: Vec<ResultDelta> = delta_stream(chunks, chat_parser()).try_collect().await.unwrap();
        let text: String = deltas.iter().map(|d| d.message.content.as_str()).collect();

        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn cr_only_framing() {
        let chunks = body(vec![Ok(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\r\rdata: [DONE]\r\r",
        )]);

        let deltas: Vec<ResultDelta> = delta_stream(chunks, chat_parser()).try_collect().await.unwrap();

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].message.content, "Hi");
    }

    #[tokio::test]
    async fn crlf_split_between_chunks() {
        let chunks = body(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\r"),
            Ok("\n\r"),
            Ok("\ndata: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\r"),
            Ok("\n\r\ndata: [DONE]\r\n"),
        ]);

        let deltas: Vec<ResultDelta> = delta_stream(chunks, chat_parser()).try_collect().await.unwrap();
        let text: Vec<&str> = deltas.iter().map(|d| d.message.content.as_str()).collect();

        assert_eq!(text, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn nothing_after_done_is_read() {
        let chunks = body(vec![
            Ok("data: [DONE]\n\n"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n"),
        ]);

        let deltas: Vec<ResultDelta> = delta_stream(chunks, chat_parser()).try_collect().await.unwrap();
        assert!(deltas.is_empty());
    }

    #[tokio::test]
    async fn body_end_without_done_flushes_last_line() {
        let chunks = body(vec![Ok("data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}")]);

        let deltas: Vec<ResultDelta> = delta_stream(chunks, chat_parser()).try_collect().await.unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].message.content, "tail");
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let chunks = body(vec![
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n"),
            Err("connection reset"),
            Ok("data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n"),
        ]);

        let mut stream = delta_stream(chunks, chat_parser());

        assert_eq!(stream.next().await.unwrap().unwrap().message.content, "a");
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err, InvokeError::Connection("stream interrupted: connection reset".to_owned()));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_stream_releases_the_body() {
        struct Released(Arc<AtomicBool>);

        impl Drop for Released {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let released = Arc::new(AtomicBool::new(false));
        let guard = Released(Arc::clone(&released));
        let chunks = body(vec![
            Ok("data: {\"choices\":[{\"finish_reason\":\"stop\"}]}\n\n"),
            Ok("data: [DONE]\n\n"),
        ])
        .map(move |chunk| {
            let _ = &guard;
            chunk
        });

        let mut stream = delta_stream(chunks, chat_parser());
        let first = stream.next().await.unwrap().unwrap();
        assert!(first.is_terminal());
        assert!(!released.load(Ordering::SeqCst));

        drop(stream);
        assert!(released.load(Ordering::SeqCst));
    }
}
