//! Line framing for streamed HTTP bodies.
//!
//! Both network tiers send newline-delimited records over a chunked body,
//! and a transport read can end anywhere, including in the middle of a line
//! or of a UTF-8 sequence. [`LineBuffer`] keeps the unterminated tail between
//! reads and only hands out complete lines; [`line_chunks`] turns a body
//! stream plus a per-line parser into a [`ChunkStream`].

use futures::{Stream, StreamExt, stream};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use thiserror::Error;
use tiered_application::{ChunkStream, GeneratorError};
use tracing::{debug, warn};

/// A line that could not be understood. Recovered by skipping the line.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid JSON line: {error}\nRaw line: {line}")]
    InvalidJson { line: String, error: String },
}

/// What one complete line contributes to the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineOutcome {
    /// Text to forward, if the line carried any.
    pub chunk: Option<String>,
    /// The service reported an error in-band.
    pub error: Option<String>,
    /// The stream is finished after this line.
    pub done: bool,
}

impl LineOutcome {
    /// A line with nothing to forward (comments, keep-alives, metadata).
    pub fn skip() -> Self {
        Self::default()
    }

    pub fn chunk(text: impl Into<String>) -> Self {
        Self {
            chunk: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            ..Self::default()
        }
    }
}

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return every line completed by them, without the
    /// line terminator. The trailing fragment stays buffered.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            lines.push(text.trim_end_matches('\r').to_string());
        }
        lines
    }

    /// Bytes of the unterminated fragment still waiting for its newline.
    pub fn remainder(&self) -> &[u8] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

struct LineState<S, F> {
    body: Pin<Box<S>>,
    buffer: LineBuffer,
    ready: VecDeque<Result<String, GeneratorError>>,
    parse: F,
    finished: bool,
}

/// Adapt a streamed HTTP body into text chunks.
///
/// `parse` sees each complete, non-blank line. Lines it rejects are logged
/// and skipped. A body error ends the stream with
/// [`GeneratorError::Transport`]; a line marked `done` ends it cleanly even
/// if the body continues. Empty chunks are dropped.
pub fn line_chunks<S, B, E, F>(source: &'static str, body: S, parse: F) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    F: FnMut(&str) -> Result<LineOutcome, ProtocolError> + Send + 'static,
{
    let state = LineState {
        body: Box::pin(body),
        buffer: LineBuffer::new(),
        ready: VecDeque::new(),
        parse,
        finished: false,
    };

    stream::unfold(state, move |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.body.next().await {
                Some(Ok(bytes)) => {
                    for line in st.buffer.push(bytes.as_ref()) {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let outcome = match (st.parse)(&line) {
                            Ok(outcome) => outcome,
                            Err(e) => {
                                warn!("{}: skipping malformed line: {}", source, e);
                                continue;
                            }
                        };
                        if let Some(text) = outcome.chunk.filter(|t| !t.is_empty()) {
                            st.ready.push_back(Ok(text));
                        }
                        if let Some(message) = outcome.error {
                            st.ready.push_back(Err(GeneratorError::Remote(message)));
                            st.finished = true;
                            break;
                        }
                        if outcome.done {
                            st.finished = true;
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.ready
                        .push_back(Err(GeneratorError::Transport(e.to_string())));
                }
                None => {
                    if !st.buffer.is_empty() {
                        debug!(
                            "{}: discarding {} bytes of unterminated trailing line",
                            source,
                            st.buffer.remainder().len()
                        );
                    }
                    st.finished = true;
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_json_text(line: &str) -> Result<LineOutcome, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| ProtocolError::InvalidJson {
                line: line.to_string(),
                error: e.to_string(),
            })?;
        Ok(LineOutcome {
            chunk: value["text"].as_str().map(str::to_string),
            error: value["error"].as_str().map(str::to_string),
            done: value["done"].as_bool().unwrap_or(false),
        })
    }

    fn body(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Vec<u8>, String>> + Send {
        stream::iter(parts.iter().map(|p| Ok(p.to_vec())).collect::<Vec<_>>())
    }

    async fn collect(stream: ChunkStream) -> Vec<Result<String, GeneratorError>> {
        stream.collect().await
    }

    #[test]
    fn test_buffer_keeps_unterminated_fragment() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"{\"a\":1}\n{\"b\"").len() == 1);
        assert_eq!(buffer.remainder(), b"{\"b\"");
        assert_eq!(buffer.push(b":2}\n"), vec!["{\"b\":2}".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_handles_crlf_and_multiple_lines() {
        let mut buffer = LineBuffer::new();
        assert_eq!(
            buffer.push(b"one\r\ntwo\n\nthree"),
            vec!["one".to_string(), "two".to_string(), String::new()]
        );
        assert_eq!(buffer.remainder(), b"three");
    }

    #[test]
    fn test_buffer_survives_split_utf8_sequence() {
        let bytes = "ñ\n".as_bytes();
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(&bytes[..1]).is_empty());
        assert_eq!(buffer.push(&bytes[1..]), vec!["ñ".to_string()]);
    }

    #[tokio::test]
    async fn test_split_line_yields_single_chunk() {
        let chunks = collect(line_chunks(
            "test",
            body(&[b"{\"text\":\"ab", b"c\"}\n"]),
            parse_json_text,
        ))
        .await;
        assert_eq!(chunks, vec![Ok("abc".to_string())]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let chunks = collect(line_chunks(
            "test",
            body(&[b"{\"text\":\"a\"}\nnot json\n{\"text\":\"b\"}\n"]),
            parse_json_text,
        ))
        .await;
        assert_eq!(chunks, vec![Ok("a".to_string()), Ok("b".to_string())]);
    }

    #[tokio::test]
    async fn test_done_stops_reading() {
        let chunks = collect(line_chunks(
            "test",
            body(&[b"{\"text\":\"a\",\"done\":true}\n{\"text\":\"late\"}\n"]),
            parse_json_text,
        ))
        .await;
        assert_eq!(chunks, vec![Ok("a".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_text_is_not_a_chunk() {
        let chunks = collect(line_chunks(
            "test",
            body(&[b"{\"text\":\"\"}\n{\"done\":true}\n"]),
            parse_json_text,
        ))
        .await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_trailing_fragment_is_discarded() {
        let chunks = collect(line_chunks(
            "test",
            body(&[b"{\"text\":\"a\"}\n{\"text\":\"b\"}"]),
            parse_json_text,
        ))
        .await;
        assert_eq!(chunks, vec![Ok("a".to_string())]);
    }

    #[tokio::test]
    async fn test_body_error_ends_with_transport_error() {
        let parts: Vec<Result<Vec<u8>, String>> = vec![
            Ok(b"{\"text\":\"a\"}\n".to_vec()),
            Err("connection reset".to_string()),
            Ok(b"{\"text\":\"never\"}\n".to_vec()),
        ];
        let chunks = collect(line_chunks("test", stream::iter(parts), parse_json_text)).await;
        assert_eq!(
            chunks,
            vec![
                Ok("a".to_string()),
                Err(GeneratorError::Transport("connection reset".to_string()))
            ]
        );
    }

    #[tokio::test]
    async fn test_in_band_error_ends_with_remote_error() {
        let chunks = collect(line_chunks(
            "test",
            body(&[b"{\"error\":\"model not found\"}\n{\"text\":\"never\"}\n"]),
            parse_json_text,
        ))
        .await;
        assert_eq!(
            chunks,
            vec![Err(GeneratorError::Remote("model not found".to_string()))]
        );
    }
}
