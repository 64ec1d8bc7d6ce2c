//! Streaming reader for `data: {json}` line frames.
//!
//! The chat stream endpoint emits newline-delimited frames of the form
//! `data: {"content": "..."}`. This is not a full SSE implementation: there is
//! no `event:`/`id:`/`retry:` handling and no end-of-stream sentinel. The
//! stream ends when the transport does.
//!
//! Bytes are decoded incrementally; a UTF-8 sequence or a line split across
//! reads is held back until it is complete, so the accumulated text does not
//! depend on where chunk boundaries fall.

use futures::{Stream, StreamExt};
use tracing::{debug, trace};

use reelforge_core::ReelError;

const DATA_PREFIX: &str = "data: ";

/// Incremental UTF-8 decoder + line splitter + frame parser.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Undecoded tail of a multi-byte character split across reads.
    pending_bytes: Vec<u8>,
    /// Decoded text whose final line has not been terminated yet.
    line_buffer: String,
    /// Concatenation of every `content` value seen so far.
    accumulated: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one transport chunk. Returns the `content` deltas completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.decode(chunk);
        self.line_buffer.push_str(&text);

        let mut deltas = Vec::new();
        while let Some(pos) = self.line_buffer.find('\n') {
            let line: String = self.line_buffer.drain(..=pos).collect();
            if let Some(delta) = self.accept_line(&line[..line.len() - 1]) {
                deltas.push(delta);
            }
        }
        deltas
    }

    /// Flush at end of stream. A trailing unterminated line is treated as
    /// complete.
    pub fn finish(&mut self) -> Option<String> {
        if !self.pending_bytes.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending_bytes).into_owned();
            self.pending_bytes.clear();
            self.line_buffer.push_str(&tail);
        }
        let rest = std::mem::take(&mut self.line_buffer);
        if rest.is_empty() {
            None
        } else {
            self.accept_line(&rest)
        }
    }

    /// Everything accumulated so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn into_accumulated(self) -> String {
        self.accumulated
    }

    fn accept_line(&mut self, line: &str) -> Option<String> {
        let delta = parse_frame(line)?;
        self.accumulated.push_str(&delta);
        Some(delta)
    }

    fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending_bytes.extend_from_slice(chunk);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(s) => {
                    out.push_str(s);
                    self.pending_bytes.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending_bytes[..valid]));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes.
                        None => {
                            self.pending_bytes.drain(..valid);
                            return out;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending_bytes.drain(..valid + len);
                        }
                    }
                }
            }
        }
    }
}

/// Extract the `content` string from a single `data: {json}` line.
///
/// Lines without the prefix, with malformed JSON, or without a non-empty
/// string `content` yield `None`.
pub fn parse_frame(line: &str) -> Option<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, "Dropping malformed stream frame");
            return None;
        }
    };
    value
        .get("content")
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Drain a byte stream of frames, calling `on_delta` with the accumulated text
/// after each delta. Returns the full text.
pub async fn read_frames<S, B, E>(
    stream: S,
    on_delta: &mut (dyn FnMut(&str) + Send),
) -> Result<String, ReelError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = FrameDecoder::new();
    let mut rendered = String::new();
    let mut chunks = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ReelError::Network(e.to_string()))?;
        chunks += 1;
        for delta in decoder.push(chunk.as_ref()) {
            rendered.push_str(&delta);
            on_delta(&rendered);
        }
    }
    if let Some(delta) = decoder.finish() {
        rendered.push_str(&delta);
        on_delta(&rendered);
    }
    debug!(chunks, chars = rendered.chars().count(), "Stream completed");
    Ok(decoder.into_accumulated())
}
