//! Incremental decoding of the `/chat` event stream.
//!
//! The body is a sequence of lines; lines starting with `data: ` carry a JSON
//! `StreamFragment`. Text deltas are appended to one buffer and the full
//! buffer is handed to the renderer after every fragment, so what is shown is
//! always the concatenation of everything received so far.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::types::StreamFragment;
use crate::api::{ApiError, ByteStream};

pub const DATA_PREFIX: &str = "data: ";

/// Splits a chunked byte stream into complete lines. Bytes of a line (or of a
/// multi-byte character) split across chunks are held until the line ends.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&raw[..raw.len() - 1]));
        }
        lines
    }

    /// Whatever is left once the stream has ended without a final newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.pending);
        Some(decode_line(&raw))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Parses one line; anything that is not a well-formed data line is skipped.
pub fn parse_line(line: &str) -> Option<StreamFragment> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str(payload) {
        Ok(fragment) => Some(fragment),
        Err(e) => {
            debug!("Skipping unparseable stream line: {e}");
            None
        }
    }
}

/// How a stream stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The backend sent `done`, optionally with the conversation's new title.
    Done { title: Option<String> },
    /// The body ended without a `done` fragment.
    Eof,
    /// The user stopped generation.
    Aborted,
    /// The backend reported an error fragment.
    Failed(String),
}

/// Accumulates the streamed reply. The text survives any way the stream ends.
#[derive(Debug, Default)]
pub struct StreamReader {
    decoder: LineDecoder,
    text: String,
}

impl StreamReader {
    #[cfg(test)]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Consumes `stream` until it ends, a terminal fragment arrives or `cancel`
    /// fires. After cancellation no further fragment is applied or rendered.
    pub async fn run<F>(
        &mut self,
        mut stream: ByteStream,
        cancel: &CancellationToken,
        mut render: F,
    ) -> Result<StreamEnd, ApiError>
    where
        F: FnMut(&str),
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Aborted),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk?;

            for line in self.decoder.push(&chunk) {
                if cancel.is_cancelled() {
                    return Ok(StreamEnd::Aborted);
                }
                if let Some(end) = self.apply_line(&line, &mut render) {
                    return Ok(end);
                }
            }
        }

        if let Some(line) = self.decoder.finish() {
            if let Some(end) = self.apply_line(&line, &mut render) {
                return Ok(end);
            }
        }
        Ok(StreamEnd::Eof)
    }

    fn apply_line<F>(&mut self, line: &str, render: &mut F) -> Option<StreamEnd>
    where
        F: FnMut(&str),
    {
        let fragment = parse_line(line)?;

        if let Some(delta) = fragment.text.filter(|t| !t.is_empty()) {
            self.text.push_str(&delta);
            render(&self.text);
        }
        if let Some(error) = fragment.error {
            return Some(StreamEnd::Failed(error));
        }
        if fragment.done {
            return Some(StreamEnd::Done {
                title: fragment.title,
            });
        }
        None
    }
}
