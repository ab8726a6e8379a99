//! Line-delimited JSON replay stream.
//!
//! Every line is one `{"type": ..., "data": ...}` envelope. Chunks from the
//! network may split a line anywhere, so the decoder keeps the trailing
//! partial line buffered until the next chunk (or the end of the stream)
//! completes it. A malformed line is logged and skipped; only transport
//! failures end the stream early.

use std::collections::VecDeque;
use std::future::Future;

use common::{ReplayEvent, RoundMetadata, TickFrame};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ReplayError, ReplayResult};

#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Metadata(RoundMetadata),
    Frame(TickFrame),
    Event(ReplayEvent),
    End,
    Error { message: String },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
}

impl StreamMessage {
    /// Decode a single complete line. `line` is only used for error reporting.
    pub fn decode(bytes: &[u8], line: usize) -> ReplayResult<Self> {
        let decode_err = |source| ReplayError::Decode { line, source };
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(decode_err)?;

        let message = match envelope.kind.as_str() {
            "metadata" => {
                StreamMessage::Metadata(serde_json::from_value(envelope.data).map_err(decode_err)?)
            }
            "frame" => StreamMessage::Frame(serde_json::from_value(envelope.data).map_err(decode_err)?),
            "event" => StreamMessage::Event(serde_json::from_value(envelope.data).map_err(decode_err)?),
            "end" => StreamMessage::End,
            "error" => {
                let payload: ErrorPayload = if envelope.data.is_null() {
                    ErrorPayload {
                        message: String::new(),
                    }
                } else {
                    serde_json::from_value(envelope.data).map_err(decode_err)?
                };
                StreamMessage::Error {
                    message: payload.message,
                }
            }
            other => return Err(ReplayError::UnknownMessage(other.to_string())),
        };
        Ok(message)
    }
}

/// Incremental splitter/decoder for the line protocol.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    lines_seen: usize,
    skipped: usize,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk and return every message completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamMessage> {
        self.buffer.extend_from_slice(chunk);

        let mut messages = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let line = self.buffer[consumed..end].to_vec();
            consumed = end + 1;
            if let Some(message) = self.decode_line(&line) {
                messages.push(message);
            }
        }
        self.buffer.drain(..consumed);
        messages
    }

    /// Flush whatever is left in the buffer as a final decode attempt.
    pub fn finish(&mut self) -> Option<StreamMessage> {
        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(&rest)
    }

    /// Bytes of an incomplete trailing line still waiting for more input.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Number of lines dropped because they could not be decoded.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<StreamMessage> {
        let line = raw.strip_suffix(b"\r").unwrap_or(raw);
        if line.iter().all(|b| b.is_ascii_whitespace()) {
            return None;
        }

        self.lines_seen += 1;
        match StreamMessage::decode(line, self.lines_seen) {
            Ok(message) => Some(message),
            Err(e) => {
                self.skipped += 1;
                warn!("Skipping replay record: {}", e);
                None
            }
        }
    }
}

/// Async producer of raw byte chunks. `Ok(None)` marks a clean end of input.
pub trait ChunkSource {
    fn next_chunk(&mut self) -> impl Future<Output = ReplayResult<Option<Vec<u8>>>> + Send;
}

/// In-memory chunk source, mostly for tests and local files.
#[derive(Debug, Default)]
pub struct MemorySource {
    chunks: VecDeque<Vec<u8>>,
}

impl MemorySource {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }
}

impl ChunkSource for MemorySource {
    async fn next_chunk(&mut self) -> ReplayResult<Option<Vec<u8>>> {
        Ok(self.chunks.pop_front())
    }
}

/// Lazy, finite message sequence over a chunk source. Once it has returned
/// `None` (or a transport error) it stays exhausted.
pub struct MessageReader<S> {
    source: S,
    decoder: LineDecoder,
    ready: VecDeque<StreamMessage>,
    exhausted: bool,
}

impl<S: ChunkSource> MessageReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            decoder: LineDecoder::new(),
            ready: VecDeque::new(),
            exhausted: false,
        }
    }

    pub async fn next(&mut self) -> Option<ReplayResult<StreamMessage>> {
        loop {
            if let Some(message) = self.ready.pop_front() {
                return Some(Ok(message));
            }
            if self.exhausted {
                return None;
            }

            match self.source.next_chunk().await {
                Ok(Some(chunk)) => {
                    self.ready.extend(self.decoder.push(&chunk));
                }
                Ok(None) => {
                    self.exhausted = true;
                    if let Some(message) = self.decoder.finish() {
                        self.ready.push_back(message);
                    }
                    debug!(
                        "Replay stream finished ({} malformed lines skipped)",
                        self.decoder.skipped()
                    );
                }
                Err(e) => {
                    self.exhausted = true;
                    self.ready.clear();
                    return Some(Err(e));
                }
            }
        }
    }

    pub fn skipped(&self) -> usize {
        self.decoder.skipped()
    }
}
