//! Line framing: `data: <json>` lines separated by newlines.
//!
//! [`FrameDecoder`] buffers raw bytes across reads and only parses a line once its newline
//! has arrived, so the decoded event sequence does not depend on where reads were split.
//! A complete line whose JSON ends early is reported as [`Frame::Incomplete`] (a framing
//! gap, never an error); any other parse failure is [`Frame::Malformed`] so callers can log
//! it and keep reading.

use crate::event::StreamEvent;

/// Prefix of every event-bearing line. Lines without it are ignored.
pub const FRAME_MARKER: &str = "data: ";

/// Result of parsing one complete line that carried the frame marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    /// A well-formed event.
    Event(StreamEvent),
    /// JSON that stops before the object is closed; await more data.
    Incomplete { line: String },
    /// JSON that can never become a valid event (bad syntax, unknown `type`, wrong field types).
    Malformed { line: String, reason: String },
}

/// Serializes an event to a single frame: `data: <JSON>\n\n`.
pub fn encode_frame(event: &StreamEvent) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(format!("{FRAME_MARKER}{json}\n\n"))
}

/// Parses one line (without its trailing `\n`). Returns `None` for lines without the marker.
pub fn parse_line(raw: &[u8]) -> Option<Frame> {
    let decoded = String::from_utf8_lossy(raw);
    let text: &str = &decoded;
    let text = text.strip_suffix('\r').unwrap_or(text);
    let payload = text
        .strip_prefix(FRAME_MARKER)
        .or_else(|| text.strip_prefix("data:"))?
        .trim();
    Some(match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Frame::Event(event),
        Err(e) if e.is_eof() => Frame::Incomplete {
            line: text.to_string(),
        },
        Err(e) => Frame::Malformed {
            line: text.to_string(),
            reason: e.to_string(),
        },
    })
}

/// Incremental decoder: feed bytes as they are read, collect frames for complete lines.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns frames for every line completed by them, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(frame) = parse_line(&self.buffer[start..end]) {
                frames.push(frame);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);
        frames
    }

    /// Parses whatever is left after the transport closed (a last line without newline).
    pub fn finish(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        parse_line(&rest)
    }

    /// Number of buffered bytes that do not yet form a complete line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
