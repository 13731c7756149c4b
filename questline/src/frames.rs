//! Async side of the Event Frame Decoder: a backend body in, typed events out.

use std::collections::VecDeque;

use futures::StreamExt;
use stream_event::{Frame, FrameDecoder, StreamEvent};

use crate::backend::ByteStream;
use crate::error::BackendError;

/// Lazy, finite sequence of events decoded from one response body.
///
/// Framing gaps are logged at debug and skipped; malformed frames are logged at warn and
/// skipped. Neither ends the sequence.
pub struct EventStream {
    body: ByteStream,
    decoder: FrameDecoder,
    ready: VecDeque<StreamEvent>,
    closed: bool,
}

impl EventStream {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            decoder: FrameDecoder::new(),
            ready: VecDeque::new(),
            closed: false,
        }
    }

    /// Next event, `None` once the body is exhausted, or the transport error that ended it.
    ///
    /// Cancel-safe: dropping the future between reads loses no decoded event.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, BackendError>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Some(Ok(event));
            }
            if self.closed {
                return None;
            }
            match self.body.next().await {
                Some(Ok(bytes)) => {
                    let frames = self.decoder.feed(&bytes);
                    self.absorb(frames);
                }
                Some(Err(e)) => {
                    self.closed = true;
                    return Some(Err(e));
                }
                None => {
                    self.closed = true;
                    if let Some(last) = self.decoder.finish() {
                        self.absorb(vec![last]);
                    }
                }
            }
        }
    }

    fn absorb(&mut self, frames: Vec<Frame>) {
        for frame in frames {
            match frame {
                Frame::Event(event) => self.ready.push_back(event),
                Frame::Incomplete { line } => {
                    tracing::debug!(len = line.len(), "incomplete frame skipped");
                }
                Frame::Malformed { line, reason } => {
                    tracing::warn!(%reason, line = %line, "malformed frame skipped");
                }
            }
        }
    }
}
