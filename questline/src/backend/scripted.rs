//! ScriptedBackend: replays prepared response bodies, read by read.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use stream_event::{encode_frame, StreamEvent};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{ByteStream, GameBackend};
use crate::error::BackendError;
use crate::protocol::{Endpoint, GameRequest, ProviderInfo};
use crate::sync::lock;

#[derive(Clone, Debug)]
enum Piece {
    Bytes(Vec<u8>),
    Pause(Duration),
    /// Keep the body open until the reader goes away.
    Hang,
    Fail(String),
}

/// One prepared response body.
#[derive(Clone, Debug, Default)]
pub struct Script {
    pieces: Vec<Piece>,
    split_every: Option<usize>,
    rejected: Option<String>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// One read per event.
    pub fn events(events: impl IntoIterator<Item = StreamEvent>) -> Self {
        events.into_iter().fold(Self::new(), |s, e| s.event(&e))
    }

    /// The request is refused before any body is sent.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            rejected: Some(message.into()),
            ..Self::default()
        }
    }

    /// Appends one encoded frame; an event that cannot be encoded becomes a body failure.
    pub fn event(self, event: &StreamEvent) -> Self {
        match encode_frame(event) {
            Ok(frame) => self.raw(frame),
            Err(e) => self.then_fail(e.to_string()),
        }
    }

    pub fn raw(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.pieces.push(Piece::Bytes(bytes.into()));
        self
    }

    pub fn pause(mut self, duration: Duration) -> Self {
        self.pieces.push(Piece::Pause(duration));
        self
    }

    pub fn then_hang(mut self) -> Self {
        self.pieces.push(Piece::Hang);
        self
    }

    pub fn then_fail(mut self, message: impl Into<String>) -> Self {
        self.pieces.push(Piece::Fail(message.into()));
        self
    }

    /// Re-cuts consecutive bytes into reads of `n` bytes, ignoring frame boundaries.
    pub fn split_every(mut self, n: usize) -> Self {
        self.split_every = Some(n.max(1));
        self
    }

    fn into_pieces(self) -> Vec<Piece> {
        let Some(n) = self.split_every else {
            return self.pieces;
        };
        let mut out = Vec::new();
        let mut run: Vec<u8> = Vec::new();
        let flush = |run: &mut Vec<u8>, out: &mut Vec<Piece>| {
            out.extend(run.chunks(n).map(|c| Piece::Bytes(c.to_vec())));
            run.clear();
        };
        for piece in self.pieces {
            match piece {
                Piece::Bytes(b) => run.extend_from_slice(&b),
                other => {
                    flush(&mut run, &mut out);
                    out.push(other);
                }
            }
        }
        flush(&mut run, &mut out);
        out
    }
}

/// In-memory [`GameBackend`]. Scripts are queued per endpoint and consumed in order.
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<HashMap<Endpoint, VecDeque<Script>>>,
    providers: Mutex<HashMap<String, ProviderInfo>>,
    requests: Mutex<Vec<(Endpoint, GameRequest)>>,
    resets: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `script` as the answer to the next unanswered call of `endpoint`.
    pub fn push(&self, endpoint: Endpoint, script: Script) -> &Self {
        lock(&self.scripts)
            .entry(endpoint)
            .or_default()
            .push_back(script);
        self
    }

    pub fn add_provider(&self, name: impl Into<String>, info: ProviderInfo) {
        lock(&self.providers).insert(name.into(), info);
    }

    /// Every streaming call made so far.
    pub fn requests(&self) -> Vec<(Endpoint, GameRequest)> {
        lock(&self.requests).clone()
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .count()
    }

    /// Session ids passed to `reset`.
    pub fn resets(&self) -> Vec<String> {
        lock(&self.resets).clone()
    }
}

async fn play(pieces: Vec<Piece>, tx: mpsc::Sender<Result<Vec<u8>, BackendError>>) {
    for piece in pieces {
        match piece {
            Piece::Bytes(bytes) => {
                if tx.send(Ok(bytes)).await.is_err() {
                    return;
                }
            }
            Piece::Pause(d) => tokio::time::sleep(d).await,
            Piece::Hang => {
                tx.closed().await;
                return;
            }
            Piece::Fail(message) => {
                let _ = tx.send(Err(BackendError::Transport(message))).await;
                return;
            }
        }
    }
}

#[async_trait]
impl GameBackend for ScriptedBackend {
    async fn open(
        &self,
        endpoint: Endpoint,
        request: &GameRequest,
    ) -> Result<ByteStream, BackendError> {
        lock(&self.requests).push((endpoint, request.clone()));
        let script = lock(&self.scripts)
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| BackendError::Transport(format!("no script queued for {endpoint}")))?;
        if let Some(message) = script.rejected {
            return Err(BackendError::Rejected(message));
        }
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(play(script.into_pieces(), tx));
        Ok(ReceiverStream::new(rx).boxed())
    }

    async fn reset(&self, session_id: &str) -> Result<(), BackendError> {
        lock(&self.resets).push(session_id.to_string());
        Ok(())
    }

    async fn provider(&self, name: &str) -> Result<ProviderInfo, BackendError> {
        lock(&self.providers)
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::Rejected(format!("unknown provider {name}")))
    }
}
