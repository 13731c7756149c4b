//! Axum app: shared state, router, and the JSON/stream response helpers.
//!
//! Routes mirror the game backend contract: `POST /api/{start,step,autoplay,reset}` and
//! `GET /api/provider/{name}`. Streaming routes answer `text/event-stream` bodies of
//! `data: ` frames written by a producer task.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use futures::StreamExt;
use questline::{GameRequest, ResetRequest};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::game::GameRecord;
use crate::narrator::Narrator;
use crate::providers::{provider_config, resolve_api_url};
use crate::stream;

/// Streaming configuration.
#[derive(Clone, Debug)]
pub struct ServeConfig {
    /// Frames buffered between the producer task and the HTTP body.
    pub event_queue_capacity: usize,
    /// Pause between narration deltas, to make streaming visible.
    pub chunk_delay: Duration,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: 128,
            chunk_delay: Duration::from_millis(30),
        }
    }
}

impl ServeConfig {
    /// Builds the config from environment variables, falling back to [`Default`] for unset or
    /// invalid values.
    ///
    /// - `SERVE_EVENT_QUEUE_CAPACITY` (default 128)
    /// - `SERVE_CHUNK_DELAY_MS` (default 30)
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            event_queue_capacity: std::env::var("SERVE_EVENT_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.event_queue_capacity),
            chunk_delay: std::env::var("SERVE_CHUNK_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.chunk_delay),
        }
    }
}

/// Shared state: one game record per session id, plus the narrator.
pub(crate) struct AppState {
    pub(crate) sessions: DashMap<String, GameRecord>,
    pub(crate) narrator: Arc<dyn Narrator>,
    pub(crate) config: ServeConfig,
}

pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/start", post(start_handler))
        .route("/api/step", post(step_handler))
        .route("/api/autoplay", post(autoplay_handler))
        .route("/api/reset", post(reset_handler))
        .route("/api/provider/:name", get(provider_handler))
        .with_state(state)
}

/// Frame channel of one streaming response. Send failures mean the client went away.
pub(crate) type FrameSender = mpsc::Sender<String>;

fn event_stream_response(rx: mpsc::Receiver<String>) -> Response {
    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GameRequest>,
) -> Response {
    tracing::info!(
        session_id = %req.session_id,
        provider = %req.provider,
        model = %req.model,
        api_url = %resolve_api_url(&req.provider, &req.api_url),
        "start"
    );
    let (tx, rx) = mpsc::channel(state.config.event_queue_capacity);
    tokio::spawn(stream::start(state, req, tx));
    event_stream_response(rx)
}

async fn step_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GameRequest>,
) -> Response {
    if !state.sessions.contains_key(&req.session_id) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "No active game. Start a new game first.",
        );
    }
    tracing::info!(session_id = %req.session_id, max_steps = req.max_steps, "step");
    let (tx, rx) = mpsc::channel(state.config.event_queue_capacity);
    tokio::spawn(stream::step(state, req, tx));
    event_stream_response(rx)
}

async fn autoplay_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GameRequest>,
) -> Response {
    tracing::info!(
        session_id = %req.session_id,
        max_steps = req.max_steps,
        delay = req.delay,
        "autoplay"
    );
    let (tx, rx) = mpsc::channel(state.config.event_queue_capacity);
    tokio::spawn(stream::autoplay(state, req, tx));
    event_stream_response(rx)
}

async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> Response {
    let removed = state.sessions.remove(&req.session_id).is_some();
    tracing::info!(session_id = %req.session_id, removed, "reset");
    Json(json!({ "status": "reset" })).into_response()
}

async fn provider_handler(Path(name): Path<String>) -> Response {
    Json(provider_config(&name)).into_response()
}
