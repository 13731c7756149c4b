//! Demo adventure backend for Questline (axum).
//!
//! Speaks the game backend contract consumed by `questline::HttpBackend`: streamed
//! `start`/`step`/`autoplay`, best-effort `reset`, and the provider catalog. Narration comes
//! from a [`Narrator`]; the default [`ScriptedNarrator`] is deterministic, so the server doubles
//! as an end-to-end test fixture.
//!
//! **Public API**: [`run_serve`], [`run_serve_on_listener`].

mod app;
mod game;
mod narrator;
mod providers;
mod stream;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::net::TcpListener;
use tracing::info;

use app::{router, AppState};

pub use app::ServeConfig;
pub use narrator::{finalize_ending, Narrator, ScriptedNarrator};
pub use providers::{provider_config, resolve_api_url, PROVIDER_NAMES};

pub const DEFAULT_ADDR: &str = "127.0.0.1:7860";

/// Runs the backend on an existing listener. Used by tests (bind to 127.0.0.1:0 then pass the
/// listener).
pub async fn run_serve_on_listener(
    listener: TcpListener,
    config: ServeConfig,
    narrator: Arc<dyn Narrator>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = listener.local_addr()?;
    info!("adventure backend listening on http://{}", addr);
    let state = Arc::new(AppState {
        sessions: DashMap::new(),
        narrator,
        config,
    });
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Runs the backend with the scripted narrator. Listens on `addr` (default 127.0.0.1:7860).
pub async fn run_serve(
    addr: Option<&str>,
    config: ServeConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = addr.unwrap_or(DEFAULT_ADDR);
    let listener = TcpListener::bind(addr).await?;
    run_serve_on_listener(listener, config, Arc::new(ScriptedNarrator)).await
}
