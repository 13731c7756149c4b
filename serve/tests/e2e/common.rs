//! Shared helpers for e2e tests: spawn the backend, build sessions against it.

use std::sync::Arc;
use std::time::Duration;

use questline::{GameSession, HttpBackend, PlayerSettings, SessionConfig};
use serve::{ScriptedNarrator, ServeConfig};
use tokio::net::TcpListener;

/// Binds a random port and spawns the server. Returns (base_url, server_handle).
pub async fn spawn_backend() -> (
    String,
    tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error + Send + Sync>>>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServeConfig {
        chunk_delay: Duration::ZERO,
        ..ServeConfig::default()
    };
    let handle = tokio::spawn(serve::run_serve_on_listener(
        listener,
        config,
        Arc::new(ScriptedNarrator),
    ));
    (format!("http://{}", addr), handle)
}

pub fn http_backend(base_url: &str) -> HttpBackend {
    HttpBackend::new(base_url, Duration::from_secs(10)).unwrap()
}

pub fn game(base_url: &str, budget: u32, delay_secs: u64) -> GameSession {
    let settings = PlayerSettings {
        delay_secs,
        ..PlayerSettings::default()
    };
    GameSession::new(
        Arc::new(http_backend(base_url)),
        settings,
        SessionConfig {
            default_budget: budget,
            budget_floor: 20,
        },
    )
}
