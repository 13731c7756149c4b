//! Game backend abstraction.
//!
//! The session core depends only on [`GameBackend`]; it never builds URLs or prompts.
//! - **[`HttpBackend`]**: talks to a running backend over HTTP (streaming bodies).
//! - **[`ScriptedBackend`]**: replays scripted byte chunks; used by tests and offline demos.

mod http;
mod scripted;

pub use http::HttpBackend;
pub use scripted::{Script, ScriptedBackend};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::BackendError;
use crate::protocol::{Endpoint, GameRequest, ProviderInfo};

/// Raw response body, delivered in whatever pieces the transport read.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, BackendError>>;

#[async_trait]
pub trait GameBackend: Send + Sync {
    /// Opens one streaming call. The returned body carries `data: ` frames.
    async fn open(
        &self,
        endpoint: Endpoint,
        request: &GameRequest,
    ) -> Result<ByteStream, BackendError>;

    /// Drops the server-side game for `session_id`. Callers treat failures as best-effort.
    async fn reset(&self, session_id: &str) -> Result<(), BackendError>;

    /// Provider metadata for the selection UI.
    async fn provider(&self, name: &str) -> Result<ProviderInfo, BackendError>;
}
