//! HttpBackend: `POST /api/{start|step|autoplay}` with a streamed `text/event-stream` body.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, Url};
use serde::Deserialize;

use super::{ByteStream, GameBackend};
use crate::error::BackendError;
use crate::protocol::{Endpoint, GameRequest, ProviderInfo, ResetRequest};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// `{"error": "..."}` body of a refused request.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpBackend {
    client: Client,
    base: String,
    /// Applies to non-streaming calls only; a streamed autoplay may legitimately run long.
    request_timeout: Duration,
}

impl HttpBackend {
    /// `base_url` is the backend root, e.g. `http://127.0.0.1:7860`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base: base_url.into().trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn api_url(&self, segment: &str) -> Result<Url, BackendError> {
        let mut url = Url::parse(&format!("{}/api", self.base))
            .map_err(|e| BackendError::InvalidResponse(format!("bad backend url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidResponse("backend url cannot be a base".into()))?
            .push(segment);
        Ok(url)
    }

    /// Turns a non-2xx answer into [`BackendError::Rejected`], keeping the server's message.
    async fn check_status(resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                if text.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {}", text.trim())
                }
            });
        Err(BackendError::Rejected(message))
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

#[async_trait]
impl GameBackend for HttpBackend {
    async fn open(
        &self,
        endpoint: Endpoint,
        request: &GameRequest,
    ) -> Result<ByteStream, BackendError> {
        let url = self.api_url(endpoint.path())?;
        tracing::debug!(%url, session_id = %request.session_id, "opening stream");
        let resp = self
            .client
            .post(url)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        let resp = Self::check_status(resp).await?;
        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(transport))
            .boxed())
    }

    async fn reset(&self, session_id: &str) -> Result<(), BackendError> {
        let resp = self
            .client
            .post(self.api_url("reset")?)
            .timeout(self.request_timeout)
            .json(&ResetRequest {
                session_id: session_id.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;
        Self::check_status(resp).await.map(|_| ())
    }

    async fn provider(&self, name: &str) -> Result<ProviderInfo, BackendError> {
        let mut url = self.api_url("provider")?;
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidResponse("backend url cannot be a base".into()))?
            .push(name);
        let resp = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(transport)?;
        let resp = Self::check_status(resp).await?;
        resp.json::<ProviderInfo>()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}
