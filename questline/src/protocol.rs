//! Request and response bodies of the game backend (see [`crate::backend::GameBackend`]).

use serde::{Deserialize, Serialize};

/// Streaming endpoints. Each answers with `data: ` frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Opening scene; answers `chunk`* then `done`.
    Start,
    /// One step; answers `chunk`* then `done { complete }`.
    Step,
    /// Whole run from a fresh game; answers `status`/`chunk`/`step_done`* then `complete`.
    Autoplay,
}

impl Endpoint {
    /// Path segment under `/api/`.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Start => "start",
            Endpoint::Step => "step",
            Endpoint::Autoplay => "autoplay",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Body of `start`, `step` and `autoplay`. Every field has a default so a backend can
/// accept partial bodies.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRequest {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub api_url: String,
    pub max_steps: u32,
    /// Seconds between autoplay steps.
    pub delay: u64,
    pub session_id: String,
}

impl Default for GameRequest {
    fn default() -> Self {
        Self {
            provider: "Groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key: String::new(),
            api_url: String::new(),
            max_steps: 5,
            delay: 1,
            session_id: "default".to_string(),
        }
    }
}

impl std::fmt::Debug for GameRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameRequest")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("api_url", &self.api_url)
            .field("max_steps", &self.max_steps)
            .field("delay", &self.delay)
            .field("session_id", &self.session_id)
            .finish()
    }
}

/// Body of `reset`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRequest {
    pub session_id: String,
}

/// Answer of `GET provider/{name}`; only used to populate model selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub models: Vec<String>,
    pub default_model: String,
    pub requires_key: bool,
    #[serde(default)]
    pub api_url: String,
    /// Short provider id (e.g. `openai`, `ollama`).
    #[serde(default)]
    pub provider: String,
}

/// What the player picked: provider, model, credentials and autoplay pacing.
#[derive(Clone, PartialEq, Eq)]
pub struct PlayerSettings {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub api_url: String,
    /// Pause between client-driven autoplay steps; 0 means none.
    pub delay_secs: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        let request = GameRequest::default();
        Self {
            provider: request.provider,
            model: request.model,
            api_key: request.api_key,
            api_url: request.api_url,
            delay_secs: 2,
        }
    }
}

impl std::fmt::Debug for PlayerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("api_url", &self.api_url)
            .field("delay_secs", &self.delay_secs)
            .finish()
    }
}

impl PlayerSettings {
    /// Builds the request body for the current session and budget.
    pub fn request(&self, session_id: &str, max_steps: u32) -> GameRequest {
        GameRequest {
            provider: self.provider.clone(),
            model: self.model.clone(),
            api_key: self.api_key.trim().to_string(),
            api_url: self.api_url.trim().to_string(),
            max_steps,
            delay: self.delay_secs,
            session_id: session_id.to_string(),
        }
    }
}
