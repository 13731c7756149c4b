//! Error types surfaced by the backend and by session operations.

use thiserror::Error;

use crate::session::TransitionError;

/// Failure talking to the game backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend answered but refused the request (non-2xx, `{"error": ...}` body).
    #[error("backend rejected request: {0}")]
    Rejected(String),
    /// Connection, timeout, or body read failure.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The backend answered with something that is not the expected body.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Backend-reported failures leave the session resumable via Next-Step; transport ones too,
    /// but they are worded differently for the player.
    pub fn is_transport(&self) -> bool {
        !matches!(self, BackendError::Rejected(_))
    }
}

/// Why a session operation did not finish normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// An `error` event, or a refused request.
    #[error("{0}")]
    Backend(String),
    /// Network or connection failure, including a stream that closed mid-step.
    #[error("connection failed: {0}")]
    Transport(String),
    /// The operation is not legal in the current state.
    #[error(transparent)]
    Rejected(#[from] TransitionError),
}

impl From<BackendError> for SessionError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Rejected(msg) => SessionError::Backend(msg),
            BackendError::Transport(msg) | BackendError::InvalidResponse(msg) => {
                SessionError::Transport(msg)
            }
        }
    }
}
