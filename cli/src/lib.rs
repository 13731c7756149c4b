//! Library side of the `questline` binary: option resolution and transcript rendering.
//!
//! The binary (`main.rs`) parses arguments, initialises logging and drives a
//! [`questline::GameSession`]; everything here is plain code that tests can call directly.

pub mod display;
pub mod options;

pub use display::{describe_outcome, Renderer};
pub use options::{resolve, Overrides, Resolved};

use thiserror::Error;

/// Failures the binary reports before exiting non-zero.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Backend(#[from] questline::BackendError),
    #[error("{0}")]
    Session(#[from] questline::SessionError),
    #[error("logging: {0}")]
    Logging(String),
    #[error("serve: {0}")]
    Serve(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
