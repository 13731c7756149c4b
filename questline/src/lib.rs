//! # Questline
//!
//! Session orchestration for a streamed, AI-narrated text adventure. A backend streams
//! `data: ` frames ([`stream_event::StreamEvent`]); this crate turns them into a growing
//! transcript and a resumable, cancelable game session.
//!
//! ## Design principles
//!
//! - **One state value**: [`SessionState`] plus a pure [`transition`] function; illegal moves are
//!   rejected, never patched over with scattered flag checks.
//! - **One writer**: [`SessionMachine`] owns state and [`Transcript`]; everything else requests
//!   mutations through it.
//! - **Explicit cancellation**: a [`CancellationToken`](tokio_util::sync::CancellationToken) is passed
//!   into every suspension point (stream read, inter-step delay).
//! - **Two autoplay strategies, one contract**: [`ServerStreamed`] and [`ClientLoop`] implement
//!   [`AutoplayStrategy`].
//!
//! ## Main modules
//!
//! - [`session`]: [`SessionState`], [`Phase`], [`transition`], [`SessionMachine`], [`session::budget`].
//! - [`transcript`]: [`Transcript`], [`Message`], [`TranscriptMutation`].
//! - [`frames`]: [`EventStream`] over a backend body.
//! - [`runner`]: [`StreamOperationRunner`], [`RunOutcome`].
//! - [`autoplay`]: [`AutoplayStrategy`], [`cancelable_delay`].
//! - [`backend`]: [`GameBackend`], [`HttpBackend`], [`ScriptedBackend`].
//! - [`game`]: [`GameSession`], the controller a UI drives.
//! - [`protocol`], [`status`], [`error`].

pub mod autoplay;
pub mod backend;
pub mod error;
pub mod frames;
pub mod game;
pub mod protocol;
pub mod runner;
pub mod session;
pub mod status;
mod sync;
pub mod transcript;

pub use autoplay::{
    cancelable_delay, AutoplayContext, AutoplayStrategy, ClientLoop, ServerStreamed,
};
pub use backend::{ByteStream, GameBackend, HttpBackend, Script, ScriptedBackend};
pub use error::{BackendError, SessionError};
pub use frames::EventStream;
pub use game::{GameSession, OperationOutcome, SessionConfig};
pub use protocol::{Endpoint, GameRequest, PlayerSettings, ProviderInfo, ResetRequest};
pub use runner::{RunOutcome, StreamOperationRunner, Terminal};
pub use session::{
    transition, Flags, Mode, OpTicket, Operation, Phase, SessionMachine, SessionSnapshot,
    SessionState, SessionUpdate, SharedMachine, Transition, TransitionError, UpdateSink,
};
pub use status::Status;
pub use stream_event::StreamEvent;
pub use transcript::{Message, Role, Transcript, TranscriptMutation};
