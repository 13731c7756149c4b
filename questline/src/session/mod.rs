//! Session State Machine and Budget Extender.

pub mod budget;
mod machine;
mod state;

pub use machine::{SessionMachine, SessionSnapshot, SessionUpdate, UpdateSink};
pub use state::{
    transition, Flags, Mode, OpTicket, Operation, Phase, SessionState, Transition,
    TransitionError,
};

use std::sync::{Arc, Mutex};

pub(crate) use crate::sync::lock;

/// The machine shared between the controller, its runners and `stop()` callers.
pub type SharedMachine = Arc<Mutex<SessionMachine>>;
