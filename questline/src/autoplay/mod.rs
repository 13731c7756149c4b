//! Autoplay Loop Controller: two strategies behind one contract.
//!
//! Both are cancelable through the context's token, leave progress in the machine step by
//! step, and finish with the same [`RunOutcome`] shapes as a single call.

mod client_loop;
mod delay;
mod server;

pub use client_loop::ClientLoop;
pub use delay::cancelable_delay;
pub use server::ServerStreamed;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::protocol::{GameRequest, PlayerSettings};
use crate::runner::{RunOutcome, StreamOperationRunner};
use crate::session::{lock, OpTicket, Operation, SharedMachine};

/// What a strategy needs for one run.
pub struct AutoplayContext<'a> {
    pub runner: &'a StreamOperationRunner,
    pub machine: &'a SharedMachine,
    pub settings: &'a PlayerSettings,
    pub ticket: OpTicket,
    pub cancel: &'a CancellationToken,
}

impl AutoplayContext<'_> {
    /// Request body for the next call, with the current session id and budget.
    pub fn request(&self) -> GameRequest {
        let m = lock(self.machine);
        self.settings
            .request(m.session_id(), m.state().step_budget)
    }
}

#[async_trait]
pub trait AutoplayStrategy: Send + Sync {
    /// The machine operation this strategy runs under.
    fn operation(&self) -> Operation;

    async fn play(&self, cx: AutoplayContext<'_>) -> RunOutcome;
}
