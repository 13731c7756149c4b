//! Stream Operation Runner: one streaming call, from request to terminal outcome.

use std::sync::Arc;

use stream_event::StreamEvent;
use tokio_util::sync::CancellationToken;

use crate::backend::GameBackend;
use crate::error::BackendError;
use crate::frames::EventStream;
use crate::protocol::{Endpoint, GameRequest};
use crate::session::{lock, OpTicket, SharedMachine, TransitionError};
use crate::status::Status;

/// The event that ended a stream normally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    /// `done` of a start or step call.
    Done { step: u32, complete: bool },
    /// `complete` of an autoplay stream.
    Complete { step: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Terminal(Terminal),
    /// The token fired, or the operation was superseded (its ticket went stale).
    Cancelled,
    /// `error` event or refused request.
    Backend(String),
    /// Connection failure, body read failure, or a body that ended before its terminal event.
    Transport(String),
}

impl From<BackendError> for RunOutcome {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Rejected(message) => RunOutcome::Backend(message),
            BackendError::Transport(message) | BackendError::InvalidResponse(message) => {
                RunOutcome::Transport(message)
            }
        }
    }
}

enum Flow {
    Continue,
    Stop(RunOutcome),
}

#[derive(Clone)]
pub struct StreamOperationRunner {
    backend: Arc<dyn GameBackend>,
    machine: SharedMachine,
}

impl StreamOperationRunner {
    pub fn new(backend: Arc<dyn GameBackend>, machine: SharedMachine) -> Self {
        Self { backend, machine }
    }

    /// Opens `endpoint`, routes each decoded event into the machine under `ticket`, and
    /// resolves on the terminal event, an `error` event, transport failure, or `cancel`.
    ///
    /// Events are applied strictly in arrival order. Once `cancel` has fired, no further
    /// event of this stream is applied.
    pub async fn run(
        &self,
        endpoint: Endpoint,
        request: &GameRequest,
        ticket: OpTicket,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RunOutcome::Cancelled,
            opened = self.backend.open(endpoint, request) => opened,
        };
        let mut events = match opened {
            Ok(body) => EventStream::new(body),
            Err(e) => return e.into(),
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return RunOutcome::Cancelled,
                next = events.next_event() => next,
            };
            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(e)) => return e.into(),
                None => {
                    return RunOutcome::Transport(format!(
                        "{endpoint} stream closed before the step finished"
                    ))
                }
            };
            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            tracing::debug!(%ticket, kind = event.kind(), "stream event");
            match self.apply(endpoint, ticket, event) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(outcome)) => return outcome,
                Err(TransitionError::Stale) => {
                    tracing::warn!(%ticket, "event from superseded operation dropped");
                    return RunOutcome::Cancelled;
                }
                Err(e) => return RunOutcome::Backend(e.to_string()),
            }
        }
    }

    fn apply(
        &self,
        endpoint: Endpoint,
        ticket: OpTicket,
        event: StreamEvent,
    ) -> Result<Flow, TransitionError> {
        let mut m = lock(&self.machine);
        match event {
            StreamEvent::Chunk { content, choice } => {
                m.push_chunk(ticket, &content, choice.as_deref())?;
            }
            StreamEvent::Done { step, complete } => {
                m.end_step(ticket, step, complete)?;
                if endpoint != Endpoint::Autoplay {
                    return Ok(Flow::Stop(RunOutcome::Terminal(Terminal::Done {
                        step,
                        complete,
                    })));
                }
            }
            StreamEvent::StepDone { step } => {
                m.end_step(ticket, step, false)?;
                let max_steps = m.state().step_budget;
                m.set_status(Status::AutoplayStep { step, max_steps });
            }
            StreamEvent::Complete { step } => {
                m.end_step(ticket, step, true)?;
                return Ok(Flow::Stop(RunOutcome::Terminal(Terminal::Complete { step })));
            }
            StreamEvent::Status { message } => {
                if m.state().active_ticket() != Some(ticket) {
                    return Err(TransitionError::Stale);
                }
                m.set_status(Status::Backend(message));
            }
            StreamEvent::Error { message } => {
                return Ok(Flow::Stop(RunOutcome::Backend(message)));
            }
        }
        Ok(Flow::Continue)
    }
}
