//! SessionMachine: the single writer of session state and transcript.

use tokio::sync::mpsc;

use super::state::{
    transition, Flags, Mode, OpTicket, Operation, Phase, SessionState, Transition, TransitionError,
};
use crate::status::Status;
use crate::transcript::{Transcript, TranscriptMutation};

/// Read-only view of the session for renderers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub phase: Phase,
    pub flags: Flags,
    pub mode: Mode,
    pub current_step: u32,
    pub step_budget: u32,
    pub budget_ceiling: u32,
}

/// Everything a renderer needs to follow the session, in application order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionUpdate {
    Transcript(TranscriptMutation),
    State(SessionSnapshot),
    Status(Status),
}

pub type UpdateSink = mpsc::UnboundedSender<SessionUpdate>;

pub struct SessionMachine {
    state: SessionState,
    transcript: Transcript,
    session_id: String,
    status: Status,
    sink: Option<UpdateSink>,
}

impl SessionMachine {
    pub fn new(default_budget: u32, ceiling_floor: u32, session_id: String) -> Self {
        Self {
            state: SessionState::new(default_budget, ceiling_floor),
            transcript: Transcript::new(),
            session_id,
            status: Status::Ready,
            sink: None,
        }
    }

    pub fn set_sink(&mut self, sink: UpdateSink) {
        self.sink = Some(sink);
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            phase: self.state.phase(),
            flags: self.state.flags,
            mode: self.state.mode,
            current_step: self.state.current_step,
            step_budget: self.state.step_budget,
            budget_ceiling: self.state.budget_ceiling,
        }
    }

    fn emit(&self, update: SessionUpdate) {
        if let Some(sink) = &self.sink {
            // A renderer that went away must not stall the session.
            let _ = sink.send(update);
        }
    }

    fn emit_mutations(&self, mutations: Vec<TranscriptMutation>) {
        for m in mutations {
            self.emit(SessionUpdate::Transcript(m));
        }
    }

    /// Runs `input` through the transition function and publishes the new state.
    pub fn apply(&mut self, input: Transition) -> Result<(), TransitionError> {
        let before = self.state.phase();
        match transition(&self.state, input) {
            Ok(next) => {
                self.state = next;
                tracing::debug!(
                    ?input,
                    from = %before,
                    to = %self.state.phase(),
                    step = self.state.current_step,
                    budget = self.state.step_budget,
                    "session transition"
                );
                self.emit(SessionUpdate::State(self.snapshot()));
                Ok(())
            }
            Err(e) => {
                tracing::debug!(?input, phase = %before, error = %e, "transition rejected");
                Err(e)
            }
        }
    }

    pub fn begin(&mut self, op: Operation) -> Result<OpTicket, TransitionError> {
        self.apply(Transition::Begin(op))?;
        self.state.active_ticket().ok_or(TransitionError::Stale)
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status.clone();
        self.emit(SessionUpdate::Status(status));
    }

    /// Applies one `chunk` of the operation holding `ticket`.
    pub fn push_chunk(
        &mut self,
        ticket: OpTicket,
        content: &str,
        choice: Option<&str>,
    ) -> Result<(), TransitionError> {
        self.state.check_ticket(ticket)?;
        let mutations = self.transcript.push_chunk(content, choice);
        self.emit_mutations(mutations);
        Ok(())
    }

    /// A step's terminal event: freezes its messages and advances the counter.
    pub fn end_step(
        &mut self,
        ticket: OpTicket,
        step: u32,
        complete: bool,
    ) -> Result<(), TransitionError> {
        self.state.check_ticket(ticket)?;
        self.transcript.finish_step();
        self.apply(Transition::StepDone {
            ticket,
            step,
            complete,
        })
    }

    fn discard_open_step(&mut self) {
        if let Some(m) = self.transcript.discard_open_step() {
            tracing::debug!(?m, "discarded unfinished step");
            self.emit(SessionUpdate::Transcript(m));
        }
    }

    pub fn mark_budget_exhausted(&mut self, ticket: OpTicket) -> Result<(), TransitionError> {
        self.apply(Transition::BudgetExhausted { ticket })
    }

    pub fn finish(&mut self, ticket: OpTicket) -> Result<(), TransitionError> {
        self.state.check_ticket(ticket)?;
        self.discard_open_step();
        self.apply(Transition::Finish { ticket })
    }

    pub fn fail(&mut self, ticket: OpTicket) -> Result<(), TransitionError> {
        self.state.check_ticket(ticket)?;
        self.discard_open_step();
        self.apply(Transition::Fail { ticket })
    }

    /// User stop. Only legal while autoplaying; the unfinished step is dropped.
    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.apply(Transition::Cancel)?;
        self.discard_open_step();
        Ok(())
    }

    pub fn extend(&mut self, additional: u32) -> Result<u32, TransitionError> {
        self.apply(Transition::Extend { additional })?;
        Ok(self.state.step_budget)
    }

    pub fn set_budget(&mut self, steps: u32) -> Result<(), TransitionError> {
        self.apply(Transition::SetBudget { steps })
    }

    /// Clears everything and adopts `new_session_id`. Returns the previous id.
    pub fn reset(&mut self, new_session_id: String) -> String {
        if !self.transcript.is_empty() {
            self.emit(SessionUpdate::Transcript(TranscriptMutation::Discarded { from: 0 }));
        }
        self.transcript.clear();
        let old = std::mem::replace(&mut self.session_id, new_session_id);
        // Reset is legal from every state.
        let _ = self.apply(Transition::Reset);
        old
    }
}
