//! GameSession: the public controller over machine, runner and autoplay strategies.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};

use crate::autoplay::{AutoplayContext, AutoplayStrategy, ClientLoop, ServerStreamed};
use crate::backend::GameBackend;
use crate::error::SessionError;
use crate::protocol::{Endpoint, GameRequest, PlayerSettings, ProviderInfo};
use crate::runner::{RunOutcome, StreamOperationRunner};
use crate::session::{
    lock, transition, OpTicket, Operation, Phase, SessionMachine, SessionSnapshot, SharedMachine,
    Transition, TransitionError, UpdateSink,
};
use crate::status::Status;
use crate::transcript::Message;

/// Budget limits of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Budget of a fresh session and after reset.
    pub default_budget: u32,
    /// Lowest selectable budget ceiling.
    pub budget_floor: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_budget: 5,
            budget_floor: 20,
        }
    }
}

/// How an operation ended, from the caller's point of view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Finished a start or step; more steps are possible.
    Ready { step: u32 },
    /// The story (or its budget) is over.
    Completed { step: u32 },
    /// User stop; resumable.
    Stopped { step: u32 },
    Failed(SessionError),
    /// Not legal right now; nothing was sent.
    Ignored(TransitionError),
    /// A reset replaced the operation while it ran.
    Superseded,
}

impl OperationOutcome {
    /// Errors for `Failed` and `Ignored`; every other outcome is a normal end.
    pub fn into_result(self) -> Result<OperationOutcome, SessionError> {
        match self {
            OperationOutcome::Failed(e) => Err(e),
            OperationOutcome::Ignored(e) => Err(SessionError::Rejected(e)),
            other => Ok(other),
        }
    }
}

struct ActiveOp {
    ticket: OpTicket,
    token: CancellationToken,
    stopped: bool,
}

struct Inner {
    backend: Arc<dyn GameBackend>,
    machine: SharedMachine,
    runner: StreamOperationRunner,
    settings: Mutex<PlayerSettings>,
    /// Always locked after the machine, never before.
    active: Mutex<Option<ActiveOp>>,
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// One play-through. Cheap to clone; clones share the session, so `stop()` can be called
/// from another task while an operation is awaited.
#[derive(Clone)]
pub struct GameSession {
    inner: Arc<Inner>,
}

impl GameSession {
    pub fn new(
        backend: Arc<dyn GameBackend>,
        settings: PlayerSettings,
        config: SessionConfig,
    ) -> Self {
        let machine = Arc::new(Mutex::new(SessionMachine::new(
            config.default_budget,
            config.budget_floor,
            new_session_id(),
        )));
        Self {
            inner: Arc::new(Inner {
                runner: StreamOperationRunner::new(backend.clone(), machine.clone()),
                backend,
                machine,
                settings: Mutex::new(settings),
                active: Mutex::new(None),
            }),
        }
    }

    /// Publishes every transcript, state and status change to `sink`.
    pub fn with_update_sink(self, sink: UpdateSink) -> Self {
        lock(&self.inner.machine).set_sink(sink);
        self
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.inner.machine).snapshot()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.inner.machine).phase()
    }

    pub fn transcript(&self) -> Vec<Message> {
        lock(&self.inner.machine).transcript().messages().to_vec()
    }

    pub fn session_id(&self) -> String {
        lock(&self.inner.machine).session_id().to_string()
    }

    pub fn status(&self) -> Status {
        lock(&self.inner.machine).status().clone()
    }

    pub fn settings(&self) -> PlayerSettings {
        lock(&self.inner.settings).clone()
    }

    /// Replaces provider, model, credentials and delay for subsequent calls.
    pub fn set_settings(&self, settings: PlayerSettings) {
        *lock(&self.inner.settings) = settings;
    }

    pub fn set_delay(&self, delay_secs: u64) {
        lock(&self.inner.settings).delay_secs = delay_secs;
    }

    /// Chooses the budget of the next run. Only before the game starts.
    pub fn set_budget(&self, steps: u32) -> Result<(), TransitionError> {
        lock(&self.inner.machine).set_budget(steps)
    }

    /// Opening scene. Legal only from Idle.
    pub async fn start(&self) -> OperationOutcome {
        self.run_single(Operation::Start, Endpoint::Start, Status::Starting)
            .await
    }

    /// One manual step from ManualReady or StoppedPaused.
    pub async fn next_step(&self) -> OperationOutcome {
        self.run_single(Operation::Step, Endpoint::Step, Status::TakingStep)
            .await
    }

    /// Autoplay: a fresh game is played by the server stream; a running game continues
    /// with the client loop.
    pub async fn autoplay(&self) -> OperationOutcome {
        if self.phase() == Phase::Idle {
            self.run_autoplay(&ServerStreamed, None, None).await
        } else {
            self.run_autoplay(&ClientLoop, None, None).await
        }
    }

    /// Continues a stopped autoplay where it left off.
    pub async fn resume(&self) -> OperationOutcome {
        self.run_autoplay(&ClientLoop, Some(Phase::StoppedPaused), None)
            .await
    }

    /// Raises the budget by `additional` steps, then either waits for the player or
    /// autoplays the new steps. With `autoplay` the budget is only raised when the autoplay
    /// can begin too.
    pub async fn continue_game(&self, additional: u32, autoplay: bool) -> OperationOutcome {
        if autoplay {
            return self
                .run_autoplay(&ClientLoop, None, Some(additional))
                .await;
        }
        let step = {
            let mut m = lock(&self.inner.machine);
            match m.extend(additional) {
                Ok(max_steps) => {
                    m.set_status(Status::BudgetExtended { max_steps });
                    m.state().current_step
                }
                Err(e) => {
                    m.set_status(Status::Busy);
                    return OperationOutcome::Ignored(e);
                }
            }
        };
        OperationOutcome::Ready { step }
    }

    /// Stops a running autoplay. Effective immediately: no further event of the stream is
    /// applied, and the unfinished step is dropped.
    pub fn stop(&self) -> Result<(), TransitionError> {
        let mut m = lock(&self.inner.machine);
        m.cancel()?;
        let state = m.state();
        let (step, max_steps) = (state.current_step, state.step_budget);
        m.set_status(Status::AutoplayPaused { step, max_steps });
        if let Some(active) = lock(&self.inner.active).as_mut() {
            active.stopped = true;
            active.token.cancel();
        }
        tracing::info!(step, "autoplay stopped by user");
        Ok(())
    }

    /// Back to Idle from any state: cancels the in-flight stream, clears transcript, flags
    /// and counters, restores the default budget, and starts a new session id. The backend
    /// is told to drop the old game in the background; failures are ignored.
    pub fn reset(&self) {
        let old_id = {
            let mut m = lock(&self.inner.machine);
            if let Some(active) = lock(&self.inner.active).take() {
                active.token.cancel();
            }
            let old_id = m.reset(new_session_id());
            m.set_status(Status::ResetComplete);
            old_id
        };
        tracing::info!(session_id = %old_id, "session reset");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let backend = self.inner.backend.clone();
                handle.spawn(async move {
                    if let Err(e) = backend.reset(&old_id).await {
                        tracing::debug!(error = %e, "backend reset failed (ignored)");
                    }
                });
            }
            Err(_) => tracing::debug!("no runtime; backend reset skipped"),
        }
    }

    pub async fn provider_info(&self, name: &str) -> Result<ProviderInfo, SessionError> {
        Ok(self.inner.backend.provider(name).await?)
    }

    /// Validates and begins `op`, installing a fresh cancellation token. A budget
    /// extension in `extend` is applied together with the begin, or not at all.
    fn begin(
        &self,
        op: Operation,
        required: Option<Phase>,
        extend: Option<u32>,
        opening: Status,
    ) -> Result<(OpTicket, CancellationToken, GameRequest), TransitionError> {
        let mut m = lock(&self.inner.machine);
        let phase = m.phase();
        let ticket = match (required, extend) {
            (Some(req), _) if phase != req && !m.state().flags.processing => {
                Err(TransitionError::NotAllowed {
                    action: op.name(),
                    phase,
                })
            }
            (_, Some(additional)) => transition(m.state(), Transition::Extend { additional })
                .and_then(|extended| transition(&extended, Transition::Begin(op)))
                .and_then(|_| m.extend(additional))
                .and_then(|max_steps| {
                    m.set_status(Status::BudgetExtended { max_steps });
                    m.begin(op)
                }),
            (_, None) => m.begin(op),
        };
        let ticket = match ticket {
            Ok(t) => t,
            Err(e) => {
                m.set_status(Status::Busy);
                return Err(e);
            }
        };
        let token = CancellationToken::new();
        *lock(&self.inner.active) = Some(ActiveOp {
            ticket,
            token: token.clone(),
            stopped: false,
        });
        m.set_status(opening);
        let request = lock(&self.inner.settings).request(m.session_id(), m.state().step_budget);
        Ok((ticket, token, request))
    }

    async fn run_single(
        &self,
        op: Operation,
        endpoint: Endpoint,
        opening: Status,
    ) -> OperationOutcome {
        let (ticket, token, request) = match self.begin(op, None, None, opening) {
            Ok(v) => v,
            Err(e) => return OperationOutcome::Ignored(e),
        };
        let span = info_span!(
            "operation",
            op = op.name(),
            session_id = %request.session_id,
            %ticket
        );
        tracing::info!(parent: &span, "operation started");
        let outcome = self
            .inner
            .runner
            .run(endpoint, &request, ticket, &token)
            .instrument(span.clone())
            .await;
        let settled = self.settle(ticket, op, outcome);
        tracing::info!(parent: &span, outcome = ?settled, "operation finished");
        settled
    }

    async fn run_autoplay(
        &self,
        strategy: &dyn AutoplayStrategy,
        required: Option<Phase>,
        extend: Option<u32>,
    ) -> OperationOutcome {
        let op = strategy.operation();
        let (ticket, token, request) =
            match self.begin(op, required, extend, Status::AutoplayStarting) {
                Ok(v) => v,
                Err(e) => return OperationOutcome::Ignored(e),
            };
        let settings = self.settings();
        let span = info_span!(
            "operation",
            op = op.name(),
            session_id = %request.session_id,
            %ticket
        );
        tracing::info!(parent: &span, delay_secs = settings.delay_secs, "autoplay started");
        let cx = AutoplayContext {
            runner: &self.inner.runner,
            machine: &self.inner.machine,
            settings: &settings,
            ticket,
            cancel: &token,
        };
        let outcome = strategy.play(cx).instrument(span.clone()).await;
        let settled = self.settle(ticket, op, outcome);
        tracing::info!(parent: &span, outcome = ?settled, "autoplay finished");
        settled
    }

    /// Ends the operation in the machine and turns the run result into an outcome.
    fn settle(&self, ticket: OpTicket, op: Operation, outcome: RunOutcome) -> OperationOutcome {
        let mut m = lock(&self.inner.machine);
        let stopped = {
            let mut active = lock(&self.inner.active);
            if active.as_ref().is_some_and(|a| a.ticket == ticket) {
                active.take().is_some_and(|a| a.stopped)
            } else {
                false
            }
        };

        if m.state().active_ticket() != Some(ticket) {
            // A stop or reset ended the operation first.
            return if stopped {
                OperationOutcome::Stopped {
                    step: m.state().current_step,
                }
            } else {
                OperationOutcome::Superseded
            };
        }

        match outcome {
            RunOutcome::Terminal(_) => {
                let _ = m.finish(ticket);
                let state = m.state();
                let (step, max_steps) = (state.current_step, state.step_budget);
                if state.flags.complete {
                    m.set_status(if op.is_autoplay() {
                        Status::AutoplayCompleted { step, max_steps }
                    } else {
                        Status::GameCompleted { step, max_steps }
                    });
                    OperationOutcome::Completed { step }
                } else {
                    m.set_status(match op {
                        Operation::Start => Status::Started { max_steps },
                        _ => Status::StepCompleted { step, max_steps },
                    });
                    OperationOutcome::Ready { step }
                }
            }
            RunOutcome::Cancelled => {
                let _ = m.fail(ticket);
                OperationOutcome::Superseded
            }
            RunOutcome::Backend(message) => {
                let _ = m.fail(ticket);
                tracing::warn!(%message, "backend reported an error");
                m.set_status(Status::BackendError(message.clone()));
                OperationOutcome::Failed(SessionError::Backend(message))
            }
            RunOutcome::Transport(message) => {
                let _ = m.fail(ticket);
                tracing::warn!(%message, "transport failure");
                m.set_status(Status::TransportError(message.clone()));
                OperationOutcome::Failed(SessionError::Transport(message))
            }
        }
    }
}
