//! Session state as one value, plus the pure transition function over it.
//!
//! Flags compose into a [`Phase`]; every mutation goes through [`transition`], which rejects
//! illegal moves instead of silently applying them.

use std::fmt;

use thiserror::Error;

use super::budget;

/// Raw session flags. Read them through [`SessionState::phase`] where possible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub started: bool,
    pub processing: bool,
    pub autoplaying: bool,
    pub complete: bool,
    pub stopped_by_user: bool,
}

/// Observable state derived from [`Flags`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    /// A start or manual step is streaming.
    Processing,
    ManualReady,
    Autoplaying,
    StoppedPaused,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Processing => "processing",
            Phase::ManualReady => "manual_ready",
            Phase::Autoplaying => "autoplaying",
            Phase::StoppedPaused => "stopped_paused",
            Phase::Complete => "complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which runner drives subsequent steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Manual,
    Autoplay,
}

/// A streaming operation the session can begin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Opening scene of a fresh game.
    Start,
    /// One manual step.
    Step,
    /// Fresh game played entirely by one server stream.
    ServerAutoplay,
    /// Client-issued steps with a delay between them (autoplay from a running game, resume).
    LoopAutoplay,
}

impl Operation {
    pub fn is_autoplay(&self) -> bool {
        matches!(self, Operation::ServerAutoplay | Operation::LoopAutoplay)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Start => "start",
            Operation::Step => "step",
            Operation::ServerAutoplay => "autoplay",
            Operation::LoopAutoplay => "resume autoplay",
        }
    }

    fn allowed_from(&self, phase: Phase) -> bool {
        match self {
            Operation::Start | Operation::ServerAutoplay => phase == Phase::Idle,
            Operation::Step | Operation::LoopAutoplay => {
                matches!(phase, Phase::ManualReady | Phase::StoppedPaused)
            }
        }
    }
}

/// Identifies one begun operation. Anything carrying an older ticket is stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpTicket(u64);

impl OpTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OpTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub flags: Flags,
    pub current_step: u32,
    pub step_budget: u32,
    /// Highest budget selectable right now; grows with extensions.
    pub budget_ceiling: u32,
    /// Budget restored by reset.
    pub default_budget: u32,
    /// Lower bound for `budget_ceiling`.
    pub ceiling_floor: u32,
    pub mode: Mode,
    active: Option<(OpTicket, Operation)>,
    next_ticket: u64,
}

impl SessionState {
    pub fn new(default_budget: u32, ceiling_floor: u32) -> Self {
        let default_budget = default_budget.max(1);
        Self {
            flags: Flags::default(),
            current_step: 0,
            step_budget: default_budget,
            budget_ceiling: default_budget.max(ceiling_floor),
            default_budget,
            ceiling_floor,
            mode: Mode::Manual,
            active: None,
            next_ticket: 1,
        }
    }

    pub fn phase(&self) -> Phase {
        let f = &self.flags;
        if f.complete {
            Phase::Complete
        } else if f.processing && f.autoplaying {
            Phase::Autoplaying
        } else if f.processing {
            Phase::Processing
        } else if f.stopped_by_user {
            Phase::StoppedPaused
        } else if f.started {
            Phase::ManualReady
        } else {
            Phase::Idle
        }
    }

    pub fn active(&self) -> Option<(OpTicket, Operation)> {
        self.active
    }

    pub fn active_ticket(&self) -> Option<OpTicket> {
        self.active.map(|(t, _)| t)
    }

    pub fn budget_reached(&self) -> bool {
        self.current_step >= self.step_budget
    }

    pub(super) fn check_ticket(&self, ticket: OpTicket) -> Result<(), TransitionError> {
        match self.active {
            Some((active, _)) if active == ticket => Ok(()),
            _ => Err(TransitionError::Stale),
        }
    }

    fn end_operation(&mut self) {
        self.flags.processing = false;
        self.flags.autoplaying = false;
        self.active = None;
    }
}

/// Input to [`transition`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Begin(Operation),
    /// A step's terminal event (`done`, `step_done`, `complete`) was applied.
    StepDone {
        ticket: OpTicket,
        step: u32,
        complete: bool,
    },
    /// The client loop ran out of budget; treated as narrative completion.
    BudgetExhausted { ticket: OpTicket },
    /// The operation ended normally.
    Finish { ticket: OpTicket },
    /// The operation ended with a backend or transport failure.
    Fail { ticket: OpTicket },
    /// User stop.
    Cancel,
    Extend { additional: u32 },
    SetBudget { steps: u32 },
    Reset,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("an operation is already in flight")]
    Busy,
    #[error("{action} is not allowed while {phase}")]
    NotAllowed { action: &'static str, phase: Phase },
    #[error("event from a superseded operation")]
    Stale,
    #[error("invalid step budget {0}")]
    InvalidBudget(u32),
}

/// Applies `input` to `state`, returning the next state or why the move is illegal.
pub fn transition(state: &SessionState, input: Transition) -> Result<SessionState, TransitionError> {
    let phase = state.phase();
    let mut next = state.clone();
    match input {
        Transition::Begin(op) => {
            if state.flags.processing {
                return Err(TransitionError::Busy);
            }
            if !op.allowed_from(phase) {
                return Err(TransitionError::NotAllowed {
                    action: op.name(),
                    phase,
                });
            }
            let ticket = OpTicket(state.next_ticket);
            next.next_ticket += 1;
            next.active = Some((ticket, op));
            next.flags.processing = true;
            next.flags.autoplaying = op.is_autoplay();
            next.flags.stopped_by_user = false;
            next.mode = if op.is_autoplay() {
                Mode::Autoplay
            } else {
                Mode::Manual
            };
        }
        Transition::StepDone {
            ticket,
            step,
            complete,
        } => {
            state.check_ticket(ticket)?;
            next.flags.started = true;
            next.current_step = state.current_step.max(step);
            next.flags.complete |= complete;
        }
        Transition::BudgetExhausted { ticket } => {
            state.check_ticket(ticket)?;
            next.flags.complete = true;
        }
        Transition::Finish { ticket } | Transition::Fail { ticket } => {
            state.check_ticket(ticket)?;
            next.end_operation();
        }
        Transition::Cancel => {
            // A spent budget already made the run complete; there is nothing left to stop.
            if !state.flags.autoplaying || state.flags.complete {
                return Err(TransitionError::NotAllowed {
                    action: "stop",
                    phase,
                });
            }
            next.end_operation();
            // The backend holds the game from the first request on, so even a run stopped
            // before its first step can be resumed.
            next.flags.started = true;
            next.flags.stopped_by_user = true;
        }
        Transition::Extend { additional } => {
            if state.flags.processing {
                return Err(TransitionError::Busy);
            }
            if phase == Phase::Idle {
                return Err(TransitionError::NotAllowed {
                    action: "continue",
                    phase,
                });
            }
            if additional == 0 {
                return Err(TransitionError::InvalidBudget(additional));
            }
            let ext = budget::extend(state.step_budget, additional, state.ceiling_floor);
            next.step_budget = ext.budget;
            next.budget_ceiling = ext.ceiling.max(state.budget_ceiling);
            next.flags.complete = false;
            next.flags.stopped_by_user = false;
        }
        Transition::SetBudget { steps } => {
            if phase != Phase::Idle {
                return Err(TransitionError::NotAllowed {
                    action: "change the step budget",
                    phase,
                });
            }
            if steps == 0 || steps > state.budget_ceiling {
                return Err(TransitionError::InvalidBudget(steps));
            }
            next.step_budget = steps;
        }
        Transition::Reset => {
            next = SessionState::new(state.default_budget, state.ceiling_floor);
            next.next_ticket = state.next_ticket;
        }
    }
    Ok(next)
}
