//! Player-facing status lines.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Ready,
    Starting,
    Started { max_steps: u32 },
    TakingStep,
    StepCompleted { step: u32, max_steps: u32 },
    GameCompleted { step: u32, max_steps: u32 },
    AutoplayStarting,
    AutoplayStep { step: u32, max_steps: u32 },
    AutoplayCompleted { step: u32, max_steps: u32 },
    AutoplayPaused { step: u32, max_steps: u32 },
    ResetComplete,
    /// An operation was requested while another is running or no game exists.
    Busy,
    BudgetExtended { max_steps: u32 },
    /// `status` event text from the backend.
    Backend(String),
    BackendError(String),
    TransportError(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => write!(f, "Ready to start adventure"),
            Status::Starting => write!(f, "Starting adventure..."),
            Status::Started { max_steps } => {
                write!(f, "Adventure started! Step 0/{max_steps}")
            }
            Status::TakingStep => write!(f, "Taking next step..."),
            Status::StepCompleted { step, max_steps } => {
                write!(f, "Step {step}/{max_steps} completed")
            }
            Status::GameCompleted { step, max_steps } => {
                write!(f, "Game completed ({step}/{max_steps} steps)")
            }
            Status::AutoplayStarting => write!(f, "Starting auto-play adventure..."),
            Status::AutoplayStep { step, max_steps } => {
                write!(f, "Auto-play step {step}/{max_steps}")
            }
            Status::AutoplayCompleted { step, max_steps } => {
                write!(f, "Auto-play completed! {step}/{max_steps} steps finished")
            }
            Status::AutoplayPaused { step, max_steps } => {
                write!(f, "Auto-play stopped at step {step}/{max_steps}. Resume to continue")
            }
            Status::ResetComplete => write!(f, "Reset complete. Ready for new adventure!"),
            Status::Busy => write!(f, "No active game or already processing"),
            Status::BudgetExtended { max_steps } => {
                write!(f, "Budget extended to {max_steps} steps")
            }
            Status::Backend(message) => f.write_str(message),
            Status::BackendError(message) => write!(f, "Error: {message}"),
            Status::TransportError(message) => write!(f, "Connection failed: {message}"),
        }
    }
}

impl Status {
    pub fn is_error(&self) -> bool {
        matches!(self, Status::BackendError(_) | Status::TransportError(_))
    }
}
