use std::time::Duration;

use async_trait::async_trait;

use super::{cancelable_delay, AutoplayContext, AutoplayStrategy};
use crate::protocol::Endpoint;
use crate::runner::{RunOutcome, Terminal};
use crate::session::{lock, Operation};
use crate::status::Status;

/// One `step` call per iteration with a cancelable pause in between.
///
/// Reaching the step budget counts as completion even when the backend never said so.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientLoop;

enum Check {
    Go,
    Done(RunOutcome),
}

impl ClientLoop {
    /// Stops the loop when the story is over or the budget is spent.
    fn check_progress(cx: &AutoplayContext<'_>) -> Check {
        let mut m = lock(cx.machine);
        let state = m.state();
        let step = state.current_step;
        if state.flags.complete {
            return Check::Done(RunOutcome::Terminal(Terminal::Complete { step }));
        }
        if state.budget_reached() {
            tracing::info!(step, budget = state.step_budget, "step budget reached");
            return match m.mark_budget_exhausted(cx.ticket) {
                Ok(()) => Check::Done(RunOutcome::Terminal(Terminal::Complete { step })),
                Err(_) => Check::Done(RunOutcome::Cancelled),
            };
        }
        let max_steps = state.step_budget;
        m.set_status(Status::AutoplayStep {
            step: step + 1,
            max_steps,
        });
        Check::Go
    }
}

#[async_trait]
impl AutoplayStrategy for ClientLoop {
    fn operation(&self) -> Operation {
        Operation::LoopAutoplay
    }

    async fn play(&self, cx: AutoplayContext<'_>) -> RunOutcome {
        let delay = Duration::from_secs(cx.settings.delay_secs);
        loop {
            if cx.cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            if let Check::Done(outcome) = Self::check_progress(&cx) {
                return outcome;
            }
            let request = cx.request();
            match cx
                .runner
                .run(Endpoint::Step, &request, cx.ticket, cx.cancel)
                .await
            {
                RunOutcome::Terminal(Terminal::Done { step, .. }) => {
                    tracing::debug!(step, "autoplay step finished");
                }
                other => return other,
            }
            let more = {
                let m = lock(cx.machine);
                !m.state().flags.complete && !m.state().budget_reached()
            };
            if more && !cancelable_delay(delay, cx.cancel).await {
                return RunOutcome::Cancelled;
            }
        }
    }
}
