use async_trait::async_trait;

use super::{AutoplayContext, AutoplayStrategy};
use crate::protocol::Endpoint;
use crate::runner::RunOutcome;
use crate::session::Operation;

/// Fresh game played by a single `autoplay` stream; the server paces the steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerStreamed;

#[async_trait]
impl AutoplayStrategy for ServerStreamed {
    fn operation(&self) -> Operation {
        Operation::ServerAutoplay
    }

    async fn play(&self, cx: AutoplayContext<'_>) -> RunOutcome {
        let request = cx.request();
        cx.runner
            .run(Endpoint::Autoplay, &request, cx.ticket, cx.cancel)
            .await
    }
}
