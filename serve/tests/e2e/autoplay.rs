//! Server-streamed autoplay, stop, and client-loop resume against the demo backend.

use std::time::Duration;

use questline::{OperationOutcome, Phase, SessionUpdate};
use tokio::sync::mpsc;

use super::common::{game, spawn_backend};

#[tokio::test]
async fn fresh_autoplay_streams_whole_run() {
    let (base, server) = spawn_backend().await;
    let game = game(&base, 3, 0);

    assert_eq!(game.autoplay().await, OperationOutcome::Completed { step: 3 });
    let snap = game.snapshot();
    assert_eq!(snap.phase, Phase::Complete);
    assert_eq!(snap.current_step, 3);
    assert_eq!(game.transcript().len(), 1 + 2 * 3);

    server.abort();
}

/// Stop lands during the server's pause after step 1; resume continues with single steps.
#[tokio::test]
async fn stop_during_server_pause_then_resume() {
    let (base, server) = spawn_backend().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let game = game(&base, 3, 1).with_update_sink(tx);

    let running = tokio::spawn({
        let game = game.clone();
        async move { game.autoplay().await }
    });
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(update) = rx.recv().await {
            if matches!(&update, SessionUpdate::State(s) if s.current_step == 1) {
                return;
            }
        }
    })
    .await
    .expect("step 1 never finished");
    game.stop().unwrap();
    assert_eq!(running.await.unwrap(), OperationOutcome::Stopped { step: 1 });
    assert_eq!(game.phase(), Phase::StoppedPaused);
    let paused = game.transcript();
    assert_eq!(paused.len(), 3);

    assert_eq!(game.resume().await, OperationOutcome::Completed { step: 3 });
    let done = game.transcript();
    assert_eq!(&done[..3], &paused[..]);
    assert_eq!(done.len(), 7);

    server.abort();
}
