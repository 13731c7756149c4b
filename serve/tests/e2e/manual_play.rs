//! Start and step against the demo backend.

use questline::{OperationOutcome, Phase, Role};

use super::common::{game, spawn_backend};

#[tokio::test]
async fn start_and_steps_until_budget() {
    let (base, server) = spawn_backend().await;
    let game = game(&base, 2, 0);

    assert_eq!(game.start().await, OperationOutcome::Ready { step: 0 });
    assert_eq!(game.phase(), Phase::ManualReady);
    let opening = game.transcript();
    assert_eq!(opening.len(), 1);
    assert!(opening[0].content.contains("1. Press forward carefully"));

    assert_eq!(game.next_step().await, OperationOutcome::Ready { step: 1 });
    let t = game.transcript();
    assert_eq!(t.len(), 3);
    assert_eq!(t[1].role, Role::User);
    assert_eq!(t[1].content, "1");
    assert!(t[2].content.starts_with("You chose option 1."));

    assert_eq!(game.next_step().await, OperationOutcome::Completed { step: 2 });
    assert_eq!(game.phase(), Phase::Complete);
    let t = game.transcript();
    assert_eq!(t.len(), 5);
    assert_eq!(t[3].content, "2");
    let finale = &t[4].content;
    assert!(finale.ends_with('.'), "{finale}");
    assert!(!finale.contains("1. Press"), "{finale}");

    server.abort();
}

#[tokio::test]
async fn continue_after_completion_keeps_playing() {
    let (base, server) = spawn_backend().await;
    let game = game(&base, 1, 0);
    game.start().await;
    assert_eq!(game.next_step().await, OperationOutcome::Completed { step: 1 });

    game.continue_game(2, false).await;
    assert_eq!(game.next_step().await, OperationOutcome::Ready { step: 2 });
    assert_eq!(game.next_step().await, OperationOutcome::Completed { step: 3 });
    assert_eq!(game.transcript().len(), 7);

    server.abort();
}
