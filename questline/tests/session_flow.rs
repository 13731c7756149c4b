//! Manual play through `GameSession`: start, steps, failures, busy and reset handling.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{bot_appended, done, session, wait_for, watched};
use questline::{
    Endpoint, Message, OperationOutcome, Phase, Script, ScriptedBackend, SessionError, Status,
    StreamEvent, TransitionError,
};

fn opening() -> Script {
    Script::events([
        StreamEvent::chunk("You wake"),
        StreamEvent::chunk(" in a cave."),
        done(1, false),
    ])
}

/// **Scenario**: a start whose `done` is not complete lands in ManualReady at `done.step`.
#[tokio::test]
async fn start_lands_in_manual_ready() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    let game = session(&backend, 5);

    assert_eq!(game.start().await, OperationOutcome::Ready { step: 1 });
    let snap = game.snapshot();
    assert_eq!(snap.phase, Phase::ManualReady);
    assert_eq!(snap.current_step, 1);
    assert!(!snap.flags.processing);
    assert_eq!(game.transcript(), vec![Message::bot("You wake in a cave.")]);
    assert_eq!(game.status(), Status::Started { max_steps: 5 });

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].1.session_id, game.session_id());
    assert_eq!(requests[0].1.max_steps, 5);
}

/// **Scenario**: `[chunk{A, go north}, chunk{B}, done{2}]` adds exactly `user:"go north"`, `bot:"AB"`.
#[tokio::test]
async fn step_adds_choice_then_narration() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    backend.push(
        Endpoint::Step,
        Script::events([
            StreamEvent::chunk_with_choice("A", "go north"),
            StreamEvent::chunk("B"),
            done(2, false),
        ]),
    );
    let game = session(&backend, 5);
    game.start().await;

    assert_eq!(game.next_step().await, OperationOutcome::Ready { step: 2 });
    let transcript = game.transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(&transcript[1..], &[Message::user("go north"), Message::bot("AB")]);
    assert_eq!(
        game.status(),
        Status::StepCompleted {
            step: 2,
            max_steps: 5
        }
    );
}

/// **Scenario**: a choice repeated on every chunk still yields one user message.
#[tokio::test]
async fn choice_repeated_on_every_chunk() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    backend.push(
        Endpoint::Step,
        Script::events([
            StreamEvent::chunk_with_choice("The ", "Light the torch"),
            StreamEvent::chunk_with_choice("torch ", "Light the torch"),
            StreamEvent::chunk_with_choice("flares.", "Light the torch"),
            done(2, false),
        ]),
    );
    let game = session(&backend, 5);
    game.start().await;
    game.next_step().await;
    assert_eq!(
        &game.transcript()[1..],
        &[
            Message::user("Light the torch"),
            Message::bot("The torch flares.")
        ]
    );
}

/// **Scenario**: arbitrary read boundaries (down to one byte, inside UTF-8) change nothing.
#[tokio::test]
async fn split_reads_decode_identically() {
    let events = [
        StreamEvent::chunk("Café ☕ "),
        StreamEvent::chunk("au lait."),
        done(1, false),
    ];
    let mut transcripts = Vec::new();
    for split in [None, Some(1), Some(2), Some(7), Some(64)] {
        let backend = Arc::new(ScriptedBackend::new());
        let script = Script::events(events.clone());
        let script = match split {
            Some(n) => script.split_every(n),
            None => script,
        };
        backend.push(Endpoint::Start, script);
        let game = session(&backend, 5);
        assert_eq!(game.start().await, OperationOutcome::Ready { step: 1 });
        transcripts.push(game.transcript());
    }
    assert!(transcripts.iter().all(|t| t == &transcripts[0]));
    assert_eq!(transcripts[0], vec![Message::bot("Café ☕ au lait.")]);
}

/// **Scenario**: noise lines and a malformed frame do not end the stream.
#[tokio::test]
async fn malformed_frames_are_skipped() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(
        Endpoint::Start,
        Script::new()
            .raw(": comment\n\nevent: message\n")
            .raw("data: {\"type\":\"mystery\"}\n\n")
            .raw("data: not json\n\n")
            .event(&StreamEvent::chunk("Still here."))
            .event(&done(1, false)),
    );
    let game = session(&backend, 5);
    assert_eq!(game.start().await, OperationOutcome::Ready { step: 1 });
    assert_eq!(game.transcript(), vec![Message::bot("Still here.")]);
}

/// **Scenario**: `done.complete` ends the game; only continue or reset are accepted.
#[tokio::test]
async fn completion_then_continue_extends_budget() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    backend.push(
        Endpoint::Step,
        Script::events([StreamEvent::chunk_with_choice("The end.", "1"), done(2, true)]),
    );
    let game = session(&backend, 2);
    game.start().await;
    assert_eq!(game.next_step().await, OperationOutcome::Completed { step: 2 });
    assert_eq!(game.phase(), Phase::Complete);
    assert!(matches!(
        game.next_step().await,
        OperationOutcome::Ignored(TransitionError::NotAllowed {
            phase: Phase::Complete,
            ..
        })
    ));

    assert_eq!(
        game.continue_game(3, false).await,
        OperationOutcome::Ready { step: 2 }
    );
    let snap = game.snapshot();
    assert_eq!(snap.phase, Phase::ManualReady);
    assert_eq!(snap.step_budget, 5);
    assert_eq!(snap.budget_ceiling, 20);
    assert_eq!(game.transcript().len(), 3);
    assert_eq!(backend.calls(Endpoint::Step), 1);
}

/// **Scenario**: an `error` event is reported, the half step is dropped, and a retry works.
#[tokio::test]
async fn backend_error_leaves_session_retryable() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    backend.push(
        Endpoint::Step,
        Script::events([
            StreamEvent::chunk_with_choice("Par", "2"),
            StreamEvent::Error {
                message: "rate limited".into(),
            },
            StreamEvent::chunk("ignored"),
        ]),
    );
    backend.push(
        Endpoint::Step,
        Script::events([StreamEvent::chunk_with_choice("Again.", "2"), done(2, false)]),
    );
    let game = session(&backend, 5);
    game.start().await;

    assert_eq!(
        game.next_step().await,
        OperationOutcome::Failed(SessionError::Backend("rate limited".into()))
    );
    assert_eq!(game.phase(), Phase::ManualReady);
    assert_eq!(game.snapshot().current_step, 1);
    assert_eq!(game.transcript().len(), 1);
    assert!(game.status().is_error());

    assert_eq!(game.next_step().await, OperationOutcome::Ready { step: 2 });
    assert_eq!(game.transcript().len(), 3);
}

/// **Scenario**: a refused request surfaces the server's message as a backend error.
#[tokio::test]
async fn rejected_request_is_backend_error() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    backend.push(
        Endpoint::Step,
        Script::rejected("No active game. Start a new game first."),
    );
    let game = session(&backend, 5);
    game.start().await;
    assert_eq!(
        game.next_step().await,
        OperationOutcome::Failed(SessionError::Backend(
            "No active game. Start a new game first.".into()
        ))
    );
    assert!(!game.snapshot().flags.processing);
}

/// **Scenario**: a dropped connection or a body that ends early is a transport failure.
#[tokio::test]
async fn transport_failures_clear_processing() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    backend.push(
        Endpoint::Step,
        Script::events([StreamEvent::chunk("Half")]).then_fail("connection reset"),
    );
    backend.push(Endpoint::Step, Script::events([StreamEvent::chunk("Cut off")]));
    let game = session(&backend, 5);
    game.start().await;

    assert_eq!(
        game.next_step().await,
        OperationOutcome::Failed(SessionError::Transport("connection reset".into()))
    );
    assert!(matches!(
        game.next_step().await,
        OperationOutcome::Failed(SessionError::Transport(_))
    ));
    let snap = game.snapshot();
    assert_eq!(snap.phase, Phase::ManualReady);
    assert!(!snap.flags.autoplaying && !snap.flags.complete);
    assert_eq!(game.transcript(), vec![Message::bot("You wake in a cave.")]);
}

/// **Scenario**: a start that fails before its first step leaves nothing to continue.
#[tokio::test]
async fn failed_start_returns_to_idle() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, Script::rejected("Invalid API key"));
    let game = session(&backend, 5);
    assert!(matches!(game.start().await, OperationOutcome::Failed(_)));
    assert_eq!(game.phase(), Phase::Idle);
    assert!(game.transcript().is_empty());
}

/// **Scenario**: operations requested while a stream is in flight are ignored, not queued.
#[tokio::test]
async fn busy_session_ignores_new_operations() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(
        Endpoint::Start,
        Script::events([StreamEvent::chunk("Once upon")]).then_hang(),
    );
    let (game, mut rx) = watched(&backend, 5);
    let running = tokio::spawn({
        let game = game.clone();
        async move { game.start().await }
    });
    wait_for(&mut rx, |u| bot_appended(u, "Once upon")).await;

    assert_eq!(game.phase(), Phase::Processing);
    assert_eq!(game.start().await, OperationOutcome::Ignored(TransitionError::Busy));
    assert_eq!(
        game.next_step().await,
        OperationOutcome::Ignored(TransitionError::Busy)
    );
    assert_eq!(game.status(), Status::Busy);
    assert!(game.stop().is_err(), "stop is only for autoplay");
    assert_eq!(backend.calls(Endpoint::Start), 1);

    game.reset();
    assert_eq!(running.await.unwrap(), OperationOutcome::Superseded);
}

/// **Scenario**: reset mid-stream returns to Idle with defaults and a new session id.
#[tokio::test]
async fn reset_mid_stream_returns_to_idle() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    backend.push(
        Endpoint::Step,
        Script::events([StreamEvent::chunk_with_choice("Mid", "1")]).then_hang(),
    );
    let (game, mut rx) = watched(&backend, 5);
    game.start().await;
    game.continue_game(4, false).await;
    let old_id = game.session_id();

    let running = tokio::spawn({
        let game = game.clone();
        async move { game.next_step().await }
    });
    wait_for(&mut rx, |u| bot_appended(u, "Mid")).await;
    game.reset();

    assert_eq!(running.await.unwrap(), OperationOutcome::Superseded);
    let snap = game.snapshot();
    assert_eq!(snap.phase, Phase::Idle);
    assert_eq!(snap.current_step, 0);
    assert_eq!(snap.step_budget, 5);
    assert!(game.transcript().is_empty());
    assert_ne!(game.session_id(), old_id);
    assert_eq!(game.status(), Status::ResetComplete);

    tokio::time::timeout(Duration::from_secs(2), async {
        while backend.resets().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("backend reset was never sent");
    assert_eq!(backend.resets(), vec![old_id]);
}

/// **Scenario**: the budget can be chosen before starting, but not afterwards.
#[tokio::test]
async fn budget_is_chosen_while_idle() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push(Endpoint::Start, opening());
    let game = session(&backend, 5);
    game.set_budget(12).unwrap();
    game.start().await;
    assert_eq!(backend.requests()[0].1.max_steps, 12);
    assert!(game.set_budget(3).is_err());
    game.reset();
    assert_eq!(game.snapshot().step_budget, 5);
}
