//! Producer tasks behind the streaming routes. Each writes `data: ` frames into the response
//! channel and stops as soon as the client has gone away.

use std::sync::Arc;
use std::time::Duration;

use questline::GameRequest;
use stream_event::{encode_frame, StreamEvent};

use crate::app::{AppState, FrameSender};
use crate::game::GameRecord;
use crate::narrator::{deltas, finalize_ending};

const NO_GAME: &str = "No active game. Start a new game first.";

/// Sends one frame. `false` means the client disconnected or the event could not be encoded.
async fn send(tx: &FrameSender, event: StreamEvent) -> bool {
    match encode_frame(&event) {
        Ok(frame) => tx.send(frame).await.is_ok(),
        Err(e) => {
            tracing::warn!(kind = event.kind(), error = %e, "frame encoding failed");
            false
        }
    }
}

/// Streams `text` as content deltas. `choice`, when set, rides on every chunk of the step.
async fn send_narration(
    state: &AppState,
    tx: &FrameSender,
    text: &str,
    choice: Option<String>,
) -> bool {
    if let Some(choice) = &choice {
        // The choice is announced before any narration arrives.
        if !send(tx, StreamEvent::chunk_with_choice("", choice.clone())).await {
            return false;
        }
    }
    for delta in deltas(text) {
        if !state.config.chunk_delay.is_zero() {
            tokio::time::sleep(state.config.chunk_delay).await;
        }
        let event = StreamEvent::Chunk {
            content: delta,
            choice: choice.clone(),
        };
        if !send(tx, event).await {
            return false;
        }
    }
    true
}

async fn pause(delay_secs: u64) {
    if delay_secs > 0 {
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
    }
}

/// Opens a new game for the session and returns its opening text.
fn new_game(state: &AppState, session_id: &str) -> String {
    let opening = state.narrator.opening();
    state
        .sessions
        .insert(session_id.to_string(), GameRecord::new(opening.clone()));
    opening
}

struct PlayedStep {
    step: u32,
    choice: u8,
    text: String,
}

/// Advances the session's game by one step. `None` when the session has no game.
fn play_step(state: &AppState, req: &GameRequest) -> Option<PlayedStep> {
    let (step, choice, final_step) = {
        let mut record = state.sessions.get_mut(&req.session_id)?;
        let choice = state.narrator.choose(record.step_count + 1);
        let (step, final_step) = record.advance(choice, req.max_steps);
        (step, choice, final_step)
    };
    let mut text = state.narrator.continue_story(step, choice, final_step);
    if final_step {
        text = finalize_ending(&text, choice);
    }
    if let Some(mut record) = state.sessions.get_mut(&req.session_id) {
        record.narrate(text.clone());
    }
    tracing::debug!(session_id = %req.session_id, step, choice, final_step, "step narrated");
    Some(PlayedStep { step, choice, text })
}

pub(crate) async fn start(state: Arc<AppState>, req: GameRequest, tx: FrameSender) {
    let opening = new_game(&state, &req.session_id);
    if send_narration(&state, &tx, &opening, None).await {
        send(
            &tx,
            StreamEvent::Done {
                step: 0,
                complete: false,
            },
        )
        .await;
    }
}

pub(crate) async fn step(state: Arc<AppState>, req: GameRequest, tx: FrameSender) {
    let Some(played) = play_step(&state, &req) else {
        send(
            &tx,
            StreamEvent::Error {
                message: NO_GAME.to_string(),
            },
        )
        .await;
        return;
    };
    if !send_narration(&state, &tx, &played.text, Some(played.choice.to_string())).await {
        return;
    }
    send(
        &tx,
        StreamEvent::Done {
            step: played.step,
            complete: played.step >= req.max_steps,
        },
    )
    .await;
}

pub(crate) async fn autoplay(state: Arc<AppState>, req: GameRequest, tx: FrameSender) {
    if !send(
        &tx,
        StreamEvent::Status {
            message: "Starting adventure...".to_string(),
        },
    )
    .await
    {
        return;
    }
    let opening = new_game(&state, &req.session_id);
    if !send_narration(&state, &tx, &opening, None).await
        || !send(&tx, StreamEvent::StepDone { step: 0 }).await
    {
        return;
    }
    pause(req.delay).await;

    let mut last = 0;
    while last < req.max_steps {
        let status = StreamEvent::Status {
            message: format!("Step {}/{}...", last + 1, req.max_steps),
        };
        if !send(&tx, status).await {
            return;
        }
        let Some(played) = play_step(&state, &req) else {
            // Reset while autoplaying.
            send(
                &tx,
                StreamEvent::Error {
                    message: NO_GAME.to_string(),
                },
            )
            .await;
            return;
        };
        last = played.step;
        if !send_narration(&state, &tx, &played.text, Some(played.choice.to_string())).await
            || !send(&tx, StreamEvent::StepDone { step: last }).await
        {
            tracing::debug!(session_id = %req.session_id, step = last, "autoplay client left");
            return;
        }
        if last >= req.max_steps {
            break;
        }
        pause(req.delay).await;
    }
    send(&tx, StreamEvent::Complete { step: last }).await;
}
