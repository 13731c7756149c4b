//! Shared helpers for session tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use questline::{
    GameSession, PlayerSettings, ScriptedBackend, SessionConfig, SessionUpdate, StreamEvent,
    TranscriptMutation,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub fn done(step: u32, complete: bool) -> StreamEvent {
    StreamEvent::Done { step, complete }
}

pub fn session(backend: &Arc<ScriptedBackend>, budget: u32) -> GameSession {
    let settings = PlayerSettings {
        delay_secs: 0,
        ..PlayerSettings::default()
    };
    GameSession::new(
        backend.clone(),
        settings,
        SessionConfig {
            default_budget: budget,
            budget_floor: 20,
        },
    )
}

pub fn watched(
    backend: &Arc<ScriptedBackend>,
    budget: u32,
) -> (GameSession, UnboundedReceiver<SessionUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (session(backend, budget).with_update_sink(tx), rx)
}

/// Waits until an update matching `pred` arrives.
pub async fn wait_for(
    rx: &mut UnboundedReceiver<SessionUpdate>,
    pred: impl Fn(&SessionUpdate) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(update) = rx.recv().await {
            if pred(&update) {
                return;
            }
        }
        panic!("update channel closed");
    })
    .await
    .expect("timed out waiting for session update");
}

/// True for a bot message that appeared with exactly `text`.
pub fn bot_appended(update: &SessionUpdate, text: &str) -> bool {
    matches!(
        update,
        SessionUpdate::Transcript(TranscriptMutation::Appended { message, .. })
            if message.content == text
    )
}
