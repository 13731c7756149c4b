//! Route-level behavior: refused steps, reset, provider catalog.

use questline::{BackendError, Endpoint, GameBackend, GameRequest};

use super::common::{http_backend, spawn_backend};

fn request(session_id: &str) -> GameRequest {
    GameRequest {
        session_id: session_id.to_string(),
        max_steps: 3,
        delay: 0,
        ..GameRequest::default()
    }
}

async fn drain(mut body: questline::ByteStream) -> String {
    use futures::StreamExt;
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend(chunk.unwrap());
    }
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn step_without_game_is_refused() {
    let (base, server) = spawn_backend().await;
    let backend = http_backend(&base);
    let err = match backend.open(Endpoint::Step, &request("nobody")).await {
        Err(e) => e,
        Ok(_) => panic!("expected 400"),
    };
    assert_eq!(
        err,
        BackendError::Rejected("No active game. Start a new game first.".into())
    );
    server.abort();
}

#[tokio::test]
async fn reset_drops_server_game() {
    let (base, server) = spawn_backend().await;
    let backend = http_backend(&base);
    let body = backend.open(Endpoint::Start, &request("s-1")).await.unwrap();
    let wire = drain(body).await;
    assert!(wire.starts_with("data: "));
    assert!(wire.contains(r#""type":"done""#));

    backend.reset("s-1").await.unwrap();
    assert!(matches!(
        backend.open(Endpoint::Step, &request("s-1")).await,
        Err(BackendError::Rejected(_))
    ));
    // Unknown ids are fine too.
    backend.reset("never-existed").await.unwrap();
    server.abort();
}

#[tokio::test]
async fn step_frames_carry_choice_and_completion() {
    let (base, server) = spawn_backend().await;
    let backend = http_backend(&base);
    drain(backend.open(Endpoint::Start, &request("s-2")).await.unwrap()).await;
    let mut req = request("s-2");
    req.max_steps = 1;
    let wire = drain(backend.open(Endpoint::Step, &req).await.unwrap()).await;
    assert!(wire.contains(r#""choice":"1""#));
    assert!(wire.contains(r#"{"type":"done","step":1,"complete":true}"#));
    server.abort();
}

#[tokio::test]
async fn provider_catalog_lookup() {
    let (base, server) = spawn_backend().await;
    let backend = http_backend(&base);
    let ollama = backend.provider("Ollama (Local)").await.unwrap();
    assert!(!ollama.requires_key);
    assert_eq!(ollama.default_model, "llama3.1");
    assert_eq!(ollama.provider, "ollama");

    let unknown = backend.provider("Something Else").await.unwrap();
    assert_eq!(unknown.provider, "custom");
    server.abort();
}
