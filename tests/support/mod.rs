//! In-process stand-in for the agent backend.
//!
//! Serves `/ws`, `/process`, `/process-plan` and `/health` on an ephemeral
//! port and records everything it receives.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use scholar_relay::backend::BackendClient;
use scholar_relay::models::{ClientEvent, LinkState};
use scholar_relay::relay::{BackendLink, Hub, Relay};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;

pub const TIMEOUT: Duration = Duration::from_secs(5);
pub const STEP_DELAY: Duration = Duration::from_millis(5);

#[derive(Clone, Default)]
pub struct FakeBackend {
    /// Envelopes received over `/ws`.
    pub envelopes: Arc<Mutex<Vec<Value>>>,
    /// `(path, body)` of every HTTP process call.
    pub requests: Arc<Mutex<Vec<(String, Value)>>>,
    /// Socket connections accepted so far.
    pub connections: Arc<AtomicUsize>,
    drop_first_connection: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the first socket right after accepting it.
    pub fn dropping_first_connection() -> Self {
        Self {
            drop_first_connection: true,
            ..Self::default()
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(socket))
            .route("/process", post(process))
            .route("/process-plan", post(process_plan))
            .route("/health", get(health))
            .with_state(self.clone())
    }

    pub async fn spawn(&self) -> SocketAddr {
        serve(self.router()).await
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn socket(State(backend): State<FakeBackend>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| backend_session(backend, socket))
}

async fn backend_session(backend: FakeBackend, mut socket: WebSocket) {
    let previous = backend.connections.fetch_add(1, Ordering::SeqCst);
    if backend.drop_first_connection && previous == 0 {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else { continue };
        let envelope: Value = serde_json::from_str(text.as_str()).expect("relay sent bad JSON");
        backend.envelopes.lock().unwrap().push(envelope.clone());

        if envelope["type"] != "task" {
            continue;
        }
        let frames = [
            json!({"type": "progress", "data": {"percent": 10}}),
            json!({"type": "step", "data": {"type": "thought", "content": envelope["message"], "iteration": 1}}),
            json!({"type": "complete", "data": {"answer": "done", "total_steps": 1, "iterations": 1}}),
        ];
        for frame in frames {
            if socket
                .send(Message::Text(frame.to_string().into()))
                .await
                .is_err()
            {
                return;
            }
        }
    }
}

async fn process(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    backend
        .requests
        .lock()
        .unwrap()
        .push(("/process".to_string(), body.clone()));
    Json(json!({
        "task": body["message"],
        "steps": [
            {"type": "thought", "content": "searching", "iteration": 1},
            {"type": "final_answer", "content": "42", "iteration": 2}
        ],
        "answer": "42",
        "iterations": 2,
        "session_id": body["sessionId"]
    }))
}

async fn process_plan(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Json<Value> {
    backend
        .requests
        .lock()
        .unwrap()
        .push(("/process-plan".to_string(), body.clone()));
    Json(json!({
        "task": body["message"],
        "steps": [{"type": "plan", "content": "1. search"}],
        "answer": "planned",
        "plan": [{"step": 1, "action": "search"}],
        "iterations": 1,
        "session_id": body["sessionId"]
    }))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy", "service": "python-fastapi", "llm_configured": false}))
}

/// Backend whose process endpoint always fails.
pub fn failing_backend() -> Router {
    Router::new().route(
        "/process",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "agent crashed") }),
    )
}

pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn http_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

pub fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{}/ws", addr)
}

pub fn relay(hub: Hub, link: BackendLink, backend: SocketAddr) -> Relay {
    Relay::new(
        hub,
        link,
        BackendClient::new(http_url(backend), TIMEOUT),
        STEP_DELAY,
    )
}

pub async fn wait_for_state(link: &BackendLink, pred: impl Fn(&LinkState) -> bool) -> LinkState {
    let mut rx = link.subscribe();
    let state = tokio::time::timeout(TIMEOUT, rx.wait_for(|s| pred(s)))
        .await
        .expect("timed out waiting for link state")
        .expect("link state channel closed");
    *state
}

pub async fn next_event(rx: &mut UnboundedReceiver<ClientEvent>) -> ClientEvent {
    tokio::time::timeout(TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

pub async fn assert_quiet(rx: &mut UnboundedReceiver<ClientEvent>) {
    let extra = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(extra.is_err(), "unexpected event: {:?}", extra);
}
