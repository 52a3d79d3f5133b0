use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};

use crate::models::{ClientEvent, SocketCommand};
use crate::relay::Relay;

// ============================================================
// Health
// ============================================================

/// Gateway health. `pythonConnected` is the live state of the backend link.
pub async fn health(State(relay): State<Relay>) -> impl IntoResponse {
    let link = relay.link();
    Json(json!({
        "status": "ok",
        "service": "relay",
        "pythonConnected": link.is_connected(),
        "state": link.state().as_str(),
        "reconnectAttempts": link.attempts(),
        "clients": relay.hub().session_count(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Relay the backend's own `/health`.
pub async fn backend_status(
    State(relay): State<Relay>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let connected = relay.link().is_connected();
    match relay.client().health().await {
        Ok(python) => Ok(Json(json!({
            "gateway": "ok",
            "pythonConnected": connected,
            "python": python,
        }))),
        Err(e) => {
            tracing::warn!("Backend health check failed: {}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "gateway": "ok",
                    "pythonConnected": connected,
                    "python": null,
                    "error": "Backend service is unreachable",
                })),
            ))
        }
    }
}

// ============================================================
// Browser sessions
// ============================================================

pub async fn socket(State(relay): State<Relay>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| serve_session(relay, socket))
}

async fn serve_session(relay: Relay, socket: WebSocket) {
    let (id, mut events) = relay.hub().register();
    let (mut sink, mut stream) = socket.split();

    relay
        .hub()
        .emit_to(id, ClientEvent::status(relay.link().state()));

    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!("Failed to encode {} event: {}", event.name(), e);
                    continue;
                }
            };
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(session = %id, "Session socket error: {}", e);
                break;
            }
        };

        match serde_json::from_str::<SocketCommand>(text.as_str()) {
            Ok(SocketCommand::UserMessage(input)) => {
                let relay = relay.clone();
                tokio::spawn(async move { relay.handle_user_message(id, input).await });
            }
            Err(e) => {
                tracing::warn!(session = %id, "Ignoring unparseable session frame: {}", e);
            }
        }
    }

    relay.hub().unregister(id);
    writer.abort();
}
