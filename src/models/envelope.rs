use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A task submitted to the backend over the link.
///
/// The backend only acts on envelopes whose `type` is `"task"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl BackendEnvelope {
    pub fn task(session_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            kind: "task".to_string(),
            message: message.into(),
            session_id,
            timestamp: Utc::now(),
        }
    }
}

/// A frame received from the backend.
///
/// Only `step` and `complete` are recognized. Everything else lands in
/// `Unrecognized` and is dropped by the hub.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendFrame {
    Step(Value),
    Complete(Value),
    Unrecognized(Option<String>),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: Value,
}

impl BackendFrame {
    /// Parse a text frame. Fails only on malformed JSON or a non-object payload.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawFrame = serde_json::from_str(text)?;
        Ok(match raw.kind.as_deref() {
            Some("step") => Self::Step(raw.data),
            Some("complete") => Self::Complete(raw.data),
            _ => Self::Unrecognized(raw.kind),
        })
    }
}
