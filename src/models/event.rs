use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State of the relay's outbound connection to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkState {
    /// First connection attempt in flight.
    Connecting,
    Connected,
    /// Waiting to retry after a close or a failed attempt.
    Reconnecting {
        attempt: u32,
        #[serde(rename = "maxAttempts")]
        max_attempts: u32,
    },
    /// Retries exhausted (or never started). Requires a restart to recover.
    Disconnected,
}

impl LinkState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting { .. } => "reconnecting",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Payload of a `connection-status` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(flatten)]
    pub link: LinkState,
}

impl From<LinkState> for ConnectionStatus {
    fn from(link: LinkState) -> Self {
        Self {
            connected: link.is_connected(),
            link,
        }
    }
}

/// An event pushed to browser sessions, framed as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// One reasoning step, forwarded verbatim.
    AgentStep(Value),
    /// Final answer, forwarded verbatim.
    AgentComplete(Value),
    AgentError { message: String },
    ConnectionStatus(ConnectionStatus),
}

impl ClientEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::AgentError {
            message: message.into(),
        }
    }

    pub fn status(link: LinkState) -> Self {
        Self::ConnectionStatus(link.into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AgentStep(_) => "agent-step",
            Self::AgentComplete(_) => "agent-complete",
            Self::AgentError { .. } => "agent-error",
            Self::ConnectionStatus(_) => "connection-status",
        }
    }

    /// `agent-complete` and `agent-error` end a user message's exchange.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AgentComplete(_) | Self::AgentError { .. })
    }
}

/// Which backend agent should handle a user message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    /// Single ReAct loop; served over the link when it is up.
    #[default]
    React,
    /// Planning agent; only reachable over HTTP.
    Plan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessage {
    pub message: String,
    #[serde(default)]
    pub mode: AgentMode,
}

/// A frame sent by a browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum SocketCommand {
    UserMessage(UserMessage),
}
