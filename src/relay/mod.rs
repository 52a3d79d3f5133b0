//! Message relay between browser sessions and the agent backend.
//!
//! # Paths
//!
//! - **Link**: while [`BackendLink`] is connected, ReAct tasks go out as
//!   [`BackendEnvelope`]s and the backend's `step`/`complete` frames are
//!   broadcast to every session through the [`Hub`].
//! - **Fallback**: when the link is down (or the task needs the planning
//!   agent) the relay calls the backend over HTTP and replays the returned
//!   steps to the originating session only, then ends with `agent-complete`.
//!   An HTTP failure ends with `agent-error` instead.

mod hub;
mod link;
mod policy;

use std::time::Duration;

pub use hub::{Hub, SessionId};
pub use link::{BackendLink, LinkError};
pub use policy::ReconnectPolicy;

use crate::backend::BackendClient;
use crate::config::RelayConfig;
use crate::models::*;

/// User-facing text for a failed fallback request.
pub const FALLBACK_ERROR_MESSAGE: &str =
    "The assistant backend is unavailable right now. Please try again shortly.";

#[derive(Clone, Debug)]
pub struct Relay {
    hub: Hub,
    link: BackendLink,
    client: BackendClient,
    step_delay: Duration,
}

impl Relay {
    pub fn new(hub: Hub, link: BackendLink, client: BackendClient, step_delay: Duration) -> Self {
        Self {
            hub,
            link,
            client,
            step_delay,
        }
    }

    /// Build the relay and start the backend link. Needs a tokio runtime.
    pub fn start(config: &RelayConfig) -> Self {
        let hub = Hub::new();
        let policy = ReconnectPolicy::new(config.reconnect_interval(), config.max_reconnect_attempts);
        let link = BackendLink::spawn(config.backend_ws_url(), policy, hub.clone());
        let client = BackendClient::new(&config.backend_url, config.request_timeout());
        Self::new(hub, link, client, config.step_delay())
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn link(&self) -> &BackendLink {
        &self.link
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    /// Handle a `user-message` from `session`.
    pub async fn handle_user_message(&self, session: SessionId, input: UserMessage) {
        tracing::info!(session = %session, mode = ?input.mode, "User message received");

        if input.mode == AgentMode::React && self.link.is_connected() {
            match self
                .link
                .send(&BackendEnvelope::task(session, input.message.as_str()))
            {
                Ok(()) => return,
                Err(e) => tracing::warn!("Link send failed, using HTTP fallback: {}", e),
            }
        }

        self.replay_over_http(session, input).await;
    }

    async fn replay_over_http(&self, session: SessionId, input: UserMessage) {
        let request = ProcessRequest {
            message: input.message,
            session_id: Some(session),
        };

        let result = match input.mode {
            AgentMode::React => self.client.process(&request).await,
            AgentMode::Plan => self.client.process_plan(&request).await,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(session = %session, "HTTP fallback failed: {}", e);
                self.hub
                    .emit_to(session, ClientEvent::error(FALLBACK_ERROR_MESSAGE));
                return;
            }
        };

        tracing::debug!(
            session = %session,
            steps = response.steps.len(),
            "Replaying fallback steps"
        );

        for (i, step) in response.steps.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.step_delay).await;
            }
            if !self.hub.emit_to(session, ClientEvent::AgentStep(step.clone())) {
                tracing::debug!(session = %session, "Session left during replay");
                return;
            }
        }

        if !response.steps.is_empty() {
            tokio::time::sleep(self.step_delay).await;
        }
        self.hub
            .emit_to(session, ClientEvent::AgentComplete(response.completion()));
    }
}
