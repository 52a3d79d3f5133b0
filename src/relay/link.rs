//! The relay's single outbound WebSocket to the backend.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::{Hub, ReconnectPolicy};
use crate::models::{BackendEnvelope, ClientEvent, LinkState};

type BackendStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Backend link is not connected")]
    NotConnected,

    #[error("Failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Handle to the backend connection.
///
/// A single supervisor task owns the socket and its retry schedule; handles
/// only observe state and queue outbound frames while a writer is installed.
#[derive(Clone, Debug)]
pub struct BackendLink {
    inner: Arc<LinkInner>,
}

#[derive(Debug)]
struct LinkInner {
    url: String,
    state: watch::Sender<LinkState>,
    /// Present only while a socket is open.
    writer: Mutex<Option<mpsc::UnboundedSender<String>>>,
    attempts: AtomicU32,
}

impl BackendLink {
    /// Start connecting to `url` in the background.
    ///
    /// State changes are broadcast to `hub` as `connection-status` events.
    pub fn spawn(url: impl Into<String>, policy: ReconnectPolicy, hub: Hub) -> Self {
        let link = Self::with_state(url.into(), LinkState::Connecting);
        let supervisor = link.clone();
        tokio::spawn(async move { supervisor.supervise(policy, hub).await });
        link
    }

    /// A link that never connects; every task goes through the HTTP fallback.
    pub fn offline(url: impl Into<String>) -> Self {
        Self::with_state(url.into(), LinkState::Disconnected)
    }

    fn with_state(url: String, state: LinkState) -> Self {
        let (state, _) = watch::channel(state);
        Self {
            inner: Arc::new(LinkInner {
                url,
                state,
                writer: Mutex::new(None),
                attempts: AtomicU32::new(0),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> LinkState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.inner.state.subscribe()
    }

    /// Reconnect attempts made since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// True only while a socket is open and its writer is alive.
    pub fn is_connected(&self) -> bool {
        let writer_alive = self
            .inner
            .writer
            .lock()
            .expect("link writer lock poisoned")
            .as_ref()
            .is_some_and(|tx| !tx.is_closed());
        writer_alive && self.state().is_connected()
    }

    /// Queue an envelope on the open socket.
    pub fn send(&self, envelope: &BackendEnvelope) -> Result<(), LinkError> {
        let payload = serde_json::to_string(envelope)?;
        let writer = self.inner.writer.lock().expect("link writer lock poisoned");
        match writer.as_ref() {
            Some(tx) => tx.send(payload).map_err(|_| LinkError::NotConnected),
            None => Err(LinkError::NotConnected),
        }
    }

    fn set_state(&self, state: LinkState, hub: &Hub) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            hub.broadcast(ClientEvent::status(state));
        }
    }

    async fn supervise(self, mut policy: ReconnectPolicy, hub: Hub) {
        loop {
            match connect_async(self.inner.url.as_str()).await {
                Ok((stream, _)) => {
                    policy.reset();
                    self.inner.attempts.store(0, Ordering::SeqCst);
                    tracing::info!(url = %self.inner.url, "Connected to backend");
                    self.run_session(stream, &hub).await;
                    tracing::warn!(url = %self.inner.url, "Backend connection closed");
                }
                Err(e) => {
                    tracing::warn!(url = %self.inner.url, "Backend connection failed: {}", e);
                }
            }

            match policy.next_delay() {
                Some(delay) => {
                    self.inner.attempts.store(policy.attempts(), Ordering::SeqCst);
                    self.set_state(
                        LinkState::Reconnecting {
                            attempt: policy.attempts(),
                            max_attempts: policy.max_attempts(),
                        },
                        &hub,
                    );
                    tracing::info!(
                        "Reconnecting to backend in {:?} (attempt {}/{})",
                        delay,
                        policy.attempts(),
                        policy.max_attempts()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    self.set_state(LinkState::Disconnected, &hub);
                    tracing::error!(
                        "Gave up on backend after {} reconnect attempts; restart to retry",
                        policy.max_attempts()
                    );
                    return;
                }
            }
        }
    }

    async fn run_session(&self, stream: BackendStream, hub: &Hub) {
        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        *self.inner.writer.lock().expect("link writer lock poisoned") = Some(tx);
        self.set_state(LinkState::Connected, hub);

        loop {
            tokio::select! {
                outbound = rx.recv() => {
                    let Some(payload) = outbound else { break };
                    if let Err(e) = sink.send(Message::text(payload)).await {
                        tracing::warn!("Failed to write to backend: {}", e);
                        break;
                    }
                }
                inbound = source.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        hub.dispatch_backend_frame(text.as_str());
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!(?frame, "Backend sent close");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("Backend socket error: {}", e);
                        break;
                    }
                    None => break,
                },
            }
        }

        self.inner
            .writer
            .lock()
            .expect("link writer lock poisoned")
            .take();
    }
}
