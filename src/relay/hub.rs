//! Registry of connected browser sessions.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::{BackendFrame, ClientEvent};

pub type SessionId = Uuid;

/// Fan-out point for events headed to browser sessions.
///
/// Each session owns the receiving half of an unbounded channel; the hub keeps
/// the senders. A session whose receiver is gone is pruned on the next
/// broadcast or direct emit.
#[derive(Clone, Debug, Default)]
pub struct Hub {
    sessions: Arc<Mutex<HashMap<SessionId, mpsc::UnboundedSender<ClientEvent>>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> (SessionId, mpsc::UnboundedReceiver<ClientEvent>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .insert(id, tx);
        tracing::debug!(session = %id, "Session registered");
        (id, rx)
    }

    pub fn unregister(&self, id: SessionId) {
        let removed = self
            .sessions
            .lock()
            .expect("session registry lock poisoned")
            .remove(&id);
        if removed.is_some() {
            tracing::debug!(session = %id, "Session unregistered");
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry lock poisoned")
            .len()
    }

    /// Send `event` to every session. Returns how many received it.
    pub fn broadcast(&self, event: ClientEvent) -> usize {
        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, tx| tx.send(event.clone()).is_ok());
        let delivered = sessions.len();
        if delivered < before {
            tracing::debug!("Pruned {} closed sessions", before - delivered);
        }
        tracing::trace!(event = event.name(), delivered, "Broadcast");
        delivered
    }

    /// Send `event` to one session. Returns false if it is gone.
    pub fn emit_to(&self, id: SessionId, event: ClientEvent) -> bool {
        let mut sessions = self.sessions.lock().expect("session registry lock poisoned");
        let delivered = match sessions.get(&id) {
            Some(tx) => tx.send(event).is_ok(),
            None => return false,
        };
        if !delivered {
            sessions.remove(&id);
        }
        delivered
    }

    /// Broadcast the event matching a backend text frame.
    ///
    /// Returns the number of sessions reached, or `None` when the frame was
    /// malformed or of an unrecognized type.
    pub fn dispatch_backend_frame(&self, text: &str) -> Option<usize> {
        let frame = match BackendFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Dropping malformed backend frame: {}", e);
                return None;
            }
        };

        let event = match frame {
            BackendFrame::Step(data) => ClientEvent::AgentStep(data),
            BackendFrame::Complete(data) => ClientEvent::AgentComplete(data),
            BackendFrame::Unrecognized(kind) => {
                tracing::debug!(kind = ?kind, "Ignoring unrecognized backend frame");
                return None;
            }
        };

        Some(self.broadcast(event))
    }
}
