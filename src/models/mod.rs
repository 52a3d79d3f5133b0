//! Wire types for the relay.
//!
//! # Directions
//!
//! - [`BackendEnvelope`]: relay to backend over the link.
//! - [`BackendFrame`]: backend to relay over the link.
//! - [`ClientEvent`]: relay to browser sessions, `{event, data}` framed.
//! - [`SocketCommand`]: browser sessions to relay, same framing.
//! - [`ProcessRequest`] / [`ProcessResponse`]: the HTTP fallback.

mod envelope;
mod event;
mod process;

pub use envelope::*;
pub use event::*;
pub use process::*;
