mod client;

pub use client::{BackendClient, ClientError, DEFAULT_URL};
