//! Relay configuration.
//!
//! Layered as: defaults, then an optional JSON file, then environment
//! variables. The CLI applies its flags on top.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::backend::DEFAULT_URL;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the backend's HTTP API.
    pub backend_url: String,
    /// Backend socket URL. Derived from `backend_url` when unset.
    pub backend_ws_url: Option<String>,
    pub reconnect_interval_ms: u64,
    pub max_reconnect_attempts: u32,
    /// Pause between replayed steps on the HTTP fallback path.
    pub step_delay_ms: u64,
    pub request_timeout_ms: u64,
    /// Allowed CORS origins. `None` means permissive.
    pub cors_origins: Option<Vec<String>>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            backend_url: DEFAULT_URL.to_string(),
            backend_ws_url: None,
            reconnect_interval_ms: 3_000,
            max_reconnect_attempts: 10,
            step_delay_ms: 500,
            request_timeout_ms: 120_000,
            cors_origins: None,
        }
    }
}

impl RelayConfig {
    /// Load from `path` (if given) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("RELAY_HOST") {
            self.host = host;
        }
        if let Some(port) = var("RELAY_PORT") {
            self.port = port.parse().context("RELAY_PORT must be a port number")?;
        }
        if let Some(url) = var("PYTHON_SERVICE_URL") {
            self.backend_url = url;
        }
        if let Some(url) = var("PYTHON_WS_URL") {
            self.backend_ws_url = Some(url);
        }
        if let Some(ms) = var("RELAY_RECONNECT_INTERVAL_MS") {
            self.reconnect_interval_ms = ms
                .parse()
                .context("RELAY_RECONNECT_INTERVAL_MS must be an integer")?;
        }
        if let Some(n) = var("RELAY_MAX_RECONNECT_ATTEMPTS") {
            self.max_reconnect_attempts = n
                .parse()
                .context("RELAY_MAX_RECONNECT_ATTEMPTS must be an integer")?;
        }
        if let Some(ms) = var("RELAY_STEP_DELAY_MS") {
            self.step_delay_ms = ms.parse().context("RELAY_STEP_DELAY_MS must be an integer")?;
        }
        if let Some(ms) = var("RELAY_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = ms
                .parse()
                .context("RELAY_REQUEST_TIMEOUT_MS must be an integer")?;
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            self.cors_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        Ok(())
    }

    /// Socket URL of the backend, e.g. `ws://localhost:8000/ws`.
    pub fn backend_ws_url(&self) -> String {
        if let Some(url) = &self.backend_ws_url {
            return url.clone();
        }
        let base = self.backend_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/ws", base)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
