//! HTTP client for the agent backend.
//!
//! Used for the status relay (`/health`) and as the fallback path when the
//! link is down (`/process`, `/process-plan`).

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::models::{ProcessRequest, ProcessResponse};

/// Default URL for a locally running backend.
pub const DEFAULT_URL: &str = "http://localhost:8000";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// HTTP client for the agent backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url).timeout(self.timeout)
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            match status {
                StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    Err(ClientError::BadRequest(body))
                }
                _ => Err(ClientError::Server(format!("{}: {}", status, body))),
            }
        }
    }

    /// Backend health document, returned as-is.
    pub async fn health(&self) -> Result<Value, ClientError> {
        let response = self.request(reqwest::Method::GET, "/health").send().await?;
        self.handle_response(response).await
    }

    /// Run the ReAct agent synchronously.
    pub async fn process(&self, input: &ProcessRequest) -> Result<ProcessResponse, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/process")
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Run the planning agent synchronously.
    pub async fn process_plan(
        &self,
        input: &ProcessRequest,
    ) -> Result<ProcessResponse, ClientError> {
        let response = self
            .request(reqwest::Method::POST, "/process-plan")
            .json(input)
            .send()
            .await?;
        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = BackendClient::new("http://localhost:8000/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
