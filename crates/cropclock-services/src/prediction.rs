//! HTTP client for the prediction backend.
//!
//! Every endpoint takes a JSON POST and answers with either the workflow's
//! success payload or `{ "error": "..." }`. Requests are sent once; there
//! is no retry.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

use crate::workflow::Workflow;

/// Prediction backend errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Message taken verbatim from the backend's `error` field
    #[error("{0}")]
    Backend(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send one request for workflow `W` and decode its reply.
    #[instrument(skip(self), fields(workflow = W::NAME), level = "info")]
    pub async fn submit<W: Workflow>(
        &self,
        request: &W::Request,
    ) -> Result<W::Response, ClientError> {
        let url = format!("{}{}", self.base_url, W::PATH);

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let reply = parse_reply::<W>(status.is_success(), status.as_u16(), &text);
        match &reply {
            Ok(_) => tracing::info!("{} prediction succeeded", W::NAME),
            Err(e) => tracing::warn!("{} prediction failed: {}", W::NAME, e),
        }
        reply
    }
}

/// A backend `error` field wins over the HTTP status, so model errors
/// reported with 4xx/5xx still reach the user verbatim.
fn parse_reply<W: Workflow>(
    success: bool,
    status: u16,
    text: &str,
) -> Result<W::Response, ClientError> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) if success => {
            return Err(ClientError::InvalidResponse(format!("JSON parse error: {}", e)))
        }
        Err(_) => {
            return Err(ClientError::Status {
                status,
                body: text.to_string(),
            })
        }
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(ClientError::Backend(message));
    }

    if !success {
        return Err(ClientError::Status {
            status,
            body: text.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}
