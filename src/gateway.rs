//! Remote inference gateway.
//!
//! Sends one chat-completions request per call: the prompt as text plus the
//! image embedded as a base64 data URI, with a JSON-object response format.
//! The call is bracketed with a monotonic clock so subscribers can observe
//! remote latency. No retries; every failure surfaces to the caller.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use std::time::Instant;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("response carried no message content")]
    MissingContent,
}

/// Client for the OpenAI-compatible inference endpoint.
pub struct InferenceGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl InferenceGateway {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run inference over `bytes` with `prompt`.
    ///
    /// Returns the parsed JSON result and the elapsed wall-clock seconds of
    /// the remote call. The first choice's message content must itself be a
    /// JSON document; anything else is a parse error.
    pub async fn infer(
        &self,
        mime_type: &str,
        bytes: &[u8],
        prompt: &str,
    ) -> Result<(serde_json::Value, f64)> {
        let data_uri = format!("data:{};base64,{}", mime_type, BASE64.encode(bytes));
        let body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": data_uri } },
                ],
            }],
        });

        info!(mime_type, model = %self.model, "processing image");

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(GatewayError::Http)?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }
        let envelope: serde_json::Value =
            response.json().await.map_err(GatewayError::Http)?;
        let elapsed = started.elapsed().as_secs_f64();

        let content = envelope
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or(GatewayError::MissingContent)?;
        let result: serde_json::Value = serde_json::from_str(content).map_err(Error::Parse)?;

        info!(
            model = %self.model,
            elapsed_seconds = elapsed,
            "inference output received"
        );
        Ok((result, elapsed))
    }
}
