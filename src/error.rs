use crate::fetch::FetchError;
use crate::gateway::GatewayError;
use thiserror::Error;

/// Unified error type for the crate.
///
/// Aggregates the per-stage errors into one caller-facing taxonomy. Every
/// variant is propagated to the caller unchanged after being logged; there
/// is no local recovery, retry, or fallback result anywhere in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Resolving the image reference into bytes failed (remote retrieval or
    /// inline base64 decoding).
    #[error("content fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The remote inference call failed (auth, quota, network, non-2xx).
    #[error("inference gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The inference response content was not valid JSON.
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or missing configuration detected at construction time.
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
        }
    }
}
