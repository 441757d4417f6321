//! Processor configuration, read once at construction.

use keyring::Entry;
use std::env;
use std::time::Duration;

/// Model used when neither the builder nor the environment overrides it.
pub const DEFAULT_MODEL: &str = "gpt-4o-2024-08-06";

/// Default endpoint of the OpenAI-compatible inference service.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Resolved configuration for an [`ImageProcessor`](crate::ImageProcessor).
///
/// All values are fixed at construction time; nothing is re-read per call.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub http_timeout: Duration,
}

impl ProcessorConfig {
    /// Build a config from the environment.
    ///
    /// The credential is resolved keyring-first, then `OPENAI_API_KEY`. The
    /// model comes from `OPENAI_MODEL` when set. `LENSCACHE_HTTP_TIMEOUT_SECS`
    /// overrides the transport timeout.
    pub fn from_env() -> Self {
        let timeout_secs = env::var("LENSCACHE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            api_key: resolve_api_key(),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn resolve_api_key() -> Option<String> {
    // 1. Try keyring
    if let Ok(entry) = Entry::new("lenscache", "openai") {
        if let Ok(key) = entry.get_password() {
            return Some(key);
        }
    }

    // 2. Try environment variable
    env::var("OPENAI_API_KEY").ok()
}
