//! Image reference resolution.
//!
//! An image reference is either a remote URL or an inline base64 payload.
//! References starting with `http` are retrieved over the network; anything
//! else is decoded directly. Failures propagate to the caller unchanged, no
//! local retries.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} retrieving {url}")]
    Status { status: u16, url: String },

    #[error("base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Resolves image references into raw byte buffers.
pub struct ContentFetcher {
    client: reqwest::Client,
}

impl ContentFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Resolve `image_ref` into bytes.
    ///
    /// A reference with an `http` scheme prefix is fetched remotely expecting
    /// a binary body; any other reference is treated as inline base64 data.
    pub async fn fetch(&self, image_ref: &str) -> Result<Bytes, FetchError> {
        if image_ref.starts_with("http") {
            let response = self.client.get(image_ref).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: image_ref.to_string(),
                });
            }
            Ok(response.bytes().await?)
        } else {
            Ok(Bytes::from(BASE64.decode(image_ref)?))
        }
    }
}
