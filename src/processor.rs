//! Processing coordinator.

use crate::cache::{CachedResult, MemoryStore, ResultStore};
use crate::config::ProcessorConfig;
use crate::events::{noop_sink, EventSink, ProcessingEvent};
use crate::fetch::ContentFetcher;
use crate::fingerprint::Fingerprint;
use crate::gateway::InferenceGateway;
use crate::{media, Error, Result};
use std::sync::Arc;
use tracing::{debug, error};

/// Request-deduplicating gateway around a vision inference service.
///
/// One instance owns its cache, event sink, and remote configuration; there
/// is no ambient global state. Lifecycle per call is strictly linear:
/// `Receipt`, then either a `CacheHit` return, a `CacheMiss` after a fresh
/// inference was stored, or a propagated error with no cache mutation.
///
/// Many calls may run concurrently on one instance. Calls with distinct
/// fingerprints touch disjoint cache slots; concurrent calls sharing a
/// never-seen fingerprint all miss, all invoke the remote service, and the
/// last writer wins. There is no single-flight deduplication of in-flight
/// computations.
pub struct ImageProcessor {
    fetcher: ContentFetcher,
    gateway: InferenceGateway,
    store: Arc<dyn ResultStore>,
    sink: Arc<dyn EventSink>,
}

impl ImageProcessor {
    /// Processor with environment-derived configuration and defaults.
    pub fn new() -> Result<Self> {
        ImageProcessorBuilder::new().build()
    }

    pub fn builder() -> ImageProcessorBuilder {
        ImageProcessorBuilder::new()
    }

    /// Process one (image reference, prompt) request.
    ///
    /// The result is delivered through the event sink, not the return value:
    /// subscribers receive `Receipt` unconditionally, then `CacheHit` with
    /// the stored result (zero network traffic) or `CacheMiss` with the
    /// freshly computed one. Failures are logged and propagated unchanged;
    /// nothing is cached on failure.
    pub async fn process(&self, image_ref: &str, prompt: &str) -> Result<()> {
        let fingerprint = Fingerprint::derive(image_ref, prompt);
        self.sink
            .emit(ProcessingEvent::Receipt {
                fingerprint: fingerprint.clone(),
            })
            .await;

        if let Some(cached) = self.store.get(&fingerprint).await {
            debug!(%fingerprint, "cache hit, skipping inference");
            self.sink
                .emit(ProcessingEvent::CacheHit {
                    fingerprint,
                    result: cached,
                })
                .await;
            return Ok(());
        }

        match self.compute(image_ref, prompt, &fingerprint).await {
            Ok(cached) => {
                self.store.put(fingerprint.clone(), cached.clone()).await;
                self.sink
                    .emit(ProcessingEvent::CacheMiss {
                        fingerprint,
                        result: cached,
                    })
                    .await;
                Ok(())
            }
            Err(err) => {
                error!(
                    model = %self.gateway.model(),
                    %fingerprint,
                    error = %err,
                    "error processing image"
                );
                Err(err)
            }
        }
    }

    async fn compute(
        &self,
        image_ref: &str,
        prompt: &str,
        fingerprint: &Fingerprint,
    ) -> Result<Arc<CachedResult>> {
        let bytes = self.fetcher.fetch(image_ref).await?;
        let mime_type = media::resolve(&bytes);
        let (result, elapsed) = self.gateway.infer(mime_type, &bytes, prompt).await?;
        Ok(Arc::new(CachedResult {
            result,
            elapsed_seconds: elapsed,
            fingerprint: fingerprint.clone(),
        }))
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    pub fn model(&self) -> &str {
        self.gateway.model()
    }
}

/// Builder for [`ImageProcessor`].
///
/// Unset knobs fall back to [`ProcessorConfig::from_env`].
pub struct ImageProcessorBuilder {
    api_key: Option<String>,
    model: Option<String>,
    base_url_override: Option<String>,
    http_timeout: Option<std::time::Duration>,
    store: Option<Arc<dyn ResultStore>>,
    sink: Option<Arc<dyn EventSink>>,
}

impl ImageProcessorBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url_override: None,
            http_timeout: None,
            store: None,
            sink: None,
        }
    }

    /// Set the API credential explicitly, bypassing keyring/env resolution.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the inference model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the service base URL. Primarily for testing with mock
    /// servers; production uses the default endpoint.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn http_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Inject a result store. Default is an unbounded [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Inject an event sink. Default is a no-op sink.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<ImageProcessor> {
        let Self {
            api_key,
            model,
            base_url_override,
            http_timeout,
            store,
            sink,
        } = self;

        let mut config = ProcessorConfig::from_env();
        if api_key.is_some() {
            config.api_key = api_key;
        }
        if let Some(model) = model {
            config.model = model;
        }
        if let Some(base_url) = base_url_override {
            config.base_url = base_url;
        }
        if let Some(timeout) = http_timeout {
            config.http_timeout = timeout;
        }

        // One shared HTTP client for both retrieval and inference.
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(ImageProcessor {
            fetcher: ContentFetcher::new(client.clone()),
            gateway: InferenceGateway::new(client, config.base_url, config.model, config.api_key),
            store: store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            sink: sink.unwrap_or_else(noop_sink),
        })
    }
}

impl Default for ImageProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_take_precedence() {
        let processor = ImageProcessor::builder()
            .api_key("sk-test")
            .model("gpt-4o-mini")
            .base_url_override("http://localhost:9999")
            .build()
            .unwrap();
        assert_eq!(processor.model(), "gpt-4o-mini");
    }

    #[test]
    fn default_store_starts_empty() {
        let processor = ImageProcessor::builder()
            .api_key("sk-test")
            .build()
            .unwrap();
        let store = processor.store().clone();
        tokio_test::block_on(async move {
            assert_eq!(store.len().await, 0);
        });
    }
}
