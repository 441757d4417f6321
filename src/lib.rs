//! # lenscache
//!
//! Content-addressed caching gateway for multimodal vision inference.
//!
//! `lenscache` wraps an OpenAI-compatible vision endpoint (image plus text
//! prompt in, structured JSON out) with a deterministic request fingerprint,
//! an in-memory result cache, and synchronous lifecycle events. Identical
//! (image, prompt) pairs hit the remote service exactly once per process.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lenscache::{ImageProcessor, InMemoryEventSink};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> lenscache::Result<()> {
//!     let sink = Arc::new(InMemoryEventSink::new());
//!     let processor = ImageProcessor::builder()
//!         .api_key("your-api-key")
//!         .event_sink(sink.clone())
//!         .build()?;
//!
//!     // First call fetches, infers, caches, and emits Receipt + CacheMiss.
//!     processor
//!         .process("http://example.com/x.png", "Describe this")
//!         .await?;
//!
//!     // Second identical call emits Receipt + CacheHit, no network traffic.
//!     processor
//!         .process("http://example.com/x.png", "Describe this")
//!         .await?;
//!
//!     for event in sink.events() {
//!         println!("{} {}", event.name(), event.fingerprint());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`processor`] | Coordinator tying fetch, inference, cache, and events together |
//! | [`fingerprint`] | Deterministic SHA-256 request fingerprints |
//! | [`cache`] | Fingerprint-to-result store implementations |
//! | [`fetch`] | Image reference resolution (remote URL or inline base64) |
//! | [`media`] | Media type detection from magic bytes |
//! | [`gateway`] | Remote inference call and latency measurement |
//! | [`events`] | Lifecycle event types and sinks |
//! | [`config`] | Credential, model, and endpoint configuration |

pub mod cache;
pub mod config;
pub mod events;
pub mod fetch;
pub mod fingerprint;
pub mod gateway;
pub mod media;
pub mod processor;

// Re-export main types for convenience
pub use cache::{CacheStats, CachedResult, MemoryStore, ResultStore};
pub use config::ProcessorConfig;
pub use events::{
    noop_sink, CompositeEventSink, EventSink, InMemoryEventSink, NoopEventSink, ProcessingEvent,
};
pub use fetch::{ContentFetcher, FetchError};
pub use fingerprint::Fingerprint;
pub use gateway::{GatewayError, InferenceGateway};
pub use processor::{ImageProcessor, ImageProcessorBuilder};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::Error;
