//! 通知事件：处理生命周期的同步事件通道，供外部订阅者做指标或审计。
//!
//! Lifecycle notification events.
//!
//! Results are delivered to subscribers through events rather than return
//! values: every call emits `Receipt` first, then exactly one of `CacheHit`
//! or `CacheMiss` on success. Failure paths emit only `Receipt`; the error
//! itself propagates to the caller. Events are delivered synchronously on
//! the calling flow, in emission order, and delivery is best-effort: a
//! misbehaving sink never affects processing correctness.

use crate::cache::CachedResult;
use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Event emitted during one `process` call.
#[derive(Debug, Clone)]
pub enum ProcessingEvent {
    /// Request acknowledged; always the first event of a call.
    Receipt { fingerprint: Fingerprint },
    /// A stored result was found; no remote call was made.
    CacheHit {
        fingerprint: Fingerprint,
        result: Arc<CachedResult>,
    },
    /// No stored result; carries the freshly computed one.
    CacheMiss {
        fingerprint: Fingerprint,
        result: Arc<CachedResult>,
    },
}

impl ProcessingEvent {
    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            Self::Receipt { fingerprint }
            | Self::CacheHit { fingerprint, .. }
            | Self::CacheMiss { fingerprint, .. } => fingerprint,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Receipt { .. } => "receipt",
            Self::CacheHit { .. } => "cacheHit",
            Self::CacheMiss { .. } => "cacheMiss",
        }
    }
}

/// Destination for processing events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: ProcessingEvent);
}

/// Default sink that drops every event.
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn emit(&self, _event: ProcessingEvent) {}
}

/// Returns a shared no-op sink.
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoopEventSink)
}

/// In-memory sink for testing and auditing.
pub struct InMemoryEventSink {
    events: RwLock<Vec<ProcessingEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    /// Events recorded so far, in delivery order.
    pub fn events(&self) -> Vec<ProcessingEvent> {
        self.events.read().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn emit(&self, event: ProcessingEvent) {
        self.events.write().unwrap().push(event);
    }
}

/// Fan-out sink for multiple subscribers.
///
/// Subscribers receive each event in registration order, still synchronously
/// on the emitting flow.
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: ProcessingEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}
