//! Store implementations.

use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Result of one successful inference call, keyed by its fingerprint.
///
/// Created exactly once per distinct fingerprint and immutable thereafter;
/// later calls with the same fingerprint share this value by reference.
/// Serializes with the field names subscribers see on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResult {
    /// Structured JSON value returned by the inference service.
    pub result: serde_json::Value,
    /// Wall-clock seconds spent in the remote call.
    #[serde(rename = "elapsedTime")]
    pub elapsed_seconds: f64,
    /// Fingerprint this result was computed for.
    #[serde(rename = "receiptId")]
    pub fingerprint: Fingerprint,
}

/// Fingerprint-to-result mapping.
///
/// Implementations must be safe to share across concurrent calls. Operations
/// are infallible: a missing entry is `None`, never an error.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<CachedResult>>;
    async fn put(&self, fingerprint: Fingerprint, result: Arc<CachedResult>);
    async fn len(&self) -> usize;
    async fn clear(&self);
    fn name(&self) -> &'static str;
}

/// Counter snapshot for a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
        }
    }

    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
        }
    }
}

/// Unbounded in-memory store.
///
/// No TTL, no size bound, no eviction: entries survive until the process
/// exits. Concurrent writers to the same fingerprint are last-writer-wins;
/// there is no per-key locking beyond the map lock itself, so an entry is
/// always one complete result, never a partial write.
pub struct MemoryStore {
    entries: RwLock<HashMap<Fingerprint, Arc<CachedResult>>>,
    stats: AtomicStats,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: AtomicStats::new(),
        }
    }

    /// Snapshot of the hit/miss/insert counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<CachedResult>> {
        let found = self.entries.read().unwrap().get(fingerprint).cloned();
        match found {
            Some(entry) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn put(&self, fingerprint: Fingerprint, result: Arc<CachedResult>) {
        self.entries.write().unwrap().insert(fingerprint, result);
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
    }

    async fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    async fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
