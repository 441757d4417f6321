//! 结果缓存模块：按指纹缓存推理结果，避免对同一请求重复调用远端服务。
//!
//! # Result Caching Module
//!
//! Maps request fingerprints to previously computed inference results so that
//! repeated (image, prompt) pairs never hit the remote service twice.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CachedResult`] | Immutable result payload stored per fingerprint |
//! | [`ResultStore`] | Trait for pluggable store implementations |
//! | [`MemoryStore`] | Unbounded in-memory store with hit/miss statistics |
//! | [`CacheStats`] | Counter snapshot exposed by [`MemoryStore`] |
//!
//! ## Limitations
//!
//! The in-memory store is deliberately unbounded: entries are never evicted
//! and live until process termination. There is also no single-flight
//! deduplication; concurrent calls that share a fingerprint all miss
//! independently and the last writer wins. Both behaviors are documented
//! contract, not accidents.

mod store;

pub use store::{CacheStats, CachedResult, MemoryStore, ResultStore};
