//! Storage abstractions for the radar workspace.
//!
//! Currently a single in-memory TTL cache shared by the map/radar engine.
//! Nothing is persisted; entries live for the lifetime of the process.

pub mod ttl_cache;

pub use ttl_cache::{CacheEntry, TtlCache, TtlCacheStats};
