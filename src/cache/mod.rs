//! Caching layer
//!
//! [`LruCache`] backs the "recently viewed entity" cache and any other
//! bounded memoization a caller opts into. Reads through the store itself
//! stay strongly consistent; only values placed in this cache are subject to
//! eviction and TTL expiry.

pub mod lru;

pub use lru::{CacheStats, LruCache};
