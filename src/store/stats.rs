//! Short-TTL memoization guard for aggregate statistics
//!
//! Aggregate metrics walk every index bucket, which is too expensive to do on
//! every read. [`StatsGuard`] memoizes the computed value for a short TTL so
//! callers get an approximately fresh snapshot; writes invalidate it so the
//! staleness window never exceeds the TTL.

use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// Cached aggregate value with a freshness deadline
struct Cached<T> {
    value: T,
    computed_at: Instant,
}

/// Time-bounded memoization of a single computed value
///
/// `get_or_refresh` serves the cached value while it is younger than the TTL
/// and recomputes otherwise. Point reads elsewhere stay strongly consistent;
/// only the value behind this guard may be up to one TTL stale.
pub struct StatsGuard<T> {
    slot: RwLock<Option<Cached<T>>>,
    ttl: Duration,
}

impl<T: Clone> StatsGuard<T> {
    /// Create a guard with the given freshness TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
        }
    }

    /// Return the cached value if fresh, otherwise recompute it
    pub fn get_or_refresh<F>(&self, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        // Fast path: fresh value under the read lock
        {
            let slot = self.slot.read();
            if let Some(cached) = slot.as_ref() {
                if cached.computed_at.elapsed() < self.ttl {
                    return cached.value.clone();
                }
            }
        }

        // Slow path: recompute under the write lock
        let mut slot = self.slot.write();

        // Double-check after acquiring the write lock
        if let Some(cached) = slot.as_ref() {
            if cached.computed_at.elapsed() < self.ttl {
                return cached.value.clone();
            }
        }

        let value = compute();
        *slot = Some(Cached {
            value: value.clone(),
            computed_at: Instant::now(),
        });
        value
    }

    /// Drop the cached value so the next read recomputes
    pub fn invalidate(&self) {
        *self.slot.write() = None;
    }

    /// The freshness TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl<T> std::fmt::Debug for StatsGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsGuard").field("ttl", &self.ttl).finish()
    }
}
