use std::time::{Duration, Instant};

/// A cached value with its creation instant and time-to-live.
///
/// An entry is fresh while `now <= created_at + ttl`. Strict reads treat
/// an expired entry as a miss; stale-tolerant reads return it anyway.
/// Entries are never mutated in place; a refresh installs a new entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self::with_created_at(value, ttl, Instant::now())
    }

    pub fn with_created_at(value: T, ttl: Duration, created_at: Instant) -> Self {
        Self {
            value,
            created_at,
            ttl,
        }
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) <= self.ttl
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}
