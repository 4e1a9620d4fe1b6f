//! TTL cache holding one entry per feed key
//!
//! Entries are replaced wholesale on every successful fetch and are never
//! evicted; the key space is the fixed set of feeds.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

use crate::upstream::FetchResult;

/// Source of the current time, injectable for tests
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A cached fetch result and when it was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// When the value was stored
    pub stored_at: DateTime<Utc>,
    /// The cached result
    pub value: FetchResult,
}

/// Process-wide map from cache key to the latest successful result
///
/// Owned by the gate and shared through an `Arc`; no global state.
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
    clock: Clock,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl TtlCache {
    /// Creates an empty cache backed by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Creates an empty cache with a custom clock
    ///
    /// Useful for testing TTL boundaries without sleeping.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Current time according to this cache's clock
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Looks up the entry for `key` without side effects
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Stores `value` under `key`, replacing any previous entry
    pub fn put(&self, key: &str, value: FetchResult) {
        let entry = CacheEntry {
            stored_at: self.now(),
            value,
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Whether `entry` is present and younger than `ttl` at `now`
    ///
    /// A zero TTL is never fresh, so such feeds pass straight through.
    pub fn is_fresh(entry: Option<&CacheEntry>, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Some(entry) = entry else {
            return false;
        };
        if ttl.is_zero() {
            return false;
        }
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        now - entry.stored_at < ttl
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
