//! Read-through policy over the TTL cache
//!
//! Checks the cache first, fetches on a miss or stale entry, and stores only
//! successful results.
//!
//! Concurrent calls for the same stale key are not coalesced: each one fetches,
//! and whichever fetch completes last leaves its value in the cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::TtlCache;
use crate::error::FetchFailure;
use crate::upstream::{Fetch, FetchResult};

/// Where a returned value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Fresh cache entry, no fetch performed
    Hit,
    /// Fetched from upstream and stored
    Miss,
    /// Fetch failed and an expired entry was served instead
    Stale,
}

impl CacheStatus {
    /// Value for the `x-cache-status` response header
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
        }
    }
}

/// A value returned by the gate along with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub value: FetchResult,
    pub status: CacheStatus,
}

/// Serves fresh cached values or fetches and populates the cache
#[derive(Debug, Clone)]
pub struct ReadThroughGate {
    cache: Arc<TtlCache>,
    serve_stale_on_error: bool,
}

impl Default for ReadThroughGate {
    fn default() -> Self {
        Self::new(Arc::new(TtlCache::new()))
    }
}

impl ReadThroughGate {
    /// Creates a gate over `cache` that fails the caller when a refresh fails
    pub fn new(cache: Arc<TtlCache>) -> Self {
        Self {
            cache,
            serve_stale_on_error: false,
        }
    }

    /// Serve an expired entry instead of failing when a refresh fails
    pub fn with_stale_on_error(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    pub fn cache(&self) -> &Arc<TtlCache> {
        &self.cache
    }

    /// Returns the value for `key`, fetching through `source` unless fresh
    ///
    /// # Returns
    /// * `Ok(FetchResult)` - cached or freshly fetched value
    /// * `Err(FetchFailure)` - the fetch failed; the cache is left untouched
    pub async fn get<F>(
        &self,
        key: &str,
        ttl: Duration,
        source: &F,
    ) -> Result<FetchResult, FetchFailure>
    where
        F: Fetch + ?Sized,
    {
        self.lookup(key, ttl, source).await.map(|lookup| lookup.value)
    }

    /// Like [`get`](Self::get) but also reports whether the value was cached
    pub async fn lookup<F>(
        &self,
        key: &str,
        ttl: Duration,
        source: &F,
    ) -> Result<Lookup, FetchFailure>
    where
        F: Fetch + ?Sized,
    {
        let entry = self.cache.get(key);
        let now = self.cache.now();
        if let Some(fresh) = entry
            .as_ref()
            .filter(|entry| TtlCache::is_fresh(Some(*entry), ttl, now))
        {
            debug!(key, "cache hit");
            return Ok(Lookup {
                value: fresh.value.clone(),
                status: CacheStatus::Hit,
            });
        }

        debug!(key, "cache miss, fetching upstream");
        match source.fetch().await {
            Ok(result) => {
                self.cache.put(key, result.clone());
                Ok(Lookup {
                    value: result,
                    status: CacheStatus::Miss,
                })
            }
            Err(failure) => {
                warn!(key, kind = ?failure.kind(), error = %failure, "upstream fetch failed");
                match entry {
                    Some(stale) if self.serve_stale_on_error => {
                        warn!(key, stored_at = %stale.stored_at, "serving stale entry");
                        Ok(Lookup {
                            value: stale.value,
                            status: CacheStatus::Stale,
                        })
                    }
                    _ => Err(failure),
                }
            }
        }
    }
}
