//! In-memory read-through cache for upstream feed responses
//!
//! `TtlCache` keeps the most recent successful result per key together with the
//! time it was stored. `ReadThroughGate` sits on top of it and decides, per call,
//! whether to serve the cached value or fetch a fresh one. Failed fetches never
//! touch the cache.

mod gate;
mod manager;

pub use gate::{CacheStatus, Lookup, ReadThroughGate};
pub use manager::{CacheEntry, Clock, TtlCache};
