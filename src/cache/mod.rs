//! Multi-tier caching: in-memory TTL maps plus a durable artist-page tier.
//!
//! Reads enforce expiry lazily (compare-and-remove on access, no background
//! sweep). All keys are canonicalized, see [`keys`].

mod durable;
mod keys;
mod schema;
mod store;

pub use durable::{ArtistPageEntry, DurableArtistCache};
pub use keys::{artist_cache_keys, browse_key, canonical_artist_name, name_key, search_key};
pub use store::SqliteArtistCache;

#[cfg(any(test, feature = "mock"))]
pub use durable::MockDurableArtistCache;

use crate::clock::SharedClock;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// A cached value with the time it was stored.
///
/// Entries are replaced, never mutated in place; staleness flags are
/// applied on copies so the stored timestamp keeps driving TTL checks.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub cached_at_ms: i64,
}

impl<V> CacheEntry<V> {
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.cached_at_ms
    }

    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        self.age_ms(now_ms) <= ttl_ms
    }
}

/// In-memory TTL cache keyed by canonical strings.
///
/// Internally synchronized; safe for concurrent read/insert/remove. Within
/// one key the last completed write wins: concurrent refreshes may race
/// and duplicate loads are tolerated.
pub struct TtlCache<V> {
    label: &'static str,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl_ms: i64,
    clock: SharedClock,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(label: &'static str, ttl_ms: i64, clock: SharedClock) -> Self {
        Self {
            label,
            entries: Mutex::new(HashMap::new()),
            ttl_ms,
            clock,
        }
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Fresh read. An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl_ms) => {
                debug!("{} cache hit for {}", self.label, key);
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!("{} cache expired for {}", self.label, key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Tolerant read for staleness fallback: returns the entry if it is at
    /// most `tolerance_ms` old, without removing it. The caller decides
    /// whether to flag the value stale.
    pub fn get_within(&self, key: &str, tolerance_ms: i64) -> Option<CacheEntry<V>> {
        let now = self.clock.now_millis();
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .filter(|entry| entry.age_ms(now) <= tolerance_ms)
            .cloned()
    }

    pub fn put(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            cached_at_ms: self.clock.now_millis(),
        };
        self.entries.lock().unwrap().insert(key.into(), entry);
    }

    /// Insert one value under several keys as a single fan-out write, so
    /// equivalent lookups (e.g. `browse:` and `name:` for one artist)
    /// never observe a partial insert.
    pub fn put_many(&self, keys: &[String], value: V) {
        let cached_at_ms = self.clock.now_millis();
        let mut entries = self.entries.lock().unwrap();
        for key in keys {
            entries.insert(
                key.clone(),
                CacheEntry {
                    value: value.clone(),
                    cached_at_ms,
                },
            );
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}
