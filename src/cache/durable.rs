//! Durable artist-page cache contract.

use crate::model::ArtistProfile;
use anyhow::Result;

/// A durable artist-page row.
#[derive(Debug, Clone)]
pub struct ArtistPageEntry {
    /// Canonical key the row is stored under (`browse:<id>` or
    /// `name:<canonical name>`).
    pub cache_key: String,
    pub profile: ArtistProfile,
    pub cached_at_ms: i64,
}

/// Disk-backed artist-page tier. Survives process restarts and feeds the
/// staleness-tolerant fallback chain when the remote source fails.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait DurableArtistCache: Send + Sync {
    /// Get a row by canonical key. Returns Ok(None) on miss.
    fn get_artist_page(&self, key: &str) -> Result<Option<ArtistPageEntry>>;

    /// Insert or replace a row by its key.
    fn upsert_artist_page(&self, entry: &ArtistPageEntry) -> Result<()>;

    /// Delete a row by key. Returns the number of rows removed.
    fn delete_artist_page(&self, key: &str) -> Result<usize>;

    /// Delete rows cached before the given epoch. Returns rows removed.
    fn purge_old_cache(&self, older_than_epoch_ms: i64) -> Result<usize>;
}
