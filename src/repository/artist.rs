//! Artist repository: profile, section and album-song reads with the
//! staleness-tolerant fallback chain over memory, disk and remote tiers.

use crate::cache::{
    artist_cache_keys, search_key, ArtistPageEntry, DurableArtistCache, TtlCache,
};
use crate::clock::SharedClock;
use crate::config::{CacheSettings, RetrySettings};
use crate::error::{FeedError, RemoteError};
use crate::model::{ArtistProfile, Song};
use crate::remote::{RemoteMusicSource, RetryPolicy};
use std::sync::Arc;
use tracing::{debug, warn};

/// One tier of the profile read chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    FreshMemory,
    FreshDurable,
    Remote,
    StaleDurable,
    StaleMemory,
}

/// The degradation order for profile reads. Fresh tiers first, then the
/// remote source, then stale tiers within the tolerance window; the chain
/// guarantees the UI gets *some* previously-seen page if one exists
/// within the tolerance, at the cost of an `is_stale` flag.
pub const PROFILE_READ_CHAIN: &[ProfileSource] = &[
    ProfileSource::FreshMemory,
    ProfileSource::FreshDurable,
    ProfileSource::Remote,
    ProfileSource::StaleDurable,
    ProfileSource::StaleMemory,
];

pub struct ArtistRepository {
    remote: Arc<dyn RemoteMusicSource>,
    durable: Arc<dyn DurableArtistCache>,
    retry: RetryPolicy,
    clock: SharedClock,
    settings: CacheSettings,
    page_cache: TtlCache<ArtistProfile>,
    section_cache: TtlCache<Vec<Song>>,
    album_songs_cache: TtlCache<Vec<Song>>,
}

impl ArtistRepository {
    pub fn new(
        remote: Arc<dyn RemoteMusicSource>,
        durable: Arc<dyn DurableArtistCache>,
        cache_settings: &CacheSettings,
        retry_settings: &RetrySettings,
        clock: SharedClock,
    ) -> Self {
        Self {
            remote,
            durable,
            retry: RetryPolicy::new(retry_settings),
            settings: cache_settings.clone(),
            page_cache: TtlCache::new(
                "artist page",
                cache_settings.artist_page_ttl_ms,
                clock.clone(),
            ),
            section_cache: TtlCache::new(
                "artist section",
                cache_settings.artist_section_ttl_ms,
                clock.clone(),
            ),
            album_songs_cache: TtlCache::new(
                "album songs",
                cache_settings.album_songs_ttl_ms,
                clock.clone(),
            ),
            clock,
        }
    }

    /// Resolve an artist page, walking [`PROFILE_READ_CHAIN`].
    ///
    /// `force_refresh` evicts the memory tiers up front so the remote
    /// source is consulted even inside the TTL window.
    pub async fn get_artist_profile(
        &self,
        name: &str,
        browse_id_hint: Option<&str>,
        force_refresh: bool,
    ) -> Result<ArtistProfile, FeedError> {
        let keys = artist_cache_keys(name, browse_id_hint);
        let Some(primary_key) = keys.first().cloned() else {
            return Err(FeedError::InvalidInput(
                "artist name or browse id required".to_string(),
            ));
        };

        if force_refresh {
            for key in &keys {
                self.page_cache.invalidate(key);
            }
        }

        let mut remote_error: Option<RemoteError> = None;
        for source in PROFILE_READ_CHAIN {
            match source {
                ProfileSource::FreshMemory => {
                    if force_refresh {
                        continue;
                    }
                    for key in &keys {
                        if let Some(profile) = self.page_cache.get(key) {
                            return Ok(profile);
                        }
                    }
                }
                ProfileSource::FreshDurable => {
                    if force_refresh {
                        continue;
                    }
                    if let Some(entry) =
                        self.durable_lookup(&keys, self.settings.artist_page_ttl_ms)
                    {
                        // Promote so the next read stops at the memory tier
                        self.page_cache.put(primary_key.clone(), entry.profile.clone());
                        return Ok(entry.profile);
                    }
                }
                ProfileSource::Remote => {
                    match self
                        .retry
                        .execute(|| self.remote.get_artist_profile(name, browse_id_hint))
                        .await
                    {
                        Ok(raw) => {
                            let profile = ArtistProfile::from_remote(raw);
                            self.store_profile(&profile, &keys);
                            return Ok(profile);
                        }
                        Err(e) => {
                            warn!("Artist profile fetch failed for {:?}: {}", primary_key, e);
                            remote_error = Some(e);
                        }
                    }
                }
                ProfileSource::StaleDurable => {
                    if let Some(entry) =
                        self.durable_lookup(&keys, self.settings.stale_tolerance_ms)
                    {
                        debug!("Serving stale durable artist page for {}", primary_key);
                        return Ok(entry.profile.as_stale());
                    }
                }
                ProfileSource::StaleMemory => {
                    for key in &keys {
                        if let Some(entry) = self
                            .page_cache
                            .get_within(key, self.settings.stale_tolerance_ms)
                        {
                            debug!("Serving stale in-memory artist page for {}", key);
                            return Ok(entry.value.as_stale());
                        }
                    }
                }
            }
        }

        Err(remote_error
            .unwrap_or_else(|| RemoteError::Connection("no cached artist page".to_string()))
            .into())
    }

    /// An artist's songs beyond the top-songs shelf, cached per section TTL.
    pub async fn get_artist_songs(
        &self,
        name: &str,
        browse_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Song>, FeedError> {
        let keys = artist_cache_keys(name, browse_id);
        let Some(primary_key) = keys.first() else {
            return Err(FeedError::InvalidInput(
                "artist name or browse id required".to_string(),
            ));
        };
        let cache_key = format!("songs:{}|{}", primary_key, limit);

        if let Some(songs) = self.section_cache.get(&cache_key) {
            return Ok(songs);
        }

        let songs = self
            .retry
            .execute(|| self.remote.get_artist_songs(name, browse_id, limit))
            .await?;
        self.section_cache.put(cache_key, songs.clone());
        Ok(songs)
    }

    /// Resolve an album's tracklist through search, cached per album TTL.
    pub async fn get_album_songs(
        &self,
        album_title: &str,
        artist: &str,
        limit: usize,
    ) -> Result<Vec<Song>, FeedError> {
        if album_title.trim().is_empty() {
            return Err(FeedError::InvalidInput("blank album title".to_string()));
        }

        let query = format!("{} {}", album_title.trim(), artist.trim());
        let cache_key = format!("album:{}", search_key(&query, limit));

        if let Some(songs) = self.album_songs_cache.get(&cache_key) {
            return Ok(songs);
        }

        let songs = self
            .retry
            .execute(|| self.remote.search_songs(&query, limit))
            .await?;
        self.album_songs_cache.put(cache_key, songs.clone());
        Ok(songs)
    }

    /// Durable lookup across the key fan-out. Storage errors are logged
    /// and treated as misses so the chain keeps walking.
    fn durable_lookup(&self, keys: &[String], tolerance_ms: i64) -> Option<ArtistPageEntry> {
        let now = self.clock.now_millis();
        for key in keys {
            match self.durable.get_artist_page(key) {
                Ok(Some(entry)) if now - entry.cached_at_ms <= tolerance_ms => {
                    return Some(entry);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Durable artist cache read failed for {}: {}", key, e);
                }
            }
        }
        None
    }

    /// Write-through on a successful remote fetch: fan out to the memory
    /// and durable tiers under every canonical key, then purge old
    /// durable rows. Storage failures never fail the fetch itself.
    fn store_profile(&self, profile: &ArtistProfile, requested_keys: &[String]) {
        let mut keys = artist_cache_keys(&profile.name, Some(&profile.browse_id));
        for key in requested_keys {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }

        self.page_cache.put_many(&keys, profile.clone());

        let cached_at_ms = self.clock.now_millis();
        for key in &keys {
            let entry = ArtistPageEntry {
                cache_key: key.clone(),
                profile: profile.clone(),
                cached_at_ms,
            };
            if let Err(e) = self.durable.upsert_artist_page(&entry) {
                warn!("Durable artist cache write failed for {}: {}", key, e);
            }
        }

        let purge_before = cached_at_ms - self.settings.durable_purge_horizon_ms;
        match self.durable.purge_old_cache(purge_before) {
            Ok(0) => {}
            Ok(purged) => debug!("Purged {} old artist pages", purged),
            Err(e) => warn!("Artist cache purge failed: {}", e),
        }
    }
}
