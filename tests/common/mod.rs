//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use melofono_core::clock::ManualClock;
use melofono_core::config::{AppSettings, HistorySettings};
use melofono_core::genres::GenreCatalog;
use melofono_core::history::{PlaybackEvent, SqlitePlaybackHistory};
use melofono_core::model::{RemoteArtistProfile, Song};
use melofono_core::region::RegionProvider;
use melofono_core::SqliteArtistCache;
use std::sync::Arc;
use tempfile::TempDir;

/// Fixed test epoch: 2023-11-14 22:13:20 UTC.
pub const T0: i64 = 1_700_000_000_000;

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Region provider pinned to India, so tests never touch geolocation.
pub struct FixedRegion;

#[async_trait]
impl RegionProvider for FixedRegion {
    async fn country_code(&self) -> String {
        "IN".to_string()
    }

    async fn country_name(&self) -> String {
        "India".to_string()
    }
}

/// Settings tuned for tests: no retry backoff delays.
pub fn test_settings() -> AppSettings {
    let mut settings = AppSettings::default();
    settings.retry.max_retries = 0;
    settings.retry.initial_delay_ms = 1;
    settings
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(T0))
}

pub fn history_store(dir: &TempDir, clock: Arc<ManualClock>) -> Arc<SqlitePlaybackHistory> {
    Arc::new(
        SqlitePlaybackHistory::new(
            dir.path().join("history.db"),
            &HistorySettings::default(),
            clock,
        )
        .unwrap(),
    )
}

pub fn artist_cache(dir: &TempDir) -> Arc<SqliteArtistCache> {
    Arc::new(SqliteArtistCache::new(dir.path().join("artist_cache.db")).unwrap())
}

pub fn genre_catalog() -> Arc<GenreCatalog> {
    Arc::new(GenreCatalog::embedded())
}

pub fn song(id: &str, artist: &str) -> Song {
    Song::new(id, format!("Title {}", id), artist)
}

pub fn song_with_views(id: &str, artist: &str, views: u64) -> Song {
    let mut song = song(id, artist);
    song.view_count = Some(views);
    song
}

/// A full listen recorded `age_ms` before [`T0`].
pub fn listen(song_id: &str, artist: &str, age_ms: i64) -> PlaybackEvent {
    PlaybackEvent {
        song_id: song_id.to_string(),
        title: format!("Title {}", song_id),
        artist: artist.to_string(),
        thumbnail_url: None,
        played_at_ms: T0 - age_ms,
        play_duration_seconds: 200,
        total_duration_seconds: 210,
        completed: true,
    }
}

/// A quick skip recorded `age_ms` before [`T0`].
pub fn skip(song_id: &str, artist: &str, age_ms: i64) -> PlaybackEvent {
    PlaybackEvent {
        play_duration_seconds: 4,
        completed: false,
        ..listen(song_id, artist, age_ms)
    }
}

pub fn remote_profile(name: &str, browse_id: &str, bio: &str) -> RemoteArtistProfile {
    RemoteArtistProfile {
        name: name.to_string(),
        browse_id: browse_id.to_string(),
        images: vec![format!("{}.jpg", browse_id)],
        bio: Some(bio.to_string()),
        top_songs: vec![song("top1", name), song("top2", name)],
        albums: vec![],
        singles: vec![],
        videos: vec![],
        featured_on: vec![],
        related_artists: vec![],
        more_endpoints: vec![],
    }
}
