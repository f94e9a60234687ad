//! PlaybackHistoryStore trait definition.

use super::models::{
    CompletionStats, HourlyPlayback, ListenAgainStats, PlaybackEvent, TopArtist,
};
use crate::model::Song;
use anyhow::Result;
use std::collections::HashSet;

/// Durable play-event log with derived aggregate queries.
///
/// All reads are computed fresh from the current log; nothing derived is
/// persisted.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait PlaybackHistoryStore: Send + Sync {
    /// Append a play event and opportunistically prune the log to its
    /// configured row cap, oldest rows first.
    fn record_event(&self, event: &PlaybackEvent) -> Result<()>;

    /// Artists ranked by play count, most played first.
    fn get_top_artists_by_play_count(&self, n: usize) -> Result<Vec<TopArtist>>;

    /// Play counts bucketed by local hour of day.
    fn get_playback_by_hour(&self) -> Result<Vec<HourlyPlayback>>;

    /// Completion numbers across the whole log.
    fn get_completion_stats(&self) -> Result<CompletionStats>;

    /// Mean play duration in milliseconds, 0 for an empty log.
    fn get_average_play_duration_ms(&self) -> Result<i64>;

    /// Distinct song ids, most recently played first.
    fn get_recent_song_ids(&self, n: usize) -> Result<Vec<String>>;

    /// Every song id ever recorded.
    fn get_all_played_song_ids(&self) -> Result<HashSet<String>>;

    /// Normalized names of artists the user habitually skips.
    fn get_skipped_artists(&self) -> Result<HashSet<String>>;

    /// Per-song windowed aggregates for the listen-again engine.
    /// `utc_offset_ms` shifts the time-of-day/day-of-week bucketing into
    /// the caller's local time.
    fn get_listen_again_raw_stats(
        &self,
        since_90d_ms: i64,
        since_30d_ms: i64,
        since_7d_ms: i64,
        utc_offset_ms: i64,
    ) -> Result<Vec<ListenAgainStats>>;

    /// Well-played songs the user has not touched in the last 30 days,
    /// most played first.
    fn get_rediscovery_candidates(&self, n: usize) -> Result<Vec<Song>>;

    /// Canonical names of followed artists.
    fn get_followed_artists(&self) -> Result<Vec<String>>;

    fn set_artist_followed(&self, name: &str, followed: bool) -> Result<()>;
}
