//! Data models for the playback-history database.

use serde::{Deserialize, Serialize};

/// One play of one song, written by the playback collaborator on track
/// transition. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackEvent {
    pub song_id: String,
    pub title: String,
    pub artist: String,
    pub thumbnail_url: Option<String>,
    pub played_at_ms: i64,
    pub play_duration_seconds: u32,
    pub total_duration_seconds: u32,
    pub completed: bool,
}

/// Per-song aggregate over the trailing 7/30/90-day windows, computed
/// fresh for every listen-again scoring request and never persisted.
///
/// The time/day distributions arrive as pipe-delimited label strings
/// (`"morning|morning|evening"`) and are parsed by the scoring engine.
#[derive(Debug, Clone, Default)]
pub struct ListenAgainStats {
    pub song_id: String,
    pub title: String,
    pub artist: String,
    pub thumbnail_url: Option<String>,
    pub last_played_at_ms: i64,
    pub play_count_90d: u32,
    pub play_count_30d: u32,
    pub play_count_7d: u32,
    /// Plays in the 7 days preceding the trailing 7-day window.
    pub play_count_7d_prior: u32,
    pub completed_count: u32,
    /// All-time plays on record for this song.
    pub total_plays: u32,
    pub skip_count_30d: u32,
    pub qualified_listen_count: u32,
    pub time_of_day_raw: String,
    pub day_of_week_raw: String,
}

/// Aggregate completion numbers across the whole log.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionStats {
    pub completed: u64,
    pub total: u64,
}

impl CompletionStats {
    /// Fraction of plays listened to completion, in [0, 1].
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Artist ranked by play count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopArtist {
    pub name: String,
    pub play_count: u64,
}

/// Plays bucketed by hour of day (local time), 0-23.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourlyPlayback {
    pub hour: u8,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_rate() {
        let stats = CompletionStats {
            completed: 3,
            total: 4,
        };
        assert!((stats.rate() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_completion_rate_empty_log() {
        assert_eq!(CompletionStats::default().rate(), 0.0);
    }
}
