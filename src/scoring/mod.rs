//! Pure scoring and ranking engines.
//!
//! Everything in this module is synchronous and side-effect free: raw
//! candidates and aggregates in, ranked and deduplicated lists out. The
//! repository layer owns all I/O and failure handling.

mod discovery;
mod listen_again;
mod quick_picks;

pub use discovery::{personalize, PersonalizationInputs};
pub use listen_again::{parse_distribution, ListenAgainEngine};
pub use quick_picks::{session_seed, QuickPicksEngine};

use chrono::{DateTime, Datelike, Timelike};

/// Coarse time-of-day bucket, matching the labels the history store emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=21 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// Day-of-week labels as the history store emits them, Sunday first.
const DAY_LABELS: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

/// The caller's current time/day buckets, used for affinity bonuses.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub time_of_day: TimeOfDay,
    /// Lowercase three-letter day label ("sun".."sat").
    pub day_of_week: String,
}

impl ScoringContext {
    /// Build a context for the given instant, shifted into the caller's
    /// local time by `utc_offset_ms`.
    pub fn at(now_ms: i64, utc_offset_ms: i64) -> Self {
        let local =
            DateTime::from_timestamp_millis(now_ms + utc_offset_ms).unwrap_or(DateTime::UNIX_EPOCH);
        let day_index = local.weekday().num_days_from_sunday() as usize;
        Self {
            time_of_day: TimeOfDay::from_hour(local.hour() as u8),
            day_of_week: DAY_LABELS[day_index].to_string(),
        }
    }
}
