//! Repository façades: the public contracts the UI layer consumes.
//!
//! Repositories orchestrate the remote source, history aggregates, cache
//! tiers and scoring engines into one `Result` per use case. The UI never
//! sees a raw transport error, only a success payload (possibly flagged
//! stale) or a [`FeedError`](crate::error::FeedError) it can render.

mod artist;
mod recommendations;

pub use artist::{ArtistRepository, ProfileSource, PROFILE_READ_CHAIN};
pub use recommendations::RecommendationRepository;

/// The device's current UTC offset in milliseconds, for shifting
/// time-of-day bucketing into local time.
pub fn device_utc_offset_ms() -> i64 {
    use chrono::Offset;
    let offset = chrono::Local::now().offset().fix();
    offset.local_minus_utc() as i64 * 1000
}
