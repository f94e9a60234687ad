//! Durable playback-history log and its derived aggregate queries.

mod models;
mod schema;
mod store;
mod trait_def;

pub use models::{
    CompletionStats, HourlyPlayback, ListenAgainStats, PlaybackEvent, TopArtist,
};
pub use store::SqlitePlaybackHistory;
pub use trait_def::PlaybackHistoryStore;

#[cfg(any(test, feature = "mock"))]
pub use trait_def::MockPlaybackHistoryStore;
