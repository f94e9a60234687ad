//! Melofono Core
//!
//! Recommendation-and-caching pipeline for the Melofono mobile music
//! client: scoring engines for the personalized feeds (Quick Picks,
//! Listen Again, New Releases, Trending), the multi-tier cache with TTL
//! and staleness policy, and the retry-with-backoff layer wrapping every
//! call against the upstream music API.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod genres;
pub mod history;
pub mod model;
pub mod region;
pub mod remote;
pub mod repository;
pub mod scoring;
pub mod sqlite_persistence;
pub mod taste;

// Re-export commonly used types for convenience
pub use cache::{SqliteArtistCache, TtlCache};
pub use clock::{Clock, SharedClock, SystemClock};
pub use config::AppSettings;
pub use error::{FeedError, RemoteError};
pub use history::SqlitePlaybackHistory;
pub use remote::{HttpMusicSource, RetryPolicy};
pub use repository::{ArtistRepository, RecommendationRepository};
