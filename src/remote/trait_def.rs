//! RemoteMusicSource trait definition.

use crate::error::RemoteError;
use crate::model::{RemoteArtistProfile, Song};
use async_trait::async_trait;

/// Upstream music API contract.
///
/// Every method is fallible and rate-limited upstream; callers are
/// expected to wrap calls in a [`RetryPolicy`](super::RetryPolicy) and to
/// degrade through the cache tiers on failure.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RemoteMusicSource: Send + Sync {
    /// Search songs by free-text query, best matches first.
    async fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<Song>, RemoteError>;

    /// Songs currently trending for the caller's region.
    async fn get_trending_songs(&self, limit: usize) -> Result<Vec<Song>, RemoteError>;

    /// Recently released songs.
    async fn get_new_releases(&self, limit: usize) -> Result<Vec<Song>, RemoteError>;

    /// Songs related to a seed song.
    async fn get_song_recommendations(
        &self,
        seed_id: &str,
        limit: usize,
    ) -> Result<Vec<Song>, RemoteError>;

    /// Full artist page. `browse_id_hint` skips the name-resolution step
    /// upstream when the caller already knows the id.
    async fn get_artist_profile<'a>(
        &self,
        name: &str,
        browse_id_hint: Option<&'a str>,
    ) -> Result<RemoteArtistProfile, RemoteError>;

    /// An artist's songs beyond the page's top-songs shelf.
    async fn get_artist_songs<'a>(
        &self,
        name: &str,
        browse_id: Option<&'a str>,
        limit: usize,
    ) -> Result<Vec<Song>, RemoteError>;
}
