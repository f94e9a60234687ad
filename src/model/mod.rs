//! Core data models shared across the remote, cache and scoring layers.

use serde::{Deserialize, Serialize};

/// A playable song as surfaced by the upstream music API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<u32>,
    /// Upstream view count, used as a popularity proxy in discovery scoring.
    pub view_count: Option<u64>,
    /// Upstream browse id of the primary artist, when known.
    pub artist_browse_id: Option<String>,
}

impl Song {
    /// Minimal constructor for the common id/title/artist triple.
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            thumbnail_url: None,
            duration_seconds: None,
            view_count: None,
            artist_browse_id: None,
        }
    }
}

/// Album or single as listed on an artist page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    pub year: Option<u16>,
    pub thumbnail_url: Option<String>,
}

/// Related artist as listed on an artist page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtistSummary {
    pub browse_id: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
}

/// Artist-page section that has its own "more" browse endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtistSection {
    Albums,
    Singles,
    Videos,
    FeaturedOn,
}

impl ArtistSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtistSection::Albums => "albums",
            ArtistSection::Singles => "singles",
            ArtistSection::Videos => "videos",
            ArtistSection::FeaturedOn => "featured_on",
        }
    }

    /// Parse a section name, used to validate caller-supplied section ids.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "albums" => Some(ArtistSection::Albums),
            "singles" => Some(ArtistSection::Singles),
            "videos" => Some(ArtistSection::Videos),
            "featured_on" | "featured-on" => Some(ArtistSection::FeaturedOn),
            _ => None,
        }
    }
}

/// Browse endpoint for loading the full contents of an artist-page section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionEndpoint {
    pub section: ArtistSection,
    pub browse_id: String,
    pub params: Option<String>,
}

/// Raw artist page as fetched from the upstream API, before cache merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteArtistProfile {
    pub name: String,
    pub browse_id: String,
    pub images: Vec<String>,
    pub bio: Option<String>,
    pub top_songs: Vec<Song>,
    pub albums: Vec<AlbumSummary>,
    pub singles: Vec<AlbumSummary>,
    pub videos: Vec<Song>,
    pub featured_on: Vec<AlbumSummary>,
    pub related_artists: Vec<ArtistSummary>,
    pub more_endpoints: Vec<SectionEndpoint>,
}

/// Artist page as served to the UI, cached across memory and disk tiers.
///
/// Every list field is deduplicated by item id. `is_stale` is applied via
/// copy-on-read when the entry is served past its TTL; the stored entry
/// keeps its original freshness timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistProfile {
    pub name: String,
    pub browse_id: String,
    pub images: Vec<String>,
    pub bio: Option<String>,
    pub top_songs: Vec<Song>,
    pub albums: Vec<AlbumSummary>,
    pub singles: Vec<AlbumSummary>,
    pub videos: Vec<Song>,
    pub featured_on: Vec<AlbumSummary>,
    pub related_artists: Vec<ArtistSummary>,
    pub more_endpoints: Vec<SectionEndpoint>,
    pub is_stale: bool,
}

fn dedup_by_key<T, K: std::hash::Hash + Eq>(items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

impl ArtistProfile {
    /// Build a profile from the raw remote payload, deduplicating every
    /// list field by item id (first occurrence wins).
    pub fn from_remote(remote: RemoteArtistProfile) -> Self {
        Self {
            name: remote.name,
            browse_id: remote.browse_id,
            images: dedup_by_key(remote.images, |url| url.clone()),
            bio: remote.bio,
            top_songs: dedup_by_key(remote.top_songs, |s| s.id.clone()),
            albums: dedup_by_key(remote.albums, |a| a.id.clone()),
            singles: dedup_by_key(remote.singles, |a| a.id.clone()),
            videos: dedup_by_key(remote.videos, |s| s.id.clone()),
            featured_on: dedup_by_key(remote.featured_on, |a| a.id.clone()),
            related_artists: dedup_by_key(remote.related_artists, |a| a.browse_id.clone()),
            more_endpoints: remote.more_endpoints,
            is_stale: false,
        }
    }

    /// Copy-on-read staleness flag, leaving the cached value untouched.
    pub fn as_stale(&self) -> Self {
        let mut copy = self.clone();
        copy.is_stale = true;
        copy
    }
}

/// Where a quick-picks candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateSource {
    /// Drawn from the user's own listening history.
    Familiar,
    /// Unplayed deep cut from one of the user's top artists.
    SameArtistUnplayed,
    /// Seed-based recommendation from a recently played song.
    SimilarArtist,
    /// Regional trending pick.
    TrendingGenre,
}

/// A candidate flowing through one quick-picks build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub song: Song,
    pub source: CandidateSource,
    /// Source-assigned base score in [0, 1].
    pub source_score: f64,
    /// Weighted final score assigned during candidate scoring.
    pub final_score: f64,
    pub is_familiar: bool,
    pub inferred_genre: String,
}

/// Coarse daily listening shape derived from the per-hour histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListeningPattern {
    /// Most plays land before noon.
    EarlyBird,
    /// Most plays land in the afternoon.
    DayListener,
    /// Most plays land in the evening or at night.
    NightOwl,
    /// No hour range dominates.
    Balanced,
}

/// Derived taste profile, rebuilt from current aggregates on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTasteProfile {
    pub top_artists: Vec<String>,
    pub top_genres: Vec<String>,
    pub preferred_languages: Vec<String>,
    pub listening_pattern: ListeningPattern,
    /// Fraction of plays listened to completion, in [0, 1].
    pub completion_rate: f64,
    pub avg_session_duration_ms: i64,
    /// Seed queries for discovery searches, most relevant first.
    pub top_search_queries: Vec<String>,
}

impl UserTasteProfile {
    /// Profile for a user with no usable history.
    pub fn empty() -> Self {
        Self {
            top_artists: Vec::new(),
            top_genres: Vec::new(),
            preferred_languages: Vec::new(),
            listening_pattern: ListeningPattern::Balanced,
            completion_rate: 0.0,
            avg_session_duration_ms: 0,
            top_search_queries: Vec::new(),
        }
    }
}

/// Resolved region pair consumed by the scoring and repository layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    /// Canonical ISO 3166-1 alpha-2 code, uppercased.
    pub country_code: String,
    pub country_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_remote_dedups_by_id() {
        let remote = RemoteArtistProfile {
            name: "Artist".into(),
            browse_id: "UC123".into(),
            images: vec!["a.jpg".into(), "a.jpg".into()],
            bio: None,
            top_songs: vec![
                Song::new("s1", "One", "Artist"),
                Song::new("s1", "One (dup)", "Artist"),
                Song::new("s2", "Two", "Artist"),
            ],
            albums: vec![
                AlbumSummary {
                    id: "al1".into(),
                    title: "Album".into(),
                    year: None,
                    thumbnail_url: None,
                },
                AlbumSummary {
                    id: "al1".into(),
                    title: "Album".into(),
                    year: None,
                    thumbnail_url: None,
                },
            ],
            singles: vec![],
            videos: vec![],
            featured_on: vec![],
            related_artists: vec![],
            more_endpoints: vec![],
        };

        let profile = ArtistProfile::from_remote(remote);
        assert_eq!(profile.top_songs.len(), 2);
        assert_eq!(profile.top_songs[0].title, "One"); // first occurrence wins
        assert_eq!(profile.albums.len(), 1);
        assert_eq!(profile.images.len(), 1);
        assert!(!profile.is_stale);
    }

    #[test]
    fn test_as_stale_does_not_mutate_original() {
        let profile = ArtistProfile::from_remote(RemoteArtistProfile {
            name: "Artist".into(),
            browse_id: "UC123".into(),
            images: vec![],
            bio: None,
            top_songs: vec![],
            albums: vec![],
            singles: vec![],
            videos: vec![],
            featured_on: vec![],
            related_artists: vec![],
            more_endpoints: vec![],
        });

        let stale = profile.as_stale();
        assert!(stale.is_stale);
        assert!(!profile.is_stale);
    }

    #[test]
    fn test_artist_section_parse() {
        assert_eq!(ArtistSection::parse("albums"), Some(ArtistSection::Albums));
        assert_eq!(
            ArtistSection::parse(" Featured_On "),
            Some(ArtistSection::FeaturedOn)
        );
        assert_eq!(ArtistSection::parse("discography"), None);
    }
}
