//! HTTP client for the upstream music API.
//!
//! A thin wire adapter: it maps endpoints to typed calls and transport
//! failures to [`RemoteError`] kinds. Retry and caching live above it.

use super::trait_def::RemoteMusicSource;
use crate::error::RemoteError;
use crate::model::{
    AlbumSummary, ArtistSection, ArtistSummary, RemoteArtistProfile, SectionEndpoint, Song,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Client for the unofficial upstream music API.
#[derive(Clone)]
pub struct HttpMusicSource {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SongListResponse {
    items: Vec<SongDto>,
}

#[derive(Deserialize)]
struct SongDto {
    id: String,
    title: String,
    artist: String,
    album: Option<String>,
    thumbnail: Option<String>,
    duration_seconds: Option<u32>,
    view_count: Option<u64>,
    artist_browse_id: Option<String>,
}

impl From<SongDto> for Song {
    fn from(dto: SongDto) -> Self {
        Song {
            id: dto.id,
            title: dto.title,
            artist: dto.artist,
            album: dto.album,
            thumbnail_url: dto.thumbnail,
            duration_seconds: dto.duration_seconds,
            view_count: dto.view_count,
            artist_browse_id: dto.artist_browse_id,
        }
    }
}

#[derive(Deserialize)]
struct AlbumDto {
    id: String,
    title: String,
    year: Option<u16>,
    thumbnail: Option<String>,
}

impl From<AlbumDto> for AlbumSummary {
    fn from(dto: AlbumDto) -> Self {
        AlbumSummary {
            id: dto.id,
            title: dto.title,
            year: dto.year,
            thumbnail_url: dto.thumbnail,
        }
    }
}

#[derive(Deserialize)]
struct RelatedArtistDto {
    browse_id: String,
    name: String,
    thumbnail: Option<String>,
}

#[derive(Deserialize)]
struct SectionEndpointDto {
    section: String,
    browse_id: String,
    params: Option<String>,
}

#[derive(Deserialize)]
struct ArtistProfileResponse {
    name: String,
    browse_id: String,
    #[serde(default)]
    images: Vec<String>,
    bio: Option<String>,
    #[serde(default)]
    top_songs: Vec<SongDto>,
    #[serde(default)]
    albums: Vec<AlbumDto>,
    #[serde(default)]
    singles: Vec<AlbumDto>,
    #[serde(default)]
    videos: Vec<SongDto>,
    #[serde(default)]
    featured_on: Vec<AlbumDto>,
    #[serde(default)]
    related_artists: Vec<RelatedArtistDto>,
    #[serde(default)]
    more_endpoints: Vec<SectionEndpointDto>,
}

fn map_transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        return RemoteError::Timeout;
    }
    if e.is_decode() {
        return RemoteError::Decode(e.to_string());
    }
    if e.is_connect() {
        // reqwest folds DNS failures into connect errors; the io source
        // chain is the only place the distinction survives
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            if inner.to_string().contains("dns error")
                || inner.to_string().contains("failed to lookup address")
            {
                return RemoteError::UnresolvedHost;
            }
            source = std::error::Error::source(inner);
        }
        return RemoteError::Connection(e.to_string());
    }
    RemoteError::Connection(e.to_string())
}

impl HttpMusicSource {
    /// Create a client against `base_url` (e.g. "https://music.example.com").
    pub fn new(base_url: String, timeout_secs: Option<u64>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_song_list(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Song>, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
            });
        }

        let body: SongListResponse = response.json().await.map_err(map_transport_error)?;
        Ok(body.items.into_iter().map(Song::from).collect())
    }
}

#[async_trait]
impl RemoteMusicSource for HttpMusicSource {
    async fn search_songs(&self, query: &str, limit: usize) -> Result<Vec<Song>, RemoteError> {
        if query.trim().is_empty() {
            return Err(RemoteError::InvalidInput("blank search query".to_string()));
        }
        self.get_song_list(
            "/v1/search/songs",
            &[("q", query.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn get_trending_songs(&self, limit: usize) -> Result<Vec<Song>, RemoteError> {
        self.get_song_list("/v1/charts/trending", &[("limit", limit.to_string())])
            .await
    }

    async fn get_new_releases(&self, limit: usize) -> Result<Vec<Song>, RemoteError> {
        self.get_song_list("/v1/charts/new-releases", &[("limit", limit.to_string())])
            .await
    }

    async fn get_song_recommendations(
        &self,
        seed_id: &str,
        limit: usize,
    ) -> Result<Vec<Song>, RemoteError> {
        if seed_id.trim().is_empty() {
            return Err(RemoteError::InvalidInput("blank seed id".to_string()));
        }
        self.get_song_list(
            "/v1/recommendations",
            &[
                ("seed", seed_id.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn get_artist_profile<'a>(
        &self,
        name: &str,
        browse_id_hint: Option<&'a str>,
    ) -> Result<RemoteArtistProfile, RemoteError> {
        if name.trim().is_empty() && browse_id_hint.map_or(true, |id| id.trim().is_empty()) {
            return Err(RemoteError::InvalidInput(
                "artist name or browse id required".to_string(),
            ));
        }

        let url = format!("{}/v1/artist", self.base_url);
        let mut query = vec![("name", name.to_string())];
        if let Some(id) = browse_id_hint {
            query.push(("browse_id", id.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
            });
        }

        let body: ArtistProfileResponse = response.json().await.map_err(map_transport_error)?;

        Ok(RemoteArtistProfile {
            name: body.name,
            browse_id: body.browse_id,
            images: body.images,
            bio: body.bio,
            top_songs: body.top_songs.into_iter().map(Song::from).collect(),
            albums: body.albums.into_iter().map(AlbumSummary::from).collect(),
            singles: body.singles.into_iter().map(AlbumSummary::from).collect(),
            videos: body.videos.into_iter().map(Song::from).collect(),
            featured_on: body
                .featured_on
                .into_iter()
                .map(AlbumSummary::from)
                .collect(),
            related_artists: body
                .related_artists
                .into_iter()
                .map(|dto| ArtistSummary {
                    browse_id: dto.browse_id,
                    name: dto.name,
                    thumbnail_url: dto.thumbnail,
                })
                .collect(),
            // Unknown section names from newer upstream versions are dropped
            more_endpoints: body
                .more_endpoints
                .into_iter()
                .filter_map(|dto| {
                    let section = ArtistSection::parse(&dto.section)?;
                    Some(SectionEndpoint {
                        section,
                        browse_id: dto.browse_id,
                        params: dto.params,
                    })
                })
                .collect(),
        })
    }

    async fn get_artist_songs<'a>(
        &self,
        name: &str,
        browse_id: Option<&'a str>,
        limit: usize,
    ) -> Result<Vec<Song>, RemoteError> {
        if name.trim().is_empty() && browse_id.map_or(true, |id| id.trim().is_empty()) {
            return Err(RemoteError::InvalidInput(
                "artist name or browse id required".to_string(),
            ));
        }

        let mut query = vec![("name", name.to_string()), ("limit", limit.to_string())];
        if let Some(id) = browse_id {
            query.push(("browse_id", id.to_string()));
        }
        self.get_song_list("/v1/artist/songs", &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_dto_maps_all_fields() {
        let dto = SongDto {
            id: "s1".into(),
            title: "Song".into(),
            artist: "Artist".into(),
            album: Some("Album".into()),
            thumbnail: Some("t.jpg".into()),
            duration_seconds: Some(200),
            view_count: Some(1_000_000),
            artist_browse_id: Some("UC1".into()),
        };

        let song = Song::from(dto);
        assert_eq!(song.id, "s1");
        assert_eq!(song.album.as_deref(), Some("Album"));
        assert_eq!(song.view_count, Some(1_000_000));
    }

    #[tokio::test]
    async fn test_blank_query_fails_fast() {
        let source = HttpMusicSource::new("http://localhost:1".to_string(), None).unwrap();
        let result = source.search_songs("   ", 10).await;
        assert!(matches!(result, Err(RemoteError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_blank_artist_identifiers_fail_fast() {
        let source = HttpMusicSource::new("http://localhost:1".to_string(), None).unwrap();
        let result = source.get_artist_profile("", Some("  ")).await;
        assert!(matches!(result, Err(RemoteError::InvalidInput(_))));

        let result = source.get_song_recommendations(" ", 5).await;
        assert!(matches!(result, Err(RemoteError::InvalidInput(_))));
    }
}
