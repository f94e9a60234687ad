//! Taste profile derivation from playback-history aggregates.

use crate::genres::GenreCatalog;
use crate::history::PlaybackHistoryStore;
use crate::model::{ListeningPattern, RegionInfo, UserTasteProfile};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// How many top artists feed the profile.
const TOP_ARTISTS: usize = 10;
/// How many genres the profile keeps.
const TOP_GENRES: usize = 5;
/// How many seed queries the profile emits.
const TOP_SEARCH_QUERIES: usize = 5;
/// A daily bucket must hold at least this share of plays to set the
/// listening pattern; otherwise the pattern is balanced.
const PATTERN_DOMINANCE_THRESHOLD: f64 = 0.5;

/// Default language expectation per region, used when history alone
/// doesn't establish a language preference.
fn region_default_language(country_code: &str) -> &'static str {
    match country_code {
        "IN" => "hindi",
        "PK" | "BD" => "hindi",
        "ES" | "MX" | "AR" | "CO" | "CL" | "PE" => "spanish",
        "FR" => "french",
        "DE" | "AT" => "german",
        "JP" => "japanese",
        "KR" => "korean",
        "BR" | "PT" => "portuguese",
        _ => "english",
    }
}

/// Builds a [`UserTasteProfile`] from current history aggregates.
///
/// Profiles are rebuilt on every request; callers that want memoization
/// cache the result themselves.
pub struct TasteProfileBuilder {
    history: Arc<dyn PlaybackHistoryStore>,
    genres: Arc<GenreCatalog>,
}

impl TasteProfileBuilder {
    pub fn new(history: Arc<dyn PlaybackHistoryStore>, genres: Arc<GenreCatalog>) -> Self {
        Self { history, genres }
    }

    pub fn build(&self, region: &RegionInfo) -> Result<UserTasteProfile> {
        let top = self.history.get_top_artists_by_play_count(TOP_ARTISTS)?;
        let top_artists: Vec<String> = top.iter().map(|a| a.name.clone()).collect();

        // Genres weighted by the artist's play count
        let mut genre_weights: HashMap<String, u64> = HashMap::new();
        for artist in &top {
            for genre in self.genres.genres_for(&artist.name) {
                *genre_weights.entry(genre.clone()).or_insert(0) += artist.play_count;
            }
        }
        let mut weighted: Vec<(String, u64)> = genre_weights.into_iter().collect();
        weighted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let top_genres: Vec<String> = weighted
            .into_iter()
            .take(TOP_GENRES)
            .map(|(genre, _)| genre)
            .collect();

        // Languages: what the top artists sing in, then the region default
        let mut preferred_languages: Vec<String> = Vec::new();
        for artist in &top_artists {
            if let Some(language) = self.genres.language_for(artist) {
                if !preferred_languages.iter().any(|l| l == language) {
                    preferred_languages.push(language.to_string());
                }
            }
        }
        let regional = region_default_language(&region.country_code);
        if !preferred_languages.iter().any(|l| l == regional) {
            preferred_languages.push(regional.to_string());
        }

        let listening_pattern = self.derive_pattern()?;
        let completion_rate = self.history.get_completion_stats()?.rate();
        let avg_session_duration_ms = self.history.get_average_play_duration_ms()?;

        // Seed queries: artist deep dives first, then a genre/language net
        let mut top_search_queries: Vec<String> = top_artists
            .iter()
            .take(3)
            .map(|artist| format!("{} songs", artist))
            .collect();
        if let Some(genre) = top_genres.first() {
            top_search_queries.push(format!("best {} songs", genre));
        }
        if let Some(language) = preferred_languages.first() {
            top_search_queries.push(format!("{} hits", language));
        }
        top_search_queries.truncate(TOP_SEARCH_QUERIES);

        debug!(
            "Built taste profile: {} artists, {} genres, pattern {:?}",
            top_artists.len(),
            top_genres.len(),
            listening_pattern
        );

        Ok(UserTasteProfile {
            top_artists,
            top_genres,
            preferred_languages,
            listening_pattern,
            completion_rate,
            avg_session_duration_ms,
            top_search_queries,
        })
    }

    fn derive_pattern(&self) -> Result<ListeningPattern> {
        let hours = self.history.get_playback_by_hour()?;
        let total: u64 = hours.iter().map(|h| h.count).sum();
        if total == 0 {
            return Ok(ListeningPattern::Balanced);
        }

        let mut morning = 0u64;
        let mut afternoon = 0u64;
        let mut late = 0u64;
        for bucket in &hours {
            match bucket.hour {
                5..=11 => morning += bucket.count,
                12..=16 => afternoon += bucket.count,
                _ => late += bucket.count,
            }
        }

        let share = |count: u64| count as f64 / total as f64;
        let pattern = if share(morning) >= PATTERN_DOMINANCE_THRESHOLD {
            ListeningPattern::EarlyBird
        } else if share(afternoon) >= PATTERN_DOMINANCE_THRESHOLD {
            ListeningPattern::DayListener
        } else if share(late) >= PATTERN_DOMINANCE_THRESHOLD {
            ListeningPattern::NightOwl
        } else {
            ListeningPattern::Balanced
        };
        Ok(pattern)
    }
}
