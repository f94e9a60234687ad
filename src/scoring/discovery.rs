//! New-release and trending personalization.
//!
//! Both feeds share one shape: take a raw remote list (fetched at twice
//! the requested size), drop what the user has already heard, boost what
//! matches their taste, stable-sort and truncate.

use crate::cache::canonical_artist_name;
use crate::genres::GenreCatalog;
use crate::model::Song;
use std::collections::HashSet;

/// Boost for an artist in the user's top-artists or followed set.
const ARTIST_BOOST: f64 = 2.0;
/// Boost for a genre overlapping the user's top genres.
const GENRE_BOOST: f64 = 1.0;
/// Boost for a language in the user's preferred set.
const LANGUAGE_BOOST: f64 = 0.5;

/// Taste signals shared by the new-release and trending engines.
pub struct PersonalizationInputs<'a> {
    pub played_song_ids: &'a HashSet<String>,
    pub top_artists: &'a [String],
    pub followed_artists: &'a [String],
    pub top_genres: &'a [String],
    pub preferred_languages: &'a [String],
}

/// Personalize a raw candidate list. Already-played songs are dropped,
/// boosted items float up via a stable descending sort (ties keep the
/// upstream order), and the result is truncated to `limit`. An empty
/// input short-circuits to an empty output.
pub fn personalize(
    raw: Vec<Song>,
    inputs: &PersonalizationInputs<'_>,
    catalog: &GenreCatalog,
    limit: usize,
) -> Vec<Song> {
    if raw.is_empty() {
        return Vec::new();
    }

    let boosted_artists: HashSet<String> = inputs
        .top_artists
        .iter()
        .chain(inputs.followed_artists)
        .map(|a| canonical_artist_name(a))
        .collect();
    let top_genres: HashSet<&str> = inputs.top_genres.iter().map(String::as_str).collect();
    let languages: HashSet<&str> = inputs
        .preferred_languages
        .iter()
        .map(String::as_str)
        .collect();

    let mut seen_ids = HashSet::new();
    let mut scored: Vec<(f64, Song)> = raw
        .into_iter()
        .filter(|song| !inputs.played_song_ids.contains(&song.id))
        .filter(|song| seen_ids.insert(song.id.clone()))
        .map(|song| {
            let mut score = 0.0;
            if boosted_artists.contains(&canonical_artist_name(&song.artist)) {
                score += ARTIST_BOOST;
            }
            if catalog
                .genres_for(&song.artist)
                .iter()
                .any(|g| top_genres.contains(g.as_str()))
            {
                score += GENRE_BOOST;
            }
            if catalog
                .language_for(&song.artist)
                .map(|lang| languages.contains(lang))
                .unwrap_or(false)
            {
                score += LANGUAGE_BOOST;
            }
            (score, song)
        })
        .collect();

    // sort_by is stable: equal scores preserve upstream ranking
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored.into_iter().map(|(_, song)| song).collect()
}
