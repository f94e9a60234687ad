//! Quick-picks candidate scoring and assembly.
//!
//! The repository layer gathers familiar and discovery candidate pools;
//! this engine merges, scores and interleaves them into the final list.

use crate::cache::canonical_artist_name;
use crate::config::QuickPicksSettings;
use crate::genres::GenreCatalog;
use crate::model::{ScoredCandidate, UserTasteProfile};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

/// Session seed: stable for the lifetime of one cache window, different
/// across windows and regions. Assembly output is reproducible in tests
/// by fixing the seed.
pub fn session_seed(region_code: &str, now_ms: i64, ttl_ms: i64) -> u64 {
    let time_bucket = if ttl_ms > 0 { now_ms / ttl_ms } else { 0 };
    let mut hasher = DefaultHasher::new();
    region_code.hash(&mut hasher);
    time_bucket.hash(&mut hasher);
    hasher.finish()
}

pub struct QuickPicksEngine {
    settings: QuickPicksSettings,
}

impl QuickPicksEngine {
    pub fn new(settings: QuickPicksSettings) -> Self {
        Self { settings }
    }

    /// Merge the candidate pools: drop candidates by skipped artists,
    /// drop anything the user has already played, deduplicate by song id
    /// (first occurrence wins).
    pub fn merge_pools(
        &self,
        familiar: Vec<ScoredCandidate>,
        discovery: Vec<ScoredCandidate>,
        skipped_artists: &HashSet<String>,
        played_song_ids: &HashSet<String>,
    ) -> Vec<ScoredCandidate> {
        let mut seen_ids = HashSet::new();
        familiar
            .into_iter()
            .chain(discovery)
            .filter(|c| {
                // Familiar candidates are played by definition; the
                // played-ids filter only guards the discovery pools
                if !c.is_familiar && played_song_ids.contains(&c.song.id) {
                    return false;
                }
                !skipped_artists.contains(&canonical_artist_name(&c.song.artist))
            })
            .filter(|c| seen_ids.insert(c.song.id.clone()))
            .collect()
    }

    /// Weighted final score: source score plus genre/artist/language
    /// matches against the taste profile.
    pub fn score_candidates(
        &self,
        mut candidates: Vec<ScoredCandidate>,
        taste: &UserTasteProfile,
        catalog: &GenreCatalog,
    ) -> Vec<ScoredCandidate> {
        let s = &self.settings;
        let top_artists: HashSet<String> = taste
            .top_artists
            .iter()
            .map(|a| canonical_artist_name(a))
            .collect();
        let top_genres: HashSet<&str> = taste.top_genres.iter().map(String::as_str).collect();
        let languages: HashSet<&str> = taste
            .preferred_languages
            .iter()
            .map(String::as_str)
            .collect();

        for candidate in &mut candidates {
            let artist = &candidate.song.artist;
            let genre_match = catalog
                .genres_for(artist)
                .iter()
                .any(|g| top_genres.contains(g.as_str()));
            let artist_match = top_artists.contains(&canonical_artist_name(artist));
            let language_match = catalog
                .language_for(artist)
                .map(|lang| languages.contains(lang))
                .unwrap_or(false);

            candidate.inferred_genre = catalog.infer_genre(artist);
            candidate.final_score = s.source_weight * candidate.source_score
                + s.genre_weight * f64::from(genre_match as u8)
                + s.artist_weight * f64::from(artist_match as u8)
                + s.language_weight * f64::from(language_match as u8);
        }
        candidates
    }

    /// Interleave familiar and discovery candidates so discovery content
    /// keeps a guaranteed share even when familiar candidates outscore
    /// it, cap songs per artist, truncate to `limit`, then apply the
    /// session-deterministic shuffle.
    pub fn assemble(
        &self,
        candidates: Vec<ScoredCandidate>,
        limit: usize,
        seed: u64,
    ) -> Vec<ScoredCandidate> {
        let s = &self.settings;

        let (mut familiar, mut discovery): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|c| c.is_familiar);
        // Stable sorts keep pool-internal order deterministic for ties
        familiar.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        discovery.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut familiar = familiar.into_iter().peekable();
        let mut discovery = discovery.into_iter().peekable();
        let mut per_artist: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<ScoredCandidate> = Vec::with_capacity(limit);

        let mut push_capped = |out: &mut Vec<ScoredCandidate>,
                               per_artist: &mut HashMap<String, usize>,
                               candidate: ScoredCandidate| {
            let key = canonical_artist_name(&candidate.song.artist);
            let count = per_artist.entry(key).or_insert(0);
            if *count < s.artist_cap {
                *count += 1;
                out.push(candidate);
            }
        };

        while out.len() < limit && (familiar.peek().is_some() || discovery.peek().is_some()) {
            for _ in 0..s.interleave_familiar {
                if out.len() >= limit {
                    break;
                }
                if let Some(candidate) = familiar.next() {
                    push_capped(&mut out, &mut per_artist, candidate);
                }
            }
            for _ in 0..s.interleave_discovery {
                if out.len() >= limit {
                    break;
                }
                if let Some(candidate) = discovery.next() {
                    push_capped(&mut out, &mut per_artist, candidate);
                }
            }
        }

        let mut rng = StdRng::seed_from_u64(seed);
        out.shuffle(&mut rng);
        out
    }
}
