//! Shared artist → genre/language reference catalog.
//!
//! One injectable lookup consumed by every scoring engine, replacing the
//! per-engine literal tables the engines would otherwise each carry. The
//! embedded table is reference data with its own version string; callers
//! can supply their own entries (e.g. fetched from an updates channel).

use crate::cache::canonical_artist_name;
use std::collections::HashMap;

/// Version of the embedded reference table.
pub const GENRE_CATALOG_VERSION: &str = "2025-07";

struct ReferenceEntry {
    artist: &'static str,
    genres: &'static [&'static str],
    language: &'static str,
}

const REFERENCE_ENTRIES: &[ReferenceEntry] = &[
    // Western pop / rock
    ReferenceEntry { artist: "taylor swift", genres: &["pop", "country"], language: "english" },
    ReferenceEntry { artist: "dua lipa", genres: &["pop", "dance"], language: "english" },
    ReferenceEntry { artist: "ed sheeran", genres: &["pop", "acoustic"], language: "english" },
    ReferenceEntry { artist: "billie eilish", genres: &["pop", "alternative"], language: "english" },
    ReferenceEntry { artist: "the weeknd", genres: &["rnb", "pop"], language: "english" },
    ReferenceEntry { artist: "ariana grande", genres: &["pop", "rnb"], language: "english" },
    ReferenceEntry { artist: "coldplay", genres: &["rock", "alternative"], language: "english" },
    ReferenceEntry { artist: "imagine dragons", genres: &["rock", "pop"], language: "english" },
    ReferenceEntry { artist: "arctic monkeys", genres: &["rock", "indie"], language: "english" },
    ReferenceEntry { artist: "linkin park", genres: &["rock", "metal"], language: "english" },
    ReferenceEntry { artist: "radiohead", genres: &["rock", "alternative"], language: "english" },
    ReferenceEntry { artist: "tame impala", genres: &["indie", "psychedelic"], language: "english" },
    // Hip hop
    ReferenceEntry { artist: "drake", genres: &["hiphop", "rnb"], language: "english" },
    ReferenceEntry { artist: "kendrick lamar", genres: &["hiphop"], language: "english" },
    ReferenceEntry { artist: "travis scott", genres: &["hiphop", "trap"], language: "english" },
    ReferenceEntry { artist: "eminem", genres: &["hiphop", "rap"], language: "english" },
    ReferenceEntry { artist: "j. cole", genres: &["hiphop"], language: "english" },
    // Electronic
    ReferenceEntry { artist: "daft punk", genres: &["electronic", "house"], language: "english" },
    ReferenceEntry { artist: "calvin harris", genres: &["electronic", "dance"], language: "english" },
    ReferenceEntry { artist: "avicii", genres: &["electronic", "dance"], language: "english" },
    ReferenceEntry { artist: "marshmello", genres: &["electronic", "dance"], language: "english" },
    // Bollywood / Indian
    ReferenceEntry { artist: "arijit singh", genres: &["bollywood", "romantic"], language: "hindi" },
    ReferenceEntry { artist: "shreya ghoshal", genres: &["bollywood", "classical"], language: "hindi" },
    ReferenceEntry { artist: "a.r. rahman", genres: &["bollywood", "soundtrack"], language: "hindi" },
    ReferenceEntry { artist: "pritam", genres: &["bollywood"], language: "hindi" },
    ReferenceEntry { artist: "atif aslam", genres: &["bollywood", "pop"], language: "hindi" },
    ReferenceEntry { artist: "kishore kumar", genres: &["bollywood", "classic"], language: "hindi" },
    ReferenceEntry { artist: "lata mangeshkar", genres: &["bollywood", "classic"], language: "hindi" },
    ReferenceEntry { artist: "diljit dosanjh", genres: &["punjabi", "pop"], language: "punjabi" },
    ReferenceEntry { artist: "sidhu moose wala", genres: &["punjabi", "hiphop"], language: "punjabi" },
    ReferenceEntry { artist: "anirudh ravichander", genres: &["kollywood", "soundtrack"], language: "tamil" },
    // K-pop / J-pop
    ReferenceEntry { artist: "bts", genres: &["kpop", "pop"], language: "korean" },
    ReferenceEntry { artist: "blackpink", genres: &["kpop", "pop"], language: "korean" },
    ReferenceEntry { artist: "newjeans", genres: &["kpop", "pop"], language: "korean" },
    ReferenceEntry { artist: "twice", genres: &["kpop", "pop"], language: "korean" },
    ReferenceEntry { artist: "yoasobi", genres: &["jpop"], language: "japanese" },
    ReferenceEntry { artist: "kenshi yonezu", genres: &["jpop"], language: "japanese" },
    // Latin
    ReferenceEntry { artist: "bad bunny", genres: &["reggaeton", "latin"], language: "spanish" },
    ReferenceEntry { artist: "shakira", genres: &["latin", "pop"], language: "spanish" },
    ReferenceEntry { artist: "j balvin", genres: &["reggaeton", "latin"], language: "spanish" },
    ReferenceEntry { artist: "karol g", genres: &["reggaeton", "latin"], language: "spanish" },
    ReferenceEntry { artist: "rosalia", genres: &["flamenco", "pop"], language: "spanish" },
    // Misc
    ReferenceEntry { artist: "burna boy", genres: &["afrobeats"], language: "english" },
    ReferenceEntry { artist: "wizkid", genres: &["afrobeats"], language: "english" },
    ReferenceEntry { artist: "stromae", genres: &["pop", "electronic"], language: "french" },
    ReferenceEntry { artist: "indila", genres: &["pop"], language: "french" },
    ReferenceEntry { artist: "rammstein", genres: &["metal", "industrial"], language: "german" },
    ReferenceEntry { artist: "hans zimmer", genres: &["soundtrack", "orchestral"], language: "english" },
    ReferenceEntry { artist: "ludovico einaudi", genres: &["classical", "piano"], language: "english" },
];

/// Fallback genre for artists the catalog doesn't know.
pub const UNKNOWN_GENRE: &str = "unknown";

struct CatalogEntry {
    genres: Vec<String>,
    language: String,
}

/// Artist → genre/language lookup keyed by canonical artist name.
pub struct GenreCatalog {
    version: String,
    entries: HashMap<String, CatalogEntry>,
}

impl GenreCatalog {
    /// Catalog backed by the embedded reference table.
    pub fn embedded() -> Self {
        let entries = REFERENCE_ENTRIES
            .iter()
            .map(|entry| {
                (
                    entry.artist.to_string(),
                    CatalogEntry {
                        genres: entry.genres.iter().map(|g| g.to_string()).collect(),
                        language: entry.language.to_string(),
                    },
                )
            })
            .collect();
        Self {
            version: GENRE_CATALOG_VERSION.to_string(),
            entries,
        }
    }

    /// Catalog from caller-supplied `(artist, genres, language)` rows.
    pub fn with_entries(
        version: impl Into<String>,
        rows: Vec<(String, Vec<String>, String)>,
    ) -> Self {
        let entries = rows
            .into_iter()
            .map(|(artist, genres, language)| {
                (
                    canonical_artist_name(&artist),
                    CatalogEntry { genres, language },
                )
            })
            .collect();
        Self {
            version: version.into(),
            entries,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn genres_for(&self, artist: &str) -> &[String] {
        self.entries
            .get(&canonical_artist_name(artist))
            .map(|e| e.genres.as_slice())
            .unwrap_or(&[])
    }

    pub fn language_for(&self, artist: &str) -> Option<&str> {
        self.entries
            .get(&canonical_artist_name(artist))
            .map(|e| e.language.as_str())
    }

    /// Primary genre for an artist, or [`UNKNOWN_GENRE`].
    pub fn infer_genre(&self, artist: &str) -> String {
        self.genres_for(artist)
            .first()
            .cloned()
            .unwrap_or_else(|| UNKNOWN_GENRE.to_string())
    }
}

impl Default for GenreCatalog {
    fn default() -> Self {
        Self::embedded()
    }
}
