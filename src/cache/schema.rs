//! SQLite schema for the durable artist-page cache.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// Artist pages, one row per canonical cache key. The same profile is
/// fanned out under its `browse:` and `name:` keys.
const ARTIST_PAGES_TABLE: Table = Table {
    name: "artist_pages",
    columns: &[
        sqlite_column!("cache_key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("payload", &SqlType::Text, non_null = true), // JSON ArtistProfile
        sqlite_column!("cached_at", &SqlType::Integer, non_null = true), // epoch ms
    ],
    indices: &[("idx_artist_pages_cached_at", "cached_at")],
};

pub const ARTIST_CACHE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ARTIST_PAGES_TABLE],
    migration: None,
}];
