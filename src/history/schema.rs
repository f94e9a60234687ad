//! SQLite schema definitions for the playback-history database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

/// Play-event log, pruned to a bounded row count oldest-first.
const PLAY_EVENTS_TABLE: Table = Table {
    name: "play_events",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("song_id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("thumbnail_url", &SqlType::Text),
        sqlite_column!("played_at", &SqlType::Integer, non_null = true), // epoch ms
        sqlite_column!("play_duration_seconds", &SqlType::Integer, non_null = true),
        sqlite_column!("total_duration_seconds", &SqlType::Integer, non_null = true),
        sqlite_column!("completed", &SqlType::Integer, non_null = true, default_value = Some("0")),
    ],
    indices: &[
        ("idx_play_events_played_at", "played_at"),
        ("idx_play_events_song_id", "song_id"),
        ("idx_play_events_artist", "artist"),
    ],
};

/// Artists the user follows, keyed by canonical name.
const FOLLOWED_ARTISTS_TABLE: Table = Table {
    name: "followed_artists",
    columns: &[
        sqlite_column!("name", &SqlType::Text, is_primary_key = true),
        sqlite_column!("followed_at", &SqlType::Integer, non_null = true), // epoch ms
    ],
    indices: &[],
};

pub const HISTORY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[PLAY_EVENTS_TABLE, FOLLOWED_ARTISTS_TABLE],
    migration: None,
}];
