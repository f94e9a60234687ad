//! SQLite-backed durable artist-page cache.

use super::durable::{ArtistPageEntry, DurableArtistCache};
use super::schema::ARTIST_CACHE_VERSIONED_SCHEMAS;
use crate::model::ArtistProfile;
use crate::sqlite_persistence::migrate_if_needed;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Durable artist-page cache stored in its own SQLite file.
#[derive(Clone)]
pub struct SqliteArtistCache {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
}

impl SqliteArtistCache {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open artist cache database")?;

        migrate_if_needed(
            &mut write_conn,
            ARTIST_CACHE_VERSIONED_SCHEMAS,
            "artist cache",
        )?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on artist cache write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open artist cache database for reading")?;

        read_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on artist cache read connection")?;

        let rows: usize =
            read_conn.query_row("SELECT COUNT(*) FROM artist_pages", [], |r| r.get(0))?;
        info!("Artist cache ready: {} pages stored", rows);

        Ok(Self {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
        })
    }
}

impl DurableArtistCache for SqliteArtistCache {
    fn get_artist_page(&self, key: &str) -> Result<Option<ArtistPageEntry>> {
        let conn = self.read_conn.lock().unwrap();
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT payload, cached_at FROM artist_pages WHERE cache_key = ?1",
                params![key],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()
            .context("Failed to read artist page")?;

        let Some((payload, cached_at_ms)) = row else {
            return Ok(None);
        };

        let profile: ArtistProfile = match serde_json::from_str(&payload) {
            Ok(profile) => profile,
            Err(e) => {
                // A malformed row is useless as a fallback, treat as a miss
                warn!("Malformed artist page payload for {}: {}", key, e);
                return Ok(None);
            }
        };

        Ok(Some(ArtistPageEntry {
            cache_key: key.to_string(),
            profile,
            cached_at_ms,
        }))
    }

    fn upsert_artist_page(&self, entry: &ArtistPageEntry) -> Result<()> {
        let payload =
            serde_json::to_string(&entry.profile).context("Failed to serialize artist page")?;
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO artist_pages (cache_key, payload, cached_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(cache_key) DO UPDATE SET payload = ?2, cached_at = ?3",
            params![entry.cache_key, payload, entry.cached_at_ms],
        )
        .context("Failed to upsert artist page")?;
        Ok(())
    }

    fn delete_artist_page(&self, key: &str) -> Result<usize> {
        let conn = self.write_conn.lock().unwrap();
        let removed = conn
            .execute("DELETE FROM artist_pages WHERE cache_key = ?1", params![key])
            .context("Failed to delete artist page")?;
        Ok(removed)
    }

    fn purge_old_cache(&self, older_than_epoch_ms: i64) -> Result<usize> {
        let conn = self.write_conn.lock().unwrap();
        let removed = conn
            .execute(
                "DELETE FROM artist_pages WHERE cached_at < ?1",
                params![older_than_epoch_ms],
            )
            .context("Failed to purge old artist pages")?;
        Ok(removed)
    }
}
