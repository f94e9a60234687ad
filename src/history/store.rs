//! SQLite-backed playback-history store.

use super::models::{
    CompletionStats, HourlyPlayback, ListenAgainStats, PlaybackEvent, TopArtist,
};
use super::schema::HISTORY_VERSIONED_SCHEMAS;
use super::trait_def::PlaybackHistoryStore;
use crate::cache::canonical_artist_name;
use crate::clock::SharedClock;
use crate::config::HistorySettings;
use crate::model::Song;
use crate::sqlite_persistence::migrate_if_needed;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// A play shorter than this that didn't complete counts as a skip.
const SKIP_PLAY_MAX_SECONDS: u32 = 10;
/// Skip-dominant artists need at least this many skips to be flagged.
const SKIPPED_ARTIST_MIN_SKIPS: u32 = 3;
/// Qualified listen: at least this many seconds played...
const QUALIFIED_LISTEN_MIN_SECONDS: u32 = 30;
/// Rediscovery candidates need at least this many lifetime plays.
const REDISCOVERY_MIN_PLAYS: u32 = 3;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const SKIPPED_ARTIST_WINDOW_MS: i64 = 30 * DAY_MS;
const REDISCOVERY_DORMANT_MS: i64 = 30 * DAY_MS;

/// SQLite-backed play-event log.
#[derive(Clone)]
pub struct SqlitePlaybackHistory {
    read_conn: Arc<Mutex<Connection>>,
    write_conn: Arc<Mutex<Connection>>,
    max_history_rows: usize,
    clock: SharedClock,
}

impl SqlitePlaybackHistory {
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        settings: &HistorySettings,
        clock: SharedClock,
    ) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open history database")?;

        migrate_if_needed(&mut write_conn, HISTORY_VERSIONED_SCHEMAS, "history")?;

        write_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on history write connection")?;

        let read_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open history database for reading")?;

        read_conn
            .pragma_update(None, "journal_mode", "WAL")
            .context("Failed to set WAL mode on history read connection")?;

        let rows: usize =
            read_conn.query_row("SELECT COUNT(*) FROM play_events", [], |r| r.get(0))?;
        info!("Playback history ready: {} events on record", rows);

        Ok(Self {
            read_conn: Arc::new(Mutex::new(read_conn)),
            write_conn: Arc::new(Mutex::new(write_conn)),
            max_history_rows: settings.max_history_rows,
            clock,
        })
    }
}

impl PlaybackHistoryStore for SqlitePlaybackHistory {
    fn record_event(&self, event: &PlaybackEvent) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO play_events
                (song_id, title, artist, thumbnail_url, played_at,
                 play_duration_seconds, total_duration_seconds, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.song_id,
                event.title,
                event.artist,
                event.thumbnail_url,
                event.played_at_ms,
                event.play_duration_seconds,
                event.total_duration_seconds,
                event.completed as i64,
            ],
        )
        .context("Failed to record play event")?;

        let pruned = conn
            .execute(
                "DELETE FROM play_events WHERE id NOT IN
                    (SELECT id FROM play_events ORDER BY played_at DESC, id DESC LIMIT ?1)",
                params![self.max_history_rows as i64],
            )
            .context("Failed to prune play events")?;
        if pruned > 0 {
            debug!("Pruned {} old play events", pruned);
        }
        Ok(())
    }

    fn get_top_artists_by_play_count(&self, n: usize) -> Result<Vec<TopArtist>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT MAX(artist), COUNT(*) AS plays
             FROM play_events
             GROUP BY lower(trim(artist))
             ORDER BY plays DESC
             LIMIT ?1",
        )?;
        let artists = stmt
            .query_map(params![n as i64], |row| {
                Ok(TopArtist {
                    name: row.get(0)?,
                    play_count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(artists)
    }

    fn get_playback_by_hour(&self) -> Result<Vec<HourlyPlayback>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT CAST(strftime('%H', played_at / 1000, 'unixepoch', 'localtime') AS INTEGER)
                    AS hour,
                    COUNT(*)
             FROM play_events
             GROUP BY hour
             ORDER BY hour",
        )?;
        let hours = stmt
            .query_map([], |row| {
                Ok(HourlyPlayback {
                    hour: row.get::<_, i64>(0)? as u8,
                    count: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(hours)
    }

    fn get_completion_stats(&self) -> Result<CompletionStats> {
        let conn = self.read_conn.lock().unwrap();
        let (completed, total): (i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(completed), 0), COUNT(*) FROM play_events",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok(CompletionStats {
            completed: completed as u64,
            total: total as u64,
        })
    }

    fn get_average_play_duration_ms(&self) -> Result<i64> {
        let conn = self.read_conn.lock().unwrap();
        let avg_ms: i64 = conn.query_row(
            "SELECT CAST(COALESCE(AVG(play_duration_seconds), 0) * 1000 AS INTEGER)
             FROM play_events",
            [],
            |r| r.get(0),
        )?;
        Ok(avg_ms)
    }

    fn get_recent_song_ids(&self, n: usize) -> Result<Vec<String>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT song_id, MAX(played_at) AS last_played
             FROM play_events
             GROUP BY song_id
             ORDER BY last_played DESC
             LIMIT ?1",
        )?;
        let ids = stmt
            .query_map(params![n as i64], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(ids)
    }

    fn get_all_played_song_ids(&self) -> Result<HashSet<String>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT DISTINCT song_id FROM play_events")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(ids)
    }

    fn get_skipped_artists(&self) -> Result<HashSet<String>> {
        let since = self.clock.now_millis() - SKIPPED_ARTIST_WINDOW_MS;
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT lower(trim(artist)) AS artist_key,
                    SUM(CASE WHEN completed = 0 AND play_duration_seconds < ?2
                        THEN 1 ELSE 0 END) AS skips,
                    COUNT(*) AS total
             FROM play_events
             WHERE played_at >= ?1
             GROUP BY artist_key
             HAVING skips >= ?3 AND skips * 2 > total",
        )?;
        let artists = stmt
            .query_map(
                params![since, SKIP_PLAY_MAX_SECONDS, SKIPPED_ARTIST_MIN_SKIPS],
                |row| row.get::<_, String>(0),
            )?
            .map(|r| r.map(|name| canonical_artist_name(&name)))
            .collect::<std::result::Result<_, _>>()?;
        Ok(artists)
    }

    fn get_listen_again_raw_stats(
        &self,
        since_90d_ms: i64,
        since_30d_ms: i64,
        since_7d_ms: i64,
        utc_offset_ms: i64,
    ) -> Result<Vec<ListenAgainStats>> {
        let since_14d_ms = since_7d_ms - 7 * DAY_MS;
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT
                song_id,
                MAX(title),
                MAX(artist),
                MAX(thumbnail_url),
                MAX(played_at) AS last_played_at,
                SUM(CASE WHEN played_at >= ?1 THEN 1 ELSE 0 END) AS play_count_90d,
                SUM(CASE WHEN played_at >= ?2 THEN 1 ELSE 0 END) AS play_count_30d,
                SUM(CASE WHEN played_at >= ?3 THEN 1 ELSE 0 END) AS play_count_7d,
                SUM(CASE WHEN played_at >= ?4 AND played_at < ?3 THEN 1 ELSE 0 END)
                    AS play_count_7d_prior,
                SUM(CASE WHEN played_at >= ?1 AND completed = 1 THEN 1 ELSE 0 END)
                    AS completed_count,
                COUNT(*) AS total_plays,
                SUM(CASE WHEN played_at >= ?2 AND completed = 0
                         AND play_duration_seconds < ?6 THEN 1 ELSE 0 END) AS skip_count_30d,
                SUM(CASE WHEN played_at >= ?1
                         AND (play_duration_seconds >= ?7
                              OR play_duration_seconds * 2 >= total_duration_seconds)
                    THEN 1 ELSE 0 END) AS qualified_listen_count,
                GROUP_CONCAT(CASE WHEN played_at >= ?1 THEN
                    CASE
                        WHEN CAST(strftime('%H', (played_at + ?5) / 1000, 'unixepoch')
                            AS INTEGER) BETWEEN 5 AND 11 THEN 'morning'
                        WHEN CAST(strftime('%H', (played_at + ?5) / 1000, 'unixepoch')
                            AS INTEGER) BETWEEN 12 AND 16 THEN 'afternoon'
                        WHEN CAST(strftime('%H', (played_at + ?5) / 1000, 'unixepoch')
                            AS INTEGER) BETWEEN 17 AND 21 THEN 'evening'
                        ELSE 'night'
                    END
                END, '|') AS time_of_day_raw,
                GROUP_CONCAT(CASE WHEN played_at >= ?1 THEN
                    CASE CAST(strftime('%w', (played_at + ?5) / 1000, 'unixepoch') AS INTEGER)
                        WHEN 0 THEN 'sun' WHEN 1 THEN 'mon' WHEN 2 THEN 'tue'
                        WHEN 3 THEN 'wed' WHEN 4 THEN 'thu' WHEN 5 THEN 'fri'
                        ELSE 'sat'
                    END
                END, '|') AS day_of_week_raw
             FROM play_events
             GROUP BY song_id
             HAVING play_count_90d > 0
             ORDER BY last_played_at DESC",
        )?;

        let stats = stmt
            .query_map(
                params![
                    since_90d_ms,
                    since_30d_ms,
                    since_7d_ms,
                    since_14d_ms,
                    utc_offset_ms,
                    SKIP_PLAY_MAX_SECONDS,
                    QUALIFIED_LISTEN_MIN_SECONDS,
                ],
                |row| {
                    Ok(ListenAgainStats {
                        song_id: row.get(0)?,
                        title: row.get(1)?,
                        artist: row.get(2)?,
                        thumbnail_url: row.get(3)?,
                        last_played_at_ms: row.get(4)?,
                        play_count_90d: row.get::<_, i64>(5)? as u32,
                        play_count_30d: row.get::<_, i64>(6)? as u32,
                        play_count_7d: row.get::<_, i64>(7)? as u32,
                        play_count_7d_prior: row.get::<_, i64>(8)? as u32,
                        completed_count: row.get::<_, i64>(9)? as u32,
                        total_plays: row.get::<_, i64>(10)? as u32,
                        skip_count_30d: row.get::<_, i64>(11)? as u32,
                        qualified_listen_count: row.get::<_, i64>(12)? as u32,
                        time_of_day_raw: row.get::<_, Option<String>>(13)?.unwrap_or_default(),
                        day_of_week_raw: row.get::<_, Option<String>>(14)?.unwrap_or_default(),
                    })
                },
            )?
            .collect::<std::result::Result<_, _>>()?;
        Ok(stats)
    }

    fn get_rediscovery_candidates(&self, n: usize) -> Result<Vec<Song>> {
        let dormant_before = self.clock.now_millis() - REDISCOVERY_DORMANT_MS;
        let conn = self.read_conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT song_id, MAX(title), MAX(artist), MAX(thumbnail_url),
                    COUNT(*) AS plays, MAX(played_at) AS last_played
             FROM play_events
             GROUP BY song_id
             HAVING plays >= ?2 AND last_played < ?3
             ORDER BY plays DESC
             LIMIT ?1",
        )?;
        let songs = stmt
            .query_map(
                params![n as i64, REDISCOVERY_MIN_PLAYS, dormant_before],
                |row| {
                    let mut song = Song::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    );
                    song.thumbnail_url = row.get(3)?;
                    Ok(song)
                },
            )?
            .collect::<std::result::Result<_, _>>()?;
        Ok(songs)
    }

    fn get_followed_artists(&self) -> Result<Vec<String>> {
        let conn = self.read_conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT name FROM followed_artists ORDER BY followed_at DESC")?;
        let artists = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(artists)
    }

    fn set_artist_followed(&self, name: &str, followed: bool) -> Result<()> {
        let key = canonical_artist_name(name);
        let conn = self.write_conn.lock().unwrap();
        if followed {
            conn.execute(
                "INSERT INTO followed_artists (name, followed_at) VALUES (?1, ?2)
                 ON CONFLICT(name) DO NOTHING",
                params![key, self.clock.now_millis()],
            )
            .context("Failed to follow artist")?;
        } else {
            conn.execute("DELETE FROM followed_artists WHERE name = ?1", params![key])
                .context("Failed to unfollow artist")?;
        }
        Ok(())
    }
}
