mod file_config;

pub use file_config::{
    CachesConfig, FileConfig, HistoryConfig, ListenAgainConfig, QuickPicksConfig, RegionConfig,
    RetryConfig,
};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Retry behavior for remote calls.
#[derive(Debug, Clone)]
pub struct RetrySettings {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// First backoff delay; doubles on each subsequent attempt.
    pub initial_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }
}

/// Per-feature TTLs and staleness horizons, all in milliseconds.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub artist_page_ttl_ms: i64,
    pub artist_section_ttl_ms: i64,
    pub album_songs_ttl_ms: i64,
    /// Maximum age at which an expired entry is still served as a stale
    /// fallback after a remote failure.
    pub stale_tolerance_ms: i64,
    /// Durable rows older than this are deleted on each write.
    pub durable_purge_horizon_ms: i64,
    pub quick_picks_ttl_ms: i64,
    pub search_ttl_ms: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            artist_page_ttl_ms: 30 * MINUTE_MS,
            artist_section_ttl_ms: 60 * MINUTE_MS,
            album_songs_ttl_ms: 60 * MINUTE_MS,
            stale_tolerance_ms: 24 * HOUR_MS,
            durable_purge_horizon_ms: 7 * DAY_MS,
            quick_picks_ttl_ms: 6 * HOUR_MS,
            search_ttl_ms: 5 * MINUTE_MS,
        }
    }
}

/// Playback history retention.
#[derive(Debug, Clone)]
pub struct HistorySettings {
    /// Hard row cap on the play-event log; oldest rows are pruned first.
    pub max_history_rows: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_history_rows: 10_000,
        }
    }
}

/// Listen-again eligibility thresholds and score weights.
///
/// The thresholds were tuned by hand; they are exposed here so property
/// tests pin the chosen values instead of an inferred ideal.
#[derive(Debug, Clone)]
pub struct ListenAgainSettings {
    /// Minimum qualified listens within the lookback window.
    pub min_qualified_listens: u32,
    /// A listen qualifies at this many seconds of playback...
    pub qualified_listen_min_seconds: u32,
    /// ...or at this fraction of the track, whichever comes first.
    pub qualified_listen_min_ratio: f64,
    /// Lookback window for eligibility.
    pub lookback_days: u32,
    /// Recency decay half-life in days.
    pub recency_half_life_days: f64,
    /// Maximum songs per normalized artist name in the final list.
    pub artist_cap: usize,
    pub recency_weight: f64,
    pub frequency_weight: f64,
    pub completion_weight: f64,
    /// Bonus when the candidate's time-of-day peak matches the caller's.
    pub time_affinity_bonus: f64,
    /// Bonus when the candidate's day-of-week peak matches the caller's.
    pub day_affinity_bonus: f64,
}

impl Default for ListenAgainSettings {
    fn default() -> Self {
        Self {
            min_qualified_listens: 2,
            qualified_listen_min_seconds: 30,
            qualified_listen_min_ratio: 0.5,
            lookback_days: 90,
            recency_half_life_days: 14.0,
            artist_cap: 2,
            recency_weight: 0.4,
            frequency_weight: 0.3,
            completion_weight: 0.2,
            time_affinity_bonus: 0.15,
            day_affinity_bonus: 0.1,
        }
    }
}

/// Quick-picks candidate sourcing, scoring weights and assembly shape.
#[derive(Debug, Clone)]
pub struct QuickPicksSettings {
    /// Familiar-pool size drawn from the listen-again engine.
    pub familiar_pool_size: usize,
    /// Rank-decayed familiar source scores never drop below this floor.
    pub familiar_score_floor: f64,
    /// Top artists mined for unplayed deep cuts.
    pub deep_cut_artists: usize,
    /// Songs fetched per deep-cut artist search.
    pub deep_cut_fetch_limit: usize,
    /// Recent/most-played songs used as recommendation seeds.
    pub seed_songs: usize,
    /// Songs fetched per recommendation seed.
    pub seed_fetch_limit: usize,
    /// Flat base score assigned to regional trending candidates.
    pub trending_base_score: f64,
    pub source_weight: f64,
    pub genre_weight: f64,
    pub artist_weight: f64,
    pub language_weight: f64,
    /// Familiar candidates taken per interleave round...
    pub interleave_familiar: usize,
    /// ...followed by this many discovery candidates.
    pub interleave_discovery: usize,
    /// Maximum songs per normalized artist in the assembled list.
    pub artist_cap: usize,
}

impl Default for QuickPicksSettings {
    fn default() -> Self {
        Self {
            familiar_pool_size: 50,
            familiar_score_floor: 0.2,
            deep_cut_artists: 3,
            deep_cut_fetch_limit: 15,
            seed_songs: 2,
            seed_fetch_limit: 15,
            trending_base_score: 0.6,
            source_weight: 0.5,
            genre_weight: 0.2,
            artist_weight: 0.2,
            language_weight: 0.1,
            interleave_familiar: 2,
            interleave_discovery: 1,
            artist_cap: 2,
        }
    }
}

/// Region resolution endpoints and session cache TTL.
#[derive(Debug, Clone)]
pub struct RegionSettings {
    pub primary_geo_url: String,
    pub secondary_geo_url: String,
    pub cache_ttl_ms: i64,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            primary_geo_url: "http://ip-api.com/json".to_string(),
            secondary_geo_url: "https://ipapi.co/json".to_string(),
            cache_ttl_ms: 5 * MINUTE_MS,
        }
    }
}

/// Resolved settings for the whole core.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub retry: RetrySettings,
    pub caches: CacheSettings,
    pub history: HistorySettings,
    pub listen_again: ListenAgainSettings,
    pub quick_picks: QuickPicksSettings,
    pub region: RegionSettings,
}

impl AppSettings {
    /// Resolve settings from an optional TOML file config. File values
    /// override defaults where present; everything else keeps its default.
    pub fn resolve(file_config: Option<FileConfig>) -> Self {
        let file = file_config.unwrap_or_default();
        let mut settings = AppSettings::default();

        if let Some(retry) = file.retry {
            if let Some(v) = retry.max_retries {
                settings.retry.max_retries = v;
            }
            if let Some(v) = retry.initial_delay_ms {
                settings.retry.initial_delay_ms = v;
            }
        }

        if let Some(caches) = file.caches {
            if let Some(v) = caches.artist_page_ttl_mins {
                settings.caches.artist_page_ttl_ms = v as i64 * MINUTE_MS;
            }
            if let Some(v) = caches.artist_section_ttl_mins {
                settings.caches.artist_section_ttl_ms = v as i64 * MINUTE_MS;
            }
            if let Some(v) = caches.album_songs_ttl_mins {
                settings.caches.album_songs_ttl_ms = v as i64 * MINUTE_MS;
            }
            if let Some(v) = caches.stale_tolerance_hours {
                settings.caches.stale_tolerance_ms = v as i64 * HOUR_MS;
            }
            if let Some(v) = caches.durable_purge_horizon_days {
                settings.caches.durable_purge_horizon_ms = v as i64 * DAY_MS;
            }
            if let Some(v) = caches.quick_picks_ttl_hours {
                settings.caches.quick_picks_ttl_ms = v as i64 * HOUR_MS;
            }
            if let Some(v) = caches.search_ttl_mins {
                settings.caches.search_ttl_ms = v as i64 * MINUTE_MS;
            }
        }

        if let Some(history) = file.history {
            if let Some(v) = history.max_history_rows {
                settings.history.max_history_rows = v;
            }
        }

        if let Some(listen_again) = file.listen_again {
            if let Some(v) = listen_again.min_qualified_listens {
                settings.listen_again.min_qualified_listens = v;
            }
            if let Some(v) = listen_again.artist_cap {
                settings.listen_again.artist_cap = v;
            }
        }

        if let Some(quick_picks) = file.quick_picks {
            if let Some(v) = quick_picks.familiar_pool_size {
                settings.quick_picks.familiar_pool_size = v;
            }
            if let Some(v) = quick_picks.deep_cut_artists {
                settings.quick_picks.deep_cut_artists = v;
            }
            if let Some(v) = quick_picks.seed_songs {
                settings.quick_picks.seed_songs = v;
            }
            if let Some(v) = quick_picks.artist_cap {
                settings.quick_picks.artist_cap = v;
            }
        }

        if let Some(region) = file.region {
            if let Some(v) = region.primary_geo_url {
                settings.region.primary_geo_url = v;
            }
            if let Some(v) = region.secondary_geo_url {
                settings.region.secondary_geo_url = v;
            }
            if let Some(v) = region.cache_ttl_mins {
                settings.region.cache_ttl_ms = v as i64 * MINUTE_MS;
            }
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_ttls() {
        let settings = AppSettings::default();

        assert_eq!(settings.caches.artist_page_ttl_ms, 30 * 60 * 1000);
        assert_eq!(settings.caches.artist_section_ttl_ms, 60 * 60 * 1000);
        assert_eq!(settings.caches.album_songs_ttl_ms, 60 * 60 * 1000);
        assert_eq!(settings.caches.stale_tolerance_ms, 24 * 60 * 60 * 1000);
        assert_eq!(
            settings.caches.durable_purge_horizon_ms,
            7 * 24 * 60 * 60 * 1000
        );
        assert_eq!(settings.caches.quick_picks_ttl_ms, 6 * 60 * 60 * 1000);
        assert_eq!(settings.caches.search_ttl_ms, 5 * 60 * 1000);
    }

    #[test]
    fn test_retry_defaults() {
        let settings = RetrySettings::default();
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.initial_delay_ms, 1000);
    }

    #[test]
    fn test_quick_picks_weights_sum_to_one() {
        let qp = QuickPicksSettings::default();
        let sum = qp.source_weight + qp.genre_weight + qp.artist_weight + qp.language_weight;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_overrides_from_file() {
        let file: FileConfig = toml::from_str(
            r#"
            [retry]
            max_retries = 5
            initial_delay_ms = 250

            [caches]
            artist_page_ttl_mins = 10
            quick_picks_ttl_hours = 2

            [quick_picks]
            familiar_pool_size = 25
            "#,
        )
        .unwrap();

        let settings = AppSettings::resolve(Some(file));
        assert_eq!(settings.retry.max_retries, 5);
        assert_eq!(settings.retry.initial_delay_ms, 250);
        assert_eq!(settings.caches.artist_page_ttl_ms, 10 * 60 * 1000);
        assert_eq!(settings.caches.quick_picks_ttl_ms, 2 * 60 * 60 * 1000);
        assert_eq!(settings.quick_picks.familiar_pool_size, 25);
        // Untouched fields keep defaults
        assert_eq!(settings.caches.search_ttl_ms, 5 * 60 * 1000);
        assert_eq!(settings.listen_again.min_qualified_listens, 2);
    }

    #[test]
    fn test_resolve_without_file_uses_defaults() {
        let settings = AppSettings::resolve(None);
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.history.max_history_rows, 10_000);
    }
}
