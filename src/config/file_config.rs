use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub upstream_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,

    // Feature configs
    pub retry: Option<RetryConfig>,
    pub caches: Option<CachesConfig>,
    pub history: Option<HistoryConfig>,
    pub listen_again: Option<ListenAgainConfig>,
    pub quick_picks: Option<QuickPicksConfig>,
    pub region: Option<RegionConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CachesConfig {
    pub artist_page_ttl_mins: Option<u64>,
    pub artist_section_ttl_mins: Option<u64>,
    pub album_songs_ttl_mins: Option<u64>,
    pub stale_tolerance_hours: Option<u64>,
    pub durable_purge_horizon_days: Option<u64>,
    pub quick_picks_ttl_hours: Option<u64>,
    pub search_ttl_mins: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_history_rows: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ListenAgainConfig {
    pub min_qualified_listens: Option<u32>,
    pub artist_cap: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct QuickPicksConfig {
    pub familiar_pool_size: Option<usize>,
    pub deep_cut_artists: Option<usize>,
    pub seed_songs: Option<usize>,
    pub artist_cap: Option<usize>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RegionConfig {
    pub primary_geo_url: Option<String>,
    pub secondary_geo_url: Option<String>,
    pub cache_ttl_mins: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
