//! IP-geolocation backed region provider.

use super::{canonical_country_code, RegionProvider};
use crate::cache::TtlCache;
use crate::clock::SharedClock;
use crate::config::RegionSettings;
use crate::model::RegionInfo;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const GEO_REQUEST_TIMEOUT_SECS: u64 = 5;
const CACHE_KEY: &str = "region";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrimaryGeoResponse {
    country_code: Option<String>,
    country: Option<String>,
}

#[derive(Deserialize)]
struct SecondaryGeoResponse {
    country_code: Option<String>,
    country_name: Option<String>,
}

/// Display name for the handful of regions the client special-cases;
/// everything else falls back to the code itself.
fn country_name_for(code: &str) -> String {
    match code {
        "IN" => "India",
        "US" => "United States",
        "GB" => "United Kingdom",
        "CA" => "Canada",
        "AU" => "Australia",
        "DE" => "Germany",
        "FR" => "France",
        "ES" => "Spain",
        "MX" => "Mexico",
        "BR" => "Brazil",
        "JP" => "Japan",
        "KR" => "South Korea",
        other => return other.to_string(),
    }
    .to_string()
}

/// Parse a POSIX locale string ("en_US.UTF-8") into a country code.
fn country_from_locale(locale: &str) -> Option<String> {
    let tag = locale.split('.').next()?;
    let region = tag.split(['_', '-']).nth(1)?;
    canonical_country_code(region)
}

fn locale_region() -> RegionInfo {
    let code = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LANG"))
        .ok()
        .and_then(|locale| country_from_locale(&locale))
        .unwrap_or_else(|| "US".to_string());
    RegionInfo {
        country_name: country_name_for(&code),
        country_code: code,
    }
}

/// Region provider backed by two IP-geolocation services with a short
/// in-process cache, so one recommendation build resolves the region at
/// most once per window.
pub struct GeoRegionProvider {
    client: Client,
    settings: RegionSettings,
    cache: TtlCache<RegionInfo>,
}

impl GeoRegionProvider {
    pub fn new(settings: RegionSettings, clock: SharedClock) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(GEO_REQUEST_TIMEOUT_SECS))
            .build()?;
        let cache = TtlCache::new("region", settings.cache_ttl_ms, clock);
        Ok(Self {
            client,
            settings,
            cache,
        })
    }

    async fn try_primary(&self) -> Option<RegionInfo> {
        let response = self
            .client
            .get(&self.settings.primary_geo_url)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: PrimaryGeoResponse = response.json().await.ok()?;
        let code = canonical_country_code(&body.country_code?)?;
        Some(RegionInfo {
            country_name: body.country.unwrap_or_else(|| country_name_for(&code)),
            country_code: code,
        })
    }

    async fn try_secondary(&self) -> Option<RegionInfo> {
        let response = self
            .client
            .get(&self.settings.secondary_geo_url)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: SecondaryGeoResponse = response.json().await.ok()?;
        let code = canonical_country_code(&body.country_code?)?;
        Some(RegionInfo {
            country_name: body.country_name.unwrap_or_else(|| country_name_for(&code)),
            country_code: code,
        })
    }

    async fn resolve(&self) -> RegionInfo {
        if let Some(cached) = self.cache.get(CACHE_KEY) {
            return cached;
        }

        let region = match self.try_primary().await {
            Some(region) => region,
            None => match self.try_secondary().await {
                Some(region) => {
                    debug!("Primary geolocation failed, secondary resolved region");
                    region
                }
                None => {
                    warn!("Geolocation unavailable, falling back to device locale");
                    locale_region()
                }
            },
        };

        self.cache.put(CACHE_KEY, region.clone());
        region
    }
}

#[async_trait]
impl RegionProvider for GeoRegionProvider {
    async fn country_code(&self) -> String {
        self.resolve().await.country_code
    }

    async fn country_name(&self) -> String {
        self.resolve().await.country_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_from_locale_variants() {
        assert_eq!(country_from_locale("en_US.UTF-8"), Some("US".to_string()));
        assert_eq!(country_from_locale("hi_IN"), Some("IN".to_string()));
        assert_eq!(country_from_locale("en-GB"), Some("GB".to_string()));
        assert_eq!(country_from_locale("en_UK.UTF-8"), Some("GB".to_string()));
        assert_eq!(country_from_locale("C"), None);
        assert_eq!(country_from_locale(""), None);
    }

    #[test]
    fn test_country_name_falls_back_to_code() {
        assert_eq!(country_name_for("IN"), "India");
        assert_eq!(country_name_for("ZZ"), "ZZ");
    }
}
