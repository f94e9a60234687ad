//! Region resolution: geolocation with locale fallback.
//!
//! Resolution order: in-process cache, primary IP-geolocation endpoint,
//! secondary endpoint, device locale. Failures never cross this boundary;
//! every path degrades to the locale-derived default.

mod geo;

pub use geo::GeoRegionProvider;

use crate::model::RegionInfo;
use async_trait::async_trait;

/// Resolved `{country_code, country_name}` pair consumed by the scoring
/// and repository layers.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RegionProvider: Send + Sync {
    /// Canonical ISO 3166-1 alpha-2 code, uppercased.
    async fn country_code(&self) -> String;

    async fn country_name(&self) -> String;
}

/// Canonicalize a raw country code: trim, uppercase, map legacy aliases
/// (`UK` → `GB`). Returns None for anything that isn't two ASCII letters.
pub fn canonical_country_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(match code.as_str() {
        "UK" => "GB".to_string(),
        _ => code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_country_code_uppercases_and_trims() {
        assert_eq!(canonical_country_code(" in "), Some("IN".to_string()));
        assert_eq!(canonical_country_code("us"), Some("US".to_string()));
    }

    #[test]
    fn test_legacy_uk_maps_to_gb() {
        assert_eq!(canonical_country_code("UK"), Some("GB".to_string()));
        assert_eq!(canonical_country_code("uk"), Some("GB".to_string()));
    }

    #[test]
    fn test_invalid_codes_rejected() {
        assert_eq!(canonical_country_code(""), None);
        assert_eq!(canonical_country_code("USA"), None);
        assert_eq!(canonical_country_code("1N"), None);
    }
}
