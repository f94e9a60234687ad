//! Canonical cache keys.
//!
//! Equivalent queries must collide on one entry, so every key is built
//! from a canonicalized identifier: trimmed, whitespace-collapsed,
//! case-folded names and trimmed browse ids.

/// Canonicalize an artist name: collapse runs of whitespace to a single
/// space, trim, lowercase. Idempotent.
pub fn canonical_artist_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn name_key(name: &str) -> String {
    format!("name:{}", canonical_artist_name(name))
}

pub fn browse_key(browse_id: &str) -> String {
    format!("browse:{}", browse_id.trim())
}

/// All keys an artist page is stored under. The `browse:` key comes first
/// and takes precedence on reads when both identifiers are supplied.
pub fn artist_cache_keys(name: &str, browse_id: Option<&str>) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if let Some(id) = browse_id.map(str::trim).filter(|id| !id.is_empty()) {
        keys.push(browse_key(id));
    }
    if !name.trim().is_empty() {
        keys.push(name_key(name));
    }
    keys
}

pub fn search_key(query: &str, limit: usize) -> String {
    format!("search:{}|{}", canonical_artist_name(query), limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalization_is_idempotent() {
        for input in [" Arijit   Singh ", "arijit singh", "ARIJIT\tSINGH", ""] {
            let once = canonical_artist_name(input);
            let twice = canonical_artist_name(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_equivalent_names_collide() {
        assert_eq!(
            name_key("Arijit Singh"),
            name_key(" Arijit   Singh ")
        );
        assert_eq!(name_key("Arijit Singh"), name_key("arijit singh"));
        assert_eq!(name_key("arijit singh"), "name:arijit singh");
    }

    #[test]
    fn test_browse_key_trims() {
        assert_eq!(browse_key(" UC123 "), "browse:UC123");
    }

    #[test]
    fn test_browse_key_takes_precedence() {
        let keys = artist_cache_keys("Arijit Singh", Some("UC123"));
        assert_eq!(
            keys,
            vec!["browse:UC123".to_string(), "name:arijit singh".to_string()]
        );
    }

    #[test]
    fn test_name_only_when_browse_id_blank() {
        let keys = artist_cache_keys("Arijit Singh", Some("  "));
        assert_eq!(keys, vec!["name:arijit singh".to_string()]);
    }

    #[test]
    fn test_search_key_includes_limit() {
        assert_ne!(search_key("lofi beats", 10), search_key("lofi beats", 20));
        assert_eq!(search_key(" Lofi  Beats ", 10), search_key("lofi beats", 10));
    }
}
