//! Artist repository integration tests: TTL boundaries, the staleness
//! fallback chain, key canonicalization and write-through behavior.

mod common;

use common::*;
use melofono_core::cache::DurableArtistCache;
use melofono_core::clock::ManualClock;
use melofono_core::error::{FeedError, RemoteError};
use melofono_core::remote::MockRemoteMusicSource;
use melofono_core::ArtistRepository;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn repo_with(
    remote: MockRemoteMusicSource,
    dir: &TempDir,
    clock: Arc<ManualClock>,
) -> ArtistRepository {
    let settings = test_settings();
    ArtistRepository::new(
        Arc::new(remote),
        artist_cache(dir),
        &settings.caches,
        &settings.retry,
        clock,
    )
}

#[tokio::test]
async fn test_memory_cache_hit_inside_ttl_boundary() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    let mut remote = MockRemoteMusicSource::new();
    remote
        .expect_get_artist_profile()
        .times(1)
        .returning(|name, _| Ok(remote_profile(name, "UC1", "v1")));

    let repo = repo_with(remote, &dir, clock.clone());
    let first = repo
        .get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();
    assert!(!first.is_stale);

    // One second before the 30-minute TTL expires: still a cache hit
    // (the mock would panic on a second remote call)
    clock.set(T0 + 30 * MINUTE_MS - 1000);
    let second = repo
        .get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();
    assert_eq!(second.bio.as_deref(), Some("v1"));
    assert!(!second.is_stale);
}

#[tokio::test]
async fn test_expired_page_refetches_from_remote() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in_mock = calls.clone();
    let mut remote = MockRemoteMusicSource::new();
    remote.expect_get_artist_profile().returning(move |name, _| {
        let n = calls_in_mock.fetch_add(1, Ordering::SeqCst);
        Ok(remote_profile(name, "UC1", if n == 0 { "v1" } else { "v2" }))
    });

    let repo = repo_with(remote, &dir, clock.clone());
    repo.get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();

    // One second past the TTL: durable tier is also past its fresh
    // window, so the remote is consulted again
    clock.set(T0 + 30 * MINUTE_MS + 1000);
    let refreshed = repo
        .get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();
    assert_eq!(refreshed.bio.as_deref(), Some("v2"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stale_durable_fallback_at_23h_failure_at_25h() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in_mock = calls.clone();
    let mut remote = MockRemoteMusicSource::new();
    remote.expect_get_artist_profile().returning(move |name, _| {
        if calls_in_mock.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(remote_profile(name, "UC1", "v1"))
        } else {
            Err(RemoteError::Http { status: 500 })
        }
    });

    let repo = repo_with(remote, &dir, clock.clone());
    repo.get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();

    // 23 hours later the remote is down: the durable row is inside the
    // 24-hour tolerance and comes back flagged stale
    clock.set(T0 + 23 * HOUR_MS);
    let stale = repo
        .get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();
    assert!(stale.is_stale);
    assert_eq!(stale.bio.as_deref(), Some("v1"));

    // 25 hours: past tolerance everywhere, the failure surfaces
    clock.set(T0 + 25 * HOUR_MS);
    let result = repo
        .get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await;
    assert!(matches!(
        result,
        Err(FeedError::Remote(RemoteError::Http { status: 500 }))
    ));
}

#[tokio::test]
async fn test_equivalent_names_share_one_cache_entry() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    let mut remote = MockRemoteMusicSource::new();
    remote
        .expect_get_artist_profile()
        .times(1)
        .returning(|_, _| Ok(remote_profile("Arijit Singh", "UC1", "v1")));

    let repo = repo_with(remote, &dir, clock);
    repo.get_artist_profile("Arijit Singh", None, false)
        .await
        .unwrap();

    // Different spacing and casing resolve to the same canonical key
    let hit = repo
        .get_artist_profile(" arijit   SINGH ", None, false)
        .await
        .unwrap();
    assert_eq!(hit.browse_id, "UC1");
}

#[tokio::test]
async fn test_browse_id_fetch_is_readable_by_name() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    let mut remote = MockRemoteMusicSource::new();
    remote
        .expect_get_artist_profile()
        .times(1)
        .returning(|_, _| Ok(remote_profile("Arijit Singh", "UC1", "v1")));

    let repo = repo_with(remote, &dir, clock);
    repo.get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();

    // The write fanned out under both keys, so a name-only lookup hits
    let by_name = repo
        .get_artist_profile("arijit singh", None, false)
        .await
        .unwrap();
    assert_eq!(by_name.browse_id, "UC1");
}

#[tokio::test]
async fn test_force_refresh_bypasses_fresh_cache() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in_mock = calls.clone();
    let mut remote = MockRemoteMusicSource::new();
    remote.expect_get_artist_profile().returning(move |name, _| {
        calls_in_mock.fetch_add(1, Ordering::SeqCst);
        Ok(remote_profile(name, "UC1", "fresh"))
    });

    let repo = repo_with(remote, &dir, clock);
    repo.get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();
    repo.get_artist_profile("Arijit Singh", Some("UC1"), true)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_blank_identifiers_fail_fast_without_remote_call() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    // No expectations: any remote call would panic
    let remote = MockRemoteMusicSource::new();
    let repo = repo_with(remote, &dir, clock);

    let result = repo.get_artist_profile("   ", None, false).await;
    assert!(matches!(result, Err(FeedError::InvalidInput(_))));
}

#[tokio::test]
async fn test_successful_fetch_purges_old_durable_rows() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();
    let cache = artist_cache(&dir);

    // Seed a durable row well past the 7-day purge horizon
    cache
        .upsert_artist_page(&melofono_core::cache::ArtistPageEntry {
            cache_key: "browse:ANCIENT".to_string(),
            profile: melofono_core::model::ArtistProfile::from_remote(remote_profile(
                "Old Artist",
                "ANCIENT",
                "old",
            )),
            cached_at_ms: T0 - 8 * DAY_MS,
        })
        .unwrap();

    let mut remote = MockRemoteMusicSource::new();
    remote
        .expect_get_artist_profile()
        .returning(|name, _| Ok(remote_profile(name, "UC1", "v1")));

    let settings = test_settings();
    let repo = ArtistRepository::new(
        Arc::new(remote),
        cache.clone(),
        &settings.caches,
        &settings.retry,
        clock,
    );
    repo.get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();

    assert!(cache.get_artist_page("browse:ANCIENT").unwrap().is_none());
    assert!(cache.get_artist_page("browse:UC1").unwrap().is_some());
}

#[tokio::test]
async fn test_profile_lists_deduplicated_by_id() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    let mut remote = MockRemoteMusicSource::new();
    remote.expect_get_artist_profile().returning(|name, _| {
        let mut profile = remote_profile(name, "UC1", "v1");
        profile.top_songs = vec![song("dup", name), song("dup", name), song("solo", name)];
        Ok(profile)
    });

    let repo = repo_with(remote, &dir, clock);
    let profile = repo
        .get_artist_profile("Arijit Singh", Some("UC1"), false)
        .await
        .unwrap();
    assert_eq!(profile.top_songs.len(), 2);
}

#[tokio::test]
async fn test_artist_songs_cached_per_section_ttl() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let clock = manual_clock();

    let calls = Arc::new(AtomicU32::new(0));
    let calls_in_mock = calls.clone();
    let mut remote = MockRemoteMusicSource::new();
    remote.expect_get_artist_songs().returning(move |name, _, _| {
        calls_in_mock.fetch_add(1, Ordering::SeqCst);
        Ok(vec![song("a1", name), song("a2", name)])
    });

    let repo = repo_with(remote, &dir, clock.clone());
    repo.get_artist_songs("Arijit Singh", Some("UC1"), 20)
        .await
        .unwrap();
    // Inside the 60-minute section TTL
    clock.set(T0 + 59 * MINUTE_MS);
    repo.get_artist_songs("Arijit Singh", Some("UC1"), 20)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Past it
    clock.set(T0 + 61 * MINUTE_MS);
    repo.get_artist_songs("Arijit Singh", Some("UC1"), 20)
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
