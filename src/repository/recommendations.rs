//! Recommendation repository: quick picks, listen again, new releases
//! and trending, orchestrated over the remote source, history aggregates
//! and scoring engines.

use crate::cache::{search_key, TtlCache};
use crate::clock::SharedClock;
use crate::config::AppSettings;
use crate::error::{FeedError, RemoteError};
use crate::genres::GenreCatalog;
use crate::history::PlaybackHistoryStore;
use crate::model::{
    CandidateSource, RegionInfo, ScoredCandidate, Song, UserTasteProfile,
};
use crate::region::RegionProvider;
use crate::remote::{RemoteMusicSource, RetryPolicy};
use crate::scoring::{
    personalize, session_seed, ListenAgainEngine, PersonalizationInputs, QuickPicksEngine,
    ScoringContext,
};
use crate::taste::TasteProfileBuilder;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Raw fetch multiplier for the new-release/trending feeds, leaving room
/// for post-filter shrinkage.
const RAW_FETCH_MULTIPLIER: usize = 2;
/// Trending candidates pulled into one quick-picks build.
const QUICK_PICKS_TRENDING_FETCH: usize = 25;

pub struct RecommendationRepository {
    remote: Arc<dyn RemoteMusicSource>,
    history: Arc<dyn PlaybackHistoryStore>,
    region: Arc<dyn RegionProvider>,
    genres: Arc<GenreCatalog>,
    taste: TasteProfileBuilder,
    listen_again: ListenAgainEngine,
    quick_picks: QuickPicksEngine,
    retry: RetryPolicy,
    clock: SharedClock,
    settings: AppSettings,
    utc_offset_ms: i64,
    quick_picks_cache: TtlCache<Vec<ScoredCandidate>>,
    search_cache: TtlCache<Vec<Song>>,
    new_releases_cache: TtlCache<Vec<Song>>,
    trending_cache: TtlCache<Vec<Song>>,
}

impl RecommendationRepository {
    pub fn new(
        remote: Arc<dyn RemoteMusicSource>,
        history: Arc<dyn PlaybackHistoryStore>,
        region: Arc<dyn RegionProvider>,
        genres: Arc<GenreCatalog>,
        settings: AppSettings,
        clock: SharedClock,
        utc_offset_ms: i64,
    ) -> Self {
        Self {
            taste: TasteProfileBuilder::new(history.clone(), genres.clone()),
            listen_again: ListenAgainEngine::new(settings.listen_again.clone()),
            quick_picks: QuickPicksEngine::new(settings.quick_picks.clone()),
            retry: RetryPolicy::new(&settings.retry),
            quick_picks_cache: TtlCache::new(
                "quick picks",
                settings.caches.quick_picks_ttl_ms,
                clock.clone(),
            ),
            search_cache: TtlCache::new("search", settings.caches.search_ttl_ms, clock.clone()),
            new_releases_cache: TtlCache::new(
                "new releases",
                settings.caches.search_ttl_ms,
                clock.clone(),
            ),
            trending_cache: TtlCache::new(
                "trending",
                settings.caches.search_ttl_ms,
                clock.clone(),
            ),
            remote,
            history,
            region,
            genres,
            settings,
            clock,
            utc_offset_ms,
        }
    }

    // =========================================================================
    // Listen Again
    // =========================================================================

    pub async fn get_listen_again(&self, limit: usize) -> Result<Vec<Song>, FeedError> {
        let now = self.clock.now_millis();
        let stats = self
            .history
            .get_listen_again_raw_stats(
                now - 90 * DAY_MS,
                now - 30 * DAY_MS,
                now - 7 * DAY_MS,
                self.utc_offset_ms,
            )
            .map_err(|e| FeedError::Internal(e.to_string()))?;

        let context = ScoringContext::at(now, self.utc_offset_ms);
        Ok(self.listen_again.rank(stats, &context, now, limit))
    }

    // =========================================================================
    // Quick Picks
    // =========================================================================

    /// Assemble the quick-picks feed. Results are cached per region and
    /// limit for the configured window, so repeat calls inside one window
    /// return the identical ordered list.
    pub async fn get_quick_picks(&self, limit: usize) -> Result<Vec<ScoredCandidate>, FeedError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let region = self.resolve_region().await;
        let cache_key = format!("quick_picks:{}:{}", region.country_code, limit);
        if let Some(cached) = self.quick_picks_cache.get(&cache_key) {
            return Ok(cached);
        }

        let picks = match self.build_quick_picks(limit, &region).await {
            Ok(picks) => picks,
            Err(e) => {
                warn!("Quick picks pipeline failed ({}), entering fallback chain", e);
                self.quick_picks_fallback(limit)
                    .await
                    .ok_or(FeedError::Remote(e))?
            }
        };

        info!(
            "Quick picks assembled: {} songs for region {}",
            picks.len(),
            region.country_code
        );
        self.quick_picks_cache.put(cache_key, picks.clone());
        Ok(picks)
    }

    async fn build_quick_picks(
        &self,
        limit: usize,
        region: &RegionInfo,
    ) -> Result<Vec<ScoredCandidate>, RemoteError> {
        let now = self.clock.now_millis();

        let taste = self.taste.build(region).unwrap_or_else(|e| {
            warn!("Taste profile build failed ({}), using empty profile", e);
            UserTasteProfile::empty()
        });

        // Anti-preference signals; a failing store read degrades to "no
        // signal" rather than aborting the build
        let skipped_artists = self.history.get_skipped_artists().unwrap_or_else(|e| {
            warn!("Skipped-artist lookup failed: {}", e);
            HashSet::new()
        });
        let played_song_ids = self.history.get_all_played_song_ids().unwrap_or_else(|e| {
            warn!("Played-ids lookup failed: {}", e);
            HashSet::new()
        });

        let familiar = self.familiar_pool(now);

        // Discovery branches run concurrently; each is independently
        // fault-tolerant and contributes an empty pool on error
        let (deep_cuts, seeded, trending) = tokio::join!(
            self.deep_cut_pool(&taste),
            self.seed_recommendation_pool(),
            self.trending_pool(),
        );

        let mut discovery = Vec::new();
        let mut last_branch_error: Option<RemoteError> = None;
        let mut failed_branches = 0;
        for branch in [deep_cuts, seeded, trending] {
            match branch {
                Ok(pool) => discovery.extend(pool),
                Err(e) => {
                    failed_branches += 1;
                    last_branch_error = Some(e);
                }
            }
        }

        // Total pipeline failure: nothing familiar, every branch down
        if familiar.is_empty() && discovery.is_empty() {
            if let Some(e) = last_branch_error {
                return Err(e);
            }
        } else if failed_branches > 0 {
            debug!("{} discovery branches failed, continuing degraded", failed_branches);
        }

        let merged =
            self.quick_picks
                .merge_pools(familiar, discovery, &skipped_artists, &played_song_ids);
        let scored = self.quick_picks.score_candidates(merged, &taste, &self.genres);

        let seed = session_seed(
            &region.country_code,
            now,
            self.settings.caches.quick_picks_ttl_ms,
        );
        Ok(self.quick_picks.assemble(scored, limit, seed))
    }

    /// Familiar pool: top listen-again songs with rank-decayed source
    /// scores in `[floor, 1.0]`.
    fn familiar_pool(&self, now: i64) -> Vec<ScoredCandidate> {
        let qp = &self.settings.quick_picks;
        let stats = match self.history.get_listen_again_raw_stats(
            now - 90 * DAY_MS,
            now - 30 * DAY_MS,
            now - 7 * DAY_MS,
            self.utc_offset_ms,
        ) {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Familiar pool unavailable: {}", e);
                return Vec::new();
            }
        };

        let context = ScoringContext::at(now, self.utc_offset_ms);
        let songs = self
            .listen_again
            .rank(stats, &context, now, qp.familiar_pool_size);
        let pool_size = songs.len().max(1) as f64;

        songs
            .into_iter()
            .enumerate()
            .map(|(rank, song)| {
                let source_score =
                    (1.0 - rank as f64 / pool_size).max(qp.familiar_score_floor);
                ScoredCandidate {
                    song,
                    source: CandidateSource::Familiar,
                    source_score,
                    final_score: 0.0,
                    is_familiar: true,
                    inferred_genre: String::new(),
                }
            })
            .collect()
    }

    /// Unplayed deep cuts from the user's top artists, scored by artist
    /// rank decay times normalized view count.
    async fn deep_cut_pool(
        &self,
        taste: &UserTasteProfile,
    ) -> Result<Vec<ScoredCandidate>, RemoteError> {
        let qp = &self.settings.quick_picks;
        if taste.top_artists.is_empty() {
            return Ok(Vec::new());
        }

        let artist_count = qp.deep_cut_artists.min(taste.top_artists.len()) as f64;
        let searches = taste
            .top_artists
            .iter()
            .take(qp.deep_cut_artists)
            .enumerate()
            .map(|(rank, artist)| {
                let query = format!("{} songs", artist);
                async move {
                    let songs = self.cached_search(&query, qp.deep_cut_fetch_limit).await?;
                    let rank_decay = 1.0 - rank as f64 / artist_count;
                    let max_views = max_view_count(&songs);
                    Ok::<_, RemoteError>(
                        songs
                            .into_iter()
                            .map(|song| {
                                let views = normalized_view_count(&song, max_views);
                                ScoredCandidate {
                                    source_score: rank_decay * views,
                                    song,
                                    source: CandidateSource::SameArtistUnplayed,
                                    final_score: 0.0,
                                    is_familiar: false,
                                    inferred_genre: String::new(),
                                }
                            })
                            .collect::<Vec<_>>(),
                    )
                }
            });

        let mut pool = Vec::new();
        let mut last_error = None;
        for result in join_all(searches).await {
            match result {
                Ok(candidates) => pool.extend(candidates),
                Err(e) => {
                    warn!("Deep-cut search failed: {}", e);
                    last_error = Some(e);
                }
            }
        }
        if pool.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        Ok(pool)
    }

    /// Seed-based recommendations from recent (or dormant favorite)
    /// songs, scored by normalized view count.
    async fn seed_recommendation_pool(&self) -> Result<Vec<ScoredCandidate>, RemoteError> {
        let qp = &self.settings.quick_picks;

        let mut seeds = self.history.get_recent_song_ids(qp.seed_songs).unwrap_or_else(|e| {
            warn!("Recent-song lookup failed: {}", e);
            Vec::new()
        });
        if seeds.len() < qp.seed_songs {
            // Backfill from dormant favorites
            let needed = qp.seed_songs - seeds.len();
            if let Ok(candidates) = self.history.get_rediscovery_candidates(needed) {
                for song in candidates {
                    if !seeds.contains(&song.id) {
                        seeds.push(song.id);
                    }
                }
            }
        }
        if seeds.is_empty() {
            return Ok(Vec::new());
        }

        let fetches = seeds.iter().map(|seed_id| async move {
            self.retry
                .execute(|| self.remote.get_song_recommendations(seed_id, qp.seed_fetch_limit))
                .await
        });

        let mut pool = Vec::new();
        let mut last_error = None;
        for result in join_all(fetches).await {
            match result {
                Ok(songs) => {
                    let max_views = max_view_count(&songs);
                    pool.extend(songs.into_iter().map(|song| ScoredCandidate {
                        source_score: normalized_view_count(&song, max_views),
                        song,
                        source: CandidateSource::SimilarArtist,
                        final_score: 0.0,
                        is_familiar: false,
                        inferred_genre: String::new(),
                    }));
                }
                Err(e) => {
                    warn!("Seed recommendation fetch failed: {}", e);
                    last_error = Some(e);
                }
            }
        }
        if pool.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }
        Ok(pool)
    }

    /// Regional trending with a flat moderate base score.
    async fn trending_pool(&self) -> Result<Vec<ScoredCandidate>, RemoteError> {
        let qp = &self.settings.quick_picks;
        let songs = self
            .retry
            .execute(|| self.remote.get_trending_songs(QUICK_PICKS_TRENDING_FETCH))
            .await?;
        Ok(songs
            .into_iter()
            .map(|song| ScoredCandidate {
                song,
                source: CandidateSource::TrendingGenre,
                source_score: qp.trending_base_score,
                final_score: 0.0,
                is_familiar: false,
                inferred_genre: String::new(),
            })
            .collect())
    }

    /// Fallback chain after a total pipeline failure: listen-again output
    /// first, then raw trending. The result is cached under the same TTL
    /// so repeated failures don't hammer the remote source.
    async fn quick_picks_fallback(&self, limit: usize) -> Option<Vec<ScoredCandidate>> {
        if let Ok(songs) = self.get_listen_again(limit).await {
            if !songs.is_empty() {
                let pool_size = songs.len().max(1) as f64;
                return Some(
                    songs
                        .into_iter()
                        .enumerate()
                        .map(|(rank, song)| ScoredCandidate {
                            song,
                            source: CandidateSource::Familiar,
                            source_score: (1.0 - rank as f64 / pool_size)
                                .max(self.settings.quick_picks.familiar_score_floor),
                            final_score: 0.0,
                            is_familiar: true,
                            inferred_genre: String::new(),
                        })
                        .collect(),
                );
            }
        }

        match self
            .retry
            .execute(|| self.remote.get_trending_songs(limit))
            .await
        {
            Ok(songs) if !songs.is_empty() => Some(
                songs
                    .into_iter()
                    .map(|song| ScoredCandidate {
                        song,
                        source: CandidateSource::TrendingGenre,
                        source_score: self.settings.quick_picks.trending_base_score,
                        final_score: 0.0,
                        is_familiar: false,
                        inferred_genre: String::new(),
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    // =========================================================================
    // New Releases / Trending
    // =========================================================================

    pub async fn get_new_releases(&self, limit: usize) -> Result<Vec<Song>, FeedError> {
        self.personalized_feed(limit, &self.new_releases_cache, "new_releases", |fetch_limit| {
            let remote = self.remote.clone();
            async move { remote.get_new_releases(fetch_limit).await }
        })
        .await
    }

    pub async fn get_trending(&self, limit: usize) -> Result<Vec<Song>, FeedError> {
        self.personalized_feed(limit, &self.trending_cache, "trending", |fetch_limit| {
            let remote = self.remote.clone();
            async move { remote.get_trending_songs(fetch_limit).await }
        })
        .await
    }

    /// Shared shape of the two browse feeds: fetch 2x raw, personalize,
    /// cache; on remote failure serve a stale cached copy within the
    /// tolerance window before giving up.
    async fn personalized_feed<F, Fut>(
        &self,
        limit: usize,
        cache: &TtlCache<Vec<Song>>,
        label: &str,
        mut fetch: F,
    ) -> Result<Vec<Song>, FeedError>
    where
        F: FnMut(usize) -> Fut,
        Fut: std::future::Future<Output = Result<Vec<Song>, RemoteError>>,
    {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let cache_key = format!("{}:{}", label, limit);
        if let Some(cached) = cache.get(&cache_key) {
            return Ok(cached);
        }

        let fetch_limit = limit * RAW_FETCH_MULTIPLIER;
        match self.retry.execute(|| fetch(fetch_limit)).await {
            Ok(raw) if raw.is_empty() => Ok(Vec::new()),
            Ok(raw) => {
                let songs = self.personalize_raw(raw, limit).await;
                cache.put(cache_key, songs.clone());
                Ok(songs)
            }
            Err(e) => {
                if let Some(entry) =
                    cache.get_within(&cache_key, self.settings.caches.stale_tolerance_ms)
                {
                    warn!("{} fetch failed ({}), serving stale copy", label, e);
                    return Ok(entry.value);
                }
                Err(e.into())
            }
        }
    }

    /// Personalize a raw feed against the user's taste. If the history
    /// inputs fail, the raw order is served truncated instead.
    async fn personalize_raw(&self, raw: Vec<Song>, limit: usize) -> Vec<Song> {
        let played = match self.history.get_all_played_song_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Personalization inputs unavailable ({}), serving raw feed", e);
                let mut raw = raw;
                raw.truncate(limit);
                return raw;
            }
        };
        let followed = self.history.get_followed_artists().unwrap_or_default();
        let region = self.resolve_region().await;
        let taste = self.taste.build(&region).unwrap_or_else(|_| UserTasteProfile::empty());

        let inputs = PersonalizationInputs {
            played_song_ids: &played,
            top_artists: &taste.top_artists,
            followed_artists: &followed,
            top_genres: &taste.top_genres,
            preferred_languages: &taste.preferred_languages,
        };
        personalize(raw, &inputs, &self.genres, limit)
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    async fn resolve_region(&self) -> RegionInfo {
        RegionInfo {
            country_code: self.region.country_code().await,
            country_name: self.region.country_name().await,
        }
    }

    /// Search memoized for one short window, so concurrent feed builds
    /// don't issue duplicate upstream queries.
    async fn cached_search(&self, query: &str, limit: usize) -> Result<Vec<Song>, RemoteError> {
        let key = search_key(query, limit);
        if let Some(songs) = self.search_cache.get(&key) {
            return Ok(songs);
        }
        let songs = self
            .retry
            .execute(|| self.remote.search_songs(query, limit))
            .await?;
        self.search_cache.put(key, songs.clone());
        Ok(songs)
    }
}

fn max_view_count(songs: &[Song]) -> u64 {
    songs
        .iter()
        .filter_map(|song| song.view_count)
        .max()
        .unwrap_or(0)
}

/// View count scaled into (0, 1]; songs without counts sit at the middle
/// of the range so they neither dominate nor vanish.
fn normalized_view_count(song: &Song, max_views: u64) -> f64 {
    match (song.view_count, max_views) {
        (Some(views), max) if max > 0 => (views as f64 / max as f64).max(0.05),
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_view_count_scales_against_batch_max() {
        let mut song = Song::new("s1", "T", "A");
        song.view_count = Some(500);
        assert!((normalized_view_count(&song, 1000) - 0.5).abs() < 1e-9);

        song.view_count = Some(1000);
        assert!((normalized_view_count(&song, 1000) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_view_count_is_neutral() {
        let song = Song::new("s1", "T", "A");
        assert!((normalized_view_count(&song, 1000) - 0.5).abs() < 1e-9);
        assert!((normalized_view_count(&song, 0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_view_counts_keep_a_floor() {
        let mut song = Song::new("s1", "T", "A");
        song.view_count = Some(1);
        assert!(normalized_view_count(&song, 10_000_000) >= 0.05);
    }
}
