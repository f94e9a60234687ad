//! Listen-again ranking: resurface songs the user demonstrably returns to.

use super::ScoringContext;
use crate::cache::canonical_artist_name;
use crate::config::ListenAgainSettings;
use crate::history::ListenAgainStats;
use crate::model::Song;
use std::collections::HashMap;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Plays at which the 90-day frequency component saturates.
const FREQ_90D_SATURATION: f64 = 10.0;
/// Plays at which the 7-day frequency component saturates.
const FREQ_7D_SATURATION: f64 = 3.0;
/// Long-term vs last-week split inside the frequency component.
const FREQ_LONG_TERM_SHARE: f64 = 0.7;

/// Fold a pipe-delimited label string (`"morning|morning|evening"`) into
/// per-label counts. Empty tokens are dropped; an empty input parses to
/// an empty map.
pub fn parse_distribution(raw: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in raw.split('|') {
        let label = token.trim();
        if label.is_empty() {
            continue;
        }
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Label with the highest count; ties break to the lexicographically
/// smaller label so peaks are deterministic.
fn peak_label(counts: &HashMap<String, u32>) -> Option<&str> {
    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(label, _)| label.as_str())
}

/// Pure ranking engine over per-song windowed aggregates.
pub struct ListenAgainEngine {
    settings: ListenAgainSettings,
}

impl ListenAgainEngine {
    pub fn new(settings: ListenAgainSettings) -> Self {
        Self { settings }
    }

    /// A song is eligible when it has enough qualified listens and was
    /// played inside the lookback window at all.
    pub fn is_eligible(&self, stats: &ListenAgainStats, now_ms: i64) -> bool {
        let lookback_ms = self.settings.lookback_days as i64 * DAY_MS;
        stats.qualified_listen_count >= self.settings.min_qualified_listens
            && now_ms - stats.last_played_at_ms <= lookback_ms
            && stats.play_count_90d > 0
    }

    /// Blend recency decay, play frequency, completion ratio and a bonus
    /// when the song's listening-time peak matches the caller's current
    /// time/day bucket.
    pub fn compute_score(
        &self,
        stats: &ListenAgainStats,
        context: &ScoringContext,
        now_ms: i64,
    ) -> f64 {
        let s = &self.settings;

        let days_since = ((now_ms - stats.last_played_at_ms).max(0) as f64) / DAY_MS as f64;
        let recency = 0.5f64.powf(days_since / s.recency_half_life_days);

        let long_term = (stats.play_count_90d as f64 / FREQ_90D_SATURATION).min(1.0);
        let last_week = (stats.play_count_7d as f64 / FREQ_7D_SATURATION).min(1.0);
        let frequency =
            FREQ_LONG_TERM_SHARE * long_term + (1.0 - FREQ_LONG_TERM_SHARE) * last_week;

        let completion = if stats.play_count_90d > 0 {
            (stats.completed_count as f64 / stats.play_count_90d as f64).min(1.0)
        } else {
            0.0
        };

        let mut score = s.recency_weight * recency
            + s.frequency_weight * frequency
            + s.completion_weight * completion;

        let time_counts = parse_distribution(&stats.time_of_day_raw);
        if peak_label(&time_counts) == Some(context.time_of_day.label()) {
            score += s.time_affinity_bonus;
        }
        let day_counts = parse_distribution(&stats.day_of_week_raw);
        if peak_label(&day_counts) == Some(context.day_of_week.as_str()) {
            score += s.day_affinity_bonus;
        }

        score
    }

    /// Rank eligible songs by score, cap songs per normalized artist, and
    /// truncate to `limit`. Later-ranked songs from an already-capped
    /// artist are skipped, not reordered; the output never contains a
    /// duplicate song id.
    pub fn rank(
        &self,
        stats: Vec<ListenAgainStats>,
        context: &ScoringContext,
        now_ms: i64,
        limit: usize,
    ) -> Vec<Song> {
        let mut scored: Vec<(f64, ListenAgainStats)> = stats
            .into_iter()
            .filter(|s| self.is_eligible(s, now_ms))
            .map(|s| (self.compute_score(&s, context, now_ms), s))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut per_artist: HashMap<String, usize> = HashMap::new();
        let mut seen_ids = std::collections::HashSet::new();
        let mut out = Vec::with_capacity(limit);

        for (_, stats) in scored {
            if out.len() >= limit {
                break;
            }
            if !seen_ids.insert(stats.song_id.clone()) {
                continue;
            }
            let artist_key = canonical_artist_name(&stats.artist);
            let count = per_artist.entry(artist_key).or_insert(0);
            if *count >= self.settings.artist_cap {
                continue;
            }
            *count += 1;

            let mut song = Song::new(stats.song_id, stats.title, stats.artist);
            song.thumbnail_url = stats.thumbnail_url;
            out.push(song);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::TimeOfDay;

    fn ctx() -> ScoringContext {
        ScoringContext {
            time_of_day: TimeOfDay::Morning,
            day_of_week: "mon".to_string(),
        }
    }

    fn engine() -> ListenAgainEngine {
        ListenAgainEngine::new(ListenAgainSettings::default())
    }

    fn stats(song_id: &str, artist: &str, qualified: u32, last_played_at_ms: i64) -> ListenAgainStats {
        ListenAgainStats {
            song_id: song_id.to_string(),
            title: format!("Title {}", song_id),
            artist: artist.to_string(),
            last_played_at_ms,
            play_count_90d: qualified.max(1),
            play_count_7d: 1,
            completed_count: qualified,
            total_plays: qualified.max(1),
            qualified_listen_count: qualified,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_distribution_counts_labels() {
        let counts = parse_distribution("morning|morning|evening|night");
        assert_eq!(counts.get("morning"), Some(&2));
        assert_eq!(counts.get("evening"), Some(&1));
        assert_eq!(counts.get("night"), Some(&1));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_parse_distribution_empty_and_blank_tokens() {
        assert!(parse_distribution("").is_empty());
        assert!(parse_distribution("| | |").is_empty());
        let counts = parse_distribution("morning||evening|");
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_eligibility_thresholds() {
        let engine = engine();
        let now = 100 * DAY_MS;

        // Enough qualified listens, recent: eligible
        assert!(engine.is_eligible(&stats("s1", "A", 2, now - DAY_MS), now));
        // Too few qualified listens
        assert!(!engine.is_eligible(&stats("s2", "A", 1, now - DAY_MS), now));
        // Last play outside the 90-day lookback
        assert!(!engine.is_eligible(&stats("s3", "A", 5, now - 91 * DAY_MS), now));
    }

    #[test]
    fn test_recency_decay_orders_scores() {
        let engine = engine();
        let now = 100 * DAY_MS;
        let fresh = engine.compute_score(&stats("s1", "A", 3, now - DAY_MS), &ctx(), now);
        let old = engine.compute_score(&stats("s2", "A", 3, now - 60 * DAY_MS), &ctx(), now);
        assert!(fresh > old);
    }

    #[test]
    fn test_time_affinity_bonus_applies_on_peak_match() {
        let engine = engine();
        let now = 100 * DAY_MS;

        let mut matching = stats("s1", "A", 3, now - DAY_MS);
        matching.time_of_day_raw = "morning|morning|evening".to_string();
        let mut other = stats("s1", "A", 3, now - DAY_MS);
        other.time_of_day_raw = "evening|evening|morning".to_string();

        let with_bonus = engine.compute_score(&matching, &ctx(), now);
        let without = engine.compute_score(&other, &ctx(), now);
        let expected = ListenAgainSettings::default().time_affinity_bonus;
        assert!((with_bonus - without - expected).abs() < 1e-9);
    }

    #[test]
    fn test_artist_cap_limits_to_two() {
        let engine = engine();
        let now = 100 * DAY_MS;

        // Artist "X" holds the top 5 slots by recency, plus some others
        let mut all = Vec::new();
        for i in 0..5 {
            all.push(stats(&format!("x{}", i), "X", 5, now - (i + 1) * DAY_MS));
        }
        for i in 0..5 {
            all.push(stats(&format!("y{}", i), &format!("Other {}", i), 2, now - 30 * DAY_MS));
        }

        let ranked = engine.rank(all, &ctx(), now, 10);
        let x_count = ranked
            .iter()
            .filter(|s| canonical_artist_name(&s.artist) == "x")
            .count();
        assert_eq!(x_count, 2);
        // Skipped duplicates don't shrink the list below the available pool
        assert_eq!(ranked.len(), 7);
    }

    #[test]
    fn test_rank_never_emits_duplicate_ids() {
        let engine = engine();
        let now = 100 * DAY_MS;
        let all = vec![
            stats("s1", "A", 3, now - DAY_MS),
            stats("s1", "A", 3, now - 2 * DAY_MS),
            stats("s2", "B", 3, now - DAY_MS),
        ];

        let ranked = engine.rank(all, &ctx(), now, 10);
        let mut ids: Vec<_> = ranked.iter().map(|s| s.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ranked.len());
    }

    #[test]
    fn test_rank_truncates_to_limit() {
        let engine = engine();
        let now = 100 * DAY_MS;
        let all: Vec<_> = (0..20)
            .map(|i| stats(&format!("s{}", i), &format!("Artist {}", i), 3, now - DAY_MS))
            .collect();

        assert_eq!(engine.rank(all, &ctx(), now, 5).len(), 5);
    }
}
