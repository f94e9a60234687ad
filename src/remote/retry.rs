//! Retry with exponential backoff for remote calls.

use crate::config::RetrySettings;
use crate::error::RemoteError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retry policy implementing exponential backoff.
///
/// Whether an error is worth retrying at all is decided by
/// [`RemoteError::is_retryable`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles each attempt.
    pub initial_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay_ms: settings.initial_delay_ms,
        }
    }

    /// Backoff before retry number `retry_count` (0-based):
    /// `initial_delay * 2^retry_count`.
    pub fn backoff_ms(&self, retry_count: u32) -> u64 {
        self.initial_delay_ms.saturating_mul(1u64 << retry_count.min(32))
    }

    /// Run `op`, retrying retryable failures up to `max_retries` times
    /// with exponential backoff between attempts. The backoff suspends
    /// the current task only; sibling tasks keep running. The last
    /// failure is returned once attempts are exhausted.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut retry_count = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retry_count < self.max_retries => {
                    let delay = self.backoff_ms(retry_count);
                    debug!(
                        "Remote call failed ({}), retry {}/{} in {}ms",
                        e,
                        retry_count + 1,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = policy();
        assert_eq!(policy.backoff_ms(0), 1000);
        assert_eq!(policy.backoff_ms(1), 2000);
        assert_eq!(policy.backoff_ms(2), 4000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_retried_max_retries_times() {
        let policy = policy();
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(RemoteError::Timeout) }
            })
            .await;

        assert_eq!(result, Err(RemoteError::Timeout));
        // First attempt plus max_retries additional ones
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_host_not_retried() {
        let policy = policy();
        let attempts = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(RemoteError::UnresolvedHost) }
            })
            .await;

        assert_eq!(result, Err(RemoteError::UnresolvedHost));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_429_retried_404_not() {
        let policy = policy();

        let attempts = AtomicU32::new(0);
        let _: Result<(), _> = policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(RemoteError::Http { status: 429 }) }
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 4);

        let attempts = AtomicU32::new(0);
        let _: Result<(), _> = policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(RemoteError::Http { status: 404 }) }
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let policy = policy();
        let attempts = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(RemoteError::Http { status: 503 })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_immediate_success_makes_one_attempt() {
        let policy = policy();
        let attempts = AtomicU32::new(0);

        let result = policy
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Ok("ok") }
            })
            .await;

        assert_eq!(result, Ok("ok"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
