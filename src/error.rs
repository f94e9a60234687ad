//! Error types shared across the remote, cache and repository layers.

use thiserror::Error;

/// Failure returned by the upstream music API or the transport beneath it.
///
/// The variant determines retry behavior, see
/// [`RemoteError::is_retryable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request timed out before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// DNS resolution of the upstream host failed.
    #[error("could not resolve upstream host")]
    UnresolvedHost,

    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },

    /// The connection could not be established or broke mid-request.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode upstream response: {0}")]
    Decode(String),

    /// The caller supplied an identifier the upstream cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RemoteError {
    /// Whether a retry with backoff has a chance of succeeding.
    ///
    /// Timeouts are always retryable. Rate limiting (429) and transient
    /// server errors (500/502/503) are retryable. An unresolved host is a
    /// configuration problem and retrying would only burn attempts; every
    /// other kind is treated as permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Timeout => true,
            RemoteError::Http { status } => matches!(status, 429 | 500 | 502 | 503),
            RemoteError::UnresolvedHost
            | RemoteError::Connection(_)
            | RemoteError::Decode(_)
            | RemoteError::InvalidInput(_) => false,
        }
    }
}

/// Error surfaced to the UI layer by the repository façades.
///
/// The UI renders these as an empty/error state with a retry affordance;
/// it never sees a raw transport error.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request itself was malformed (blank name, bad section).
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// The remote call failed and no cached fallback was available.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A local store failed in a path that has no remote to fall back on.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_retryable() {
        assert!(RemoteError::Timeout.is_retryable());
    }

    #[test]
    fn test_unresolved_host_is_not_retryable() {
        assert!(!RemoteError::UnresolvedHost.is_retryable());
    }

    #[test]
    fn test_retryable_http_statuses() {
        for status in [429, 500, 502, 503] {
            assert!(
                RemoteError::Http { status }.is_retryable(),
                "status {} should be retryable",
                status
            );
        }
        for status in [400, 401, 403, 404, 410, 501] {
            assert!(
                !RemoteError::Http { status }.is_retryable(),
                "status {} should not be retryable",
                status
            );
        }
    }

    #[test]
    fn test_permanent_kinds_are_not_retryable() {
        assert!(!RemoteError::Connection("reset".into()).is_retryable());
        assert!(!RemoteError::Decode("bad json".into()).is_retryable());
        assert!(!RemoteError::InvalidInput("blank".into()).is_retryable());
    }
}
