use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by a search source, split by how the fetch loop
/// must react to them.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request timed out in flight. Retried with bounded exponential
    /// backoff; after the retry budget is spent the fetch returns whatever
    /// was collected so far.
    #[error("search request timed out")]
    Timeout,

    /// The provider imposed a rate limit. The loop sleeps until `reset_at`
    /// (plus a safety margin) and resumes the same cursor.
    #[error("rate limited until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Credentials are missing/invalid or the cached session expired.
    /// Fails the whole run - there is no point retrying.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Anything else the provider threw at us. Treated as transient:
    /// logged, cooled down, retried without advancing the cursor.
    #[error("search API error: {0}")]
    Api(String),
}

impl FetchError {
    /// True for the variants the fetch loop is allowed to recover from.
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::Auth(_))
    }
}
