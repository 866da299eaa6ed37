// Search API client - thin reqwest wrapper over the external gateway.
//
// The gateway is an opaque paginated-search capability: moonwatch only
// depends on the SearchSource trait, so tests (and future providers) can
// swap in their own implementation without touching the fetch loop.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::error::FetchError;
use super::session::SessionState;

/// Default search API gateway.
pub const DEFAULT_SEARCH_API_URL: &str = "https://api.x.com";

/// Per-request timeout. The gateway can be slow under load, so the budget
/// is generous before the retry loop kicks in.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One page of search results plus the cursor for the next one.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub posts: Vec<RawPost>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// A post as the provider returns it - not yet a store Record.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub author: String,
    pub text: String,
    pub created_at: String,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub like_count: u64,
}

/// The externally supplied paginated-search capability.
///
/// `cursor` of None requests the first page; the returned page carries the
/// cursor for the next call, or None when the result set is exhausted.
#[async_trait]
pub trait SearchSource: Send + Sync {
    async fn search(&self, query: &str, cursor: Option<&str>) -> Result<SearchPage, FetchError>;
}

/// HTTP implementation of SearchSource backed by the gateway's /search
/// endpoint, authenticated with the cached session cookies.
pub struct HttpSearchClient {
    client: reqwest::Client,
    base_url: String,
    cookie_header: String,
}

impl HttpSearchClient {
    pub fn new(base_url: &str, session: &SessionState) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("moonwatch/0.1 (trend-detection)")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_header: session.cookie_header(),
        })
    }
}

#[async_trait]
impl SearchSource for HttpSearchClient {
    async fn search(&self, query: &str, cursor: Option<&str>) -> Result<SearchPage, FetchError> {
        let url = format!("{}/search", self.base_url);

        let mut params: Vec<(&str, &str)> = vec![("q", query)];
        if let Some(c) = cursor {
            params.push(("cursor", c));
        }

        debug!(query = query, has_cursor = cursor.is_some(), "search request");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::COOKIE, &self.cookie_header)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Api(e.to_string())
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let reset_at = rate_limit_reset(&response);
            return Err(FetchError::RateLimited { reset_at });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::Auth(format!(
                "search returned {status} - session cookies may have expired"
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api(format!("search returned {status}: {body}")));
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| FetchError::Api(format!("failed to decode search response: {e}")))
    }
}

/// Pull the provider's reset timestamp out of a 429 response.
/// Falls back to one minute from now when the header is missing or garbled.
fn rate_limit_reset(response: &reqwest::Response) -> DateTime<Utc> {
    response
        .headers()
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(|| Utc::now() + chrono::Duration::seconds(60))
}
