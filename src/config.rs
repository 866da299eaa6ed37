use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Default search query when `moonwatch fetch` is run without one.
/// Mirrors the crypto-slang sweep the pipeline was built around.
pub const DEFAULT_QUERY: &str = "(doge OR shiba OR floki OR pepe OR elon OR moon OR rocket \
     OR hodl OR whale OR satoshi OR fomo OR ape) lang:en";

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Account identifier used for interactive login (X_USERNAME).
    pub account: String,
    /// Contact email used as the secondary login factor (X_EMAIL).
    pub email: String,
    /// Account secret (X_PASSWORD).
    pub password: String,
    /// Base URL of the search API gateway.
    pub api_base_url: String,
    /// Where the cached session blob lives between runs.
    pub cookie_path: PathBuf,
    /// Directory the per-handle record stores are written into.
    pub data_dir: PathBuf,
    /// Minimum number of records a fetch run tries to collect.
    pub min_records: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the credentials have no default - everything else falls back
    /// to values that work for a local run.
    pub fn load() -> Result<Self> {
        let min_records = match env::var("MOONWATCH_MIN_RECORDS") {
            Ok(v) => v.parse().unwrap_or(10),
            Err(_) => 10,
        };

        Ok(Self {
            account: env::var("X_USERNAME").unwrap_or_default(),
            email: env::var("X_EMAIL").unwrap_or_default(),
            password: env::var("X_PASSWORD").unwrap_or_default(),
            api_base_url: env::var("MOONWATCH_API_URL")
                .unwrap_or_else(|_| crate::fetch::client::DEFAULT_SEARCH_API_URL.to_string()),
            cookie_path: env::var("MOONWATCH_COOKIE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./cookies.json")),
            data_dir: env::var("MOONWATCH_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            min_records,
        })
    }

    /// Check that login credentials are configured.
    /// Call this before any operation that may need an interactive login.
    pub fn require_credentials(&self) -> Result<()> {
        if self.account.is_empty() || self.email.is_empty() || self.password.is_empty() {
            anyhow::bail!(
                "X_USERNAME, X_EMAIL and X_PASSWORD must all be set.\n\
                 Add them to your .env file. See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// The record store path for a single handle's fetch run.
    pub fn store_path(&self, handle: &str) -> PathBuf {
        self.data_dir.join(format!("tweets_{handle}.csv"))
    }
}
