// Session cache - cookie blob persisted between runs.
//
// Interactive login is expensive and conspicuous, so the session cookies
// from a successful login are cached on disk and reused until the provider
// rejects them. Read-then-fallback-to-login-then-write.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::FetchError;
use crate::config::Config;

/// Cached login state. The cookie map is opaque to moonwatch - whatever
/// the gateway set at login time is echoed back verbatim on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: BTreeMap<String, String>,
    pub saved_at: DateTime<Utc>,
}

impl SessionState {
    /// Load a cached session from disk. Returns Ok(None) when the file is
    /// missing, unreadable, or holds no cookies - callers fall back to login.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<SessionState>(&raw) {
            Ok(state) if !state.cookies.is_empty() => Some(state),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "session cache is corrupt, ignoring");
                None
            }
        }
    }

    /// Persist the session for the next run.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write session cache {}", path.display()))
    }

    /// The Cookie header value sent on every authenticated request.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Reuse the cached session if one exists, otherwise log in with the
/// configured credentials and cache the fresh cookies.
pub async fn load_or_login(config: &Config) -> Result<SessionState, FetchError> {
    if let Some(state) = SessionState::load(&config.cookie_path) {
        info!(saved_at = %state.saved_at, "using cached session");
        return Ok(state);
    }

    info!("no usable session cache, attempting login");
    config
        .require_credentials()
        .map_err(|e| FetchError::Auth(e.to_string()))?;

    let state = login(
        &config.api_base_url,
        &config.account,
        &config.email,
        &config.password,
    )
    .await?;

    if let Err(e) = state.save(&config.cookie_path) {
        // A failed cache write is not fatal - the session still works for
        // this run, the next one just logs in again.
        warn!(error = %e, "failed to persist session cache");
    }

    Ok(state)
}

/// Perform the interactive login and capture the session cookies the
/// gateway sets on success.
async fn login(
    base_url: &str,
    account: &str,
    email: &str,
    password: &str,
) -> Result<SessionState, FetchError> {
    let client = reqwest::Client::builder()
        .user_agent("moonwatch/0.1 (trend-detection)")
        .build()
        .map_err(|e| FetchError::Api(e.to_string()))?;

    let url = format!("{}/login", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(&serde_json::json!({
            "username": account,
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .map_err(|e| FetchError::Api(format!("login request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Auth(format!("login returned {status}: {body}")));
    }

    let mut cookies = BTreeMap::new();
    for value in response.headers().get_all(reqwest::header::SET_COOKIE) {
        if let Ok(raw) = value.to_str() {
            if let Some((name, rest)) = raw.split_once('=') {
                let value = rest.split(';').next().unwrap_or_default();
                cookies.insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }

    if cookies.is_empty() {
        return Err(FetchError::Auth(
            "login succeeded but no session cookies were set".to_string(),
        ));
    }

    info!(cookie_count = cookies.len(), "login succeeded");

    Ok(SessionState {
        cookies,
        saved_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> SessionState {
        let mut cookies = BTreeMap::new();
        cookies.insert("auth_token".to_string(), "abc123".to_string());
        cookies.insert("ct0".to_string(), "xyz".to_string());
        SessionState {
            cookies,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn cookie_header_joins_pairs() {
        assert_eq!(sample_state().cookie_header(), "auth_token=abc123; ct0=xyz");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let state = sample_state();
        state.save(&path).unwrap();

        let loaded = SessionState::load(&path).expect("cached session should load");
        assert_eq!(loaded.cookies, state.cookies);
    }

    #[test]
    fn load_missing_file_is_none() {
        assert!(SessionState::load(Path::new("/nonexistent/cookies.json")).is_none());
    }

    #[test]
    fn load_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, "not json at all").unwrap();
        assert!(SessionState::load(&path).is_none());
    }

    #[test]
    fn load_empty_cookie_map_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let state = SessionState {
            cookies: BTreeMap::new(),
            saved_at: Utc::now(),
        };
        state.save(&path).unwrap();
        assert!(SessionState::load(&path).is_none());
    }
}
