// The fetch loop - pagination with retry, rate-limit waits, and pacing.
//
// Policy, in order of precedence:
//   - timeouts: bounded exponential backoff (2s, 4s, 8s), then give up and
//     keep whatever was collected - a partial store is still useful
//   - provider rate limits: sleep until the advertised reset plus a safety
//     margin, then resume the same cursor
//   - auth failures: abort the run, nothing will fix itself by waiting
//   - anything else: fixed cool-down and retry the same cursor, indefinitely
//
// Records are appended to the store page by page so a crash mid-run loses
// at most the in-flight page.

use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use tracing::{error, info, warn};

use super::client::{SearchPage, SearchSource};
use super::error::FetchError;
use crate::store::{Record, RecordWriter};

/// Maximum retry attempts on request timeouts before abandoning the fetch.
const MAX_TIMEOUT_RETRIES: u32 = 3;

/// Safety margin added to the provider's rate-limit reset timestamp.
const RATE_LIMIT_MARGIN: Duration = Duration::from_secs(10);

/// Fixed cool-down after an unexpected (non-timeout, non-rate-limit) error.
const ERROR_COOLDOWN: Duration = Duration::from_secs(30);

/// Knobs for one fetch run.
pub struct FetchOptions {
    /// Stop once this many records are collected (or pages run out).
    pub min_records: u64,
    /// Uniform random pacing between successful page fetches, in seconds.
    /// Stays under the provider's informal limits; tests zero it out.
    pub page_delay_secs: RangeInclusive<u64>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            min_records: 10,
            page_delay_secs: 5..=10,
        }
    }
}

impl FetchOptions {
    pub fn with_target(min_records: u64) -> Self {
        Self {
            min_records,
            ..Self::default()
        }
    }
}

/// What a fetch run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    pub collected: u64,
    pub reached_target: bool,
}

/// Drive the paginated search until the record target is met or the result
/// set is exhausted, appending every record to the store as it arrives.
///
/// Timeout exhaustion is a partial success, not an error - the outcome
/// reports how much was collected. Only authentication failures (and store
/// write failures) propagate as hard errors.
pub async fn collect(
    source: &dyn SearchSource,
    writer: &mut RecordWriter,
    query: &str,
    opts: &FetchOptions,
) -> Result<FetchOutcome> {
    let mut count: u64 = 0;
    let mut cursor: Option<String> = None;
    let mut first_page = true;

    let pb = ProgressBar::new(opts.min_records);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Fetching [{bar:30}] {pos}/{len}")
            .unwrap(),
    );

    while count < opts.min_records {
        let page = match next_page(source, query, cursor.as_deref(), first_page, opts).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                warn!(collected = count, "abandoning fetch after repeated timeouts");
                break;
            }
            Err(FetchError::RateLimited { reset_at }) => {
                let wait = until_reset(reset_at);
                warn!(
                    reset_at = %reset_at,
                    wait_secs = wait.as_secs(),
                    "rate limit reached, waiting for reset"
                );
                tokio::time::sleep(wait).await;
                continue; // same cursor
            }
            Err(e @ FetchError::Auth(_)) => {
                return Err(anyhow::Error::from(e).context("fetch run aborted"));
            }
            Err(e) => {
                error!(
                    error = %e,
                    cooldown_secs = ERROR_COOLDOWN.as_secs(),
                    "unexpected fetch error, cooling down before retry"
                );
                tokio::time::sleep(ERROR_COOLDOWN).await;
                continue; // same cursor
            }
        };
        first_page = false;

        if page.posts.is_empty() {
            info!("no more results");
            break;
        }

        for post in page.posts {
            count += 1;
            writer.append(&Record::from_raw(count, post))?;
            pb.set_position(count);
        }
        info!(total = count, "collected page");

        cursor = page.cursor;
        if cursor.is_none() {
            info!("result set exhausted");
            break;
        }
    }

    pb.finish_and_clear();
    info!(total = count, target = opts.min_records, "fetch complete");

    Ok(FetchOutcome {
        collected: count,
        reached_target: count >= opts.min_records,
    })
}

/// Request the next page, absorbing timeouts with exponential backoff.
///
/// Returns Ok(None) once the retry budget is spent - the caller treats that
/// as "stop here and keep what we have". Every other error is the caller's
/// problem. Pacing applies before each attempt for non-initial pages,
/// mirroring the cadence of a polite manual scroll.
async fn next_page(
    source: &dyn SearchSource,
    query: &str,
    cursor: Option<&str>,
    first_page: bool,
    opts: &FetchOptions,
) -> Result<Option<SearchPage>, FetchError> {
    let mut attempt: u32 = 0;

    loop {
        if !first_page {
            let delay = pick_delay(&opts.page_delay_secs);
            if !delay.is_zero() {
                info!(delay_secs = delay.as_secs(), "pacing before next page");
                tokio::time::sleep(delay).await;
            }
        }

        match source.search(query, cursor).await {
            Ok(page) => return Ok(Some(page)),
            Err(FetchError::Timeout) => {
                if attempt >= MAX_TIMEOUT_RETRIES {
                    error!(retries = MAX_TIMEOUT_RETRIES, "failed after repeated timeouts");
                    return Ok(None);
                }
                attempt += 1;
                let backoff = Duration::from_secs(2u64.pow(attempt));
                warn!(
                    attempt = attempt,
                    max_retries = MAX_TIMEOUT_RETRIES,
                    backoff_secs = backoff.as_secs(),
                    "read timeout, backing off"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(other) => return Err(other),
        }
    }
}

/// Uniform random pacing delay drawn from the configured range.
fn pick_delay(range: &RangeInclusive<u64>) -> Duration {
    if *range.start() == 0 && *range.end() == 0 {
        return Duration::ZERO;
    }
    let secs = rand::rng().random_range(range.clone());
    Duration::from_secs(secs)
}

/// How long to sleep for a provider-imposed rate limit: time until the
/// advertised reset (zero if it already passed) plus the safety margin.
fn until_reset(reset_at: DateTime<Utc>) -> Duration {
    let remaining = (reset_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    remaining + RATE_LIMIT_MARGIN
}
