// Report generation - the JSON document the /analyze endpoint returns.
//
// Every section is an explicit struct; optional sections are Option, not
// sentinel strings. A timestamp that fails to parse degrades the monthly
// section only - the rest of the report still goes out.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use super::keywords::crypto_keywords;
use super::normalize::normalize;
use super::trends::{count_tokens, trending};
use crate::store::Record;

/// How many of the most-liked records feed the high-engagement section.
const HIGH_ENGAGEMENT_RECORDS: usize = 10;

/// Tokens reported per month in the monthly breakdown.
const MONTHLY_TOP_N: usize = 10;

/// A created_at value none of the accepted formats could parse.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unparseable timestamp: {0:?}")]
pub struct MalformedTimestamp(pub String);

/// The full trend report.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    /// Overall trending tokens as [token, score] pairs, best first.
    pub overall_trending_words: Vec<(String, f64)>,
    pub total_tweets_analyzed: usize,
    pub report_generated_at: String,
    /// Present only when the report was scoped to a single author that
    /// actually has records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_segment: Option<AuthorSegment>,
    /// Highest-frequency tokens among the most-liked records.
    pub high_engagement_words: Vec<(String, u64)>,
    /// Crypto-keyword counts per calendar month. None when any record's
    /// timestamp failed to parse.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_trends: Option<Vec<MonthlyTrend>>,
}

/// Per-author slice of the report, with engagement means.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorSegment {
    pub author: String,
    pub trending_words: Vec<(String, f64)>,
    pub mean_likes: f64,
    pub mean_retweets: f64,
    pub records: usize,
}

/// Crypto-keyword counts for one calendar month (1-12).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub month: u32,
    pub keywords: Vec<(String, u64)>,
}

/// Parse a record's created_at. Providers have shipped at least three
/// formats over the life of this pipeline, so all are accepted.
pub fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, MalformedTimestamp> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Classic timeline format: "Tue Mar 05 14:00:00 +0000 2024"
    if let Ok(dt) = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    Err(MalformedTimestamp(raw.to_string()))
}

/// Build the trend report for a record set, optionally scoped to one author.
///
/// An empty record set produces an empty-but-well-formed report. A scoped
/// author with no records simply has no segment - data unavailability is
/// not a failure.
pub fn generate_report(records: &[Record], author: Option<&str>) -> TrendReport {
    TrendReport {
        overall_trending_words: trending(records, 3, 30)
            .into_iter()
            .map(|e| (e.token, e.score))
            .collect(),
        total_tweets_analyzed: records.len(),
        report_generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        author_segment: author.and_then(|a| author_segment(records, a)),
        high_engagement_words: high_engagement_words(records),
        monthly_trends: monthly_trends(records),
    }
}

fn author_segment(records: &[Record], author: &str) -> Option<AuthorSegment> {
    let subset: Vec<Record> = records
        .iter()
        .filter(|r| r.author.eq_ignore_ascii_case(author))
        .cloned()
        .collect();

    if subset.is_empty() {
        warn!(author = author, "no records for requested author segment");
        return None;
    }

    let n = subset.len() as f64;
    let mean_likes = subset.iter().map(|r| r.like_count).sum::<u64>() as f64 / n;
    let mean_retweets = subset.iter().map(|r| r.retweet_count).sum::<u64>() as f64 / n;

    Some(AuthorSegment {
        author: author.to_string(),
        trending_words: trending(&subset, 2, 20)
            .into_iter()
            .map(|e| (e.token, e.score))
            .collect(),
        mean_likes,
        mean_retweets,
        records: subset.len(),
    })
}

/// Token frequencies across the 10 most-liked records, top 10 by count.
fn high_engagement_words(records: &[Record]) -> Vec<(String, u64)> {
    let mut by_likes: Vec<&Record> = records.iter().collect();
    by_likes.sort_by(|a, b| b.like_count.cmp(&a.like_count));
    by_likes.truncate(HIGH_ENGAGEMENT_RECORDS);

    let counts = count_tokens(by_likes.iter().map(|r| r.text.as_str()));
    top_by_count(counts, HIGH_ENGAGEMENT_RECORDS)
}

/// Crypto-keyword counts per calendar month. One malformed timestamp
/// degrades the whole section to None - a partial month breakdown would
/// silently misrepresent the timeline.
fn monthly_trends(records: &[Record]) -> Option<Vec<MonthlyTrend>> {
    let mut months: BTreeMap<u32, HashMap<String, u64>> = BTreeMap::new();
    let slang = crypto_keywords();

    for record in records {
        let parsed = match parse_created_at(&record.created_at) {
            Ok(dt) => dt,
            Err(e) => {
                warn!(error = %e, "skipping monthly breakdown");
                return None;
            }
        };

        let counts = months.entry(parsed.month()).or_default();
        for token in normalize(&record.text) {
            if slang.contains(token.as_str()) {
                *counts.entry(token).or_default() += 1;
            }
        }
    }

    Some(
        months
            .into_iter()
            .map(|(month, counts)| MonthlyTrend {
                month,
                keywords: top_by_count(counts, MONTHLY_TOP_N),
            })
            .collect(),
    )
}

/// Rank a count map by frequency descending, token ascending, keep `n`.
fn top_by_count(counts: HashMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}
