// Trend scoring - token counting with the memecoin-potential heuristic.
//
// Score = raw count, boosted 1.5x for crypto slang and a further 1.2x for
// short "memeable" tokens. Equal scores order lexicographically so a report
// is reproducible run to run.

use std::collections::HashMap;

use serde::Serialize;

use super::keywords::crypto_keywords;
use super::normalize::normalize;
use crate::store::Record;

/// Multiplier for tokens in the crypto slang set.
pub const CRYPTO_BOOST: f64 = 1.5;

/// Multiplier for tokens whose length sits in the memeable band.
pub const LENGTH_BOOST: f64 = 1.2;

/// Character-length band that earns the memeable boost.
const MEMEABLE_LEN: std::ops::RangeInclusive<usize> = 3..=6;

/// One scored token in a trend ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendEntry {
    pub token: String,
    pub score: f64,
}

/// Score a single token given its raw occurrence count.
///
/// Monotonic in `count` for a fixed token: the boosts are constant
/// multipliers, so more occurrences never score lower.
pub fn score_token(token: &str, count: u64) -> f64 {
    let mut score = count as f64;
    if crypto_keywords().contains(token) {
        score *= CRYPTO_BOOST;
    }
    if MEMEABLE_LEN.contains(&token.chars().count()) {
        score *= LENGTH_BOOST;
    }
    score
}

/// Count surviving tokens across a set of texts into one multiset.
pub fn count_tokens<'a>(texts: impl IntoIterator<Item = &'a str>) -> HashMap<String, u64> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for text in texts {
        for token in normalize(text) {
            *counts.entry(token).or_default() += 1;
        }
    }
    counts
}

/// The `top_n` tokens by descending score across all records, ignoring
/// tokens seen fewer than `min_count` times.
///
/// Ties break lexicographically (ascending) - the counting structure's
/// iteration order is not part of the contract.
pub fn trending(records: &[Record], min_count: u64, top_n: usize) -> Vec<TrendEntry> {
    let counts = count_tokens(records.iter().map(|r| r.text.as_str()));
    rank(counts, min_count, top_n)
}

/// Rank an existing token multiset. Split out so report sections that
/// already hold counts (high-engagement, monthly) reuse the same ordering.
pub fn rank(counts: HashMap<String, u64>, min_count: u64, top_n: usize) -> Vec<TrendEntry> {
    let mut entries: Vec<TrendEntry> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .map(|(token, count)| {
            let score = score_token(&token, count);
            TrendEntry { token, score }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.token.cmp(&b.token))
    });
    entries.truncate(top_n);
    entries
}
