// Curated vocabularies: crypto slang, stop words, launch indicators.
//
// The crypto set is the scoring heuristic's heart - tokens in it get a
// 1.5x boost. It was tuned by hand against celebrity feeds; resist the
// urge to generate it from data.

use std::collections::HashSet;
use std::sync::OnceLock;

use stop_words::{get, LANGUAGE};

/// Slang vocabulary that signals memecoin potential.
pub const CRYPTO_KEYWORDS: &[&str] = &[
    "moon", "rocket", "pump", "diamond", "hands", "hodl", "doge", "shib", "ape", "bull", "bear",
    "whale", "lambo", "fomo", "mooning", "flip", "token", "nft", "metaverse", "crypto", "chain",
    "block", "mint", "stake", "yield", "farm", "web3", "defi", "alpha", "based", "wagmi", "ngmi",
    "gm", "gn", "ser", "anon", "ratio", "pepe", "wojak", "chad", "stonks", "tendies", "galaxy",
    "mars", "pluto", "satoshi", "vitalik", "meme", "gem", "launch", "drop", "airdrop", "sweep",
    "floor", "rare", "legend", "community", "degen", "rekt", "gigabrain", "laser", "eyes", "flex",
    "burn", "cap", "liquidity", "locked", "mission", "epic", "king", "queen", "takeover", "green",
    "candle", "bags", "flippening",
];

/// Social-media noise the general English stop list doesn't cover:
/// URL shrapnel, retweet markers, entity leftovers.
const NOISE_WORDS: &[&str] = &[
    "https", "http", "co", "t", "amp", "rt", "just", "very", "get", "got", "getting", "via", "go",
    "going", "goes", "gone",
];

/// Phrases that heuristically signal a new-asset announcement.
/// Matched as substrings of lower-cased post text.
pub const LAUNCH_INDICATORS: &[&str] = &[
    "launch",
    "token",
    "airdrop",
    "new coin",
    "memecoin",
    "just created",
];

/// The crypto slang set, for membership checks during scoring.
pub fn crypto_keywords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| CRYPTO_KEYWORDS.iter().copied().collect())
}

/// English function words plus the noise list above.
pub fn stop_word_set() -> &'static HashSet<String> {
    static SET: OnceLock<HashSet<String>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut set: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
        set.extend(NOISE_WORDS.iter().map(|w| w.to_string()));
        set
    })
}
