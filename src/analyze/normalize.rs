// Text normalization - raw post text to a sequence of clean tokens.
//
// The steps run in a fixed order; each is a pure function of the string.
// URLs must go before the punctuation strip (the strip would otherwise
// leave their hostnames behind as fake tokens).

use std::sync::OnceLock;

use regex_lite::Regex;

use super::keywords::stop_word_set;

/// Tokens shorter than this never survive. Two-letter fragments are almost
/// always contraction shrapnel after the punctuation strip.
const MIN_TOKEN_LEN: usize = 3;

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z][a-z0-9+.-]*://\S+").unwrap())
}

fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@\w+").unwrap())
}

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\w+)").unwrap())
}

fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").unwrap())
}

/// Map raw free-text to its surviving tokens, in order of appearance.
///
/// Lower-cases, strips URLs / @mentions / the `#` of hashtags / remaining
/// punctuation, splits on whitespace, and drops stop words and tokens
/// shorter than three characters.
pub fn normalize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let no_urls = url_re().replace_all(&lowered, "");
    let no_mentions = mention_re().replace_all(&no_urls, "");
    let no_hashtags = hashtag_re().replace_all(&no_mentions, "$1");
    let cleaned = symbol_re().replace_all(&no_hashtags, "");

    let stops = stop_word_set();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_TOKEN_LEN && !stops.contains(*w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_drops_stop_words() {
        let tokens = normalize("The MOON is Pumping");
        assert_eq!(tokens, vec!["moon", "pumping"]);
    }

    #[test]
    fn strips_urls_entirely() {
        let tokens = normalize("rare gem dropping https://moonwatch.example/presale?ref=anon imminent");
        assert_eq!(tokens, vec!["rare", "gem", "dropping", "imminent"]);
    }

    #[test]
    fn strips_mentions_keeps_hashtag_text() {
        let tokens = normalize("@elonmusk shilling #dogecoin relentlessly");
        assert_eq!(tokens, vec!["shilling", "dogecoin", "relentlessly"]);
    }

    #[test]
    fn strips_punctuation_inside_words() {
        let tokens = normalize("moon!!! mega-pump, hodl...");
        // hyphenated words collapse rather than split
        assert_eq!(tokens, vec!["moon", "megapump", "hodl"]);
    }

    #[test]
    fn drops_short_tokens() {
        let tokens = normalize("up 5x on my ETH bag lol");
        for t in &tokens {
            assert!(t.chars().count() >= 3, "token {t:?} is too short");
        }
        assert!(!tokens.contains(&"5x".to_string()));
    }

    #[test]
    fn survivors_are_never_stop_words() {
        let tokens = normalize("this is the most epic takeover of all time and then some");
        let stops = stop_word_set();
        for t in &tokens {
            assert!(!stops.contains(t), "stop word {t:?} survived");
        }
    }

    #[test]
    fn empty_and_noise_only_inputs_yield_nothing() {
        assert!(normalize("").is_empty());
        assert!(normalize("!!! ... @someone https://x.example/y").is_empty());
    }

    #[test]
    fn idempotent_on_its_own_output() {
        let texts = [
            "Just launched a new DOGE rocket to the moon! Check out our new token.",
            "WAGMI ser - #diamond hands only, @whale https://pump.example/x",
            "Interesting thoughts on blockchain scalability.",
        ];
        for text in texts {
            let once = normalize(text);
            let twice = normalize(&once.join(" "));
            assert_eq!(once, twice, "normalization not idempotent for {text:?}");
        }
    }
}
