// Composition tests - the full pipeline chained end to end.
//
// These tests exercise the data flow between modules:
//   SearchSource -> collector -> CSV store -> report -> wishlist
// with a scripted source instead of the network, and a temp dir for the
// store. No real HTTP anywhere.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use moonwatch::analyze::report::generate_report;
use moonwatch::fetch::client::{RawPost, SearchPage, SearchSource};
use moonwatch::fetch::collector::{collect, FetchOptions};
use moonwatch::fetch::error::FetchError;
use moonwatch::store::{read_records, RecordWriter};
use moonwatch::wishlist::WishlistStore;

struct ScriptedSource {
    responses: Mutex<VecDeque<Result<SearchPage, FetchError>>>,
}

impl ScriptedSource {
    fn new(responses: Vec<Result<SearchPage, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl SearchSource for ScriptedSource {
    async fn search(&self, _query: &str, _cursor: Option<&str>) -> Result<SearchPage, FetchError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(SearchPage {
                    posts: vec![],
                    cursor: None,
                })
            })
    }
}

fn post(author: &str, text: &str, likes: u64) -> RawPost {
    RawPost {
        author: author.to_string(),
        text: text.to_string(),
        created_at: "2024-03-05 14:00:00".to_string(),
        retweet_count: 1,
        like_count: likes,
    }
}

fn dogelord_feed() -> Vec<Result<SearchPage, FetchError>> {
    vec![
        Ok(SearchPage {
            posts: vec![
                post("dogelord", "DOGE to the moon! moon moon #doge", 500),
                post("dogelord", "diamond hands, ser - hodl the doge", 50),
                post("dogelord", "new token launch soon, moon mission", 80),
            ],
            cursor: Some("c1".to_string()),
        }),
        Ok(SearchPage {
            posts: vec![
                post("dogelord", "moon doge wagmi https://pump.example/x", 10),
                post("dogelord", "thinking about sourdough today honestly", 5),
            ],
            cursor: None,
        }),
    ]
}

#[tokio::test]
async fn fetch_store_report_chain() {
    let source = ScriptedSource::new(dogelord_feed());
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("tweets_dogelord.csv");

    // Fetch
    let mut writer = RecordWriter::create(&store_path).unwrap();
    let opts = FetchOptions {
        min_records: 5,
        page_delay_secs: 0..=0,
    };
    let outcome = collect(&source, &mut writer, "from:dogelord", &opts)
        .await
        .unwrap();
    drop(writer);
    assert_eq!(outcome.collected, 5);

    // Store round-trip
    let records = read_records(&store_path).unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].sequence_number, 1);
    assert_eq!(records[4].sequence_number, 5);

    // Report
    let report = generate_report(&records, Some("dogelord"));
    assert_eq!(report.total_tweets_analyzed, 5);

    let tokens: Vec<&str> = report
        .overall_trending_words
        .iter()
        .map(|(t, _)| t.as_str())
        .collect();
    assert!(tokens.contains(&"moon"), "moon appears 5 times across posts");
    assert!(tokens.contains(&"doge"), "doge appears 4 times across posts");

    let segment = report.author_segment.expect("scoped to dogelord");
    assert_eq!(segment.records, 5);
    assert!((segment.mean_likes - 129.0).abs() < 1e-9, "(500+50+80+10+5)/5");

    // Every timestamp parses, so the monthly section exists and only
    // holds crypto slang
    let monthly = report.monthly_trends.expect("timestamps all parse");
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].month, 3);
    assert!(monthly[0].keywords.iter().any(|(t, _)| t == "moon"));
    assert!(!monthly[0].keywords.iter().any(|(t, _)| t == "sourdough"));
}

#[tokio::test]
async fn fetch_then_wishlist_notifications() {
    let source = ScriptedSource::new(dogelord_feed());
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("tweets.csv");

    let mut writer = RecordWriter::create(&store_path).unwrap();
    let opts = FetchOptions {
        min_records: 5,
        page_delay_secs: 0..=0,
    };
    collect(&source, &mut writer, "from:dogelord", &opts)
        .await
        .unwrap();
    drop(writer);

    let records = read_records(&store_path).unwrap();

    let mut wishlists = WishlistStore::new();
    wishlists.add("watcher", ["moon".to_string()]);

    let fresh = wishlists.check_new_records(&records, "watcher");

    // Only "new token launch soon, moon mission" carries a launch
    // indicator AND the watched token
    assert_eq!(fresh.len(), 1);
    assert!(fresh[0].matched_tokens.contains("moon"));
    assert_eq!(fresh[0].author, "dogelord");
    assert_eq!(wishlists.notifications("watcher").len(), 1);
}

#[test]
fn report_json_matches_the_http_contract() {
    let records = vec![
        moonwatch::store::Record {
            sequence_number: 1,
            author: "dogelord".to_string(),
            text: "moon moon moon doge".to_string(),
            created_at: "2024-03-05 14:00:00".to_string(),
            retweet_count: 2,
            like_count: 9,
        };
        3
    ];

    let report = generate_report(&records, None);
    let json = serde_json::to_value(&report).unwrap();

    // The three fields the API contract names
    assert!(json["overall_trending_words"].is_array());
    assert!(json["total_tweets_analyzed"].is_u64());
    assert!(json["report_generated_at"].is_string());

    // Entries are [token, score] pairs
    let first = &json["overall_trending_words"][0];
    assert!(first[0].is_string());
    assert!(first[1].is_number());
}
