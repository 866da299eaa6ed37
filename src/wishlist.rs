// Wishlists and launch notifications.
//
// Each user keeps a set of watched tokens. When freshly fetched records
// contain a launch-indicator phrase AND one of the user's tokens, a
// notification is generated and appended to that user's log. The log is
// append-only; nothing expires it.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::analyze::keywords::LAUNCH_INDICATORS;
use crate::store::Record;

/// A launch alert for one record that matched a user's wishlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub author: String,
    pub text: String,
    pub created_at: String,
    pub matched_tokens: BTreeSet<String>,
    pub generated_at: String,
}

/// In-memory wishlist and notification state, keyed by user id.
#[derive(Debug, Default)]
pub struct WishlistStore {
    wishlists: HashMap<String, BTreeSet<String>>,
    notifications: HashMap<String, Vec<Notification>>,
}

impl WishlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add tokens to a user's wishlist, creating it on first use.
    /// Tokens are lower-cased; duplicates vanish (set semantics).
    /// Returns the resulting set.
    pub fn add(&mut self, user: &str, tokens: impl IntoIterator<Item = String>) -> BTreeSet<String> {
        let wishlist = self.wishlists.entry(user.to_string()).or_default();
        for token in tokens {
            let token = token.trim().to_lowercase();
            if !token.is_empty() {
                wishlist.insert(token);
            }
        }
        wishlist.clone()
    }

    /// Remove tokens from a user's wishlist. A user with no wishlist is a
    /// no-op and yields the empty set.
    pub fn remove(&mut self, user: &str, tokens: &[String]) -> BTreeSet<String> {
        let Some(wishlist) = self.wishlists.get_mut(user) else {
            return BTreeSet::new();
        };
        for token in tokens {
            wishlist.remove(&token.trim().to_lowercase());
        }
        wishlist.clone()
    }

    /// A user's current wishlist; empty set for unknown users.
    pub fn get(&self, user: &str) -> BTreeSet<String> {
        self.wishlists.get(user).cloned().unwrap_or_default()
    }

    /// Every user that currently has a wishlist.
    pub fn users(&self) -> Vec<String> {
        self.wishlists.keys().cloned().collect()
    }

    /// A user's full notification history, oldest first.
    pub fn notifications(&self, user: &str) -> &[Notification] {
        self.notifications
            .get(user)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Match freshly fetched records against one user's wishlist.
    ///
    /// A record notifies when its lower-cased text contains a launch
    /// indicator phrase and at least one watched token as a substring.
    /// New notifications append to the user's log; only the new batch is
    /// returned, not the history.
    pub fn check_new_records(&mut self, records: &[Record], user: &str) -> Vec<Notification> {
        let watched = self.get(user);
        if watched.is_empty() {
            return Vec::new();
        }

        let mut fresh = Vec::new();
        for record in records {
            let lowered = record.text.to_lowercase();

            if !LAUNCH_INDICATORS.iter().any(|p| lowered.contains(p)) {
                continue;
            }

            let matched: BTreeSet<String> = watched
                .iter()
                .filter(|token| lowered.contains(token.as_str()))
                .cloned()
                .collect();
            if matched.is_empty() {
                continue;
            }

            fresh.push(Notification {
                author: record.author.clone(),
                text: record.text.clone(),
                created_at: record.created_at.clone(),
                matched_tokens: matched,
                generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            });
        }

        if !fresh.is_empty() {
            info!(user = user, count = fresh.len(), "launch notifications generated");
            self.notifications
                .entry(user.to_string())
                .or_default()
                .extend(fresh.iter().cloned());
        }

        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> Record {
        Record {
            sequence_number: 1,
            author: "dogelord".to_string(),
            text: text.to_string(),
            created_at: "2024-03-05 14:00:00".to_string(),
            retweet_count: 0,
            like_count: 0,
        }
    }

    #[test]
    fn add_then_get_is_a_set() {
        let mut store = WishlistStore::new();
        store.add("u1", ["moon".to_string(), "rocket".to_string()]);
        // duplicates and different call order change nothing
        store.add("u1", ["rocket".to_string(), "moon".to_string(), "moon".to_string()]);

        let expected: BTreeSet<String> = ["moon", "rocket"].iter().map(|s| s.to_string()).collect();
        assert_eq!(store.get("u1"), expected);
    }

    #[test]
    fn add_lowercases_and_trims() {
        let mut store = WishlistStore::new();
        let set = store.add("u1", ["  MOON ".to_string(), "".to_string()]);
        assert_eq!(set.len(), 1);
        assert!(set.contains("moon"));
    }

    #[test]
    fn remove_on_missing_user_is_empty_and_quiet() {
        let mut store = WishlistStore::new();
        let set = store.remove("ghost", &["moon".to_string()]);
        assert!(set.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = WishlistStore::new();
        store.add("u1", ["moon".to_string(), "rocket".to_string()]);
        let once = store.remove("u1", &["moon".to_string()]);
        let twice = store.remove("u1", &["moon".to_string()]);
        assert_eq!(once, twice);
        assert!(once.contains("rocket"));
    }

    #[test]
    fn get_unknown_user_is_empty() {
        let store = WishlistStore::new();
        assert!(store.get("ghost").is_empty());
    }

    #[test]
    fn launch_plus_watched_token_notifies() {
        let mut store = WishlistStore::new();
        store.add("u1", ["moon".to_string()]);

        let records = vec![record(
            "Just launched a new DOGE rocket to the moon! Check out our new token.",
        )];
        let fresh = store.check_new_records(&records, "u1");

        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].matched_tokens.contains("moon"));
        assert_eq!(fresh[0].author, "dogelord");
    }

    #[test]
    fn no_launch_indicator_means_no_notification() {
        let mut store = WishlistStore::new();
        store.add("u1", ["moon".to_string()]);

        let records = vec![record("Interesting thoughts on blockchain scalability.")];
        assert!(store.check_new_records(&records, "u1").is_empty());
    }

    #[test]
    fn launch_without_watched_token_is_silent() {
        let mut store = WishlistStore::new();
        store.add("u1", ["lambo".to_string()]);

        let records = vec![record("Huge airdrop coming for early supporters")];
        assert!(store.check_new_records(&records, "u1").is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let mut store = WishlistStore::new();
        store.add("u1", ["MOON".to_string()]);

        let records = vec![record("TOKEN LAUNCH: TO THE MOON")];
        let fresh = store.check_new_records(&records, "u1");
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].matched_tokens.contains("moon"));
    }

    #[test]
    fn notifications_accumulate_and_return_only_new_batch() {
        let mut store = WishlistStore::new();
        store.add("u1", ["moon".to_string()]);

        let first = vec![record("new token headed to the moon")];
        let second = vec![record("another memecoin moon mission just created")];

        let batch1 = store.check_new_records(&first, "u1");
        assert_eq!(batch1.len(), 1);

        let batch2 = store.check_new_records(&second, "u1");
        assert_eq!(batch2.len(), 1, "second batch holds only the new notification");

        assert_eq!(store.notifications("u1").len(), 2, "log keeps both");
    }

    #[test]
    fn user_without_wishlist_gets_nothing() {
        let mut store = WishlistStore::new();
        let records = vec![record("new token launch, moon soon")];
        assert!(store.check_new_records(&records, "ghost").is_empty());
        assert!(store.notifications("ghost").is_empty());
    }
}
