// Wishlist routes - manage per-user watch tokens and read notifications.
//
// GET    /wishlist/{user}                - current token set
// POST   /wishlist/{user}                - add tokens  {"tokens": [...]}
// DELETE /wishlist/{user}                - remove tokens  {"tokens": [...]}
// GET    /wishlist/{user}/notifications  - full notification history

use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct TokensBody {
    #[serde(default)]
    pub tokens: Vec<String>,
}

fn wishlist_response(user: &str, tokens: BTreeSet<String>) -> Response {
    Json(serde_json::json!({ "user": user, "tokens": tokens })).into_response()
}

/// GET /wishlist/{user}
pub async fn get_wishlist(State(state): State<AppState>, Path(user): Path<String>) -> Response {
    let tokens = state.wishlists.read().await.get(&user);
    wishlist_response(&user, tokens)
}

/// POST /wishlist/{user}
pub async fn add_tokens(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(body): Json<TokensBody>,
) -> Response {
    let tokens = state.wishlists.write().await.add(&user, body.tokens);
    wishlist_response(&user, tokens)
}

/// DELETE /wishlist/{user}
pub async fn remove_tokens(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(body): Json<TokensBody>,
) -> Response {
    let tokens = state.wishlists.write().await.remove(&user, &body.tokens);
    wishlist_response(&user, tokens)
}

/// GET /wishlist/{user}/notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Response {
    let wishlists = state.wishlists.read().await;
    Json(serde_json::json!({
        "user": user,
        "notifications": wishlists.notifications(&user),
    }))
    .into_response()
}
