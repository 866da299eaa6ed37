// Web server - Axum-based trend report API.
//
// One route does the heavy lifting: GET /analyze fetches a handle's
// recent posts and returns the trend report. Wishlist routes manage the
// per-user watch sets that drive launch notifications.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::wishlist::WishlistStore;

pub mod cache;
pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub wishlists: Arc<RwLock<WishlistStore>>,
    pub reports: Arc<Mutex<cache::ReportCache>>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: Config, port: u16, bind: &str) -> Result<()> {
    let state = AppState {
        config: Arc::new(config),
        wishlists: Arc::new(RwLock::new(WishlistStore::new())),
        reports: Arc::new(Mutex::new(cache::ReportCache::default())),
    };

    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Moonwatch API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", get(handlers::analyze::analyze))
        .route("/health", get(health))
        .route(
            "/wishlist/{user}",
            get(handlers::wishlist::get_wishlist)
                .post(handlers::wishlist::add_tokens)
                .delete(handlers::wishlist::remove_tokens),
        )
        .route(
            "/wishlist/{user}/notifications",
            get(handlers::wishlist::get_notifications),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Deployment health check - always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
