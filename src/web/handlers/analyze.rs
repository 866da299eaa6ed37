// GET /analyze?username=<handle> - fetch a handle's posts and report trends.
//
// The fetch runs inline: the response is the freshly computed report.
// Repeat requests within the cache TTL skip the fetch entirely.
//
// Concurrent requests for different handles each run their own fetch
// against the provider - there is no cross-request rate-limit sharing.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info};

use crate::analyze::report::generate_report;
use crate::fetch::client::HttpSearchClient;
use crate::fetch::collector::{collect, FetchOptions};
use crate::fetch::session;
use crate::store::{read_records, RecordWriter};
use crate::web::{api_error, AppState};

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub username: Option<String>,
}

/// GET /analyze - fetch then analyze one handle's recent posts.
pub async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Response {
    let Some(username) = params.username.filter(|u| !u.trim().is_empty()) else {
        return api_error(StatusCode::BAD_REQUEST, "username is required");
    };
    let username = username.trim().trim_start_matches('@').to_string();

    if let Some(report) = state.reports.lock().await.get(&username) {
        info!(username = %username, "serving cached report");
        return Json(report).into_response();
    }

    // Authenticate (cached session, falling back to login)
    let session = match session::load_or_login(&state.config).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "authentication failed");
            return api_error(
                StatusCode::BAD_GATEWAY,
                &format!("Failed to authenticate: {e}"),
            );
        }
    };

    let client = match HttpSearchClient::new(&state.config.api_base_url, &session) {
        Ok(c) => c,
        Err(e) => {
            return api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to build search client: {e}"),
            );
        }
    };

    // Fetch into this handle's store file
    let store_path = state.config.store_path(&username);
    let mut writer = match RecordWriter::create(&store_path) {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "store creation failed");
            return api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to create record store: {e}"),
            );
        }
    };

    let query = format!("from:{username}");
    let opts = FetchOptions::with_target(state.config.min_records);
    let outcome = match collect(&client, &mut writer, &query, &opts).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "fetch failed");
            return api_error(StatusCode::BAD_GATEWAY, &format!("Failed to fetch tweets: {e}"));
        }
    };
    drop(writer);

    if !store_path.exists() {
        return api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Record store was not created",
        );
    }

    let records = match read_records(&store_path) {
        Ok(records) => records,
        Err(e) => {
            return api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Failed to load records: {e}"),
            );
        }
    };

    info!(
        username = %username,
        collected = outcome.collected,
        "fetch finished, generating report"
    );

    // New records may trigger launch notifications for any watcher
    {
        let mut wishlists = state.wishlists.write().await;
        for user in wishlists.users() {
            wishlists.check_new_records(&records, &user);
        }
    }

    let report = generate_report(&records, Some(&username));
    state
        .reports
        .lock()
        .await
        .insert(username, report.clone());

    Json(report).into_response()
}
