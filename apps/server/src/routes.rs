//! HTTP endpoints: ingest (JSON and browser), list, and manual regenerate.
//!
//! Handlers never write to the store directly; submissions go through the
//! ingestion worker's queue and block on each job's completion signal.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use readstack_core::{IngestHandle, PublishCoordinator};
use readstack_shared::{NewArticle, ReadstackError};
use readstack_storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestHandle,
    pub storage: Arc<Storage>,
    pub coordinator: Arc<PublishCoordinator>,
    pub ingest_token: Arc<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ingest/direct", post(direct_ingest))
        .route("/ingest/browser", get(browser_ingest))
        .route("/list", get(list))
        .route("/generate", post(generate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Token comparison through fixed-size digests, so the comparison time does
/// not depend on how much of the presented token matches.
fn token_matches(expected: &str, presented: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(presented.as_bytes())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    matches!(bearer_token(headers), Some(token) if token_matches(&state.ingest_token, token))
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// Submission payload for both ingest endpoints.
#[derive(Debug, Deserialize)]
struct IngestRequest {
    url: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, alias = "image")]
    image_url: String,
    /// Defaults to the submission time when absent.
    date: Option<DateTime<Utc>>,
    #[serde(default)]
    is_favourite: bool,
}

impl IngestRequest {
    fn into_article(self) -> Result<NewArticle, ReadstackError> {
        if self.title.trim().is_empty() {
            return Err(ReadstackError::validation("title must not be empty"));
        }
        Ok(NewArticle {
            url: self.url,
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            date: self.date.unwrap_or_else(Utc::now),
            is_favourite: self.is_favourite,
        })
    }
}

fn ingest_error_response(err: ReadstackError) -> Response {
    let status = match &err {
        ReadstackError::InvalidUrl { .. } | ReadstackError::Validation { .. } => {
            StatusCode::BAD_REQUEST
        }
        ReadstackError::SubmitTimeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!(error = %err, "ingest failed");
    } else {
        warn!(error = %err, "ingest rejected");
    }
    (status, err.to_string()).into_response()
}

/// JSON ingest endpoint for scripted clients.
async fn direct_ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<IngestRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let article = match request.into_article() {
        Ok(article) => article,
        Err(err) => return ingest_error_response(err),
    };

    match state.ingest.submit(article).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => ingest_error_response(err),
    }
}

/// Query-parameter ingest endpoint for the bookmarklet. Responds with a
/// small HTML page so it can be opened directly in a browser.
#[derive(Debug, Deserialize)]
struct BrowserIngest {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    token: String,
}

async fn browser_ingest(
    State(state): State<AppState>,
    Query(query): Query<BrowserIngest>,
) -> Response {
    let mut response = if !token_matches(&state.ingest_token, &query.token) {
        (
            StatusCode::UNAUTHORIZED,
            message_page("Invalid token", "Unauthorised - invalid token"),
        )
            .into_response()
    } else {
        let request = IngestRequest {
            url: query.url,
            title: query.title,
            description: query.description,
            image_url: query.image,
            date: None,
            is_favourite: false,
        };
        let outcome = match request.into_article() {
            Ok(article) => state.ingest.submit(article).await.map(|_| ()),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(()) => (StatusCode::OK, saved_page()).into_response(),
            Err(err) => {
                warn!(error = %err, "browser ingest rejected");
                (
                    StatusCode::BAD_REQUEST,
                    message_page("Addition failed", &format!("Error: {err}")),
                )
                    .into_response()
            }
        }
    };

    // The bookmarklet fires from arbitrary origins.
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

fn base_page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html><html><head>\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title}</title>\
         <style>body {{ font-family: sans-serif; font-size: 1.1rem; padding: 1em; }}</style>\
         </head><body>{body}</body></html>",
        title = html_escape::encode_text(title),
    ))
}

fn message_page(title: &str, message: &str) -> Html<String> {
    base_page(
        title,
        &format!(
            "<p style=\"font-weight: bold;\">{}</p>",
            html_escape::encode_text(message)
        ),
    )
}

fn saved_page() -> Html<String> {
    base_page(
        "Success!",
        "<p style=\"font-weight: bold;\">Success!</p>\
         <script>setTimeout(function(){history.back();}, 750);</script>",
    )
}

// ---------------------------------------------------------------------------
// List / regenerate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListQuery {
    year: Option<i32>,
    month: Option<u32>,
}

/// JSON dump of stored articles, optionally filtered to one month.
async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let result = match (query.year, query.month) {
        (Some(year), Some(month)) => state.storage.get_articles_for_month(year, month).await,
        _ => state.storage.get_all_articles().await,
    };

    match result {
        Ok(articles) => Json(articles).into_response(),
        Err(ReadstackError::Validation { message }) => {
            (StatusCode::BAD_REQUEST, message).into_response()
        }
        Err(err) => {
            error!(error = %err, "list query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Manual republish trigger. Blocks on the publish lock, so a request that
/// arrives mid-publish waits for the in-flight cycle instead of overlapping
/// it.
async fn generate(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match state.coordinator.publish().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!(error = %err, "manual publish failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
