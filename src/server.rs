//! HTTP front end.
//!
//! `GET /scopus-api` forwards a search to Scopus, normalizes the article
//! entries and answers with their title, venue, date, volume and URL as a
//! CSV attachment. Informational outcomes (empty upstream body, zero hits,
//! bad keywords) are JSON `{"message": ...}` bodies.

use crate::config::ServerConfig;
use crate::error::{Result, ScopusError};
use crate::export::summary_csv_bytes;
use crate::extract::RecordKind;
use crate::normalize::{normalize, total_results};
use crate::scopus::{ScopusClient, SearchQuery};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared, read-only handler state
pub struct AppState {
    client: ScopusClient,
    config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let client = ScopusClient::new(config.api_key.clone(), &config.base_url)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/scopus-api", get(scopus_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn home_handler() -> &'static str {
    "rustscopus - GET /scopus-api?keywords=mouse,rat to download Scopus results as CSV\n"
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Query string of `/scopus-api`
#[derive(Debug, Deserialize)]
pub struct ScopusParams {
    /// Comma-separated keywords
    keywords: Option<String>,
}

/// Turn comma-separated keywords into a `TITLE-ABS-KEY(a AND b)` query.
///
/// Terms shorter than two characters after trimming are dropped; `None` if
/// nothing is left.
pub fn keywords_query(keywords: &str) -> Option<String> {
    let terms: Vec<&str> = keywords
        .split(',')
        .map(str::trim)
        .filter(|k| k.chars().count() > 1)
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(format!("TITLE-ABS-KEY({})", terms.join(" AND ")))
    }
}

async fn scopus_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScopusParams>,
) -> Response {
    let search = match params.keywords.as_deref() {
        None => state.config.default_query.clone(),
        Some(raw) => match keywords_query(raw) {
            Some(q) => q,
            None => return message(StatusCode::BAD_REQUEST, "keywords not found"),
        },
    };

    info!(query = %search, "Scopus export request");

    let mut query = SearchQuery::new(search, RecordKind::Article);
    query.fields = state.config.fields.clone();
    query.date = state.config.date.clone();

    let response = match state.client.search(&query).await {
        Ok(response) => response,
        Err(ScopusError::EmptyResponse) => {
            return message(StatusCode::OK, "error in returning response")
        }
        Err(e) => {
            error!(error = %e, "Search failed");
            return message(StatusCode::BAD_GATEWAY, &e.to_string());
        }
    };

    // Checked before normalizing: an empty result set carries a placeholder entry.
    match total_results(&response) {
        Ok(0) => return message(StatusCode::OK, "none articles has been found"),
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "Unreadable search response");
            return message(StatusCode::BAD_GATEWAY, &e.to_string());
        }
    }

    let (table, total) = match normalize(&response, RecordKind::Article) {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Unreadable search response");
            return message(StatusCode::BAD_GATEWAY, &e.to_string());
        }
    };

    let body = match summary_csv_bytes(&table) {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "CSV rendering failed");
            return message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    if let Err(e) = persist(state.config.output_path.clone(), body.clone()).await {
        warn!(path = %state.config.output_path.display(), error = %e, "Failed to persist CSV");
    }

    info!(rows = table.len(), total = total, "Serving CSV");

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"results.csv\""),
        ],
        body,
    )
        .into_response()
}

/// Replace the file at `path` with `body` in one rename
async fn persist(path: PathBuf, body: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || write_atomically(&path, &body))
        .await
        .map_err(|e| ScopusError::Io(std::io::Error::other(e)))?
}

fn write_atomically(path: &Path, body: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(body)?;
    file.persist(path).map_err(|e| ScopusError::Io(e.error))?;
    Ok(())
}

fn message(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "message": msg }))).into_response()
}
