//! HTTP surface: one search operation plus a liveness probe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::pipeline::SearchPipeline;
use crate::types::{SearchError, SearchResult};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub url: String,
    pub query: String,
}

pub fn router(pipeline: Arc<SearchPipeline>) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/health", get(health))
        .with_state(pipeline)
}

async fn search(
    State(pipeline): State<Arc<SearchPipeline>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let results = pipeline.search(&request.url, &request.query).await?;
    Ok(Json(results))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "message": "API is running" }))
}

/// Newtype so [`SearchError`] can map onto HTTP responses.
pub struct ApiError(SearchError);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SearchError::InvalidInput(_)
            | SearchError::Fetch(_)
            | SearchError::EmptyContent => StatusCode::BAD_REQUEST,
            SearchError::Index(_) | SearchError::Query(_) | SearchError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "search request failed");
        } else {
            tracing::debug!(error = %self.0, "rejected search request");
        }
        let body = Json(json!({
            "error": self.0.kind(),
            "detail": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
