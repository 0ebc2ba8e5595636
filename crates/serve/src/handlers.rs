//! HTTP handlers for the catalog routes

use crate::backend::CatalogBackend;
use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
};
use movie_catalog_core::{CatalogError, Movie, SearchCriteria};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn CatalogBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self { backend }
    }
}

/// Query parameters of the delete route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteParams {
    pub index: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateParams {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsParams {
    pub index: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

pub async fn handle_search(
    State(state): State<AppState>,
    Json(criteria): Json<SearchCriteria>,
) -> Response {
    match state.backend.search(&criteria).await {
        Ok(body) => json_text(body),
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            (status_for(&e), format!("Error searching movies: {}", e)).into_response()
        }
    }
}

pub async fn handle_fuzzy_search(
    State(state): State<AppState>,
    Json(criteria): Json<SearchCriteria>,
) -> Response {
    match state.backend.fuzzy_search(&criteria).await {
        Ok(body) => json_text(body),
        Err(e) => {
            tracing::error!("Fuzzy search failed: {}", e);
            (status_for(&e), format!("Error searching movies: {}", e)).into_response()
        }
    }
}

pub async fn handle_create(State(state): State<AppState>, Json(movie): Json<Movie>) -> Response {
    match state.backend.create_or_overwrite(&movie).await {
        Ok(title) => (StatusCode::OK, format!("Successfully created {}", title)).into_response(),
        Err(e) => {
            tracing::error!("Create of movie {} failed: {}", movie.id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to create {}", movie.display_title()),
            )
                .into_response()
        }
    }
}

pub async fn handle_update(
    State(state): State<AppState>,
    Query(params): Query<UpdateParams>,
    Json(movie): Json<Movie>,
) -> Response {
    match state.backend.update(params.id, &movie).await {
        Ok(title) => (StatusCode::OK, format!("Successfully updated {}", title)).into_response(),
        Err(CatalogError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            format!("Movie with id {} not found", params.id),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Update of movie {} failed: {}", params.id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to update {}", movie.display_title()),
            )
                .into_response()
        }
    }
}

pub async fn handle_delete(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Response {
    match state
        .backend
        .delete(&params.index, &params.doc_type, &params.id)
        .await
    {
        Ok(status) => (StatusCode::OK, status.to_string()).into_response(),
        Err(e) => {
            tracing::error!(
                "Delete of {}/{}/{} failed: {}",
                params.index,
                params.doc_type,
                params.id,
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error deleting ElasticSearch document",
            )
                .into_response()
        }
    }
}

pub async fn handle_statistics(
    State(state): State<AppState>,
    Query(params): Query<StatisticsParams>,
) -> Response {
    match state.backend.index_statistics(&params.index).await {
        Ok(body) => json_text(body),
        Err(e) => {
            tracing::error!("Statistics for {} failed: {}", params.index, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error fetching statistics for index",
            )
                .into_response()
        }
    }
}

/// Raw store JSON passed through unchanged
fn json_text(body: String) -> Response {
    (StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response()
}

/// Status for a failed read
fn status_for(error: &CatalogError) -> StatusCode {
    match error {
        CatalogError::Transport { .. } | CatalogError::Timeout { .. } | CatalogError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        CatalogError::Validation { .. } => StatusCode::BAD_REQUEST,
        CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
