//! Route table of the catalog HTTP interface

use crate::handlers::{
    handle_create, handle_delete, handle_fuzzy_search, handle_search, handle_statistics,
    handle_update, health_check, AppState,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// Prefix of every catalog route
pub const API_PREFIX: &str = "/elastic-search";

/// Catalog routes under [`API_PREFIX`] plus `/health`
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .nest(API_PREFIX, catalog_routes())
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/search", post(handle_search))
        .route("/fuzzySearch", post(handle_fuzzy_search))
        .route("/create", post(handle_create))
        .route("/update", put(handle_update))
        .route("/delete", delete(handle_delete))
        .route("/statistics", get(handle_statistics))
}
