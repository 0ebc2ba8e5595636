//! Movie Catalog Serve Library
//!
//! HTTP interface of the movie catalog: search, fuzzy search, create,
//! update, delete and index statistics under `/elastic-search`.

pub mod api;
pub mod backend;
pub mod handlers;
pub mod server;

pub use backend::CatalogBackend;
pub use handlers::AppState;
pub use movie_catalog_core::config::ServerConfig;
pub use server::{create_app, CatalogServer, ServerBuilder};

/// Server version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
