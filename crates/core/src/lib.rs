//! Movie Catalog Core Library
//!
//! Domain model, query compiler and configuration for the movie catalog.
//! The catalog is a search/CRUD facade over a managed document store; this
//! crate holds everything that does not touch the network: the movie and
//! criteria types, the translation of criteria into the store's query
//! language, the error taxonomy and the configuration model.

pub mod config;
pub mod error;
pub mod query;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::CatalogConfig;
pub use error::{CatalogError, ErrorCategory, Result};
pub use query::{compile, compile_fuzzy, CompiledQuery, QueryClause, QueryTree};
pub use types::{GenreSet, Movie, Person, SearchCriteria};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version info as a formatted string
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
