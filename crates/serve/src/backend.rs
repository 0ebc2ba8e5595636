//! The operations the HTTP layer needs from the catalog

use async_trait::async_trait;
use movie_catalog_core::{Movie, Result, SearchCriteria};
use movie_catalog_infra::CatalogService;

/// Catalog operations behind the HTTP routes
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn search(&self, criteria: &SearchCriteria) -> Result<String>;

    async fn fuzzy_search(&self, criteria: &SearchCriteria) -> Result<String>;

    /// Returns the stored title
    async fn create_or_overwrite(&self, movie: &Movie) -> Result<String>;

    /// Returns the stored title, or `NotFound` when `id` does not exist
    async fn update(&self, id: i64, movie: &Movie) -> Result<String>;

    /// Returns the store's status code
    async fn delete(&self, index: &str, doc_type: &str, id: &str) -> Result<u16>;

    async fn index_statistics(&self, index: &str) -> Result<String>;
}

#[async_trait]
impl CatalogBackend for CatalogService {
    async fn search(&self, criteria: &SearchCriteria) -> Result<String> {
        CatalogService::search(self, criteria).await
    }

    async fn fuzzy_search(&self, criteria: &SearchCriteria) -> Result<String> {
        CatalogService::fuzzy_search(self, criteria).await
    }

    async fn create_or_overwrite(&self, movie: &Movie) -> Result<String> {
        CatalogService::create_or_overwrite(self, movie).await
    }

    async fn update(&self, id: i64, movie: &Movie) -> Result<String> {
        CatalogService::update(self, id, movie).await
    }

    async fn delete(&self, index: &str, doc_type: &str, id: &str) -> Result<u16> {
        CatalogService::delete(self, index, doc_type, id).await
    }

    async fn index_statistics(&self, index: &str) -> Result<String> {
        CatalogService::index_statistics(self, index).await
    }
}
