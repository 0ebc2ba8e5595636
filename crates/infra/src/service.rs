//! Catalog operations over the signed request pipeline
//!
//! Every call compiles its own query, builds a fresh request and signs it
//! immediately before sending. The only state shared between calls is the
//! resolved credential set.

use crate::credentials::{CachedCredentials, ChainCredentialProvider};
use crate::executor::RequestExecutor;
use crate::request::RequestBuilder;
use crate::response::ResponseEnvelope;
use crate::signer::Signer;
use movie_catalog_core::config::{IndexConfig, SearchConfig};
use movie_catalog_core::{
    compile, compile_fuzzy, store, CatalogConfig, CatalogError, CompiledQuery, Movie, Result,
    SearchCriteria,
};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Search and write access to the movie index
#[derive(Debug, Clone)]
pub struct CatalogService {
    builder: RequestBuilder,
    signer: Signer,
    executor: RequestExecutor,
    credentials: Arc<CachedCredentials>,
    index: IndexConfig,
    search: SearchConfig,
}

impl CatalogService {
    /// Create a service from configuration and a shared credential cache
    pub fn new(config: &CatalogConfig, credentials: Arc<CachedCredentials>) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let signer = Signer::new(&config.aws.region, &config.aws.service_name)?;
        let executor =
            RequestExecutor::new(config.aws.request_timeout_seconds.map(Duration::from_secs))?;

        info!(
            "Catalog store at {} (region {}, service {})",
            endpoint,
            signer.region(),
            signer.service()
        );

        Ok(Self {
            builder: RequestBuilder::new(&endpoint),
            signer,
            executor,
            credentials,
            index: config.index.clone(),
            search: config.search.clone(),
        })
    }

    /// Create a service whose credentials come from configuration or the default chain.
    ///
    /// Credentials are resolved here, before any request is served, so a
    /// missing key pair fails at startup.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let provider = ChainCredentialProvider::from_config(&config.aws);
        let credentials = Arc::new(CachedCredentials::new(Box::new(provider)));
        credentials.get()?;
        Self::new(config, credentials)
    }

    pub fn index(&self) -> &IndexConfig {
        &self.index
    }

    /// Boolean search of the configured index with the default page
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<String> {
        self.search_index(
            &self.index.name,
            self.search.from,
            self.search.size,
            None,
            criteria,
        )
        .await
    }

    /// Boolean search returning the filtered body verbatim.
    ///
    /// The body is returned whatever the status; `{}` means no hits. A request
    /// that never reached the store is an error.
    pub async fn search_index(
        &self,
        index: &str,
        from: u32,
        size: u32,
        field_filter: Option<&[String]>,
        criteria: &SearchCriteria,
    ) -> Result<String> {
        let query = compile(criteria, from, size, field_filter);
        self.run_search(index, &query).await
    }

    /// Fuzzy storyline/synopsis search of the configured index
    pub async fn fuzzy_search(&self, criteria: &SearchCriteria) -> Result<String> {
        self.fuzzy_search_index(
            &self.index.name,
            self.search.from,
            self.search.size,
            None,
            criteria,
        )
        .await
    }

    pub async fn fuzzy_search_index(
        &self,
        index: &str,
        from: u32,
        size: u32,
        field_filter: Option<&[String]>,
        criteria: &SearchCriteria,
    ) -> Result<String> {
        let query = compile_fuzzy(criteria, from, size, field_filter);
        self.run_search(index, &query).await
    }

    /// Write the full document keyed by its id. Returns the title on 2xx.
    pub async fn create_or_overwrite(&self, movie: &Movie) -> Result<String> {
        let document = movie.to_document()?;
        let path = store::document_path(
            &self.index.name,
            &self.index.document_type,
            &movie.id.to_string(),
        )?;

        let response = self.send(&path, Some(document), None, Method::PUT).await?;
        if !response.is_success() {
            warn!(
                "Write of movie {} rejected with status {}",
                movie.id,
                response.status()
            );
            return Err(CatalogError::rejected(response.status(), response.into_body()));
        }

        info!("Stored movie {} ({})", movie.id, movie.display_title());
        Ok(movie.display_title().to_string())
    }

    /// Overwrite movie `id` if a search by id finds it.
    ///
    /// Nothing is written when the search comes back empty or the store
    /// answers the search with a non-2xx status.
    pub async fn update(&self, id: i64, movie: &Movie) -> Result<String> {
        if id <= 0 {
            return Err(CatalogError::validation(format!(
                "Movie id must be positive, got {}",
                id
            )));
        }

        let query = compile(
            &SearchCriteria::by_id(id),
            self.search.from,
            self.search.size,
            None,
        );
        let existing = self.search_envelope(&self.index.name, &query).await?;
        if !existing.is_success() {
            warn!(
                "Existence check for movie {} failed with status {}",
                id,
                existing.status()
            );
            return Err(CatalogError::rejected(existing.status(), existing.into_body()));
        }
        if store::is_empty_result(existing.body()) {
            info!("Movie {} not found, nothing updated", id);
            return Err(CatalogError::not_found(format!("Movie {}", id)));
        }

        let mut document = movie.clone();
        document.id = id;
        self.create_or_overwrite(&document).await
    }

    /// Delete one document. Succeeds only on status 200.
    pub async fn delete(&self, index: &str, doc_type: &str, id: &str) -> Result<u16> {
        let path = store::document_path(index, doc_type, id)?;
        let response = self.send(&path, None, None, Method::DELETE).await?;
        if !response.is_ok() {
            warn!("Delete of {} returned status {}", path, response.status());
            return Err(CatalogError::rejected(response.status(), response.into_body()));
        }

        info!("Deleted {}", path);
        Ok(response.status())
    }

    /// Raw statistics of an index. Succeeds only on status 200.
    pub async fn index_statistics(&self, index: &str) -> Result<String> {
        let path = store::stats_path(index)?;
        let response = self.send(&path, None, None, Method::GET).await?;
        if !response.is_ok() {
            warn!("Statistics for {} returned status {}", index, response.status());
            return Err(CatalogError::rejected(response.status(), response.into_body()));
        }
        Ok(response.into_body())
    }

    async fn run_search(&self, index: &str, query: &CompiledQuery) -> Result<String> {
        let response = self.search_envelope(index, query).await?;
        if !response.is_success() {
            warn!("Search of {} returned status {}", index, response.status());
        }
        Ok(response.into_body())
    }

    async fn search_envelope(
        &self,
        index: &str,
        query: &CompiledQuery,
    ) -> Result<ResponseEnvelope> {
        let body = query.to_body()?;
        info!("Store query body: {}", body);

        self.send(
            &store::search_path(index)?,
            Some(body),
            Some(store::source_filter_params()),
            Method::GET,
        )
        .await
    }

    /// Build, sign and execute one request
    async fn send(
        &self,
        path: &str,
        body: Option<String>,
        params: Option<Vec<(String, String)>>,
        method: Method,
    ) -> Result<ResponseEnvelope> {
        let unsigned = self.builder.build(path, body, params, method)?;
        let credentials = self.credentials.get()?;
        let signed = self.signer.sign(unsigned, credentials)?;
        debug!("Signed {} {}", signed.method(), signed.url());
        self.executor.execute(signed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{CredentialProvider, Credentials};
    use mockito::Matcher;

    struct NoCredentials;

    impl CredentialProvider for NoCredentials {
        fn name(&self) -> &'static str {
            "none"
        }

        fn resolve(&self) -> Result<Credentials> {
            Err(CatalogError::signing("no credentials configured"))
        }
    }

    fn config_for(endpoint: String) -> CatalogConfig {
        let mut config = CatalogConfig::default();
        config.aws.endpoint = endpoint;
        config
    }

    fn service(endpoint: String) -> CatalogService {
        CatalogService::new(
            &config_for(endpoint),
            Arc::new(CachedCredentials::fixed(Credentials::new(
                "AKIDTEST",
                "secret",
            ))),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_sends_compiled_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/movies/_search")
            .match_query(Matcher::UrlEncoded(
                "filter_path".into(),
                "hits.hits._source".into(),
            ))
            .match_body(
                r#"{"from":0,"size":100,"query":{"bool":{"must":[{"match":{"title":"Inception"}},{"match":{"year":2010}}]}}}"#,
            )
            .with_status(200)
            .with_body(r#"{"hits":{"hits":[{"_source":{"id":1,"title":"Inception"}}]}}"#)
            .create_async()
            .await;

        let criteria = SearchCriteria::default()
            .with_title("Inception")
            .with_year(2010);
        let body = service(server.url()).search(&criteria).await.unwrap();

        assert!(body.contains("Inception"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_returns_body_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/movies/_search")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"parsing_exception"}"#)
            .create_async()
            .await;

        let body = service(server.url())
            .search(&SearchCriteria::default())
            .await
            .unwrap();
        assert!(body.contains("parsing_exception"));
    }

    #[tokio::test]
    async fn test_search_transport_failure_is_an_error() {
        let result = service("http://127.0.0.1:1".to_string())
            .search(&SearchCriteria::by_id(1))
            .await;
        assert!(result.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_fuzzy_search_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/movies/_search")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJsonString(
                r#"{"query":{"fuzzy":{"storyline":{"value":"dream heist","fuzziness":50}}}}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let criteria = SearchCriteria::default()
            .with_title("ignored")
            .with_storyline("dream heist");
        let body = service(server.url()).fuzzy_search(&criteria).await.unwrap();

        assert_eq!(body, "{}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_requires_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _created = server
            .mock("PUT", "/movies/movie/1")
            .match_header("content-type", "application/json")
            .with_status(201)
            .create_async()
            .await;
        let _rejected = server
            .mock("PUT", "/movies/movie/2")
            .with_status(400)
            .with_body("mapper_parsing_exception")
            .create_async()
            .await;

        let service = service(server.url());
        let title = service
            .create_or_overwrite(&Movie::new(1, "Heat"))
            .await
            .unwrap();
        assert_eq!(title, "Heat");

        let err = service
            .create_or_overwrite(&Movie::new(2, "Ronin"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_delete_requires_exactly_200() {
        let mut server = mockito::Server::new_async().await;
        let _accepted = server
            .mock("DELETE", "/movies/movie/5")
            .with_status(202)
            .create_async()
            .await;

        let err = service(server.url())
            .delete("movies", "movie", "5")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Rejected { status: 202, .. }));
    }

    #[tokio::test]
    async fn test_index_statistics() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/movies/_stats")
            .with_status(200)
            .with_body(r#"{"_all":{"primaries":{"docs":{"count":3}}}}"#)
            .create_async()
            .await;

        let stats = service(server.url())
            .index_statistics("movies")
            .await
            .unwrap();
        assert!(stats.contains("\"count\":3"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_signing_failure_happens_before_any_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let service = CatalogService::new(
            &config_for(server.url()),
            Arc::new(CachedCredentials::new(Box::new(NoCredentials))),
        )
        .unwrap();
        let err = service.index_statistics("movies").await.unwrap_err();

        assert!(matches!(err, CatalogError::Signing { .. }));
        mock.assert_async().await;
    }

    #[test]
    fn test_from_config_resolves_credentials_up_front() {
        let mut config = config_for("http://127.0.0.1:1".to_string());
        config.aws.access_key_id = Some("AKIDSTATIC".to_string());
        config.aws.secret_access_key = Some("static-secret".to_string());

        let service = CatalogService::from_config(&config).unwrap();
        assert!(service.credentials.is_resolved());

        config.aws.secret_access_key = Some(String::new());
        assert!(CatalogService::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_delete_with_traversal_id_sends_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = service(server.url())
            .delete("movies", "movie", "..")
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_rejects_non_positive_id() {
        let err = service("http://127.0.0.1:1".to_string())
            .update(0, &Movie::new(0, "Nothing"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }
}
