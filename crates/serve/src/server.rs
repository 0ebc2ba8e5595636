//! HTTP server for the catalog routes

use crate::api::create_routes;
use crate::backend::CatalogBackend;
use crate::handlers::AppState;
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use movie_catalog_core::config::ServerConfig;
use movie_catalog_core::{CatalogError, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Catalog HTTP server
pub struct CatalogServer {
    config: ServerConfig,
    app: Router,
}

impl CatalogServer {
    pub fn new(config: ServerConfig, backend: Arc<dyn CatalogBackend>) -> Self {
        let app = create_app(&config, AppState::new(backend));
        Self { config, app }
    }

    /// Bind and serve until the process stops
    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| CatalogError::validation(format!("Invalid address {}: {}", addr, e)))?;

        tracing::info!("Starting catalog server on {}", addr);

        let listener = tokio::net::TcpListener::bind(socket_addr)
            .await
            .map_err(|e| CatalogError::transport(format!("Failed to bind to {}: {}", addr, e)))?;

        axum::serve(listener, self.app)
            .await
            .map_err(|e| CatalogError::transport(format!("Server error: {}", e)))?;

        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The assembled router, middleware included
    pub fn router(&self) -> Router {
        self.app.clone()
    }
}

/// Routes with tracing, body limit and optional CORS layers
pub fn create_app(config: &ServerConfig, state: AppState) -> Router {
    let mut app = create_routes().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.max_request_size)),
    );

    if config.cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(HeaderValue::from_static("*"))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([ACCEPT, CONTENT_TYPE]);

        app = app.layer(cors);
    }

    app
}

/// Server builder for configuration
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    pub fn from_config(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn cors(mut self, enabled: bool) -> Self {
        self.config.cors_enabled = enabled;
        self
    }

    pub fn max_request_size(mut self, size: usize) -> Self {
        self.config.max_request_size = size;
        self
    }

    pub fn build(self, backend: Arc<dyn CatalogBackend>) -> CatalogServer {
        CatalogServer::new(self.config, backend)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
