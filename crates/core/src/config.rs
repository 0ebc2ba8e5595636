//! Configuration types for the movie catalog

use crate::{store, CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use url::Url;

/// Prefix of environment variables overriding file settings,
/// e.g. `CATALOG__AWS__REGION=us-west-2`
pub const ENV_PREFIX: &str = "CATALOG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Remote store and signing settings
    #[serde(default)]
    pub aws: AwsConfig,
    /// Index addressing
    #[serde(default)]
    pub index: IndexConfig,
    /// Search defaults
    #[serde(default)]
    pub search: SearchConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote store endpoint, region and service scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region the signature is scoped to
    #[serde(default = "default_region")]
    pub region: String,
    /// Base endpoint of the store, without trailing path
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Service name the signature is scoped to
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Access key id used by a static credential provider
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret key paired with `access_key_id`
    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,
    /// Named profile in the shared credentials file
    #[serde(default)]
    pub profile: Option<String>,
    /// Transport timeout; no timeout when absent
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: default_endpoint(),
            service_name: default_service_name(),
            access_key_id: None,
            secret_access_key: None,
            profile: None,
            request_timeout_seconds: None,
        }
    }
}

/// Index and document type the catalog operates on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_name")]
    pub name: String,
    #[serde(default = "default_document_type")]
    pub document_type: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: default_index_name(),
            document_type: default_document_type(),
        }
    }
}

/// Pagination defaults of the caller-facing search operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub from: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            from: 0,
            size: default_size(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            max_request_size: default_max_request_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json, text, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from an optional file, then apply `CATALOG__*`
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(CatalogError::not_found(format!(
                    "Configuration file {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: Self = builder.build()?.try_deserialize()?;
        match path {
            Some(path) => debug!("Loaded configuration from {}", path.display()),
            None => debug!("Loaded configuration from environment only"),
        }
        Ok(loaded)
    }

    /// Load configuration from a YAML or JSON file without environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        // Try YAML first, then JSON
        match serde_yaml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(_) => {
                let config = serde_json::from_str(&content)?;
                Ok(config)
            }
        }
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parsed base endpoint of the store
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(self.aws.endpoint.trim_end_matches('/'))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(CatalogError::validation(
                "Store endpoint must use http or https scheme",
            ));
        }
        Ok(url)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.aws.region.trim().is_empty() {
            return Err(CatalogError::validation("Region cannot be empty"));
        }
        if self.aws.service_name.trim().is_empty() {
            return Err(CatalogError::validation("Service name cannot be empty"));
        }
        self.endpoint_url()?;

        if self.aws.access_key_id.is_some() != self.aws.secret_access_key.is_some() {
            return Err(CatalogError::validation(
                "access_key_id and secret_access_key must be set together",
            ));
        }
        if self.index.name.is_empty() || self.index.document_type.is_empty() {
            return Err(CatalogError::validation(
                "Index name and document type cannot be empty",
            ));
        }
        if self.search.size == 0 {
            return Err(CatalogError::validation("Search size must be positive"));
        }

        Ok(())
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_region() -> String {
    "us-east-2".to_string()
}
fn default_endpoint() -> String {
    "https://aws-es-instance-url.es.amazonaws.com".to_string()
}
fn default_service_name() -> String {
    "es".to_string()
}
fn default_index_name() -> String {
    store::MOVIES_INDEX.to_string()
}
fn default_document_type() -> String {
    store::MOVIES_DOCUMENT_TYPE.to_string()
}
fn default_size() -> u32 {
    100
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_request_size() -> usize {
    1024 * 1024
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
