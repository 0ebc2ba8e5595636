//! Movie Catalog Infrastructure Library
//!
//! The signed request pipeline between the catalog and its document store:
//! credential resolution, request assembly, SigV4 signing, HTTP execution,
//! and the [`CatalogService`] operations built on top of them.

pub mod credentials;
pub mod executor;
pub mod logger;
pub mod request;
pub mod response;
pub mod service;
pub mod signer;

pub use credentials::{
    CachedCredentials, ChainCredentialProvider, CredentialProvider, Credentials,
    EnvironmentCredentialProvider, ProfileCredentialProvider, StaticCredentialProvider,
};
pub use executor::RequestExecutor;
pub use logger::{init_logger, init_test_logger, logger_config_from_env, LogLevel, LoggerConfig};
pub use request::{RequestBuilder, UnsignedRequest};
pub use response::ResponseEnvelope;
pub use service::CatalogService;
pub use signer::{SignedRequest, Signer};

/// Infrastructure version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
