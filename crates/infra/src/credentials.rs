//! Credential resolution for request signing
//!
//! A [`CredentialProvider`] resolves an access key pair from one source.
//! Providers are combined with [`ChainCredentialProvider`] (first success
//! wins) and wrapped in [`CachedCredentials`] so that resolution happens once
//! per process and the result is shared read-only afterwards.

use config::{Config, File, FileFormat, Value};
use movie_catalog_core::config::AwsConfig;
use movie_catalog_core::{CatalogError, Result};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const ENV_SHARED_CREDENTIALS_FILE: &str = "AWS_SHARED_CREDENTIALS_FILE";
pub const ENV_PROFILE: &str = "AWS_PROFILE";
pub const DEFAULT_PROFILE: &str = "default";

/// Access key pair with an optional session token for temporary credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    pub fn new<A: Into<String>, S: Into<String>>(access_key_id: A, secret_access_key: S) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token<T: Into<String>>(mut self, token: T) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    fn ensure_complete(self, source: &str) -> Result<Self> {
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return Err(CatalogError::signing(format!(
                "{} credentials are incomplete",
                source
            )));
        }
        Ok(self)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

/// A source of signing credentials
pub trait CredentialProvider: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    /// Resolve credentials from this source
    fn resolve(&self) -> Result<Credentials>;
}

/// Fixed credentials, typically from configuration
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    fn resolve(&self) -> Result<Credentials> {
        self.credentials.clone().ensure_complete("Static")
    }
}

type VarLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Credentials from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
/// `AWS_SESSION_TOKEN`
pub struct EnvironmentCredentialProvider {
    lookup: VarLookup,
}

impl EnvironmentCredentialProvider {
    /// Read from the process environment
    pub fn new() -> Self {
        Self {
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Read from a custom variable lookup
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }
}

impl Default for EnvironmentCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvironmentCredentialProvider {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn resolve(&self) -> Result<Credentials> {
        let (Some(access_key_id), Some(secret)) =
            (self.var(ENV_ACCESS_KEY_ID), self.var(ENV_SECRET_ACCESS_KEY))
        else {
            return Err(CatalogError::signing(format!(
                "{} and {} are not both set",
                ENV_ACCESS_KEY_ID, ENV_SECRET_ACCESS_KEY
            )));
        };

        let mut credentials = Credentials::new(access_key_id, secret);
        if let Some(token) = self.var(ENV_SESSION_TOKEN) {
            credentials = credentials.with_session_token(token);
        }
        Ok(credentials)
    }
}

/// Credentials from a profile of the shared credentials file
/// (`~/.aws/credentials` unless `AWS_SHARED_CREDENTIALS_FILE` is set)
pub struct ProfileCredentialProvider {
    path: Option<PathBuf>,
    profile: String,
}

impl ProfileCredentialProvider {
    /// Use the profile named by `AWS_PROFILE`, or `default`
    pub fn new() -> Self {
        let profile = std::env::var(ENV_PROFILE).unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
        Self {
            path: None,
            profile,
        }
    }

    pub fn with_profile<S: Into<String>>(mut self, profile: S) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    fn credentials_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        if let Ok(path) = std::env::var(ENV_SHARED_CREDENTIALS_FILE) {
            return Some(PathBuf::from(path));
        }
        dirs::home_dir().map(|home| home.join(".aws").join("credentials"))
    }
}

impl Default for ProfileCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for ProfileCredentialProvider {
    fn name(&self) -> &'static str {
        "profile"
    }

    fn resolve(&self) -> Result<Credentials> {
        let path = self
            .credentials_path()
            .ok_or_else(|| CatalogError::signing("No home directory for credentials file"))?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CatalogError::signing(format!(
                "Cannot read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;

        let sections = parse_credentials_file(&content)?;
        let section = sections.get(&self.profile).ok_or_else(|| {
            CatalogError::signing(format!(
                "Profile '{}' not found in {}",
                self.profile,
                path.display()
            ))
        })?;

        let access_key_id = section.get("aws_access_key_id").cloned().unwrap_or_default();
        let secret = section
            .get("aws_secret_access_key")
            .cloned()
            .unwrap_or_default();
        let mut credentials = Credentials::new(access_key_id, secret);
        if let Some(token) = section.get("aws_session_token") {
            credentials = credentials.with_session_token(token.clone());
        }
        credentials.ensure_complete("Profile")
    }
}

/// Profiles of a shared credentials file keyed by name; keys are lower-cased
fn parse_credentials_file(content: &str) -> Result<HashMap<String, HashMap<String, String>>> {
    let document = Config::builder()
        .add_source(File::from_str(content, FileFormat::Ini))
        .build()?;

    let mut sections = HashMap::new();
    for (name, value) in document.try_deserialize::<HashMap<String, Value>>()? {
        // Keys outside any section are not profiles
        let Ok(table) = value.into_table() else {
            continue;
        };
        let name = name.strip_prefix("profile ").unwrap_or(&name).trim().to_string();
        let entries = table
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .into_string()
                    .ok()
                    .map(|value| (key.to_lowercase(), value.trim().to_string()))
            })
            .collect();
        sections.insert(name, entries);
    }

    Ok(sections)
}

/// Tries each provider in order; the first that resolves wins
pub struct ChainCredentialProvider {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainCredentialProvider {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Environment variables, then the shared credentials file
    pub fn default_chain(profile: Option<String>) -> Self {
        let mut profile_provider = ProfileCredentialProvider::new();
        if let Some(profile) = profile {
            profile_provider = profile_provider.with_profile(profile);
        }
        Self::new(vec![
            Box::new(EnvironmentCredentialProvider::new()),
            Box::new(profile_provider),
        ])
    }

    /// Static credentials from configuration when present, otherwise the default chain
    pub fn from_config(config: &AwsConfig) -> Self {
        match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key_id), Some(secret)) => {
                Self::new(vec![Box::new(StaticCredentialProvider::new(
                    Credentials::new(access_key_id.clone(), secret.clone()),
                ))])
            }
            _ => Self::default_chain(config.profile.clone()),
        }
    }
}

impl CredentialProvider for ChainCredentialProvider {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn resolve(&self) -> Result<Credentials> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.resolve() {
                Ok(credentials) => {
                    debug!("Resolved credentials from {} provider", provider.name());
                    return Ok(credentials);
                }
                Err(e) => {
                    debug!("Credential provider {} failed: {}", provider.name(), e);
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        Err(CatalogError::signing(format!(
            "No credentials available ({})",
            failures.join("; ")
        )))
    }
}

/// Resolves credentials once and hands out the same value afterwards
pub struct CachedCredentials {
    provider: Box<dyn CredentialProvider>,
    cell: OnceCell<Credentials>,
}

impl CachedCredentials {
    pub fn new(provider: Box<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            cell: OnceCell::new(),
        }
    }

    /// Already-resolved credentials
    pub fn fixed(credentials: Credentials) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(credentials.clone());
        Self {
            provider: Box::new(StaticCredentialProvider::new(credentials)),
            cell,
        }
    }

    /// Resolve on first use. A failed resolution is not cached.
    ///
    /// Providers read the environment and the filesystem synchronously, so the
    /// first call blocks; call it once at startup before serving requests.
    pub fn get(&self) -> Result<&Credentials> {
        self.cell.get_or_try_init(|| {
            let credentials = self.provider.resolve()?;
            info!(
                "Using credentials from {} provider (access key {})",
                self.provider.name(),
                credentials.access_key_id()
            );
            Ok(credentials)
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for CachedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedCredentials")
            .field("provider", &self.provider.name())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
