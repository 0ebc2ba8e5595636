//! Sends signed requests to the store

use crate::response::ResponseEnvelope;
use crate::signer::SignedRequest;
use movie_catalog_core::{CatalogError, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP transport for signed requests.
///
/// Idle connections are not pooled, so each exchange closes its connection
/// before [`RequestExecutor::execute`] returns. Nothing is retried.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl RequestExecutor {
    /// `timeout` bounds the whole exchange; `None` waits indefinitely
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CatalogError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Send the request and read the full body.
    ///
    /// Any HTTP status yields an envelope; only transport failures are errors.
    pub async fn execute(&self, request: SignedRequest) -> Result<ResponseEnvelope> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!("{} {}", method, url);

        let mut outgoing = self.client.request(method.clone(), url.clone());
        for (name, value) in request.headers() {
            outgoing = outgoing.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            outgoing = outgoing.body(body.to_vec());
        }

        let response = outgoing
            .send()
            .await
            .map_err(|e| transport_error(&method, &url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&method, &url, e))?;

        if !(200..300).contains(&status) {
            warn!("{} {} returned status {}", method, url, status);
        } else {
            debug!("{} {} returned status {}", method, url, status);
        }

        Ok(ResponseEnvelope::new(status, body))
    }
}

fn transport_error(method: &reqwest::Method, url: &url::Url, e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::timeout(format!("{} {}", method, url))
    } else {
        CatalogError::transport(format!("{} {} failed: {}", method, url, e))
    }
}
