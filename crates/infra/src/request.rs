//! Transport-independent request values

use movie_catalog_core::{CatalogError, Result};
use reqwest::Method;
use std::collections::BTreeMap;
use url::Url;

pub const CONTENT_TYPE: &str = "content-type";
pub const APPLICATION_JSON: &str = "application/json";

/// A fully assembled request that has not been signed yet.
///
/// Header names are kept lower-case. Query parameters live beside the URL
/// rather than inside it so the signer can canonicalize them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub query: Vec<(String, String)>,
}

impl UnsignedRequest {
    /// Any query string already present on `url` is moved into `query`
    pub fn new(method: Method, mut url: Url) -> Self {
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);
        url.set_fragment(None);

        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: None,
            query,
        }
    }

    pub fn with_header<K: AsRef<str>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Resolves relative store paths against the configured endpoint
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: String,
}

impl RequestBuilder {
    pub fn new(endpoint: &Url) -> Self {
        Self {
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Assemble `{endpoint}/{relative_path}` with a JSON content type.
    ///
    /// The body and query parameters are attached only when given; a body is
    /// allowed on any method since searches are sent as GET with a body.
    pub fn build(
        &self,
        relative_path: &str,
        body: Option<String>,
        params: Option<Vec<(String, String)>>,
        method: Method,
    ) -> Result<UnsignedRequest> {
        let raw = format!(
            "{}/{}",
            self.endpoint,
            relative_path.trim_start_matches('/')
        );
        let url = Url::parse(&raw).map_err(|e| {
            CatalogError::validation(format!("Invalid request URL {}: {}", raw, e))
        })?;

        let mut request =
            UnsignedRequest::new(method, url).with_header(CONTENT_TYPE, APPLICATION_JSON);
        if let Some(body) = body {
            request = request.with_body(body);
        }
        if let Some(params) = params {
            request.query.extend(params);
        }

        Ok(request)
    }
}
