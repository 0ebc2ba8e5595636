//! SigV4 request signing
//!
//! [`Signer::sign`] consumes an [`UnsignedRequest`] and returns a
//! [`SignedRequest`] whose parts can only be read. The signature covers the
//! method, path, query string, every header present at signing time and the
//! body hash, so nothing may change between signing and sending.

use crate::credentials::Credentials;
use crate::request::UnsignedRequest;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use movie_catalog_core::{CatalogError, Result};
use reqwest::Method;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::trace;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const TERMINATOR: &str = "aws4_request";
pub const HOST: &str = "host";
pub const AMZ_DATE: &str = "x-amz-date";
pub const SECURITY_TOKEN: &str = "x-amz-security-token";
pub const AUTHORIZATION: &str = "authorization";

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_FORMAT: &str = "%Y%m%d";

/// Signs requests for one region and service
#[derive(Debug, Clone)]
pub struct Signer {
    region: String,
    service: String,
}

impl Signer {
    pub fn new<R: Into<String>, S: Into<String>>(region: R, service: S) -> Result<Self> {
        let region = region.into();
        let service = service.into();
        if region.trim().is_empty() {
            return Err(CatalogError::signing("Signing region is not configured"));
        }
        if service.trim().is_empty() {
            return Err(CatalogError::signing("Signing service name is not configured"));
        }
        Ok(Self { region, service })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Sign with the current time. Call right before sending.
    pub fn sign(&self, request: UnsignedRequest, credentials: &Credentials) -> Result<SignedRequest> {
        self.sign_at(request, credentials, Utc::now())
    }

    /// Sign as of `at`
    pub fn sign_at(
        &self,
        request: UnsignedRequest,
        credentials: &Credentials,
        at: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        if credentials.access_key_id().is_empty() || credentials.secret_access_key().is_empty() {
            return Err(CatalogError::signing("Credentials are incomplete"));
        }

        let UnsignedRequest {
            method,
            mut url,
            mut headers,
            body,
            query,
        } = request;

        let amz_date = at.format(AMZ_DATE_FORMAT).to_string();
        let date = at.format(DATE_FORMAT).to_string();

        headers.insert(HOST.to_string(), host_header(&url)?);
        headers.insert(AMZ_DATE.to_string(), amz_date.clone());
        if let Some(token) = credentials.session_token() {
            headers.insert(SECURITY_TOKEN.to_string(), token.to_string());
        }
        headers.remove(AUTHORIZATION);

        let query_string = canonical_query(&query);
        let payload_hash = hex_sha256(body.as_deref().unwrap_or_default());
        let (canonical, signed_headers) =
            canonical_request(&method, &url, &query_string, &headers, &payload_hash);
        trace!("Canonical request:\n{}", canonical);

        let scope = format!("{}/{}/{}/{}", date, self.region, self.service, TERMINATOR);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex_sha256(canonical.as_bytes())
        );

        let key = signing_key(
            credentials.secret_access_key(),
            &date,
            &self.region,
            &self.service,
        )?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        headers.insert(
            AUTHORIZATION.to_string(),
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM,
                credentials.access_key_id(),
                scope,
                signed_headers,
                signature
            ),
        );

        // The transmitted query string is the one that was signed
        if query_string.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&query_string));
        }

        Ok(SignedRequest {
            method,
            url,
            headers,
            body,
            signed_headers,
            signature,
            amz_date,
        })
    }
}

/// A signed request. Its parts are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    method: Method,
    url: Url,
    headers: BTreeMap<String, String>,
    body: Option<Vec<u8>>,
    signed_headers: String,
    signature: String,
    amz_date: String,
}

impl SignedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL including the canonical query string
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// `;`-joined lower-case names of the signed headers
    pub fn signed_headers(&self) -> &str {
        &self.signed_headers
    }

    /// Hex signature
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn amz_date(&self) -> &str {
        &self.amz_date
    }
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| CatalogError::signing(format!("URL {} has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Each path segment of the already-encoded path is encoded once more
fn canonical_uri(url: &Url) -> String {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parameters encoded and sorted by key, then value
fn canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Returns the canonical request and the signed header list
fn canonical_request(
    method: &Method,
    url: &Url,
    query_string: &str,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
) -> (String, String) {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| {
            format!(
                "{}:{}\n",
                name,
                value.split_whitespace().collect::<Vec<_>>().join(" ")
            )
        })
        .collect();
    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.as_str(),
        canonical_uri(url),
        query_string,
        canonical_headers,
        signed_headers,
        payload_hash
    );
    (canonical, signed_headers)
}

/// Key chain: secret, date, region, service, terminator
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, TERMINATOR.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CatalogError::signing(format!("Invalid signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ACCESS_KEY: &str = "AKIDEXAMPLE";
    const SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn example_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap()
    }

    fn suite_signer() -> Signer {
        Signer::new("us-east-1", "service").unwrap()
    }

    fn credentials() -> Credentials {
        Credentials::new(ACCESS_KEY, SECRET_KEY)
    }

    fn vanilla(url: &str) -> UnsignedRequest {
        UnsignedRequest::new(Method::GET, Url::parse(url).unwrap())
    }

    #[test]
    fn test_signing_key_derivation() {
        let key = signing_key(SECRET_KEY, "20120215", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_get_vanilla() {
        let signed = suite_signer()
            .sign_at(
                vanilla("https://example.amazonaws.com/"),
                &credentials(),
                example_time(),
            )
            .unwrap();

        assert_eq!(
            signed.signature(),
            "5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
        assert_eq!(signed.signed_headers(), "host;x-amz-date");
        assert_eq!(signed.header("X-Amz-Date"), Some("20150830T123600Z"));
        assert_eq!(
            signed.header("authorization"),
            Some(
                "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
                 SignedHeaders=host;x-amz-date, \
                 Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
            )
        );
    }

    #[test]
    fn test_get_vanilla_query_order_key_case() {
        let signed = suite_signer()
            .sign_at(
                vanilla("https://example.amazonaws.com/?Param2=value2&Param1=value1"),
                &credentials(),
                example_time(),
            )
            .unwrap();

        assert_eq!(
            signed.signature(),
            "b97d918cfa904a5beff61c982a1b6f458b799221646efd99d3219ec94cdf2500"
        );
        assert_eq!(signed.url().query(), Some("Param1=value1&Param2=value2"));
    }

    #[test]
    fn test_signing_is_deterministic_for_same_instant() {
        let request = vanilla("https://example.amazonaws.com/movies/_search")
            .with_header("content-type", "application/json")
            .with_body(r#"{"from":0}"#);

        let first = suite_signer()
            .sign_at(request.clone(), &credentials(), example_time())
            .unwrap();
        let second = suite_signer()
            .sign_at(request.clone(), &credentials(), example_time())
            .unwrap();
        assert_eq!(first, second);

        let later = suite_signer()
            .sign_at(
                request,
                &credentials(),
                example_time() + chrono::Duration::seconds(1),
            )
            .unwrap();
        assert_ne!(first.signature(), later.signature());
    }

    #[test]
    fn test_body_is_covered_by_signature() {
        let base = vanilla("https://example.amazonaws.com/movies/movie/1");
        let a = suite_signer()
            .sign_at(base.clone().with_body("{\"id\":1}"), &credentials(), example_time())
            .unwrap();
        let b = suite_signer()
            .sign_at(base.with_body("{\"id\":2}"), &credentials(), example_time())
            .unwrap();
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn test_session_token_is_signed() {
        let credentials = credentials().with_session_token("session-token");
        let signed = suite_signer()
            .sign_at(
                vanilla("https://example.amazonaws.com/"),
                &credentials,
                example_time(),
            )
            .unwrap();

        assert_eq!(signed.header("x-amz-security-token"), Some("session-token"));
        assert_eq!(
            signed.signed_headers(),
            "host;x-amz-date;x-amz-security-token"
        );
    }

    #[test]
    fn test_transmitted_query_matches_canonical_query() {
        let request = vanilla("http://localhost:9200/movies/_search")
            .with_query("filter_path", "hits.hits._source")
            .with_query("q", "a b");
        let signed = suite_signer()
            .sign_at(request, &credentials(), example_time())
            .unwrap();

        assert_eq!(
            signed.url().query(),
            Some("filter_path=hits.hits._source&q=a%20b")
        );
        assert_eq!(signed.header("host"), Some("localhost:9200"));
    }

    #[test]
    fn test_canonical_uri_encodes_segments() {
        let url = Url::parse("https://example.amazonaws.com/movies/movie/a b").unwrap();
        assert_eq!(canonical_uri(&url), "/movies/movie/a%2520b");
        let url = Url::parse("https://example.amazonaws.com").unwrap();
        assert_eq!(canonical_uri(&url), "/");
    }

    #[test]
    fn test_missing_configuration_is_rejected() {
        assert!(matches!(
            Signer::new("", "es"),
            Err(CatalogError::Signing { .. })
        ));
        assert!(matches!(
            Signer::new("us-east-2", " "),
            Err(CatalogError::Signing { .. })
        ));

        let result = suite_signer().sign_at(
            vanilla("https://example.amazonaws.com/"),
            &Credentials::new("", ""),
            example_time(),
        );
        assert!(matches!(result, Err(CatalogError::Signing { .. })));
    }
}
