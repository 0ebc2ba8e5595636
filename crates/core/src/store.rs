//! Wire constants and path shapes of the remote document store

use crate::error::{CatalogError, Result};

/// Default index holding movie documents
pub const MOVIES_INDEX: &str = "movies";
/// Default document type within the movies index
pub const MOVIES_DOCUMENT_TYPE: &str = "movie";

/// Query parameter trimming search responses
pub const FILTER_PATH: &str = "filter_path";
/// Keep only the source documents of each hit
pub const FILTER: &str = "hits.hits._source";

pub const SEARCH_API: &str = "_search";
pub const STATS_API: &str = "_stats";

/// Body returned for a filtered search without hits
pub const EMPTY_RESPONSE: &str = "{}";

/// Percent-encode one caller-supplied path segment.
///
/// Empty, `.` and `..` segments are rejected: the URL parser drops or
/// collapses them, which would change which resource a request addresses.
pub fn path_segment(value: &str) -> Result<String> {
    match value {
        "" | "." | ".." => Err(CatalogError::validation(format!(
            "Invalid store path segment '{}'",
            value
        ))),
        _ => Ok(urlencoding::encode(value).into_owned()),
    }
}

/// `{index}/{type}/{id}`
pub fn document_path(index: &str, doc_type: &str, id: &str) -> Result<String> {
    Ok(format!(
        "{}/{}/{}",
        path_segment(index)?,
        path_segment(doc_type)?,
        path_segment(id)?
    ))
}

/// `{index}/_search`
pub fn search_path(index: &str) -> Result<String> {
    Ok(format!("{}/{}", path_segment(index)?, SEARCH_API))
}

/// `{index}/_stats`
pub fn stats_path(index: &str) -> Result<String> {
    Ok(format!("{}/{}", path_segment(index)?, STATS_API))
}

/// Query parameters restricting a search response to `hits.hits._source`
pub fn source_filter_params() -> Vec<(String, String)> {
    vec![(FILTER_PATH.to_string(), FILTER.to_string())]
}

/// Whether a filtered search body carries no hits
pub fn is_empty_result(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.is_empty() || trimmed == EMPTY_RESPONSE
}
