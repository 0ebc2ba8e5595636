//! Query compiler
//!
//! Translates [`SearchCriteria`] into the store's JSON query language: a
//! `bool` query whose `must` array holds one clause per populated field, or a
//! single `fuzzy` block over the free-text fields. The compiled value carries
//! the pagination and `_source` directives and serializes to the exact request
//! body sent to the store.
//!
//! Clause order is fixed (id, title, year, genre, mpaaRating, imdbUrl,
//! language, country, storyline, synopsis) so that the same criteria always
//! produce byte-identical bodies.

use crate::types::SearchCriteria;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

pub const FIELD_ID: &str = "id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_YEAR: &str = "year";
pub const FIELD_GENRE: &str = "genre";
pub const FIELD_MPAA_RATING: &str = "mpaaRating";
pub const FIELD_IMDB_URL: &str = "imdbUrl";
pub const FIELD_LANGUAGE: &str = "language";
pub const FIELD_COUNTRY: &str = "country";
pub const FIELD_STORYLINE: &str = "storyline";
pub const FIELD_SYNOPSIS: &str = "synopsis";

/// Fixed fuzzy clause parameters
pub const FUZZY_BOOST: f64 = 1.0;
pub const FUZZY_FUZZINESS: u32 = 50;
pub const FUZZY_PREFIX_LENGTH: u32 = 0;
pub const FUZZY_MAX_EXPANSIONS: u32 = 100;

/// Literal value of an exact-match clause
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MatchValue {
    Integer(i64),
    Text(String),
}

impl From<i64> for MatchValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for MatchValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// `{"match": {field: value}}`
#[derive(Debug, Clone, PartialEq)]
pub struct MatchClause {
    pub field: &'static str,
    pub value: MatchValue,
}

impl MatchClause {
    pub fn new<V: Into<MatchValue>>(field: &'static str, value: V) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Approximate match on one field with the fixed tuning parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyClause {
    pub field: &'static str,
    pub value: String,
    pub boost: f64,
    pub fuzziness: u32,
    pub prefix_length: u32,
    pub max_expansions: u32,
}

impl FuzzyClause {
    pub fn new<S: Into<String>>(field: &'static str, value: S) -> Self {
        Self {
            field,
            value: value.into(),
            boost: FUZZY_BOOST,
            fuzziness: FUZZY_FUZZINESS,
            prefix_length: FUZZY_PREFIX_LENGTH,
            max_expansions: FUZZY_MAX_EXPANSIONS,
        }
    }

    fn params(&self) -> FuzzyParams<'_> {
        FuzzyParams {
            value: &self.value,
            boost: self.boost,
            fuzziness: self.fuzziness,
            prefix_length: self.prefix_length,
            max_expansions: self.max_expansions,
        }
    }
}

#[derive(Serialize)]
struct FuzzyParams<'a> {
    value: &'a str,
    boost: f64,
    fuzziness: u32,
    prefix_length: u32,
    max_expansions: u32,
}

/// One element of a query tree
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    /// Exact match on a single field
    Match(MatchClause),
    /// Logical OR across match clauses, nested as `{"bool": {"should": [..]}}`
    Should(Vec<MatchClause>),
    /// Standalone `{"fuzzy": {field: {..}}}` clause
    Fuzzy(FuzzyClause),
}

/// Root of the compiled query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTree {
    /// `{"bool": {"must": [..]}}`; an empty `must` matches every document
    Bool { must: Vec<QueryClause> },
    /// `{"fuzzy": {field: {..}, ..}}` with one sibling key per clause
    Fuzzy(Vec<FuzzyClause>),
}

/// Body of one search request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    from: u32,
    size: u32,
    query: QueryTree,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    source: Option<Vec<String>>,
}

impl CompiledQuery {
    pub fn from(&self) -> u32 {
        self.from
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn query(&self) -> &QueryTree {
        &self.query
    }

    /// Source fields requested, or `None` for the full document
    pub fn source_filter(&self) -> Option<&[String]> {
        self.source.as_deref()
    }

    /// Required clauses of a boolean query; `None` for fuzzy queries
    pub fn must(&self) -> Option<&[QueryClause]> {
        match &self.query {
            QueryTree::Bool { must } => Some(must),
            QueryTree::Fuzzy(_) => None,
        }
    }

    /// Serialize to the request body text
    pub fn to_body(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| {
            crate::CatalogError::serialization(format!("Failed to serialize query: {}", e))
        })
    }
}

/// Compile criteria into a boolean query with one `must` entry per populated field
pub fn compile(
    criteria: &SearchCriteria,
    from: u32,
    size: u32,
    field_filter: Option<&[String]>,
) -> CompiledQuery {
    let mut must = Vec::new();

    if let Some(id) = positive(criteria.id) {
        must.push(QueryClause::Match(MatchClause::new(FIELD_ID, id)));
    }
    if let Some(title) = non_empty(&criteria.title) {
        must.push(QueryClause::Match(MatchClause::new(FIELD_TITLE, title)));
    }
    if let Some(year) = positive(criteria.year) {
        must.push(QueryClause::Match(MatchClause::new(FIELD_YEAR, year)));
    }
    if let Some(genres) = &criteria.genre {
        let mut matches: Vec<MatchClause> = genres
            .iter()
            .map(|genre| MatchClause::new(FIELD_GENRE, genre.as_str()))
            .collect();
        // An empty set adds nothing.
        match matches.len() {
            0 => {}
            1 => must.push(QueryClause::Match(matches.remove(0))),
            _ => must.push(QueryClause::Should(matches)),
        }
    }

    let text_fields = [
        (FIELD_MPAA_RATING, &criteria.mpaa_rating),
        (FIELD_IMDB_URL, &criteria.imdb_url),
        (FIELD_LANGUAGE, &criteria.language),
        (FIELD_COUNTRY, &criteria.country),
        (FIELD_STORYLINE, &criteria.storyline),
        (FIELD_SYNOPSIS, &criteria.synopsis),
    ];
    for (field, value) in text_fields {
        if let Some(value) = non_empty(value) {
            must.push(QueryClause::Match(MatchClause::new(field, value)));
        }
    }

    CompiledQuery {
        from,
        size,
        query: QueryTree::Bool { must },
        source: field_filter.map(<[String]>::to_vec),
    }
}

/// Compile the storyline and synopsis of the criteria into one fuzzy block.
///
/// Every other field is ignored.
pub fn compile_fuzzy(
    criteria: &SearchCriteria,
    from: u32,
    size: u32,
    field_filter: Option<&[String]>,
) -> CompiledQuery {
    let terms = [
        (FIELD_STORYLINE, &criteria.storyline),
        (FIELD_SYNOPSIS, &criteria.synopsis),
    ]
    .into_iter()
    .filter_map(|(field, value)| non_empty(value).map(|v| FuzzyClause::new(field, v)))
    .collect();

    CompiledQuery {
        from,
        size,
        query: QueryTree::Fuzzy(terms),
        source: field_filter.map(<[String]>::to_vec),
    }
}

fn positive(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v > 0)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Single-entry JSON object `{key: value}`
struct Entry<'a, V: ?Sized>(&'a str, &'a V);

impl<V: Serialize + ?Sized> Serialize for Entry<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, self.1)?;
        map.end()
    }
}

/// Sibling fuzzy terms under one object
struct FuzzyTerms<'a>(&'a [FuzzyClause]);

impl Serialize for FuzzyTerms<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for clause in self.0 {
            map.serialize_entry(clause.field, &clause.params())?;
        }
        map.end()
    }
}

impl Serialize for MatchClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Entry("match", &Entry(self.field, &self.value)).serialize(serializer)
    }
}

impl Serialize for FuzzyClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Entry("fuzzy", &Entry(self.field, &self.params())).serialize(serializer)
    }
}

impl Serialize for QueryClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Match(clause) => clause.serialize(serializer),
            Self::Should(clauses) => {
                Entry("bool", &Entry("should", clauses.as_slice())).serialize(serializer)
            }
            Self::Fuzzy(clause) => clause.serialize(serializer),
        }
    }
}

impl Serialize for QueryTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool { must } => {
                Entry("bool", &Entry("must", must.as_slice())).serialize(serializer)
            }
            Self::Fuzzy(terms) => Entry("fuzzy", &FuzzyTerms(terms)).serialize(serializer),
        }
    }
}
