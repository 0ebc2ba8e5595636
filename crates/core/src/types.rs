//! Core type definitions for the movie catalog

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Ordered set of genre names; insertion order is preserved on the wire.
pub type GenreSet = IndexSet<String>;

/// A person credited on a movie
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
}

impl Person {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

/// A movie document as stored in the catalog index.
///
/// Writes are full-document overwrites keyed by `id`, so every field that is
/// left out here is gone from the stored copy after a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub year: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<GenreSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storyline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpaa_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_rating: Option<f64>,
    #[serde(default)]
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directors: Option<Vec<Person>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producers: Option<Vec<Person>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writers: Option<Vec<Person>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<Vec<Person>>,
}

impl Movie {
    /// Create a movie with only an id and a title
    pub fn new<S: Into<String>>(id: i64, title: S) -> Self {
        Self {
            id,
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Title used in user-facing messages; empty when the movie has none
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Serialize to the JSON text stored in the index
    pub fn to_document(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| {
            crate::CatalogError::serialization(format!(
                "Failed to serialize movie {}: {}",
                self.id, e
            ))
        })
    }
}

/// Search criteria supplied by callers.
///
/// Every field is optional. Numeric fields only count when greater than zero
/// and text fields only when non-empty; anything else contributes no clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<GenreSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpaa_rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storyline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

impl SearchCriteria {
    /// Criteria that look a single movie up by id
    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genre = Some(genres.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_storyline<S: Into<String>>(mut self, storyline: S) -> Self {
        self.storyline = Some(storyline.into());
        self
    }

    pub fn with_synopsis<S: Into<String>>(mut self, synopsis: S) -> Self {
        self.synopsis = Some(synopsis.into());
        self
    }
}
