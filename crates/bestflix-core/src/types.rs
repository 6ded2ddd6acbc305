//! Data types for the Bestflix catalog
//!
//! This module contains the core data structures shared by the index, the
//! session and the HTTP client. All types implement Serialize and Deserialize
//! for JSON compatibility with the backend and with Tauri.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CatalogError;

/// Opaque identifier of a catalog item.
///
/// The backend uses numeric ids, but nothing in the client depends on that,
/// so string ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    /// Numeric identifier
    Number(i64),
    /// Textual identifier
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId::Number(value)
    }
}

impl FromStr for ItemId {
    type Err = CatalogError;

    /// Numeric text becomes `ItemId::Number`, anything else non-blank `ItemId::Text`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidId(raw.to_string()));
        }
        Ok(match trimmed.parse::<i64>() {
            Ok(n) => ItemId::Number(n),
            Err(_) => ItemId::Text(trimmed.to_string()),
        })
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        ItemId::Text(value.to_string())
    }
}

/// Category tag of a catalog item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Feature film (`"Movie"`)
    Movie,
    /// Television show (`"TV Show"`)
    TvShow,
    /// Any other backend category, kept verbatim
    Other(String),
}

impl Category {
    /// Backend label for this category
    pub fn label(&self) -> &str {
        match self {
            Category::Movie => "Movie",
            Category::TvShow => "TV Show",
            Category::Other(label) => label,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        let normalized: String = value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "movie" => Category::Movie,
            "tvshow" => Category::TvShow,
            _ => Category::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_string()
    }
}

/// A single catalog entry as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Identifier, unique within one snapshot
    pub id: ItemId,
    /// Display title and sole search key; `None` when absent or not a string
    #[serde(rename = "movieName", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Category tag
    #[serde(default)]
    pub category: Option<Category>,
    /// Release date in ISO format (e.g., "2010-07-16")
    #[serde(default)]
    pub release_date: Option<String>,
    /// Country of origin
    #[serde(default)]
    pub country: Option<String>,
    /// Duration label (e.g., "2h 28m")
    #[serde(rename = "duration", default)]
    pub duration_label: Option<String>,
    /// Comma separated cast list
    #[serde(default)]
    pub casts: Option<String>,
    /// Synopsis
    #[serde(default)]
    pub about: Option<String>,
}

impl CatalogItem {
    /// Create an item with only the fields the index cares about
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            category: Some(category),
            release_date: None,
            country: None,
            duration_label: None,
            casts: None,
            about: None,
        }
    }

    /// Release year derived from the release date
    pub fn release_year(&self) -> Option<i32> {
        let date = self.release_date.as_deref()?.trim();
        if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            return Some(parsed.year());
        }
        date.get(..4)?.parse().ok()
    }
}

/// Accept any JSON value for a string field, keeping only actual strings
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Metadata sent when uploading or updating a catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDraft {
    /// Display title
    pub movie_name: String,
    /// Country of origin
    pub country: String,
    /// Release date in ISO format
    pub release_date: String,
    /// Comma separated cast list
    pub casts: String,
    /// Duration label (e.g., "2h 28m")
    pub duration: String,
    /// Synopsis
    pub about: String,
    /// Category tag
    pub category: Category,
}

/// A media file attached to an upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    /// Original file name
    pub file_name: String,
    /// MIME type (e.g., "image/jpeg")
    pub mime_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

/// Paginated result wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    /// Items on the current page
    pub items: Vec<T>,
    /// Current page number (1-based)
    pub current_page: u32,
    /// Total number of pages, never less than 1
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, current_page: u32, total_pages: u32) -> Self {
        Self {
            items,
            current_page,
            total_pages,
        }
    }

    /// Create an empty result for the first page
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
        }
    }

    /// Whether a page after the current one exists
    pub fn has_next_page(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Whether a page before the current one exists
    pub fn has_prev_page(&self) -> bool {
        self.current_page > 1
    }
}
