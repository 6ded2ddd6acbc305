//! Error types for the Bestflix catalog client
//!
//! This module defines all error types used throughout the library.
//! CatalogError implements Serialize for Tauri compatibility.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog snapshot was absent (JSON `null` or no source at all)
    #[error("Catalog snapshot is missing")]
    EmptyInput,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The backend rejected the request with a message
    #[error("Backend error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Rate limited by the server (HTTP 429)
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Requested resource was not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid catalog item identifier
    #[error("Invalid item ID: {0}")]
    InvalidId(String),

    /// Session token could not be decoded
    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    /// Session token is past its expiry
    #[error("Session expired. Please log in again!")]
    TokenExpired,

    /// Client-side form validation failed
    #[error("{0}")]
    Validation(String),
}

impl CatalogError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        CatalogError::Validation(message.into())
    }
}

/// Serialize CatalogError as a string for Tauri compatibility
impl Serialize for CatalogError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
