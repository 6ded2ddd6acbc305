//! Bestflix Catalog Core Library
//!
//! This crate provides the client-side core of the Bestflix movie and TV-show
//! catalog: everything a front end needs except the rendering itself.
//!
//! # Features
//! - In-memory search index with substring filtering and autocomplete
//! - Pagination and page-button window selection
//! - Browse sessions whose state round-trips through the location bar
//! - Rate-limited HTTP client for the catalog backend
//! - Bearer token decoding and client-side form validation

pub mod auth;
pub mod client;
pub mod error;
pub mod index;
pub mod pagination;
pub mod service;
pub mod session;
pub mod state;
pub mod types;
pub mod validation;

// Re-export main types for convenience
pub use auth::{AuthStatus, SessionToken};
pub use client::{CatalogClient, ClientConfig, RateLimiter};
pub use error::{CatalogError, Result};
pub use index::CatalogSearchIndex;
pub use pagination::{paginate, PageControls, PageSize, PageWindow};
pub use service::{CatalogService, PosterSize};
pub use session::{BrowseSession, HistoryUpdate, LoadSequencer, LoadTicket, ResultsPage, Suggestions, Transition};
pub use state::{item_id_from_location, item_location, CatalogView, SearchState};
pub use types::{CatalogItem, Category, ItemId, MediaFile, MovieDraft, PaginatedResult};
