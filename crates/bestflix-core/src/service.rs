//! Main catalog API
//!
//! This module provides the high-level API used by a front end. It combines
//! the HTTP client with the search index and the form checks: inputs are
//! validated before any request goes out, and snapshots come back as ready
//! to use indexes.

use chrono::Utc;
use tracing::info;

use crate::auth::SessionToken;
use crate::client::CatalogClient;
use crate::error::{CatalogError, Result};
use crate::index::CatalogSearchIndex;
use crate::session::BrowseSession;
use crate::state::CatalogView;
use crate::types::{CatalogItem, ItemId, MediaFile, MovieDraft};
use crate::validation;

/// Poster dimensions as decoded by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosterSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Main API for the Bestflix catalog
///
/// # Example
/// ```no_run
/// use bestflix_core::{CatalogService, CatalogView};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = CatalogService::new()?;
///
///     let mut session = service.open_session(CatalogView::TvShows, None, "?page=1").await?;
///     let results = session.submit_query("dark");
///     println!("Found {} shows", results.page.total_results);
///
///     Ok(())
/// }
/// ```
pub struct CatalogService {
    client: CatalogClient,
}

impl CatalogService {
    /// Create a new service with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        let client = CatalogClient::new()?;
        Ok(Self { client })
    }

    /// Create a new service with a custom client.
    ///
    /// This is useful for testing or when you need custom client configuration.
    pub fn with_client(client: CatalogClient) -> Self {
        Self { client }
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    /// Fetch the snapshot for `view` and index it.
    ///
    /// # Errors
    /// - `CatalogError::TokenExpired` / `InvalidToken` if the view needs a
    ///   session and `token` is missing, expired or nameless
    /// - `CatalogError::EmptyInput` if the backend answered `null`
    /// - any client error
    pub async fn load_index(
        &self,
        view: CatalogView,
        token: Option<&SessionToken>,
    ) -> Result<CatalogSearchIndex> {
        let items = if view.requires_session() {
            let token = token.ok_or(CatalogError::TokenExpired)?;
            let username = token.require_user(Utc::now())?;
            self.client.fetch_user_items(username).await?
        } else {
            self.client.fetch_all_items().await?
        };

        let index = CatalogSearchIndex::build(items, view.category())?;
        info!(?view, items = index.len(), "loaded catalog view");
        Ok(index)
    }

    /// Load `view` and open a session at `location`.
    ///
    /// # Errors
    /// Same as [`load_index`](Self::load_index).
    pub async fn open_session(
        &self,
        view: CatalogView,
        token: Option<&SessionToken>,
        location: &str,
    ) -> Result<BrowseSession> {
        let index = self.load_index(view, token).await?;
        Ok(BrowseSession::open(view, index, location))
    }

    /// Fetch one item for the detail or edit page.
    ///
    /// # Errors
    /// - `CatalogError::NotFound` if the item does not exist
    pub async fn get_item(&self, id: &ItemId, token: Option<&SessionToken>) -> Result<CatalogItem> {
        self.client.fetch_item(id, token).await
    }

    /// Validate and upload a new item.
    ///
    /// # Errors
    /// - `CatalogError::Validation` if media, poster ratio or duration are off
    /// - any client error
    pub async fn upload(
        &self,
        token: &SessionToken,
        draft: &MovieDraft,
        image: Option<MediaFile>,
        video: Option<MediaFile>,
        poster: PosterSize,
    ) -> Result<String> {
        let (image, video) = check_upload(draft, image, video, poster)?;
        self.client.upload(token, draft, image, video).await
    }

    /// Validate and replace an existing item.
    ///
    /// # Errors
    /// Same as [`upload`](Self::upload).
    pub async fn update(
        &self,
        token: &SessionToken,
        id: &ItemId,
        draft: &MovieDraft,
        image: Option<MediaFile>,
        video: Option<MediaFile>,
        poster: PosterSize,
    ) -> Result<String> {
        let (image, video) = check_upload(draft, image, video, poster)?;
        self.client.update(token, id, draft, image, video).await
    }

    /// Delete an item.
    ///
    /// # Errors
    /// - `CatalogError::TokenExpired` if the session expired
    /// - any client error
    pub async fn delete(&self, token: &SessionToken, id: &ItemId) -> Result<()> {
        self.client.delete(token, id).await
    }

    /// Validate credentials, log in and decode the issued token.
    ///
    /// # Errors
    /// - `CatalogError::Validation` for malformed input
    /// - `CatalogError::Api` with the backend's message on wrong credentials
    /// - `CatalogError::InvalidToken` if the backend returned garbage
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken> {
        validation::validate_login(username, password)?;
        let raw = self.client.login(username.trim(), password.trim()).await?;
        let token = SessionToken::parse(&raw)?;
        info!(user = token.username().unwrap_or_default(), "logged in");
        Ok(token)
    }

    /// Validate and submit a registration.
    ///
    /// # Errors
    /// - `CatalogError::Validation` for malformed input
    /// - `CatalogError::Api` if the backend refuses
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<String> {
        validation::validate_registration(username, email, password, confirmation)?;
        self.client.register(username.trim(), email.trim(), password).await
    }

    /// Validate an email and request a reset link.
    ///
    /// # Errors
    /// - `CatalogError::Validation` for a malformed email
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        validation::validate_email(email)?;
        self.client.forgot_password(email.trim()).await
    }

    /// Validate and set a new password.
    ///
    /// # Errors
    /// - `CatalogError::Validation` if the password is too short
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<()> {
        validation::validate_new_password(new_password)?;
        self.client.reset_password(reset_token, new_password).await
    }
}

fn check_upload(
    draft: &MovieDraft,
    image: Option<MediaFile>,
    video: Option<MediaFile>,
    poster: PosterSize,
) -> Result<(MediaFile, MediaFile)> {
    validation::validate_media(image.as_ref(), video.as_ref())?;
    validation::validate_poster_dimensions(poster.width, poster.height)?;
    validation::validate_duration_label(&draft.duration)?;

    match (image, video) {
        (Some(image), Some(video)) => Ok((image, video)),
        _ => Err(CatalogError::validation("Please select both image and video")),
    }
}
