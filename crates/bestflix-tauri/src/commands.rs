//! Tauri commands for the Bestflix catalog
//!
//! This module contains all Tauri commands that can be invoked from the
//! frontend. Errors cross the bridge as display strings.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tauri::State;
use tracing::info;

use crate::AppState;
use bestflix_core::{
    AuthStatus, CatalogItem, CatalogView, ItemId, MediaFile, MovieDraft, PosterSize, ResultsPage,
    SessionToken, Suggestions, Transition,
};

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Raw bearer token, for the frontend to persist
    pub token: String,
    /// Signed-in user
    pub username: Option<String>,
}

/// Media locations of an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaUrls {
    /// Poster image URL
    pub image: String,
    /// Video stream URL
    pub video: String,
}

/// Outcome of an upload or update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Backend confirmation message
    pub message: String,
    /// Refreshed private collection page, `None` if a newer reload is on its way
    pub page: Option<ResultsPage>,
}

/// Upload or update form contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Item metadata
    pub draft: MovieDraft,
    /// Poster file
    pub image: Option<MediaFile>,
    /// Video file
    pub video: Option<MediaFile>,
    /// Decoded poster width in pixels
    pub poster_width: u32,
    /// Decoded poster height in pixels
    pub poster_height: u32,
}

impl UploadRequest {
    fn poster(&self) -> PosterSize {
        PosterSize {
            width: self.poster_width,
            height: self.poster_height,
        }
    }
}

async fn require_token(state: &AppState) -> Result<SessionToken, String> {
    let token = state.token().await.ok_or_else(|| "Please log in first".to_string())?;
    if token.is_expired_at(Utc::now()) {
        state.set_token(None).await;
        return Err(bestflix_core::CatalogError::TokenExpired.to_string());
    }
    Ok(token)
}

/// Classify a token restored from frontend storage and adopt it when live.
///
/// # Returns
/// * `AuthStatus::SignedIn` - the token is now used for requests
/// * `AuthStatus::Expired` / `SignedOut` - the frontend should drop it
#[tauri::command]
pub async fn auth_status(
    state: State<'_, AppState>,
    token: Option<String>,
) -> Result<AuthStatus, String> {
    let status = AuthStatus::check(token.as_deref(), Utc::now());
    let parsed = match (&status, token) {
        (AuthStatus::SignedIn { .. }, Some(raw)) => SessionToken::parse(&raw).ok(),
        _ => None,
    };
    state.set_token(parsed).await;
    Ok(status)
}

/// Log in with username and password.
///
/// # Returns
/// * `Ok(LoginResponse)` with the token to persist
/// * `Err(String)` with the validation or backend message
#[tauri::command]
pub async fn login(
    state: State<'_, AppState>,
    username: String,
    password: String,
) -> Result<LoginResponse, String> {
    let token = state
        .service()
        .login(&username, &password)
        .await
        .map_err(|e| e.to_string())?;

    let response = LoginResponse {
        token: token.as_str().to_string(),
        username: token.username().map(str::to_string),
    };
    state.set_token(Some(token)).await;
    Ok(response)
}

/// Forget the current token.
#[tauri::command]
pub async fn logout(state: State<'_, AppState>) -> Result<(), String> {
    state.set_token(None).await;
    info!("logged out");
    Ok(())
}

/// Register a new account.
#[tauri::command]
pub async fn register(
    state: State<'_, AppState>,
    username: String,
    email: String,
    password: String,
    confirmation: String,
) -> Result<String, String> {
    state
        .service()
        .register(&username, &email, &password, &confirmation)
        .await
        .map_err(|e| e.to_string())
}

/// Request a password reset email.
#[tauri::command]
pub async fn forgot_password(state: State<'_, AppState>, email: String) -> Result<(), String> {
    state
        .service()
        .forgot_password(&email)
        .await
        .map_err(|e| e.to_string())
}

/// Set a new password from a reset link.
#[tauri::command]
pub async fn reset_password(
    state: State<'_, AppState>,
    token: String,
    new_password: String,
) -> Result<(), String> {
    state
        .service()
        .reset_password(&token, &new_password)
        .await
        .map_err(|e| e.to_string())
}

/// Load a view and restore its state from the page location.
///
/// # Arguments
/// * `view` - View to open
/// * `location` - Current location query string (e.g., "?query=dark&page=2")
///
/// # Returns
/// * `Ok(Some(ResultsPage))` to render
/// * `Ok(None)` if a newer load of the same view superseded this one
#[tauri::command]
pub async fn open_view(
    state: State<'_, AppState>,
    view: CatalogView,
    location: String,
) -> Result<Option<ResultsPage>, String> {
    state.load_view(view, Some(&location)).await
}

/// Reload an open view's snapshot, keeping its query and page.
#[tauri::command]
pub async fn reload_view(
    state: State<'_, AppState>,
    view: CatalogView,
) -> Result<Option<ResultsPage>, String> {
    state.load_view(view, None).await
}

/// Suggestions for the text typed so far.
#[tauri::command]
pub async fn autocomplete(
    state: State<'_, AppState>,
    view: CatalogView,
    text: String,
) -> Result<Suggestions, String> {
    state.with_session(view, |session| session.type_query(&text)).await
}

/// Run a search and show its first page.
#[tauri::command]
pub async fn submit_search(
    state: State<'_, AppState>,
    view: CatalogView,
    text: String,
) -> Result<Transition, String> {
    state
        .with_session(view, |session| session.submit_query(&text))
        .await
}

/// Jump to a page; `None` if the page is out of range.
#[tauri::command]
pub async fn change_page(
    state: State<'_, AppState>,
    view: CatalogView,
    page: u32,
) -> Result<Option<Transition>, String> {
    state
        .with_session(view, |session| session.change_page(page))
        .await
}

/// Go to the following page; `None` on the last page.
#[tauri::command]
pub async fn next_page(
    state: State<'_, AppState>,
    view: CatalogView,
) -> Result<Option<Transition>, String> {
    state.with_session(view, |session| session.next_page()).await
}

/// Go to the preceding page; `None` on the first page.
#[tauri::command]
pub async fn prev_page(
    state: State<'_, AppState>,
    view: CatalogView,
) -> Result<Option<Transition>, String> {
    state.with_session(view, |session| session.prev_page()).await
}

/// Restore a view after back/forward navigation.
#[tauri::command]
pub async fn navigate(
    state: State<'_, AppState>,
    view: CatalogView,
    location: String,
) -> Result<Transition, String> {
    state
        .with_session(view, |session| session.navigate(&location))
        .await
}

/// Fetch one item for the detail or edit page.
#[tauri::command]
pub async fn get_item(state: State<'_, AppState>, id: ItemId) -> Result<CatalogItem, String> {
    let token = state.token().await;
    state
        .service()
        .get_item(&id, token.as_ref())
        .await
        .map_err(|e| e.to_string())
}

/// Fetch the item addressed by a detail page location (e.g., "?id=42").
#[tauri::command]
pub async fn open_item(state: State<'_, AppState>, location: String) -> Result<CatalogItem, String> {
    let id = bestflix_core::item_id_from_location(&location).map_err(|e| e.to_string())?;
    get_item(state, id).await
}

/// Poster and video URLs of an item.
#[tauri::command]
pub async fn media_urls(state: State<'_, AppState>, id: ItemId) -> Result<MediaUrls, String> {
    let client = state.service().client();
    Ok(MediaUrls {
        image: client.image_url(&id),
        video: client.video_url(&id),
    })
}

/// Upload a new item and rebuild the affected views.
#[tauri::command]
pub async fn upload_item(
    state: State<'_, AppState>,
    request: UploadRequest,
) -> Result<MutationResponse, String> {
    let token = require_token(&state).await?;
    let poster = request.poster();
    let message = state
        .service()
        .upload(&token, &request.draft, request.image, request.video, poster)
        .await
        .map_err(|e| e.to_string())?;

    let page = state.refresh_after_mutation().await?;
    Ok(MutationResponse { message, page })
}

/// Replace an existing item and rebuild the affected views.
#[tauri::command]
pub async fn update_item(
    state: State<'_, AppState>,
    id: ItemId,
    request: UploadRequest,
) -> Result<MutationResponse, String> {
    let token = require_token(&state).await?;
    let poster = request.poster();
    let message = state
        .service()
        .update(&token, &id, &request.draft, request.image, request.video, poster)
        .await
        .map_err(|e| e.to_string())?;

    let page = state.refresh_after_mutation().await?;
    Ok(MutationResponse { message, page })
}

/// Delete an item and rebuild the affected views.
///
/// # Returns
/// * `Ok(Some(ResultsPage))` - the refreshed collection page
/// * `Ok(None)` - deleted, but a newer reload is already on its way
#[tauri::command]
pub async fn delete_item(
    state: State<'_, AppState>,
    id: ItemId,
) -> Result<Option<ResultsPage>, String> {
    let token = require_token(&state).await?;
    state
        .service()
        .delete(&token, &id)
        .await
        .map_err(|e| e.to_string())?;
    state.refresh_after_mutation().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use bestflix_core::Category;

    #[test]
    fn test_upload_request_deserialization() {
        let json = serde_json::json!({
            "draft": {
                "movieName": "Dark",
                "country": "Germany",
                "releaseDate": "2017-12-01",
                "casts": "Louis Hofmann",
                "duration": "1h 00m",
                "about": "Time travel.",
                "category": "TV Show"
            },
            "image": {"fileName": "p.jpg", "mimeType": "image/jpeg", "bytes": [1, 2]},
            "video": null,
            "posterWidth": 200,
            "posterHeight": 300
        });
        let request: UploadRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.draft.category, Category::TvShow);
        assert!(request.video.is_none());
        assert_eq!(
            request.poster(),
            PosterSize {
                width: 200,
                height: 300
            }
        );
    }

    #[tokio::test]
    async fn test_require_token_when_signed_out() {
        let state = AppState::new().unwrap();
        assert_eq!(require_token(&state).await.unwrap_err(), "Please log in first");
    }
}
