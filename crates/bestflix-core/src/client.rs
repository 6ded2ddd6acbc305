//! HTTP client for the Bestflix backend
//!
//! This module provides a rate-limited HTTP client for the catalog REST API.
//! Reads are retried on transient errors with exponential backoff; mutations
//! are sent exactly once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::auth::SessionToken;
use crate::error::{CatalogError, Result};
use crate::types::{CatalogItem, ItemId, MediaFile, MovieDraft};

/// Default backend base URL
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// User agent sent with every request
const USER_AGENT: &str = concat!("bestflix-client/", env!("CARGO_PKG_VERSION"));

/// Prefix of all catalog routes
const MOVIE_API: &str = "/rest/api/movie";

/// Environment variable overriding the backend base URL
pub const ENV_API_URL: &str = "BESTFLIX_API_URL";
/// Environment variable overriding the request rate
pub const ENV_REQUESTS_PER_SECOND: &str = "BESTFLIX_REQUESTS_PER_SECOND";
/// Environment variable overriding the request timeout
pub const ENV_TIMEOUT_SECS: &str = "BESTFLIX_TIMEOUT_SECS";
/// Environment variable overriding the retry count
pub const ENV_MAX_RETRIES: &str = "BESTFLIX_MAX_RETRIES";

/// Rate limiter to control request frequency
///
/// Ensures that requests are spaced at least `min_interval` apart
/// so the backend is not flooded by rapid navigation.
pub struct RateLimiter {
    /// Minimum interval between requests
    min_interval: Duration,
    /// Timestamp of the last request
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    ///
    /// # Example
    /// ```
    /// use bestflix_core::client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0); // 2 requests per second
    /// ```
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or_else(|_| {
                warn!(requests_per_second, "request rate out of range, disabling rate limit");
                Duration::ZERO
            })
        } else {
            Duration::ZERO
        };
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    /// Wait until the next request may be sent
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Configuration for the backend HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash (default: http://localhost:8080)
    pub base_url: String,
    /// Maximum requests per second (default: 2.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Retries for reads on 429/5xx (default: 3)
    pub max_retries: u32,
    /// First backoff delay in milliseconds, doubled per retry (default: 1000)
    pub retry_base_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_second: 2.0,
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `BESTFLIX_*` environment variables.
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(rate) = parse_var(&lookup, ENV_REQUESTS_PER_SECOND) {
            config.requests_per_second = rate;
        }
        if let Some(timeout) = parse_var(&lookup, ENV_TIMEOUT_SECS) {
            config.timeout_secs = timeout;
        }
        if let Some(retries) = parse_var(&lookup, ENV_MAX_RETRIES) {
            config.max_retries = retries;
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

/// Error body shape used by the backend's exception handler
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_details: Option<ApiErrorDetails>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetails {
    message: Option<String>,
}

/// HTTP client for the catalog backend with rate limiting and retry logic
///
/// This client automatically:
/// - Limits request rate
/// - Retries reads on transient errors (429, 5xx) with exponential backoff
/// - Turns backend error bodies into `CatalogError::Api`
pub struct CatalogClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Rate limiter for request throttling
    rate_limiter: RateLimiter,
    /// Client configuration
    config: ClientConfig,
}

impl CatalogClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let rate_limiter = RateLimiter::new(config.requests_per_second);

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    /// Backend base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// URL of an item's poster image
    pub fn image_url(&self, id: &ItemId) -> String {
        format!("{}{}/image/{}", self.config.base_url, MOVIE_API, encode_id(id))
    }

    /// URL of an item's video stream
    pub fn video_url(&self, id: &ItemId) -> String {
        format!("{}{}/video/{}", self.config.base_url, MOVIE_API, encode_id(id))
    }

    /// Fetch the public catalog snapshot.
    ///
    /// Returns `None` when the backend answers with JSON `null`.
    ///
    /// # Errors
    /// - `CatalogError::HttpError` - Network or HTTP error after all retries
    /// - `CatalogError::RateLimited` - Server returned 429 after all retries
    /// - `CatalogError::JsonError` - Body is not a list of items
    pub async fn fetch_all_items(&self) -> Result<Option<Vec<CatalogItem>>> {
        let url = self.url(&format!("{}/all", MOVIE_API));
        let response = self.send_read(|| self.client.get(&url)).await?;
        read_json(response).await
    }

    /// Fetch the snapshot of one user's uploads.
    ///
    /// # Errors
    /// Same as [`fetch_all_items`](Self::fetch_all_items).
    pub async fn fetch_user_items(&self, username: &str) -> Result<Option<Vec<CatalogItem>>> {
        let url = self.url(&format!("{}/mymovies", MOVIE_API));
        let body = json!({ "username": username });
        let response = self
            .send_read(|| self.client.post(&url).json(&body))
            .await?;
        read_json(response).await
    }

    /// Fetch a single item.
    ///
    /// # Errors
    /// - `CatalogError::NotFound` - No item with this id
    /// - `CatalogError::JsonError` - Body is not an item (the backend answers
    ///   `null` for unknown ids)
    pub async fn fetch_item(&self, id: &ItemId, token: Option<&SessionToken>) -> Result<CatalogItem> {
        let url = self.url(&format!("{}/{}", MOVIE_API, encode_id(id)));
        let response = self
            .send_read(|| with_bearer(self.client.get(&url), token))
            .await?;
        let item: Option<CatalogItem> = read_json(response).await?;
        item.ok_or_else(|| CatalogError::NotFound(url.clone()))
    }

    /// Upload a new item with its poster and video.
    ///
    /// Returns the backend's confirmation message.
    ///
    /// # Errors
    /// - `CatalogError::TokenExpired` / `InvalidToken` - No live session
    /// - `CatalogError::Api` - Backend rejected the upload
    pub async fn upload(
        &self,
        token: &SessionToken,
        draft: &MovieDraft,
        image: MediaFile,
        video: MediaFile,
    ) -> Result<String> {
        let username = token.require_user(chrono::Utc::now())?;
        let form = media_form(draft, image, video)?.text("username", username.to_string());

        let url = self.url(&format!("{}/upload", MOVIE_API));
        let request = with_bearer(self.client.post(&url), Some(token)).multipart(form);
        let response = self.send_once(request).await?;
        info!(movie = %draft.movie_name, "uploaded catalog item");
        Ok(response.text().await?)
    }

    /// Replace an item's metadata and media.
    ///
    /// # Errors
    /// Same as [`upload`](Self::upload).
    pub async fn update(
        &self,
        token: &SessionToken,
        id: &ItemId,
        draft: &MovieDraft,
        image: MediaFile,
        video: MediaFile,
    ) -> Result<String> {
        let username = token.require_user(chrono::Utc::now())?;
        let form = media_form(draft, image, video)?
            .text("username", username.to_string())
            .text("movieId", id.to_string());

        let url = self.url(&format!("{}/update", MOVIE_API));
        let request = with_bearer(self.client.request(Method::PUT, &url), Some(token)).multipart(form);
        let response = self.send_once(request).await?;
        info!(%id, "updated catalog item");
        Ok(response.text().await?)
    }

    /// Delete an item.
    ///
    /// # Errors
    /// - `CatalogError::TokenExpired` - Session expired
    /// - `CatalogError::NotFound` - No item with this id
    pub async fn delete(&self, token: &SessionToken, id: &ItemId) -> Result<()> {
        token.require_user(chrono::Utc::now())?;
        let url = self.url(&format!("{}/delete/{}", MOVIE_API, encode_id(id)));
        let request = with_bearer(self.client.delete(&url), Some(token));
        self.send_once(request).await?;
        info!(%id, "deleted catalog item");
        Ok(())
    }

    /// Log in and return the raw bearer token.
    ///
    /// # Errors
    /// - `CatalogError::Api` - Wrong credentials, with the backend's message
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let url = self.url("/login");
        let body = json!({ "username": username, "password": password });
        let response = self.send_once(self.client.post(&url).json(&body)).await?;
        Ok(response.text().await?.trim().to_string())
    }

    /// Register a new account, returning the backend's message.
    ///
    /// # Errors
    /// - `CatalogError::Api` - Username or email already taken
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<String> {
        let url = self.url("/register");
        let body = json!({ "username": username, "email": email, "password": password });
        let response = self.send_once(self.client.post(&url).json(&body)).await?;
        Ok(response.text().await?)
    }

    /// Ask the backend to email a password reset link.
    ///
    /// # Errors
    /// - `CatalogError::Api` - Backend rejected the request
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let url = self.url("/forgot-password");
        let body = json!({ "email": email });
        self.send_once(self.client.post(&url).json(&body)).await?;
        Ok(())
    }

    /// Set a new password using the token from a reset link.
    ///
    /// # Errors
    /// - `CatalogError::Api` - Reset token invalid or expired
    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> Result<()> {
        let url = self.url("/reset-password");
        let body = json!({ "token": reset_token, "newPassword": new_password });
        self.send_once(self.client.post(&url).json(&body)).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Send a request built by `build`, retrying on 429 and 5xx
    async fn send_read<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            self.rate_limiter.acquire().await;
            let response = build().send().await?;
            let status = response.status();

            let transient = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if transient && attempt < self.config.max_retries {
                let delay = self.calculate_backoff_delay(attempt);
                warn!(
                    url = %response.url(),
                    %status,
                    attempt,
                    "transient backend error, retrying in {:?}",
                    delay
                );
                sleep(delay).await;
                attempt += 1;
                continue;
            }

            return check_status(response).await;
        }
    }

    /// Send a request exactly once
    async fn send_once(&self, request: RequestBuilder) -> Result<Response> {
        self.rate_limiter.acquire().await;
        let response = request.send().await?;
        check_status(response).await
    }

    /// Calculate exponential backoff delay for retry
    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .config
            .retry_base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay_ms)
    }

    /// Get a reference to the rate limiter (for testing)
    #[cfg(test)]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

fn encode_id(id: &ItemId) -> String {
    urlencoding::encode(&id.to_string()).into_owned()
}

fn with_bearer(request: RequestBuilder, token: Option<&SessionToken>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token.as_str()),
        None => request,
    }
}

fn media_form(draft: &MovieDraft, image: MediaFile, video: MediaFile) -> Result<Form> {
    let movie = Part::text(serde_json::to_string(draft)?).mime_str("application/json")?;
    Ok(Form::new()
        .part("movie", movie)
        .part("image", file_part(image)?)
        .part("video", file_part(video)?))
}

fn file_part(file: MediaFile) -> Result<Part> {
    Ok(Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(&file.mime_type)?)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    debug!(bytes = body.len(), "received JSON body");
    Ok(serde_json::from_str(&body)?)
}

/// Map non-success responses to errors
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(CatalogError::NotFound(response.url().path().to_string()));
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CatalogError::RateLimited);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CatalogError::Api {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

/// Best human-readable message for a failed response
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = parsed.error_details.and_then(|details| details.message) {
            return message;
        }
    }

    let text = body.trim();
    if !text.is_empty() && !text.starts_with('{') {
        return text.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(2.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_rate_limiter_unlimited() {
        let limiter = RateLimiter::new(0.0);
        assert_eq!(limiter.min_interval(), Duration::ZERO);
    }

    #[test]
    fn test_rate_limiter_tiny_rate_does_not_panic() {
        assert_eq!(RateLimiter::new(1e-320).min_interval(), Duration::ZERO);
        assert_eq!(RateLimiter::new(f64::NAN).min_interval(), Duration::ZERO);
    }

    #[test]
    fn test_tiny_rate_from_env_builds_client() {
        let config = ClientConfig::from_lookup(|key| {
            (key == ENV_REQUESTS_PER_SECOND).then(|| "1e-320".to_string())
        });
        assert!(CatalogClient::with_config(config).is_ok());
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.requests_per_second, 2.0);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_client_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "https://bestflix.example.com/"),
            (ENV_REQUESTS_PER_SECOND, "5"),
            (ENV_TIMEOUT_SECS, "oops"),
            (ENV_MAX_RETRIES, "1"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.base_url, "https://bestflix.example.com");
        assert_eq!(config.requests_per_second, 5.0);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_client_creation() {
        assert!(CatalogClient::new().is_ok());
    }

    #[test]
    fn test_media_urls() {
        let client = CatalogClient::new().unwrap();
        assert_eq!(
            client.image_url(&ItemId::Number(7)),
            "http://localhost:8080/rest/api/movie/image/7"
        );
        assert_eq!(
            client.video_url(&ItemId::from("a b")),
            "http://localhost:8080/rest/api/movie/video/a%20b"
        );
    }

    #[test]
    fn test_backoff_delay_calculation() {
        let client = CatalogClient::new().unwrap();

        assert_eq!(client.calculate_backoff_delay(0), Duration::from_millis(1000));
        assert_eq!(client.calculate_backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(client.calculate_backoff_delay(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_error_message_from_details() {
        let body = r#"{"statusCode":401,"errorDetails":{"message":"Bad credentials","path":"/login"}}"#;
        assert_eq!(error_message(StatusCode::UNAUTHORIZED, body), "Bad credentials");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, "Username already exists"),
            "Username already exists"
        );
        assert_eq!(error_message(StatusCode::BAD_REQUEST, ""), "Bad Request");
        assert_eq!(error_message(StatusCode::CONFLICT, "{\"other\":1}"), "Conflict");
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(10.0);

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_rate_limiter_accessor() {
        let client = CatalogClient::new().unwrap();
        assert_eq!(client.rate_limiter().min_interval(), Duration::from_millis(500));
    }
}
