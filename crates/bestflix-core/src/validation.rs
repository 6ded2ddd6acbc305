//! Client-side form checks
//!
//! These run before any request is sent so obvious mistakes are reported
//! without a round trip. The messages are shown to the user as-is.

use std::sync::OnceLock;

use regex_lite::Regex;

use crate::error::{CatalogError, Result};
use crate::types::MediaFile;

/// Minimum username length
pub const MIN_USERNAME_LEN: usize = 3;
/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Poster width the layout is designed for
pub const POSTER_WIDTH: u32 = 200;
/// Poster height the layout is designed for
pub const POSTER_HEIGHT: u32 = 300;
/// Allowed deviation from the poster aspect ratio
const ASPECT_TOLERANCE: f64 = 0.05;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"))
}

fn check_username(username: &str) -> Result<()> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(CatalogError::validation(
            "Username must be at least 3 characters long!",
        ));
    }
    Ok(())
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CatalogError::validation(
            "Password must be at least 6 characters long!",
        ));
    }
    Ok(())
}

/// Whether `email` looks like an address
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Check login form input. Both values are trimmed first.
///
/// # Errors
/// Returns `CatalogError::Validation` with the message to show.
pub fn validate_login(username: &str, password: &str) -> Result<()> {
    let (username, password) = (username.trim(), password.trim());
    if username.is_empty() || password.is_empty() {
        return Err(CatalogError::validation("Please enter username and password!"));
    }
    check_username(username)?;
    check_password(password)
}

/// Check registration form input.
///
/// # Errors
/// Returns `CatalogError::Validation` with the message to show.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirmation: &str,
) -> Result<()> {
    let (username, email) = (username.trim(), email.trim());
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(CatalogError::validation("All fields are required."));
    }
    check_username(username)?;
    check_password(password)?;
    if password != confirmation {
        return Err(CatalogError::validation("Password fields must be equal"));
    }
    if !is_valid_email(email) {
        return Err(CatalogError::validation("Please enter a valid email address!"));
    }
    Ok(())
}

/// Check the forgot-password form.
///
/// # Errors
/// Returns `CatalogError::Validation` with the message to show.
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CatalogError::validation("Please enter your email"));
    }
    if !is_valid_email(email) {
        return Err(CatalogError::validation("Please enter a valid email address!"));
    }
    Ok(())
}

/// Check a new password on the reset form.
///
/// # Errors
/// Returns `CatalogError::Validation` with the message to show.
pub fn validate_new_password(password: &str) -> Result<()> {
    check_password(password)
}

/// Check that a poster is close enough to 2:3 to render undistorted.
///
/// # Errors
/// Returns `CatalogError::Validation` naming the actual size.
pub fn validate_poster_dimensions(width: u32, height: u32) -> Result<()> {
    let desired = f64::from(POSTER_WIDTH) / f64::from(POSTER_HEIGHT);
    let matches = height > 0 && (f64::from(width) / f64::from(height) - desired).abs() < ASPECT_TOLERANCE;

    if !matches {
        return Err(CatalogError::validation(format!(
            "Image dimensions: {}×{}. Suggested size is {}×{}px. Your image may appear stretched or distorted.",
            width, height, POSTER_WIDTH, POSTER_HEIGHT
        )));
    }
    Ok(())
}

/// Check a duration label such as `"2h 28m"` or `"58m 3s"`.
///
/// # Errors
/// Returns `CatalogError::Validation` if the label is not 6 or 7 characters.
pub fn validate_duration_label(duration: &str) -> Result<()> {
    match duration.chars().count() {
        6 | 7 => Ok(()),
        _ => Err(CatalogError::validation("Duration was entered wrong!")),
    }
}

/// Check that both media files of an upload were chosen.
///
/// # Errors
/// Returns `CatalogError::Validation` if either file is missing or empty.
pub fn validate_media(image: Option<&MediaFile>, video: Option<&MediaFile>) -> Result<()> {
    match (image, video) {
        (Some(image), Some(video)) if !image.bytes.is_empty() && !video.bytes.is_empty() => Ok(()),
        _ => Err(CatalogError::validation("Please select both image and video")),
    }
}
