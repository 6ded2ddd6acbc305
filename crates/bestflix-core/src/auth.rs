//! Bearer token handling
//!
//! The backend issues a JWT on login. The client never verifies the signature;
//! it only reads the payload to know who is signed in and when the session
//! ends.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// base64url that accepts payloads with or without padding
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
    username: Option<String>,
    sub: Option<String>,
}

/// Decoded bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    raw: String,
    username: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionToken {
    /// Decode the payload of a `header.payload.signature` token.
    ///
    /// # Errors
    /// Returns `CatalogError::InvalidToken` if the token does not have three
    /// segments or its payload is not base64url-encoded JSON.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(CatalogError::InvalidToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        let payload = PAYLOAD_ENGINE
            .decode(segments[1])
            .map_err(|e| CatalogError::InvalidToken(format!("payload is not base64url: {}", e)))?;
        let claims: Claims = serde_json::from_slice(&payload)
            .map_err(|e| CatalogError::InvalidToken(format!("payload is not JSON: {}", e)))?;

        let expires_at = match claims.exp {
            Some(exp) => Some(DateTime::from_timestamp(exp, 0).ok_or_else(|| {
                CatalogError::InvalidToken(format!("expiry out of range: {}", exp))
            })?),
            None => None,
        };

        Ok(Self {
            raw: raw.to_string(),
            username: claims.username.or(claims.sub),
            expires_at,
        })
    }

    /// The token as issued, for the `Authorization` header
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Signed-in user, from the `username` claim or else `sub`
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Expiry instant, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token has expired at `now`.
    ///
    /// Tokens without an `exp` claim are treated as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(exp) => now >= exp,
            None => true,
        }
    }

    /// Username of a live session.
    ///
    /// # Errors
    /// - `CatalogError::TokenExpired` if the token expired at `now`
    /// - `CatalogError::InvalidToken` if the token names no user
    pub fn require_user(&self, now: DateTime<Utc>) -> Result<&str> {
        if self.is_expired_at(now) {
            return Err(CatalogError::TokenExpired);
        }
        self.username()
            .ok_or_else(|| CatalogError::InvalidToken("no username or sub claim".to_string()))
    }
}

/// Outcome of the auth guard run when a page loads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AuthStatus {
    /// No usable token; send the user to the login page
    SignedOut,
    /// The stored token expired; clear it and ask for a new login
    Expired,
    /// A live session
    SignedIn {
        /// Signed-in user
        username: String,
    },
}

impl AuthStatus {
    /// Classify a stored token at `now`
    pub fn check(stored: Option<&str>, now: DateTime<Utc>) -> Self {
        let Some(raw) = stored.filter(|raw| !raw.trim().is_empty()) else {
            return AuthStatus::SignedOut;
        };

        match SessionToken::parse(raw) {
            Ok(token) => match token.require_user(now) {
                Ok(username) => AuthStatus::SignedIn {
                    username: username.to_string(),
                },
                Err(CatalogError::TokenExpired) => AuthStatus::Expired,
                Err(_) => AuthStatus::SignedOut,
            },
            Err(e) => {
                tracing::warn!("ignoring stored token: {}", e);
                AuthStatus::SignedOut
            }
        }
    }

    /// Whether the session is live
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthStatus::SignedIn { .. })
    }
}
