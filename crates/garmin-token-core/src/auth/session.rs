use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Exported Garmin session state, as printed by the authentication helper.
///
/// The string is opaque to this crate; [`SessionToken::summary`] only peeks
/// at it for diagnostics.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the token when it uses the Garmin secret string layout:
    /// base64 of a JSON array `[oauth1, oauth2]`.
    pub fn summary(&self) -> Option<TokenSummary> {
        let bytes = STANDARD.decode(self.0.trim()).ok()?;
        let (oauth1, oauth2): (OAuth1Part, OAuth2Part) = serde_json::from_slice(&bytes).ok()?;

        Some(TokenSummary {
            domain: oauth1.domain,
            scope: oauth2.scope,
            expires_at: DateTime::from_timestamp(oauth2.expires_at, 0)?,
            refresh_token_expires_at: DateTime::from_timestamp(oauth2.refresh_token_expires_at, 0)?,
        })
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are credentials; keep them out of debug logs
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({} bytes)", self.0.len())
    }
}

#[derive(Debug, Deserialize)]
struct OAuth1Part {
    #[serde(default)]
    domain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuth2Part {
    #[serde(default)]
    scope: Option<String>,
    expires_at: i64,
    refresh_token_expires_at: i64,
}

/// Lifetimes carried inside a decoded session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSummary {
    pub domain: Option<String>,
    pub scope: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

impl TokenSummary {
    /// True once the refresh token has lapsed and the token is unusable
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_token_expires_at
    }

    /// Whole days until the refresh token lapses (never negative)
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.refresh_token_expires_at - now).num_days().max(0)
    }
}
