//! Access/refresh token record and its lifecycle rules
//!
//! A [`Token`] is created from a login or refresh response, stamped with an
//! absolute expiry, persisted, and replaced wholesale on every refresh. All
//! time-dependent checks take `now` explicitly so callers decide the clock.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seconds before expiry at which a refresh is scheduled
pub const DEFAULT_REFRESH_LEAD_SECS: i64 = 5;

/// Current Unix timestamp in seconds
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Access/refresh token pair as stored locally.
///
/// Deserializes both the stored snake_case form and the backend's camelCase
/// login payload (`token`, `tokenType`, `expiresIn`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(alias = "token")]
    pub access_token: String,

    #[serde(default = "default_token_type", alias = "tokenType")]
    pub token_type: String,

    /// Lifetime in seconds as issued by the backend
    #[serde(default, alias = "expiresIn", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    #[serde(default, alias = "refreshToken", skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiry (Unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Where a token sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Absent,
    Valid,
    ExpiringSoon,
    Expired,
}

impl Token {
    /// Create a bearer token with no known expiry
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_in: None,
            refresh_token: None,
            exp: None,
        }
    }

    /// Set the lifetime in seconds
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: i64) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Set the refresh token
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Derive the absolute expiry from `expires_in`, falling back to the
    /// `exp` claim when the access token is a JWT. A non-positive
    /// `expires_in` means the lifetime is unknown.
    #[must_use]
    pub fn stamped(mut self, now: i64) -> Self {
        if self.token_type.is_empty() {
            self.token_type = default_token_type();
        }
        if let Some(expires_in) = self.expires_in.filter(|secs| *secs > 0) {
            self.exp = Some(now + expires_in);
        } else if self.exp.is_none() {
            self.exp = jwt_expiry(&self.access_token);
        }
        self
    }

    /// Whether the access token has passed its expiry
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp - now <= 0)
    }

    /// Whether the token carries an access value and has not expired
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }

    /// Whether a refresh should be scheduled for this token
    pub fn needs_refresh(&self) -> bool {
        self.exp.is_some_and(|exp| exp >= 0)
    }

    /// Delay until the refresh should fire, `lead` seconds before expiry
    pub fn refresh_delay_at(&self, now: i64, lead: i64) -> Duration {
        let secs = self.exp.map_or(0, |exp| (exp - lead - now).max(0));
        Duration::from_secs(u64::try_from(secs).unwrap_or(0))
    }

    /// Value for the `Authorization` header, `None` when there is no access token
    pub fn bearer(&self) -> Option<String> {
        if self.access_token.is_empty() {
            return None;
        }
        Some(format!(
            "{} {}",
            capitalize(&self.token_type),
            self.access_token
        ))
    }

    /// Lifecycle state at `now`
    pub fn state_at(&self, now: i64, lead: i64) -> TokenState {
        if self.access_token.is_empty() {
            TokenState::Absent
        } else if self.is_expired_at(now) {
            TokenState::Expired
        } else if self.exp.is_some_and(|exp| exp - lead <= now) {
            TokenState::ExpiringSoon
        } else {
            TokenState::Valid
        }
    }
}

impl TokenState {
    /// State of an optional token
    pub fn of(token: Option<&Token>, now: i64, lead: i64) -> Self {
        token.map_or(Self::Absent, |token| token.state_at(now, lead))
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => default_token_type(),
    }
}

/// Read the `exp` claim from a JWT payload without verifying it
pub fn jwt_expiry(access_token: &str) -> Option<i64> {
    let mut parts = access_token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| URL_SAFE.decode(payload))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}
