use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TokenGrant;
use crate::utils::{format_remaining, mask_token};

use super::Role;

/// Default buffer before expiry at which the access token is renewed
pub const DEFAULT_REFRESH_BUFFER_SECS: i64 = 60;

/// Error tag carried by a session whose renewal failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionError {
    RefreshFailed,
}

/// The token pair and role binding a user to the backend.
///
/// A session is never edited in place by callers: every transition
/// (refresh, failure) yields a new value that replaces the old one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    access_token: String,
    refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub role: Role,
    pub error: Option<SessionError>,
    /// When the user signed in. Refreshes keep the original value.
    pub issued_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from a login grant
    pub fn from_grant(username: impl Into<String>, grant: TokenGrant, issued_at: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            access_token: grant.token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            role: grant.role,
            error: None,
            issued_at,
        }
    }

    /// The session that replaces this one after a successful refresh
    pub fn renewed(&self, grant: TokenGrant) -> Self {
        Self {
            username: self.username.clone(),
            access_token: grant.token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            role: grant.role,
            error: None,
            issued_at: self.issued_at,
        }
    }

    /// The session that replaces this one after a failed refresh.
    /// Token material is dropped so it cannot be reused.
    pub fn failed(&self) -> Self {
        Self {
            username: self.username.clone(),
            access_token: String::new(),
            refresh_token: String::new(),
            expires_at: self.expires_at,
            role: self.role,
            error: Some(SessionError::RefreshFailed),
            issued_at: self.issued_at,
        }
    }

    /// The bearer token, unless the session has failed
    pub fn access_token(&self) -> Option<&str> {
        if self.error.is_some() || self.access_token.is_empty() {
            None
        } else {
            Some(self.access_token.as_str())
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        if self.error.is_some() || self.refresh_token.is_empty() {
            None
        } else {
            Some(self.refresh_token.as_str())
        }
    }

    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check if the session will expire within `buffer` and should be refreshed
    pub fn needs_refresh(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        now >= self.expires_at - buffer
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Human-readable time left on the access token (for display)
    pub fn expiry_display(&self, now: DateTime<Utc>) -> String {
        format_remaining(self.time_until_expiry(now))
    }

    /// Overwrite token material before the session is dropped
    pub(crate) fn wipe(&mut self) {
        self.access_token.clear();
        self.access_token.shrink_to_fit();
        self.refresh_token.clear();
        self.refresh_token.shrink_to_fit();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("access_token", &mask_token(&self.access_token))
            .field("refresh_token", &mask_token(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .field("role", &self.role)
            .field("error", &self.error)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}
