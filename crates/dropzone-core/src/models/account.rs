use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::Role;

/// Response envelope used by every endpoint of the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(rename = "isSuccess")]
    pub is_success: bool,
    pub result: Option<T>,
    #[serde(rename = "errorMessages", default)]
    pub error_messages: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    /// Error messages reported by the backend, with blanks removed
    pub fn messages(&self) -> Vec<String> {
        self.error_messages
            .iter()
            .flatten()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Username/password pair exchanged for a token grant.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Serialize)]
pub struct RefreshTokenRequest<'a> {
    #[serde(rename = "refreshToken")]
    pub refresh_token: &'a str,
}

/// Token pair and role returned by the login and refresh-token endpoints.
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    #[serde(rename = "expiresAt", deserialize_with = "deserialize_utc")]
    pub expires_at: DateTime<Utc>,
    pub role: Role,
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("token", &crate::utils::mask_token(&self.token))
            .field("refresh_token", &crate::utils::mask_token(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .field("role", &self.role)
            .finish()
    }
}

/// Accepts RFC 3339 timestamps as well as offset-less ones, which the
/// backend emits for UTC values.
fn deserialize_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_utc(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_success_envelope() {
        let json = r#"{"isSuccess": true, "statusCode": 200, "errorMessages": [], "result": {"token": "access-1", "refreshToken": "refresh-1", "expiresAt": "2026-10-18T12:00:00Z", "role": "Admin"}}"#;

        let resp: ApiResponse<TokenGrant> =
            serde_json::from_str(json).expect("Failed to parse login test JSON");
        assert!(resp.is_success);
        assert!(resp.messages().is_empty());

        let grant = resp.result.expect("result present");
        assert_eq!(grant.token, "access-1");
        assert_eq!(grant.refresh_token, "refresh-1");
        assert_eq!(grant.role, Role::Admin);
        assert_eq!(grant.expires_at, Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_failure_envelope() {
        let json = r#"{"isSuccess": false, "result": null, "errorMessages": ["Username or password is incorrect", " "]}"#;

        let resp: ApiResponse<TokenGrant> =
            serde_json::from_str(json).expect("Failed to parse failure test JSON");
        assert!(!resp.is_success);
        assert!(resp.result.is_none());
        assert_eq!(resp.messages(), vec!["Username or password is incorrect".to_string()]);
    }

    #[test]
    fn test_missing_result_is_none() {
        // Result types need not implement Default
        let json = r#"{"isSuccess": false, "errorMessages": ["Invalid refresh token"]}"#;
        let resp: ApiResponse<TokenGrant> = serde_json::from_str(json).expect("parse");
        assert!(resp.result.is_none());
        assert_eq!(resp.messages(), vec!["Invalid refresh token".to_string()]);
    }

    #[test]
    fn test_parse_null_error_messages() {
        let json = r#"{"isSuccess": false, "errorMessages": null}"#;
        let resp: ApiResponse<TokenGrant> = serde_json::from_str(json).expect("parse");
        assert!(resp.messages().is_empty());
    }

    #[test]
    fn test_parse_utc_without_offset() {
        let parsed = parse_utc("2026-10-18T12:30:00.1234567").expect("naive timestamp");
        assert_eq!(parsed.timestamp(), Utc.with_ymd_and_hms(2026, 10, 18, 12, 30, 0).unwrap().timestamp());
        assert!(parse_utc("2026-10-18T14:30:00+02:00").is_some());
        assert!(parse_utc("yesterday").is_none());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let json = r#"{"token": "a", "refreshToken": "b", "expiresAt": "2026-10-18T12:00:00Z", "role": "Pilot"}"#;
        assert!(serde_json::from_str::<TokenGrant>(json).is_err());
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(RefreshTokenRequest { refresh_token: "r-1" }).expect("serialize");
        assert_eq!(body, serde_json::json!({ "refreshToken": "r-1" }));

        let creds = Credentials::new("jumper", "hunter2");
        let body = serde_json::to_value(&creds).expect("serialize");
        assert_eq!(body, serde_json::json!({ "username": "jumper", "password": "hunter2" }));
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }
}
