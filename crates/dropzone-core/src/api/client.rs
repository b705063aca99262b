//! API client for communicating with the dashboard REST API.
//!
//! This module provides the `ApiClient` struct for exchanging credentials
//! and refresh tokens, and for making authenticated requests against the
//! rest of the API on behalf of the UI layer.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{ApiResponse, Credentials, RefreshTokenRequest, TokenGrant};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Credential exchange endpoint
const LOGIN_PATH: &str = "/api/Account/login";

/// Refresh token exchange endpoint
const REFRESH_TOKEN_PATH: &str = "/api/Account/refresh-token";

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the dashboard backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ===== Account Endpoints =====

    /// Exchange a username and password for a token grant
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenGrant, ApiError> {
        debug!(username = %credentials.username, "Sending credential exchange");
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(credentials)
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    /// Exchange a refresh token for a new token grant
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        let response = self
            .client
            .post(self.url(REFRESH_TOKEN_PATH))
            .json(&RefreshTokenRequest { refresh_token })
            .send()
            .await?;
        Self::read_envelope(response).await
    }

    // ===== Authenticated Requests =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .send_with_retry(&url, || self.authorize(self.client.get(&url)))
            .await?;
        Self::read_envelope(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let response = self
            .send_with_retry(&url, || self.authorize(self.client.post(&url)).json(body))
            .await?;
        Self::read_envelope(response).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build().send().await?;
            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited);
            }
            warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2; // Exponential backoff
        }
    }

    /// Read a response body as the `{ isSuccess, result, errorMessages }`
    /// envelope and unwrap its result.
    async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let envelope: ApiResponse<T> = serde_json::from_str(&body)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
            return Self::unwrap_envelope(envelope);
        }

        // Validation failures come back as 4xx with the envelope in the body
        if status.is_client_error() && status.as_u16() != 429 {
            if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body) {
                let messages = envelope.messages();
                if !envelope.is_success && !messages.is_empty() {
                    return Err(ApiError::Rejected(messages));
                }
            }
        }

        Err(ApiError::from_status(status, &body))
    }

    fn unwrap_envelope<T>(envelope: ApiResponse<T>) -> Result<T, ApiError> {
        if !envelope.is_success {
            return Err(ApiError::Rejected(envelope.messages()));
        }
        envelope
            .result
            .ok_or_else(|| ApiError::InvalidResponse("Successful response without result".to_string()))
    }
}
