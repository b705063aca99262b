use async_trait::async_trait;

use crate::api::{ApiClient, ApiError};
use crate::models::{Credentials, TokenGrant};

/// The two account endpoints the session layer depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync + 'static {
    async fn login(&self, credentials: &Credentials) -> Result<TokenGrant, ApiError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ApiError>;
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<TokenGrant, ApiError> {
        ApiClient::login(self, credentials).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        ApiClient::refresh_token(self, refresh_token).await
    }
}
