use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    Credential(String),

    #[error("Session expired and could not be renewed")]
    RefreshFailed,

    #[error("Unable to reach the server: {0}")]
    Network(String),

    #[error("Unexpected response from the server: {0}")]
    Backend(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),
}

/// Shown when the backend rejects a login without saying why
const DEFAULT_CREDENTIAL_MESSAGE: &str = "Username or password is incorrect";

impl AuthError {
    /// Classify a failed credential exchange
    pub fn from_login_failure(err: ApiError) -> Self {
        match err {
            ApiError::Rejected(messages) => {
                if messages.is_empty() {
                    AuthError::Credential(DEFAULT_CREDENTIAL_MESSAGE.to_string())
                } else {
                    AuthError::Credential(messages.join("; "))
                }
            }
            ApiError::Unauthorized => AuthError::Credential(DEFAULT_CREDENTIAL_MESSAGE.to_string()),
            ApiError::AccessDenied(_) => AuthError::Credential("Account is not allowed to sign in".to_string()),
            ApiError::InvalidResponse(msg) | ApiError::NotFound(msg) => AuthError::Backend(msg),
            err @ (ApiError::NetworkError(_) | ApiError::RateLimited | ApiError::ServerError(_)) => {
                AuthError::Network(err.to_string())
            }
        }
    }

    /// Text for the login screen or the sign-out notice
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Credential(msg) => msg.clone(),
            AuthError::RefreshFailed | AuthError::Unauthenticated => {
                "Your session has ended. Please sign in again.".to_string()
            }
            AuthError::Network(_) => "Unable to reach the server. Please try again.".to_string(),
            AuthError::Backend(_) | AuthError::Store(_) => {
                "Something went wrong while signing in. Please try again.".to_string()
            }
        }
    }

    /// Whether the UI must send the user back to the login screen
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, AuthError::RefreshFailed | AuthError::Unauthenticated)
    }
}
