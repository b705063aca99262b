use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session secret must be at least {min} bytes")]
    WeakSecret { min: usize },

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Failed to seal session record")]
    Encryption,

    #[error("Session record failed authentication")]
    Tampered,

    #[error("Malformed session cookie")]
    InvalidCookie,
}
