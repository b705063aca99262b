//! Encrypted server-side session storage.
//!
//! This module provides the `SessionStore`, which keeps one sealed record per
//! session cookie. Records are encrypted and authenticated with
//! ChaCha20-Poly1305 under a key derived from the server secret, and expire
//! 7 days after sign-in by default.

pub mod cipher;
pub mod error;
pub mod secret;
pub mod session_store;

pub use cipher::SessionCipher;
pub use error::StoreError;
pub use secret::SecretStore;
pub use session_store::{SessionCookie, SessionStore, SESSION_COOKIE_NAME};
