//! Authentication module for managing user sessions.
//!
//! This module provides:
//! - `Session`: the access/refresh token pair, expiry, and role of a signed-in user
//! - `SessionManager`: sign-in, lazy refresh with a single-flight guard, sign-out
//! - `SessionService`: the single owner of the current session, backed by the
//!   encrypted session store
//! - `SessionObserver`: how the UI learns it must redirect to the login screen
//! - `Role`: the closed set of account roles and their permissions
//!
//! Access tokens are renewed 60 seconds before they expire.

pub mod backend;
pub mod clock;
pub mod error;
pub mod manager;
pub mod observer;
pub mod role;
pub mod service;
pub mod session;
pub mod state;

#[cfg(test)]
pub mod testing;

pub use backend::AuthBackend;
pub use clock::{Clock, SystemClock};
pub use error::AuthError;
pub use manager::SessionManager;
pub use observer::{Redirect, SessionObserver, SessionStatus, SignOutReason};
pub use role::Role;
pub use service::SessionService;
pub use session::{Session, SessionError};
pub use state::SessionState;
