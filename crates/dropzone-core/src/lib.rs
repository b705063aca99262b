//! Session and token lifecycle core for the dropzone admin dashboard.
//!
//! The dashboard is a thin UI over a remote REST API. This crate holds the
//! part with real process: signing users in, keeping their access token
//! valid across requests, persisting sessions in encrypted server-side
//! storage, and telling the UI when a user has to sign in again.
//!
//! A host typically does:
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use dropzone_core::{Config, Credentials, SessionService};
//!
//! let config = Config::load()?;
//! let _guard = dropzone_core::logging::init_tracing(config.log_dir().ok().as_deref())?;
//! let service = SessionService::from_config(&config)?;
//! let observer = service.subscribe();
//!
//! let cookie = service.sign_in(&Credentials::new("admin", "secret")).await?;
//! let token = service.access_token().await?;
//! # let _ = (observer, cookie, token);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod logging;
pub mod models;
pub mod navigation;
pub mod store;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{
    AuthBackend, AuthError, Redirect, Role, Session, SessionManager, SessionObserver,
    SessionService, SessionState, SessionStatus, SignOutReason,
};
pub use config::Config;
pub use models::{Credentials, TokenGrant};
pub use navigation::{Action, Section};
pub use store::{SessionCookie, SessionStore};
