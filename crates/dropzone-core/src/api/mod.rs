//! REST API client module for the dashboard backend.
//!
//! This module provides the `ApiClient` for the account endpoints
//! (credential exchange and refresh-token) and for the authenticated
//! requests the rest of the dashboard issues.
//!
//! The API uses JWT bearer token authentication obtained through
//! `POST /api/Account/login` and renewed through
//! `POST /api/Account/refresh-token`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
