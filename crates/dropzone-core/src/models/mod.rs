//! Wire models for the dashboard REST API.
//!
//! - `ApiResponse`: the `{ isSuccess, result, errorMessages }` envelope
//! - `Credentials`, `RefreshTokenRequest`: request bodies for the account endpoints
//! - `TokenGrant`: the token pair returned by login and refresh

pub mod account;

pub use account::{ApiResponse, Credentials, RefreshTokenRequest, TokenGrant};
