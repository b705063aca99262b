//! Test doubles for the session layer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::api::ApiError;
use crate::models::{Credentials, TokenGrant};

use super::{AuthBackend, Clock, Role};

pub fn grant(token: &str, refresh_token: &str, expires_at: DateTime<Utc>, role: Role) -> TokenGrant {
    TokenGrant {
        token: token.to_string(),
        refresh_token: refresh_token.to_string(),
        expires_at,
        role,
    }
}

/// Backend that answers from queues of canned results and counts calls.
#[derive(Default)]
pub struct ScriptedBackend {
    login_results: Mutex<VecDeque<Result<TokenGrant, ApiError>>>,
    refresh_results: Mutex<VecDeque<Result<TokenGrant, ApiError>>>,
    login_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    refresh_tokens_seen: Mutex<Vec<String>>,
    refresh_delay: Option<StdDuration>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_delay(mut self, delay: StdDuration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    pub fn push_login(&self, result: Result<TokenGrant, ApiError>) {
        self.login_results.lock().unwrap().push_back(result);
    }

    pub fn push_refresh(&self, result: Result<TokenGrant, ApiError>) {
        self.refresh_results.lock().unwrap().push_back(result);
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.refresh_tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthBackend for ScriptedBackend {
    async fn login(&self, _credentials: &Credentials) -> Result<TokenGrant, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::ServerError("no scripted login result".to_string())))
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen.lock().unwrap().push(refresh_token.to_string());
        let result = self
            .refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::ServerError("no scripted refresh result".to_string())));
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
