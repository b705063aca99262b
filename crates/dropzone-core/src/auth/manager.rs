//! Access/refresh token lifecycle.
//!
//! `SessionManager` signs users in, renews access tokens shortly before they
//! expire, and signs users out. Validity is checked lazily at the start of
//! each authenticated request path, not on a timer.
//!
//! Refreshes are single-flight per refresh token: callers that observe the
//! same expiring session at the same time all await one exchange with the
//! backend instead of each spending the refresh token. A successful exchange
//! stays on record under the spent token until the renewed access token
//! expires, so a caller still holding the old pair gets the renewed session
//! back instead of presenting the spent token again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::Credentials;
use crate::utils::mask_token;

use super::clock::{Clock, SystemClock};
use super::observer::{SessionObserver, SessionStatus, SignOutReason};
use super::session::DEFAULT_REFRESH_BUFFER_SECS;
use super::{AuthBackend, AuthError, Session, SessionState};

type RefreshFlight = Shared<BoxFuture<'static, Session>>;

pub struct SessionManager<B: AuthBackend, C: Clock = SystemClock> {
    backend: Arc<B>,
    clock: C,
    refresh_buffer: Duration,
    in_flight: Mutex<HashMap<String, RefreshFlight>>,
    status: watch::Sender<SessionStatus>,
}

impl<B: AuthBackend> SessionManager<B> {
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, SystemClock)
    }
}

impl<B: AuthBackend, C: Clock> SessionManager<B, C> {
    pub fn with_clock(backend: B, clock: C) -> Self {
        let (status, _) = watch::channel(SessionStatus::Unauthenticated { reason: None });
        Self {
            backend: Arc::new(backend),
            clock,
            refresh_buffer: Duration::seconds(DEFAULT_REFRESH_BUFFER_SECS),
            in_flight: Mutex::new(HashMap::new()),
            status,
        }
    }

    /// Renew tokens this long before they expire
    pub fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn refresh_buffer(&self) -> Duration {
        self.refresh_buffer
    }

    pub fn subscribe(&self) -> SessionObserver {
        SessionObserver::new(self.status.subscribe())
    }

    pub fn state(&self, session: Option<&Session>) -> SessionState {
        SessionState::of(session, self.clock.now(), self.refresh_buffer)
    }

    /// Exchange credentials for a new session.
    pub async fn initialize(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        info!(username = %credentials.username, "Signing in");

        let grant = self.backend.login(credentials).await.map_err(|e| {
            let err = AuthError::from_login_failure(e);
            warn!(username = %credentials.username, error = %err, "Sign-in failed");
            err
        })?;

        let session = Session::from_grant(credentials.username.clone(), grant, self.clock.now());
        info!(
            username = %session.username,
            role = %session.role,
            expires_at = %session.expires_at,
            "Signed in"
        );
        self.publish(&session);
        Ok(session)
    }

    /// Return the session unchanged while its access token is outside the
    /// refresh buffer, otherwise refresh it.
    pub async fn ensure_valid(&self, session: &Session) -> Result<Session, AuthError> {
        if session.has_failed() {
            return Err(AuthError::RefreshFailed);
        }

        let now = self.clock.now();
        if !session.needs_refresh(now, self.refresh_buffer) {
            return Ok(session.clone());
        }

        debug!(
            username = %session.username,
            expires_in = %session.expiry_display(now),
            "Access token expiring, refreshing"
        );
        Ok(self.refresh(session).await)
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// Never fails: on any error the returned session is tagged
    /// `RefreshFailed` and carries no tokens. Observers are not told about
    /// the renewal here; the owner of the session publishes it once the new
    /// pair is committed.
    pub async fn refresh(&self, session: &Session) -> Session {
        let key = match session.refresh_token() {
            Some(token) => token.to_string(),
            None => return session.failed(),
        };

        let flight = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            let now = self.clock.now();
            in_flight.retain(|_, flight| match flight.peek() {
                None => true,
                Some(done) => !done.has_failed() && done.expires_at > now,
            });
            in_flight
                .entry(key.clone())
                .or_insert_with(|| self.start_exchange(session))
                .clone()
        };

        let refreshed = flight.await;
        if refreshed.has_failed() {
            // A failed exchange may be retried with the same token
            self.in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
        }
        refreshed
    }

    /// Run the exchange on its own task so it completes, and stays on record,
    /// even when every caller waiting on it goes away.
    fn start_exchange(&self, session: &Session) -> RefreshFlight {
        let current = session.clone();
        let task = tokio::spawn(exchange(Arc::clone(&self.backend), current.clone()));
        async move {
            task.await.unwrap_or_else(|e| {
                warn!(username = %current.username, error = %e, "Token refresh task aborted");
                current.failed()
            })
        }
        .boxed()
        .shared()
    }

    /// Destroy a session and tell observers the user is signed out.
    pub fn terminate(&self, mut session: Session) {
        let reason = if session.has_failed() {
            SignOutReason::RefreshFailed
        } else {
            SignOutReason::Logout
        };
        info!(username = %session.username, ?reason, "Session terminated");

        session.wipe();
        drop(session);

        self.status.send_replace(SessionStatus::Unauthenticated {
            reason: Some(reason),
        });
    }

    pub(crate) fn publish(&self, session: &Session) {
        self.status.send_replace(SessionStatus::of(session));
    }
}

async fn exchange<B: AuthBackend>(backend: Arc<B>, current: Session) -> Session {
    let refresh_token = match current.refresh_token() {
        Some(token) => token,
        None => return current.failed(),
    };
    debug!(refresh_token = %mask_token(refresh_token), "Exchanging refresh token");

    match backend.refresh_token(refresh_token).await {
        Ok(grant) if grant.token.is_empty() || grant.refresh_token.is_empty() => {
            warn!(username = %current.username, "Refresh response carried empty tokens");
            current.failed()
        }
        Ok(grant) if grant.expires_at < current.expires_at => {
            warn!(
                username = %current.username,
                current = %current.expires_at,
                returned = %grant.expires_at,
                "Refresh response expires earlier than the current token"
            );
            current.failed()
        }
        Ok(grant) => {
            let renewed = current.renewed(grant);
            info!(
                username = %renewed.username,
                expires_at = %renewed.expires_at,
                "Access token refreshed"
            );
            renewed
        }
        Err(e) => {
            warn!(
                username = %current.username,
                error = %e,
                transient = e.is_transient(),
                "Token refresh failed"
            );
            current.failed()
        }
    }
}
