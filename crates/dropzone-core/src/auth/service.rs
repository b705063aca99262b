//! Single owner of the signed-in session.
//!
//! The UI layer holds one `SessionService` per browser session and asks it
//! for a bearer token at the start of every authenticated request. All
//! reads and writes of the current session go through here; transitions
//! replace the session wholesale and are persisted to the encrypted store.

use anyhow::Context;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::Credentials;
use crate::store::{SecretStore, SessionCookie, SessionStore};

use super::clock::{Clock, SystemClock};
use super::{AuthBackend, AuthError, Role, Session, SessionManager, SessionObserver, SessionState};

struct ActiveSession {
    cookie: SessionCookie,
    session: Session,
}

pub struct SessionService<B: AuthBackend, C: Clock = SystemClock> {
    manager: SessionManager<B, C>,
    store: SessionStore,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionService<ApiClient> {
    /// Wire the REST client, the encrypted store, and the manager from config
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = ApiClient::from_config(config).context("Failed to build API client")?;
        let secret = SecretStore::session_secret(config.session_secret.as_deref())?;
        let store = SessionStore::open(config.session_dir()?, &secret, config.session_max_age())
            .context("Failed to open session store")?;
        let manager = SessionManager::new(client).with_refresh_buffer(config.refresh_buffer());
        Ok(Self::new(manager, store))
    }
}

impl<B: AuthBackend, C: Clock> SessionService<B, C> {
    pub fn new(manager: SessionManager<B, C>, store: SessionStore) -> Self {
        Self {
            manager,
            store,
            active: Mutex::new(None),
        }
    }

    pub fn manager(&self) -> &SessionManager<B, C> {
        &self.manager
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn subscribe(&self) -> SessionObserver {
        self.manager.subscribe()
    }

    /// Sign in and persist the new session. Replaces any current session.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<SessionCookie, AuthError> {
        let session = self.manager.initialize(credentials).await?;

        let cookie = match self.store.create(&session) {
            Ok(cookie) => cookie,
            Err(e) => {
                warn!(error = %e, "Failed to persist new session");
                self.manager.terminate(session);
                return Err(e.into());
            }
        };

        let previous = self.active.lock().await.replace(ActiveSession {
            cookie: cookie.clone(),
            session,
        });
        if let Some(previous) = previous {
            if let Err(e) = self.store.destroy(&previous.cookie) {
                warn!(error = %e, "Failed to remove replaced session record");
            }
        }

        Ok(cookie)
    }

    /// Restore the session stored under `cookie`. Returns `false` when there
    /// is nothing usable to restore.
    pub async fn resume(&self, cookie: &SessionCookie) -> Result<bool, AuthError> {
        let session = match self.store.load(cookie, self.manager.now())? {
            Some(session) if !session.has_failed() => session,
            Some(_) => {
                self.store.destroy(cookie)?;
                return Ok(false);
            }
            None => return Ok(false),
        };

        info!(username = %session.username, "Session resumed");
        let mut active = self.active.lock().await;
        self.manager.publish(&session);
        *active = Some(ActiveSession {
            cookie: cookie.clone(),
            session,
        });
        Ok(true)
    }

    pub async fn current(&self) -> Option<Session> {
        self.active.lock().await.as_ref().map(|a| a.session.clone())
    }

    pub async fn cookie(&self) -> Option<SessionCookie> {
        self.active.lock().await.as_ref().map(|a| a.cookie.clone())
    }

    pub async fn role(&self) -> Option<Role> {
        self.active.lock().await.as_ref().map(|a| a.session.role)
    }

    pub async fn state(&self) -> SessionState {
        let active = self.active.lock().await;
        self.manager.state(active.as_ref().map(|a| &a.session))
    }

    /// Bearer token for an authenticated request, refreshing it first when
    /// it is about to expire. A failed refresh signs the user out.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let (cookie, session) = {
            let active = self.active.lock().await;
            let active = active.as_ref().ok_or(AuthError::Unauthenticated)?;
            (active.cookie.clone(), active.session.clone())
        };
        self.token_for(&cookie, &session).await
    }

    /// Validate a snapshot of the active session taken under `cookie` and
    /// commit whatever the refresh produced.
    async fn token_for(&self, cookie: &SessionCookie, session: &Session) -> Result<String, AuthError> {
        let validated = match self.manager.ensure_valid(session).await {
            Ok(validated) if !validated.has_failed() => validated,
            _ => return self.refresh_failed(cookie, session).await,
        };

        if validated == *session {
            return validated
                .access_token()
                .map(str::to_string)
                .ok_or(AuthError::RefreshFailed);
        }

        let mut active = self.active.lock().await;
        let current = match active.as_mut() {
            Some(current) if current.cookie == *cookie => current,
            // Signed out or replaced while the refresh was in flight
            _ => return Err(AuthError::Unauthenticated),
        };

        if current.session.refresh_token() == session.refresh_token() {
            current.session = validated;
            if let Err(e) = self.store.save(&current.cookie, &current.session) {
                warn!(error = %e, "Failed to persist refreshed session");
            }
            self.manager.publish(&current.session);
        } else {
            debug!("Session already replaced by a concurrent refresh");
        }

        current
            .session
            .access_token()
            .map(str::to_string)
            .ok_or(AuthError::RefreshFailed)
    }

    /// Sign out after a failed refresh, unless the session was renewed by
    /// another request in the meantime.
    async fn refresh_failed(&self, cookie: &SessionCookie, spent: &Session) -> Result<String, AuthError> {
        let mut active = self.active.lock().await;
        match active.as_ref() {
            Some(current) if current.cookie == *cookie => {
                if current.session.refresh_token() != spent.refresh_token() {
                    debug!("Refresh failed for a pair already replaced; keeping the session");
                    return current
                        .session
                        .access_token()
                        .map(str::to_string)
                        .ok_or(AuthError::RefreshFailed);
                }
            }
            _ => return Err(AuthError::Unauthenticated),
        }

        if let Some(current) = active.take() {
            if let Err(e) = self.store.destroy(cookie) {
                warn!(error = %e, "Failed to remove session record after refresh failure");
            }
            self.manager.terminate(current.session.failed());
        }
        Err(AuthError::RefreshFailed)
    }

    /// Explicit logout
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(previous) => {
                let result = self.store.destroy(&previous.cookie);
                self.manager.terminate(previous.session);
                result.map_err(AuthError::from)
            }
            None => Ok(()),
        }
    }
}
