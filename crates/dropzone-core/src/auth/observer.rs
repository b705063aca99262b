//! UI-facing view of the session lifecycle.
//!
//! The session layer never raises refresh failures across the UI boundary.
//! Instead it publishes a [`SessionStatus`] over a watch channel, and the UI
//! asks its [`SessionObserver`] whether it should redirect to the login screen.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    /// The user signed out
    Logout,
    /// The refresh token was rejected or the refresh endpoint was unreachable
    RefreshFailed,
}

impl SignOutReason {
    pub fn message(&self) -> &'static str {
        match self {
            SignOutReason::Logout => "You have been signed out.",
            SignOutReason::RefreshFailed => "Your session has expired. Please sign in again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated {
        reason: Option<SignOutReason>,
    },
    Authenticated {
        username: String,
        role: Role,
        expires_at: DateTime<Utc>,
    },
}

impl SessionStatus {
    pub(crate) fn of(session: &Session) -> Self {
        SessionStatus::Authenticated {
            username: session.username.clone(),
            role: session.role,
            expires_at: session.expires_at,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated { .. })
    }
}

/// Navigation the UI has to perform in response to the session status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login { reason: Option<SignOutReason> },
}

impl Redirect {
    /// Route of the login screen
    pub const LOGIN_PATH: &'static str = "/login";

    pub fn path(&self) -> &'static str {
        match self {
            Redirect::Login { .. } => Self::LOGIN_PATH,
        }
    }
}

/// Receiving end of the session status channel, held by the UI layer.
#[derive(Clone)]
pub struct SessionObserver {
    rx: watch::Receiver<SessionStatus>,
}

impl SessionObserver {
    pub(crate) fn new(rx: watch::Receiver<SessionStatus>) -> Self {
        Self { rx }
    }

    /// Latest published status
    pub fn status(&self) -> SessionStatus {
        self.rx.borrow().clone()
    }

    /// Whether a status was published since the last `changed` or `mark_seen`
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }

    /// Wait for the next status change. Returns `None` once the session
    /// layer has been dropped.
    pub async fn changed(&mut self) -> Option<SessionStatus> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// The redirect the UI owes for the latest status, if any
    pub fn redirect(&self) -> Option<Redirect> {
        match *self.rx.borrow() {
            SessionStatus::Unauthenticated { reason } => Some(Redirect::Login { reason }),
            SessionStatus::Authenticated { .. } => None,
        }
    }

    /// Polling form: decide from a session value alone.
    pub fn inspect(session: &Session) -> Option<Redirect> {
        session.error.map(|_| Redirect::Login {
            reason: Some(SignOutReason::RefreshFailed),
        })
    }
}
