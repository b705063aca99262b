use chrono::{DateTime, Duration, Utc};

use super::Session;

/// Where a session stands in its lifecycle.
///
/// `Unauthenticated` is both the initial state and the only one reachable
/// after a failed refresh or a logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Valid,
    Expiring,
}

impl SessionState {
    pub fn of(session: Option<&Session>, now: DateTime<Utc>, buffer: Duration) -> Self {
        match session {
            None => SessionState::Unauthenticated,
            Some(s) if s.has_failed() => SessionState::Unauthenticated,
            Some(s) if s.needs_refresh(now, buffer) => SessionState::Expiring,
            Some(_) => SessionState::Valid,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, SessionState::Unauthenticated)
    }
}
