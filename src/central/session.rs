//! Per-connection session state machine (§4.1): `UNAUTH -> AUTH -> UNAUTH`,
//! plus the process-wide set of usernames currently bound to a session,
//! which is what makes double-login detectable.

use std::collections::HashSet;

use tokio::sync::Mutex;

use crate::protocol::ErrorCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauth,
    Auth(String),
}

/// One connection's mutable session state. Lives for the lifetime of the
/// TCP connection; never shared across connections.
pub struct Session {
    pub state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Unauth,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Auth(u) => Some(u.as_str()),
            SessionState::Unauth => None,
        }
    }

    pub fn require_auth(&self) -> Result<&str, ErrorCode> {
        self.username().ok_or(ErrorCode::NotAuthenticated)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide set of logged-in usernames. Mutating it is the only way to
/// enforce "no double login" across independently-handled connections.
#[derive(Default)]
pub struct ActiveSessions {
    usernames: Mutex<HashSet<String>>,
}

impl ActiveSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to claim `username` for a new session. Fails if another
    /// session already holds it.
    pub async fn try_claim(&self, username: &str) -> Result<(), ErrorCode> {
        let mut guard = self.usernames.lock().await;
        if guard.contains(username) {
            return Err(ErrorCode::UserAlreadyLoggedIn);
        }
        guard.insert(username.to_string());
        Ok(())
    }

    /// Releases `username`, e.g. on `logout` or connection close.
    pub async fn release(&self, username: &str) {
        self.usernames.lock().await.remove(username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn double_claim_is_rejected_until_released() {
        let sessions = ActiveSessions::new();
        sessions.try_claim("alice").await.unwrap();
        assert_eq!(
            sessions.try_claim("alice").await.unwrap_err(),
            ErrorCode::UserAlreadyLoggedIn
        );
        sessions.release("alice").await;
        assert!(sessions.try_claim("alice").await.is_ok());
    }
}
