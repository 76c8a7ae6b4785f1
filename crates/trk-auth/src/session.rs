//! Server-side sessions for the web flow
//!
//! The cookie carries only the session id; all state lives server-side.
//! Sessions hold the signed-in user, the currently selected team, and, on
//! the OAuth login path only, a stashed API token pair the frontend can
//! display. That stash is a development-only convenience inherited from the
//! original flow, not a durable contract.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use trk_core::Id;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,
    #[error("Session expired")]
    Expired,
    #[error("Session store unavailable")]
    Unavailable,
}

/// API tokens stashed in the session after an OAuth login (dev-only display)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StashedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Session data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (cookie value)
    pub id: String,
    /// Signed-in user
    pub user_id: Id,
    /// Team the web flow is currently navigating
    pub current_team_id: Option<Id>,
    /// Token pair minted on the OAuth path
    pub api_tokens: Option<StashedTokens>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    /// Create an authenticated session
    pub fn new(user_id: Id, lifetime_seconds: i64) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: generate_session_id(),
            user_id,
            current_team_id: None,
            api_tokens: None,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(lifetime_seconds),
        }
    }

    /// Check if the session is still valid
    pub fn is_valid(&self) -> bool {
        chrono::Utc::now() < self.expires_at
    }
}

/// Generate a secure random session ID
fn generate_session_id() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    const SESSION_ID_LENGTH: usize = 64;

    let mut rng = rand::rng();
    (0..SESSION_ID_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Session store trait for different backends
pub trait SessionStore: Send + Sync {
    /// Get a valid session by ID
    fn get(&self, session_id: &str) -> Option<Session>;

    /// Store or replace a session
    fn set(&self, session: Session) -> Result<(), SessionError>;

    /// Delete a session
    fn delete(&self, session_id: &str) -> Result<(), SessionError>;

    /// Clean up expired sessions
    fn cleanup_expired(&self) -> Result<usize, SessionError>;
}

/// In-memory session store
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().ok()?;
        match sessions.get(session_id) {
            Some(session) if session.is_valid() => Some(session.clone()),
            // expired entries are evicted on lookup, not just filtered
            Some(_) => {
                sessions.remove(session_id);
                None
            }
            None => None,
        }
    }

    fn set(&self, session: Session) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        sessions.remove(session_id);
        Ok(())
    }

    fn cleanup_expired(&self) -> Result<usize, SessionError> {
        let mut sessions = self.sessions.write().map_err(|_| SessionError::Unavailable)?;
        let now = chrono::Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok(before - sessions.len())
    }
}

/// Cookie configuration for sessions
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub max_age: Option<i64>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "_tracker_session".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
            max_age: None,
        }
    }
}

impl CookieConfig {
    /// Create a development configuration (non-secure)
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Default::default()
        }
    }

    /// Build cookie header value
    pub fn build_cookie(&self, session_id: &str) -> String {
        let mut parts = vec![format!("{}={}", self.name, session_id)];

        parts.push(format!("Path={}", self.path));

        if self.secure {
            parts.push("Secure".to_string());
        }

        if self.http_only {
            parts.push("HttpOnly".to_string());
        }

        parts.push("SameSite=Lax".to_string());

        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={}", max_age));
        }

        parts.join("; ")
    }

    /// Build cookie header to clear the session
    pub fn build_clear_cookie(&self) -> String {
        format!("{}=; Path={}; Max-Age=0; HttpOnly", self.name, self.path)
    }
}

/// Extract session ID from a Cookie header value
pub fn extract_session_id(cookie_header: &str, cookie_name: &str) -> Option<String> {
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((name, value)) = part.split_once('=') {
            if name.trim() == cookie_name {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new(1, 3600);
        assert!(session.is_valid());
        assert_eq!(session.user_id, 1);
        assert!(session.current_team_id.is_none());
        assert!(session.api_tokens.is_none());
    }

    #[test]
    fn test_expired_session_evicted_on_get() {
        let store = MemorySessionStore::new();
        let session = Session::new(1, -10);
        let id = session.id.clone();
        store.set(session).unwrap();

        assert!(store.get(&id).is_none());
        // the failed lookup already dropped the entry
        assert_eq!(store.cleanup_expired().unwrap(), 0);
    }

    #[test]
    fn test_cleanup_sweeps_only_stale_sessions() {
        let store = MemorySessionStore::new();
        let live = Session::new(2, 3600);
        let live_id = live.id.clone();
        store.set(Session::new(1, -10)).unwrap();
        store.set(live).unwrap();

        assert_eq!(store.cleanup_expired().unwrap(), 1);
        assert!(store.get(&live_id).is_some());
    }

    #[test]
    fn test_store_roundtrip_and_update() {
        let store = MemorySessionStore::new();
        let mut session = Session::new(1, 3600);
        let id = session.id.clone();
        store.set(session.clone()).unwrap();

        session.current_team_id = Some(9);
        store.set(session).unwrap();

        let retrieved = store.get(&id).unwrap();
        assert_eq!(retrieved.current_team_id, Some(9));

        store.delete(&id).unwrap();
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_cookie_build_and_extract() {
        let config = CookieConfig::default();
        let cookie = config.build_cookie("abc123");

        assert!(cookie.contains("_tracker_session=abc123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));

        assert_eq!(
            extract_session_id("_tracker_session=abc123; other=x", "_tracker_session"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_session_id("other=x", "_tracker_session"), None);
    }

    #[test]
    fn test_development_cookie_not_secure() {
        let cookie = CookieConfig::development().build_cookie("abc");
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = Session::new(1, 60);
        let b = Session::new(1, 60);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 64);
    }
}
