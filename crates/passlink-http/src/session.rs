//! Session establishment after a successful login.
//!
//! The guard only decides *who* a link authenticates. Turning that into a
//! browser session is the job of a [`SessionHook`]; [`MemorySessionStore`] is
//! the in-process implementation used by the server binary and the tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use http::header::{COOKIE, HeaderValue};
use passlink_core::{Clock, SystemClock};
use tracing::debug;
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "passlink_session";

/// Errors raised while establishing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The generated `Set-Cookie` value is not a valid header.
    #[error("invalid session cookie: {0}")]
    InvalidCookie(#[from] http::header::InvalidHeaderValue),
}

/// Hook invoked by the HTTP layer around login links.
pub trait SessionHook: Send + Sync + 'static {
    /// The principal key of the session attached to the request, if any.
    fn current(&self, parts: &http::request::Parts) -> Option<String>;

    /// Establish a session for `principal_key` and return the `Set-Cookie`
    /// value to send back.
    ///
    /// `remember` asks for a session that survives browser restarts.
    fn establish(&self, principal_key: &str, remember: bool) -> Result<HeaderValue, SessionError>;
}

/// A live session: who it belongs to and when it lapses.
#[derive(Debug, Clone)]
struct SessionEntry {
    principal: String,
    expires_at: DateTime<Utc>,
}

/// In-memory session store keyed by random session ids.
///
/// Sessions lapse after `lifetime`, or after `remember_for` when the login
/// asked to be remembered. Lapsed entries stop resolving and are swept on
/// every [`establish`](SessionHook::establish).
///
/// # Examples
///
/// ```
/// use passlink_http::session::{MemorySessionStore, SessionHook};
///
/// let store = MemorySessionStore::new();
/// let cookie = store.establish("42", false).unwrap();
/// assert!(cookie.to_str().unwrap().starts_with("passlink_session="));
/// assert_eq!(store.len(), 1);
/// ```
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    lifetime: Duration,
    remember_for: Duration,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    /// Default lifetime of a session that is not remembered.
    pub const DEFAULT_LIFETIME_MINUTES: i64 = 120;
    /// Default lifetime of a remembered session cookie.
    pub const DEFAULT_REMEMBER_DAYS: i64 = 30;

    /// Create an empty store on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store reading time from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            lifetime: Duration::minutes(Self::DEFAULT_LIFETIME_MINUTES),
            remember_for: Duration::days(Self::DEFAULT_REMEMBER_DAYS),
            clock,
        }
    }

    /// Create an empty store whose remembered cookies last `remember_for`.
    #[must_use]
    pub fn with_remember_duration(remember_for: Duration) -> Self {
        Self::new().remember_for(remember_for)
    }

    /// Set how long a session that is not remembered stays valid.
    #[must_use]
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Set how long a remembered session stays valid.
    #[must_use]
    pub fn remember_for(mut self, remember_for: Duration) -> Self {
        self.remember_for = remember_for;
        self
    }

    /// The principal key bound to a live session id.
    ///
    /// A lapsed session is dropped on lookup.
    #[must_use]
    pub fn principal_for(&self, session_id: &str) -> Option<String> {
        let now = self.clock.now();
        if self
            .sessions
            .remove_if(session_id, |_, entry| entry.expires_at <= now)
            .is_some()
        {
            debug!("session lapsed");
            return None;
        }
        self.sessions.get(session_id).map(|entry| entry.principal.clone())
    }

    /// Drop a session.
    #[must_use]
    pub fn revoke(&self, session_id: &str) -> Option<String> {
        self.sessions.remove(session_id).map(|(_, entry)| entry.principal)
    }

    /// Remove every lapsed session and return how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHook for MemorySessionStore {
    fn current(&self, parts: &http::request::Parts) -> Option<String> {
        session_id_from_cookies(parts).and_then(|id| self.principal_for(&id))
    }

    fn establish(&self, principal_key: &str, remember: bool) -> Result<HeaderValue, SessionError> {
        let purged = self.purge_expired();
        if purged > 0 {
            debug!(purged, "swept lapsed sessions");
        }

        let session_id = Uuid::new_v4().simple().to_string();
        let mut cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        let ttl = if remember {
            cookie.push_str(&format!("; Max-Age={}", self.remember_for.num_seconds()));
            self.remember_for
        } else {
            self.lifetime
        };
        let value = HeaderValue::from_str(&cookie)?;

        self.sessions.insert(
            session_id,
            SessionEntry {
                principal: principal_key.to_owned(),
                expires_at: self.clock.now() + ttl,
            },
        );
        debug!(principal = %principal_key, remember, "established session");
        Ok(value)
    }
}

/// Extract the session id from the request's `Cookie` headers.
fn session_id_from_cookies(parts: &http::request::Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_owned())
}
