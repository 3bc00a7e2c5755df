//! Per-user session state.
//!
//! A session holds the connection flag, the verified handle and the last
//! non-secret form inputs. Sessions are keyed by a random id carried in a
//! cookie; nothing in one session is visible to another.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::model::{OdbcDriver, QueryParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(SessionId)
    }
}

/// Connection form values echoed back into the page. The password is never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInputs {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    pub driver: OdbcDriver,
    pub trust_server_certificate: bool,
}

pub struct Session<H> {
    id: SessionId,
    handle: Option<H>,
    pub connection_inputs: Option<ConnectionInputs>,
    pub query_inputs: QueryParams,
    last_seen: Instant,
}

impl<H> Session<H> {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            handle: None,
            connection_inputs: None,
            query_inputs: QueryParams::default(),
            last_seen: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// True when a verified handle is held.
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// Store a freshly verified handle, releasing any previous one.
    pub fn attach(&mut self, handle: H) {
        self.handle = Some(handle);
    }

    /// Drop the current handle, if any. Returns whether one was held.
    pub fn release(&mut self) -> bool {
        self.handle.take().is_some()
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

impl<H> fmt::Debug for Session<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .field("connection_inputs", &self.connection_inputs)
            .field("query_inputs", &self.query_inputs)
            .finish()
    }
}

pub type SharedSession<H> = Arc<Mutex<Session<H>>>;

/// All live sessions, with lazy expiry of idle ones.
pub struct SessionStore<H> {
    sessions: RwLock<HashMap<SessionId, SharedSession<H>>>,
    idle_timeout: Duration,
}

impl<H: Send + 'static> SessionStore<H> {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Look up the session for `id`, creating a new one when the id is
    /// missing, unknown or expired. Returns the session and whether it is new.
    pub async fn get_or_create(&self, id: Option<SessionId>) -> (SharedSession<H>, bool) {
        self.sweep().await;

        let existing = match id {
            Some(id) => self.sessions.read().await.get(&id).cloned(),
            None => None,
        };
        if let Some(session) = existing {
            session.lock().await.touch();
            return (session, false);
        }

        let id = SessionId::new();
        let session = Arc::new(Mutex::new(Session::new(id)));
        self.sessions.write().await.insert(id, session.clone());
        tracing::debug!(session = %id, "session created");
        (session, true)
    }

    /// Tear down a session, releasing its handle.
    pub async fn remove(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id);
        match removed {
            Some(session) => {
                session.lock().await.release();
                tracing::debug!(session = %id, "session removed");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle longer than the timeout. Sessions busy with a
    /// request are skipped.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| match session.try_lock() {
            Ok(guard) => {
                let keep = guard.idle_for(now) <= self.idle_timeout;
                if !keep {
                    tracing::debug!(session = %id, "session expired");
                }
                keep
            }
            Err(_) => true,
        });
        before - sessions.len()
    }
}
