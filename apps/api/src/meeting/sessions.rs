//! In-memory registry of open sessions. Each entry is owned by exactly one
//! session id and disappears when the session is closed, sits idle past the
//! configured limit, or the process exits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::meeting::models::MeetingSession;

struct Entry {
    session: MeetingSession,
    last_touched: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, Entry>>>,
    idle_ttl: Duration,
}

impl SessionStore {
    /// Sessions untouched for longer than `idle_ttl` are dropped.
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl,
        }
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.last_touched) > self.idle_ttl
    }

    /// Opens a session and returns its id with the freshly rendered state.
    /// Idle sessions are swept first.
    pub async fn open(&self, today: NaiveDate) -> (Uuid, MeetingSession) {
        let id = Uuid::new_v4();
        let session = MeetingSession::new(today);
        let now = Instant::now();

        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle session(s)");
        }

        sessions.insert(
            id,
            Entry {
                session: session.clone(),
                last_touched: now,
            },
        );
        (id, session)
    }

    /// Drops a session. Returns false if it was not open.
    pub async fn close(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }

    /// Runs `f` against the session's state and marks the session as used.
    /// The lock is held only for the duration of `f`, which must not block.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut MeetingSession) -> R,
    ) -> Result<R, AppError> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        if sessions
            .get(&id)
            .is_some_and(|entry| self.is_expired(entry, now))
        {
            sessions.remove(&id);
        }

        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        entry.last_touched = now;
        Ok(f(&mut entry.session))
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<MeetingSession, AppError> {
        self.with_session(id, |s| s.clone()).await
    }

    pub async fn open_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
