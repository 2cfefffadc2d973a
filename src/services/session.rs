use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime, Utc};

use crate::models::ConversationState;

pub type SessionHandle = Arc<tokio::sync::Mutex<ConversationState>>;

/// In-memory map of session id → conversation state. The outer std mutex
/// guards only map lookups; each session carries its own async mutex so
/// same-session messages serialize while distinct sessions proceed in
/// parallel. The per-session lock is the only one ever held across an await.
pub struct SessionStore {
    ttl: Duration,
    inner: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes),
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get or create the handle for a session. Callers lock the handle
    /// before touching the state.
    pub fn handle(&self, session_id: &str) -> SessionHandle {
        let mut map = self.inner.lock().unwrap();
        map.entry(session_id.to_string())
            .or_insert_with(|| {
                let now = Utc::now().naive_utc();
                Arc::new(tokio::sync::Mutex::new(ConversationState::new(
                    now, self.ttl,
                )))
            })
            .clone()
    }

    /// Drop idle-expired sessions nobody is currently processing. A request
    /// already holding a handle keeps its Arc alive; only the map's
    /// reference goes away.
    pub fn prune_expired(&self, now: NaiveDateTime) -> usize {
        let mut map = self.inner.lock().unwrap();
        let before = map.len();
        map.retain(|_, handle| match handle.try_lock() {
            Ok(state) => !state.is_expired(now),
            Err(_) => true,
        });
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
