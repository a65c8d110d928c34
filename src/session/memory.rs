use super::storage::SessionStore;
use super::upsert_capped;
use crate::models::ChatSession;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// In-process store with the same ordering and capping as the file store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<ChatSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Option<MutexGuard<'_, Vec<ChatSession>>> {
        match self.sessions.lock() {
            Ok(sessions) => Some(sessions),
            Err(e) => {
                warn!(error = %e, "session store lock poisoned");
                None
            }
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn list(&self) -> Vec<ChatSession> {
        self.lock()
            .map(|sessions| sessions.clone())
            .unwrap_or_default()
    }

    fn save(&self, session: &ChatSession) {
        if let Some(mut sessions) = self.lock() {
            upsert_capped(&mut sessions, session.clone());
        }
    }

    fn delete(&self, id: &str) -> bool {
        let Some(mut sessions) = self.lock() else {
            return false;
        };
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        sessions.len() != before
    }

    fn clear(&self) {
        if let Some(mut sessions) = self.lock() {
            sessions.clear();
        }
    }
}
