use crate::models::ChatSession;

/// Trait for session storage backends.
///
/// Operations never fail from the caller's point of view: a backend logs
/// its own errors and falls back to an empty list or a no-op.
pub trait SessionStore: Send + Sync {
    /// All stored sessions, newest first by creation. Saving a known
    /// session replaces it where it stands.
    fn list(&self) -> Vec<ChatSession>;

    /// Insert or replace a session by id.
    fn save(&self, session: &ChatSession);

    /// Remove a session, returning whether it existed. Unknown ids are
    /// ignored.
    fn delete(&self, id: &str) -> bool;

    /// Remove every stored session.
    fn clear(&self);

    fn get(&self, id: &str) -> Option<ChatSession> {
        self.list().into_iter().find(|s| s.id == id)
    }

    /// The session that changed last.
    fn most_recent(&self) -> Option<ChatSession> {
        self.list().into_iter().rev().max_by_key(|s| s.updated_at)
    }
}
