mod filesystem;
mod memory;
mod storage;

pub use filesystem::{default_sessions_path, FilesystemSessionStore};
pub use memory::MemorySessionStore;
pub use storage::SessionStore;

use crate::models::ChatSession;

/// Upper bound on stored sessions; the oldest insertions fall off the end.
pub const MAX_SESSIONS: usize = 50;

const TITLE_WORDS: usize = 6;

/// Derive a session title from the first user message
pub fn generate_title(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let title = words
        .iter()
        .take(TITLE_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    if words.len() > TITLE_WORDS {
        format!("{}...", title)
    } else {
        title
    }
}

/// Replace the session in place if its id is known, else put it at the
/// front; then drop everything past `MAX_SESSIONS`.
pub fn upsert_capped(sessions: &mut Vec<ChatSession>, session: ChatSession) {
    match sessions.iter().position(|s| s.id == session.id) {
        Some(index) => sessions[index] = session,
        None => sessions.insert(0, session),
    }
    sessions.truncate(MAX_SESSIONS);
}
