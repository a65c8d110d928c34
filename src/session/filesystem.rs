use super::storage::SessionStore;
use super::upsert_capped;
use crate::error::Result;
use crate::models::ChatSession;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SESSIONS_FILE: &str = "sessions.json";

/// Session store backed by a single JSON file holding the whole list.
pub struct FilesystemSessionStore {
    path: PathBuf,
}

impl FilesystemSessionStore {
    pub fn new() -> Self {
        Self::with_path(default_sessions_path())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<ChatSession>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(vec![]);
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, sessions: &[ChatSession]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write to a sibling file first so a crash never leaves a torn list behind
        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(sessions)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), count = sessions.len(), "sessions persisted");
        Ok(())
    }

    fn read_or_empty(&self) -> Vec<ChatSession> {
        self.read().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to read sessions");
            vec![]
        })
    }

    fn write_logged(&self, sessions: &[ChatSession]) {
        if let Err(e) = self.write(sessions) {
            warn!(path = %self.path.display(), error = %e, "failed to write sessions");
        }
    }
}

impl SessionStore for FilesystemSessionStore {
    fn list(&self) -> Vec<ChatSession> {
        self.read_or_empty()
    }

    fn save(&self, session: &ChatSession) {
        let mut sessions = self.read_or_empty();
        upsert_capped(&mut sessions, session.clone());
        self.write_logged(&sessions);
    }

    fn delete(&self, id: &str) -> bool {
        let mut sessions = self.read_or_empty();
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return false;
        }
        self.write_logged(&sessions);
        true
    }

    fn clear(&self) {
        if !self.path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to clear sessions");
        }
    }
}

impl Default for FilesystemSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `~/.cache/dash/sessions.json`, or the temp dir when no home is known.
pub fn default_sessions_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".cache").join("dash"))
        .unwrap_or_else(|| std::env::temp_dir().join("dash"))
        .join(SESSIONS_FILE)
}
