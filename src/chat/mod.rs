//! Conversation flow for one chat session.
//!
//! A turn moves `Idle -> AwaitingResponse -> Idle`. Whatever the backend
//! does, the turn ends with exactly one assistant message appended and the
//! transcript saved.

mod backend;

pub use crate::api::OnUpdate;
pub use backend::{ChatBackend, DirectBackend};

use crate::error::{DashError, Result};
use crate::models::{ChatMessage, ChatSession};
use crate::session::SessionStore;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingResponse,
}

/// A submitted user turn that has not been answered yet.
#[derive(Debug)]
pub struct PendingTurn {
    query: String,
}

impl PendingTurn {
    pub fn query(&self) -> &str {
        &self.query
    }
}

pub struct ChatController<B: ChatBackend, S: SessionStore> {
    backend: B,
    store: S,
    session: ChatSession,
    state: TurnState,
    fallback_message: String,
}

impl<B: ChatBackend, S: SessionStore> ChatController<B, S> {
    pub fn new(backend: B, store: S, fallback_message: impl Into<String>) -> Self {
        Self::with_session(backend, store, ChatSession::new(), fallback_message)
    }

    pub fn with_session(
        backend: B,
        store: S,
        session: ChatSession,
        fallback_message: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            session,
            state: TurnState::Idle,
            fallback_message: fallback_message.into(),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Start over with an empty session; the previous one stays stored.
    pub fn start_new_session(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.session = ChatSession::new();
        Ok(())
    }

    /// Record the user message and move to `AwaitingResponse`.
    pub fn begin_turn(&mut self, text: &str) -> Result<PendingTurn> {
        self.ensure_idle()?;

        let query = text.trim();
        if query.is_empty() {
            return Err(DashError::BadRequest("No query provided".to_string()));
        }

        self.session.push(ChatMessage::user(query));
        self.store.save(&self.session);
        self.state = TurnState::AwaitingResponse;

        Ok(PendingTurn {
            query: query.to_string(),
        })
    }

    /// Append the backend's answer, or the fallback message on error, and
    /// return to `Idle`.
    pub fn complete_turn(
        &mut self,
        _turn: PendingTurn,
        reply: Result<ChatMessage>,
    ) -> &ChatMessage {
        let message = self.reply_or_fallback(reply);
        self.session.push(message);
        self.finish_turn()
    }

    /// Run one full non-streaming turn.
    pub async fn submit(&mut self, text: &str) -> Result<&ChatMessage> {
        let turn = self.begin_turn(text)?;
        let reply = self.backend.reply(turn.query()).await;
        Ok(self.complete_turn(turn, reply))
    }

    /// Run one turn, growing a placeholder assistant message as deltas
    /// arrive. `on_update` sees the accumulated text after each delta.
    pub async fn submit_streaming<F>(&mut self, text: &str, mut on_update: F) -> Result<&ChatMessage>
    where
        F: FnMut(&str) + Send,
    {
        let turn = self.begin_turn(text)?;

        let placeholder = ChatMessage::assistant(String::new());
        let placeholder_id = placeholder.id.clone();
        self.session.push(placeholder);
        self.store.save(&self.session);

        let reply = {
            let session = &mut self.session;
            let store = &self.store;
            let mut apply = |so_far: &str| {
                if let Some(message) = session.messages.last_mut() {
                    message.content = so_far.to_string();
                }
                store.save(session);
                on_update(so_far);
            };
            self.backend.reply_streaming(turn.query(), &mut apply).await
        };

        let mut message = self.reply_or_fallback(reply);
        message.id = placeholder_id;
        if let Some(last) = self.session.messages.last_mut() {
            *last = message;
        }
        self.session.touch();
        Ok(self.finish_turn())
    }

    fn reply_or_fallback(&self, reply: Result<ChatMessage>) -> ChatMessage {
        match reply {
            Ok(message) if !message.content.trim().is_empty() => message,
            Ok(_) => {
                warn!("backend returned an empty reply");
                ChatMessage::assistant(self.fallback_message.clone())
            }
            Err(e) => {
                warn!(error = %e, "chat turn failed");
                ChatMessage::assistant(self.fallback_message.clone())
            }
        }
    }

    fn finish_turn(&mut self) -> &ChatMessage {
        self.store.save(&self.session);
        self.state = TurnState::Idle;
        debug!(
            session = %self.session.id,
            messages = self.session.messages.len(),
            "turn complete"
        );
        // A turn always ends with the assistant message it just appended
        &self.session.messages[self.session.messages.len() - 1]
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.state {
            TurnState::Idle => Ok(()),
            TurnState::AwaitingResponse => Err(DashError::Busy),
        }
    }
}
