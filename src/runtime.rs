//! Runtime for hosting interview sessions
//!
//! The engine runs one turn against a state value; the session manager
//! owns persistence and guarantees a single writer per session.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{Engine, TurnError};
pub use traits::*;

use crate::db::{Database, DbError, Session, SessionSummary};
use crate::oracle::{LlmOracle, Oracle};
use crate::state_machine::{ConversationState, Message};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

/// Session manager over the concrete production stack
pub type ProductionSessions = SessionManager<Database, LlmOracle, ToolRegistryExecutor>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] DbError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error("Input text is empty")]
    EmptyInput,
}

/// Result of a successful turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub state: ConversationState,
    /// Messages appended by this turn, the user input first
    pub new_messages: Vec<Message>,
}

/// Manager for all sessions
pub struct SessionManager<S, O, T>
where
    S: SessionStore,
    O: Oracle,
    T: ToolExecutor,
{
    store: S,
    engine: Engine<O, T>,
    /// One lock per session serializes its turns
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S, O, T> SessionManager<S, O, T>
where
    S: SessionStore,
    O: Oracle,
    T: ToolExecutor,
{
    pub fn new(store: S, engine: Engine<O, T>) -> Self {
        Self {
            store,
            engine,
            locks: RwLock::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(id) {
            return Arc::clone(lock);
        }
        let mut locks = self.locks.write().await;
        Arc::clone(locks.entry(id.to_string()).or_default())
    }

    /// Start a new session with a fresh state
    pub async fn create_session(&self) -> Result<Session, SessionError> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = self.store.create(&id, &ConversationState::new()).await?;
        tracing::info!(session_id = %id, "Session created");
        Ok(session)
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, SessionError> {
        Ok(self.store.list().await?)
    }

    pub async fn get_session(&self, id: &str) -> Result<Session, SessionError> {
        Ok(self.store.load(id).await?)
    }

    /// Run one turn and persist the result.
    ///
    /// On failure the stored state is left exactly as it was.
    pub async fn submit_turn(&self, id: &str, text: &str) -> Result<TurnOutcome, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let session = self.store.load(id).await?;
        let previous = session.state;
        let state = self.engine.run_turn(id, &previous, text).await?;
        self.store.save(id, &state).await?;

        let new_messages = state
            .messages
            .get(previous.messages.len()..)
            .map(<[Message]>::to_vec)
            .unwrap_or_default();
        Ok(TurnOutcome {
            state,
            new_messages,
        })
    }

    /// Discard all progress and start the interview over
    pub async fn reset_session(&self, id: &str) -> Result<ConversationState, SessionError> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let state = ConversationState::new();
        self.store.save(id, &state).await?;
        tracing::info!(session_id = %id, "Session reset");
        Ok(state)
    }

    pub async fn delete_session(&self, id: &str) -> Result<(), SessionError> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        self.store.delete(id).await?;
        self.locks.write().await.remove(id);
        tracing::info!(session_id = %id, "Session deleted");
        Ok(())
    }
}
