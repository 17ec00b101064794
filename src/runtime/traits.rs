//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the engine and session manager with mock
//! implementations.

use crate::db::{Database, DbError, Session, SessionSummary};
use crate::llm::ToolDefinition;
use crate::state_machine::ConversationState;
use crate::tools::{ToolContext, ToolOutput, ToolRegistry};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Executor for tools requested by the export stage
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name; `None` when the name is unknown
    async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput>;

    /// Get tool definitions for LLM
    fn definitions(&self) -> Vec<ToolDefinition>;
}

/// Storage for conversation state between turns
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, id: &str, state: &ConversationState) -> Result<Session, DbError>;

    async fn load(&self, id: &str) -> Result<Session, DbError>;

    /// Replace the stored state of an existing session
    async fn save(&self, id: &str, state: &ConversationState) -> Result<(), DbError>;

    async fn list(&self) -> Result<Vec<SessionSummary>, DbError>;

    async fn delete(&self, id: &str) -> Result<(), DbError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ToolExecutor + ?Sized> ToolExecutor for Arc<T> {
    async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput> {
        (**self).execute(name, input, ctx).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        (**self).definitions()
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn create(&self, id: &str, state: &ConversationState) -> Result<Session, DbError> {
        (**self).create(id, state).await
    }

    async fn load(&self, id: &str) -> Result<Session, DbError> {
        (**self).load(id).await
    }

    async fn save(&self, id: &str, state: &ConversationState) -> Result<(), DbError> {
        (**self).save(id, state).await
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, DbError> {
        (**self).list().await
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        (**self).delete(id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl SessionStore for Database {
    async fn create(&self, id: &str, state: &ConversationState) -> Result<Session, DbError> {
        self.create_session(id, state)
    }

    async fn load(&self, id: &str) -> Result<Session, DbError> {
        self.get_session(id)
    }

    async fn save(&self, id: &str, state: &ConversationState) -> Result<(), DbError> {
        self.update_session_state(id, state)
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, DbError> {
        self.list_sessions()
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        self.delete_session(id)
    }
}

/// Adapter to use `ToolRegistry` as `ToolExecutor`
pub struct ToolRegistryExecutor {
    registry: ToolRegistry,
}

impl ToolRegistryExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistryExecutor {
    async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput> {
        self.registry.execute(name, input, ctx).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }
}
