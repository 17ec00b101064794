//! Mock implementations for testing
//!
//! These mocks enable engine and session tests without real I/O.

use super::traits::{SessionStore, ToolExecutor};
use crate::db::{DbError, Session, SessionSummary};
use crate::llm::{LlmErrorKind, ToolDefinition};
use crate::oracle::{Oracle, OracleError, OracleErrorKind, OracleReply, OutputSchema};
use crate::state_machine::{ConversationState, Message};
use crate::tools::{ToolContext, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Mock Oracle
// ============================================================================

/// One queued oracle answer
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Value(Value),
    Reply(OracleReply),
    Error(OracleError),
}

/// A recorded oracle call
#[derive(Debug, Clone, PartialEq)]
pub struct OracleCall {
    pub instruction: String,
    pub history: Vec<Message>,
    /// Schema name for structured calls
    pub schema: Option<String>,
    /// Offered tool names for tool-enabled calls
    pub tools: Vec<String>,
}

/// Oracle that answers from a queue, in call order
pub struct MockOracle {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<OracleCall>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a free-text answer
    pub fn queue_text(&self, text: impl Into<String>) {
        self.push(MockResponse::Text(text.into()));
    }

    /// Queue a structured answer
    pub fn queue_value(&self, value: Value) {
        self.push(MockResponse::Value(value));
    }

    /// Queue a tool-enabled answer
    pub fn queue_reply(&self, reply: OracleReply) {
        self.push(MockResponse::Reply(reply));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: OracleError) {
        self.push(MockResponse::Error(error));
    }

    /// Get recorded calls
    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    fn push(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn next(&self, call: OracleCall) -> Result<MockResponse, OracleError> {
        self.calls.lock().unwrap().push(call);
        match self.responses.lock().unwrap().pop_front() {
            Some(MockResponse::Error(e)) => Err(e),
            Some(response) => Ok(response),
            None => Err(OracleError::new(
                OracleErrorKind::Transport(LlmErrorKind::Network),
                "No mock response queued",
            )),
        }
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn generate(&self, instruction: &str, history: &[Message]) -> Result<String, OracleError> {
        let call = OracleCall {
            instruction: instruction.to_string(),
            history: history.to_vec(),
            schema: None,
            tools: Vec::new(),
        };
        match self.next(call)? {
            MockResponse::Text(text) => Ok(text),
            other => panic!("free-text call got queued {other:?}"),
        }
    }

    async fn generate_value(
        &self,
        instruction: &str,
        history: &[Message],
        schema: &OutputSchema,
    ) -> Result<Value, OracleError> {
        let call = OracleCall {
            instruction: instruction.to_string(),
            history: history.to_vec(),
            schema: Some(schema.name.to_string()),
            tools: Vec::new(),
        };
        match self.next(call)? {
            MockResponse::Value(value) => Ok(value),
            other => panic!("structured call got queued {other:?}"),
        }
    }

    async fn generate_with_tools(
        &self,
        instruction: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<OracleReply, OracleError> {
        let call = OracleCall {
            instruction: instruction.to_string(),
            history: history.to_vec(),
            schema: None,
            tools: tools.iter().map(|t| t.name.clone()).collect(),
        };
        match self.next(call)? {
            MockResponse::Reply(reply) => Ok(reply),
            MockResponse::Text(text) => Ok(OracleReply {
                text,
                tool_calls: Vec::new(),
            }),
            other => panic!("tool-enabled call got queued {other:?}"),
        }
    }
}

// ============================================================================
// Mock Tool Executor
// ============================================================================

/// Mock tool executor with predefined outputs
pub struct MockToolExecutor {
    outputs: HashMap<String, ToolOutput>,
    definitions: Vec<ToolDefinition>,
    /// Record of tool executions
    pub executions: Mutex<Vec<(String, Value)>>,
}

impl MockToolExecutor {
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
            definitions: Vec::new(),
            executions: Mutex::new(Vec::new()),
        }
    }

    /// Add a tool with a predefined output
    pub fn with_tool(mut self, name: impl Into<String>, output: ToolOutput) -> Self {
        let name = name.into();
        self.definitions.push(ToolDefinition {
            name: name.clone(),
            description: format!("Mock {name}"),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        });
        self.outputs.insert(name, output);
        self
    }

    /// Get recorded executions
    pub fn recorded_executions(&self) -> Vec<(String, Value)> {
        self.executions.lock().unwrap().clone()
    }
}

impl Default for MockToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for MockToolExecutor {
    async fn execute(&self, name: &str, input: Value, _ctx: ToolContext) -> Option<ToolOutput> {
        self.executions
            .lock()
            .unwrap()
            .push((name.to_string(), input));
        self.outputs.get(name).cloned()
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        self.definitions.clone()
    }
}

// ============================================================================
// In-Memory Session Store
// ============================================================================

/// In-memory session storage for testing
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    /// Number of successful saves
    pub saves: Mutex<usize>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            saves: Mutex::new(0),
        }
    }

    /// Get current state for a session
    pub fn get_current_state(&self, id: &str) -> Option<ConversationState> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .map(|s| s.state.clone())
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, id: &str, state: &ConversationState) -> Result<Session, DbError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(id) {
            return Err(DbError::SessionExists(id.to_string()));
        }
        let now = chrono::Utc::now();
        let session = Session {
            id: id.to_string(),
            state: state.clone(),
            created_at: now,
            updated_at: now,
        };
        sessions.insert(id.to_string(), session.clone());
        Ok(session)
    }

    async fn load(&self, id: &str) -> Result<Session, DbError> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::SessionNotFound(id.to_string()))
    }

    async fn save(&self, id: &str, state: &ConversationState) -> Result<(), DbError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| DbError::SessionNotFound(id.to_string()))?;
        session.state = state.clone();
        session.updated_at = chrono::Utc::now();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, DbError> {
        let mut summaries: Vec<_> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .map(|s| SessionSummary {
                id: s.id.clone(),
                last_stage: s.state.last_stage,
                message_count: i64::try_from(s.state.messages.len()).unwrap_or(i64::MAX),
                created_at: s.created_at,
                updated_at: s.updated_at,
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete(&self, id: &str) -> Result<(), DbError> {
        self.sessions
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DbError::SessionNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_oracle_answers_in_order() {
        let oracle = MockOracle::new();
        oracle.queue_text("first");
        oracle.queue_value(json!({"score": 1}));

        assert_eq!(oracle.generate("a", &[]).await.unwrap(), "first");
        let schema = OutputSchema {
            name: "x",
            schema: json!({}),
        };
        assert_eq!(
            oracle.generate_value("b", &[], &schema).await.unwrap(),
            json!({"score": 1})
        );
        assert_eq!(oracle.remaining(), 0);
        assert_eq!(oracle.calls()[1].schema.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_mock_oracle_empty_queue_is_transport_error() {
        let oracle = MockOracle::new();
        let err = oracle.generate("a", &[]).await.unwrap_err();
        assert_eq!(
            err.kind,
            OracleErrorKind::Transport(LlmErrorKind::Network)
        );
    }

    #[tokio::test]
    async fn test_mock_tool_executor() {
        let executor =
            MockToolExecutor::new().with_tool("generate_report", ToolOutput::success("ok"));
        let ctx = ToolContext::new("s1", "/tmp");

        let out = executor
            .execute("generate_report", json!({"title": "t"}), ctx.clone())
            .await;
        assert_eq!(out, Some(ToolOutput::success("ok")));
        assert!(executor.execute("unknown", json!({}), ctx).await.is_none());
        assert_eq!(executor.recorded_executions().len(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySessionStore::new();
        store.create("s1", &ConversationState::new()).await.unwrap();
        assert!(matches!(
            store.create("s1", &ConversationState::new()).await,
            Err(DbError::SessionExists(_))
        ));

        let mut state = ConversationState::new();
        state.messages.push(Message::user("hi"));
        store.save("s1", &state).await.unwrap();
        assert_eq!(store.get_current_state("s1"), Some(state));
        assert_eq!(store.list().await.unwrap()[0].message_count, 1);

        store.delete("s1").await.unwrap();
        assert!(store.load("s1").await.is_err());
    }
}
