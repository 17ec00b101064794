//! API request and response types

use crate::db::{Session, SessionSummary};
use crate::state_machine::{ConversationState, Message, Progress};
use serde::{Deserialize, Serialize};

/// Request to submit a user turn
#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

/// Response with the state after a turn
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub state: ConversationState,
    pub new_messages: Vec<Message>,
    pub progress: Progress,
}

/// Response with a list of sessions
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// Response with a single session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Session,
    pub progress: Progress,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        let progress = session.state.progress();
        Self { session, progress }
    }
}

/// Opening prompt shown before the first turn
#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub greeting: &'static str,
}

/// Model information with metadata
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
    pub description: String,
    pub context_window: usize,
}

/// Response for model list
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Set when resubmitting the same turn may succeed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            retryable: true,
        }
    }
}
