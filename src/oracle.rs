//! Generation oracle boundary
//!
//! Stages talk to the language model only through [`Oracle`]. Free-form
//! calls return text; structured calls return a value that must deserialize
//! into the requested schema or the whole stage fails.

mod llm_oracle;
pub mod schema;

pub use llm_oracle::{LlmOracle, RetryPolicy};
pub use schema::{
    CrossSiloJudgement, EvaluationDimensions, ProblemEvaluation, ProblemExtraction,
    StructuredOutput,
};

use crate::llm::{LlmErrorKind, ToolDefinition};
use crate::state_machine::{Message, ToolCall};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Why an oracle call produced nothing usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleErrorKind {
    /// The provider call failed after any retries
    Transport(LlmErrorKind),
    /// A single attempt exceeded the configured deadline
    Timeout,
    /// A structured reply could not be coerced to its schema
    MalformedOutput,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct OracleError {
    pub kind: OracleErrorKind,
    pub message: String,
}

impl OracleError {
    pub fn new(kind: OracleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::MalformedOutput, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(OracleErrorKind::Timeout, message)
    }
}

impl From<crate::llm::LlmError> for OracleError {
    fn from(e: crate::llm::LlmError) -> Self {
        Self::new(OracleErrorKind::Transport(e.kind), e.message)
    }
}

/// Declared shape of a structured reply
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// Reply from a tool-enabled call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleReply {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

/// External text and structured-data generation service
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Instruction plus history to free text
    async fn generate(&self, instruction: &str, history: &[Message]) -> Result<String, OracleError>;

    /// Instruction plus history to a JSON value shaped by `schema`
    async fn generate_value(
        &self,
        instruction: &str,
        history: &[Message],
        schema: &OutputSchema,
    ) -> Result<Value, OracleError>;

    /// Free text that may instead request tool invocations
    async fn generate_with_tools(
        &self,
        instruction: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<OracleReply, OracleError>;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for std::sync::Arc<T> {
    async fn generate(&self, instruction: &str, history: &[Message]) -> Result<String, OracleError> {
        (**self).generate(instruction, history).await
    }

    async fn generate_value(
        &self,
        instruction: &str,
        history: &[Message],
        schema: &OutputSchema,
    ) -> Result<Value, OracleError> {
        (**self).generate_value(instruction, history, schema).await
    }

    async fn generate_with_tools(
        &self,
        instruction: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<OracleReply, OracleError> {
        (**self).generate_with_tools(instruction, history, tools).await
    }
}

/// Structured call typed by the target record
///
/// No partial acceptance: any deserialization failure is `MalformedOutput`.
pub async fn generate_structured<T, O>(
    oracle: &O,
    instruction: &str,
    history: &[Message],
) -> Result<T, OracleError>
where
    T: StructuredOutput,
    O: Oracle + ?Sized,
{
    let schema = T::output_schema();
    let value = oracle.generate_value(instruction, history, &schema).await?;
    serde_json::from_value(value)
        .map_err(|e| OracleError::malformed(format!("{} does not match schema: {e}", schema.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::testing::MockOracle;
    use serde_json::json;

    #[tokio::test]
    async fn test_structured_call_decodes_value() {
        let oracle = MockOracle::new();
        oracle.queue_value(json!({
            "job_title": "行銷經理",
            "pain_point": "流失率太高",
            "goal": null,
            "job_title_corrected": false
        }));

        let extraction: ProblemExtraction =
            generate_structured(&oracle, "extract", &[Message::user("x")])
                .await
                .unwrap();
        assert_eq!(extraction.job_title.as_deref(), Some("行銷經理"));
        assert_eq!(extraction.goal, None);
    }

    #[tokio::test]
    async fn test_structured_call_rejects_wrong_shape() {
        let oracle = MockOracle::new();
        oracle.queue_value(json!({"score": "high"}));

        let err = generate_structured::<ProblemEvaluation, _>(&oracle, "evaluate", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind, OracleErrorKind::MalformedOutput);
        assert!(err.message.contains("problem_evaluation"));
    }

    #[tokio::test]
    async fn test_wrong_keyed_extraction_is_malformed() {
        let oracle = MockOracle::new();
        oracle.queue_value(json!({"painPoint": "流失率太高", "objective": "降到 8%"}));

        let err = generate_structured::<ProblemExtraction, _>(&oracle, "extract", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind, OracleErrorKind::MalformedOutput);
        assert!(err.message.contains("problem_extraction"));
    }

    #[test]
    fn test_llm_error_maps_to_transport() {
        let err: OracleError = crate::llm::LlmError::rate_limit("slow down").into();
        assert_eq!(err.kind, OracleErrorKind::Transport(LlmErrorKind::RateLimit));
    }
}
