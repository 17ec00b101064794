//! Oracle backed by an [`LlmService`]

use super::{Oracle, OracleError, OracleReply, OutputSchema};
use crate::llm::{
    ContentBlock, LlmMessage, LlmRequest, LlmResponse, LlmService, MessageRole,
    ResponseFormat, ToolDefinition,
};
use crate::state_machine::{Message, ToolCall};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Retry and deadline applied to each provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Deadline for one attempt
    pub timeout: Duration,
    /// Delay before the first retry; doubles on each further retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(120),
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff: 1s, 2s, 4s with the default base
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.saturating_sub(1).min(16))
    }
}

/// Oracle over one model, sampled at two temperatures
///
/// Conversational replies use the creative temperature; extraction and
/// scoring use the strict one.
pub struct LlmOracle {
    service: Arc<dyn LlmService>,
    temperature: f32,
    strict_temperature: f32,
    retry: RetryPolicy,
}

impl LlmOracle {
    pub fn new(service: Arc<dyn LlmService>, temperature: f32, strict_temperature: f32) -> Self {
        Self {
            service,
            temperature,
            strict_temperature,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, instruction: &str, history: &[Message], temperature: f32) -> LlmRequest {
        LlmRequest::new(instruction, translate_history(history)).with_temperature(temperature)
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, OracleError> {
        let mut attempt = 1;
        loop {
            match tokio::time::timeout(self.retry.timeout, self.service.complete(request)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) if e.kind.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = e.retry_after.unwrap_or_else(|| self.retry.delay(attempt));
                    tracing::warn!(
                        model = %self.service.model_id(),
                        attempt,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Retrying oracle call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    return Err(OracleError::timeout(format!(
                        "{} did not answer within {}s",
                        self.service.model_id(),
                        self.retry.timeout.as_secs()
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl Oracle for LlmOracle {
    async fn generate(&self, instruction: &str, history: &[Message]) -> Result<String, OracleError> {
        let request = self.request(instruction, history, self.temperature);
        Ok(self.complete(&request).await?.text())
    }

    async fn generate_value(
        &self,
        instruction: &str,
        history: &[Message],
        schema: &OutputSchema,
    ) -> Result<Value, OracleError> {
        let request = self
            .request(instruction, history, self.strict_temperature)
            .with_response_format(ResponseFormat {
                name: schema.name.to_string(),
                schema: schema.schema.clone(),
            });
        let text = self.complete(&request).await?.text();
        parse_json_reply(&text)
            .ok_or_else(|| OracleError::malformed(format!("{} reply is not JSON: {text}", schema.name)))
    }

    async fn generate_with_tools(
        &self,
        instruction: &str,
        history: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<OracleReply, OracleError> {
        let request = self
            .request(instruction, history, self.temperature)
            .with_tools(tools.to_vec());
        let response = self.complete(&request).await?;
        Ok(OracleReply {
            text: response.text(),
            tool_calls: response
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| ToolCall::new(id, name, input.clone()))
                .collect(),
        })
    }
}

/// Parse a JSON reply, tolerating a surrounding Markdown code fence
fn parse_json_reply(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    trimmed
        .get(start..=end)
        .and_then(|inner| serde_json::from_str(inner).ok())
}

/// Map the transcript into provider messages
fn translate_history(history: &[Message]) -> Vec<LlmMessage> {
    history
        .iter()
        .filter_map(|message| match message {
            Message::User { content } => Some(LlmMessage::user(content.clone())),
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let mut blocks = Vec::new();
                if !content.is_empty() {
                    blocks.push(ContentBlock::text(content.clone()));
                }
                blocks.extend(
                    tool_calls
                        .iter()
                        .map(|c| ContentBlock::tool_use(&c.id, &c.name, c.input.clone())),
                );
                Some(LlmMessage::assistant(blocks))
            }
            Message::ToolResult {
                tool_call_id,
                content,
                is_error,
                ..
            } => Some(LlmMessage {
                role: MessageRole::User,
                content: vec![ContentBlock::tool_result(tool_call_id, content, *is_error)],
            }),
            // Instructions travel in the system slot, not the history
            Message::System { .. } => None,
        })
        .collect()
}
