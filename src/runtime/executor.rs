//! Turn engine: one run of the stage graph per user input

use super::traits::ToolExecutor;
use crate::config::EngineConfig;
use crate::oracle::{Oracle, OracleError};
use crate::stages::{self, StageContext};
use crate::state_machine::{
    resume_stage, transition, ConversationState, MergePolicy, Message, Next, QualityGate, Stage,
};
use crate::tools::{parse_artifact, ToolContext, FAILURE_MARKER};
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Why a turn produced no new state
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("stage {stage} failed: {source}")]
    Oracle { stage: Stage, source: OracleError },
}

impl TurnError {
    pub fn stage(&self) -> Stage {
        match self {
            TurnError::Oracle { stage, .. } => *stage,
        }
    }
}

/// Generic turn engine that can work with any oracle and tool implementations
pub struct Engine<O, T>
where
    O: Oracle,
    T: ToolExecutor,
{
    oracle: O,
    tools: T,
    gate: QualityGate,
    merge_policy: MergePolicy,
    export_dir: PathBuf,
}

impl<O, T> Engine<O, T>
where
    O: Oracle,
    T: ToolExecutor,
{
    pub fn new(oracle: O, tools: T, config: &EngineConfig) -> Self {
        Self {
            oracle,
            tools,
            gate: config.gate,
            merge_policy: config.merge_policy.clone(),
            export_dir: config.export_dir.clone(),
        }
    }

    pub fn gate(&self) -> QualityGate {
        self.gate
    }

    /// Run one turn: route, append the input, execute stages until a halt.
    ///
    /// `previous` is never modified. On an oracle failure nothing from the
    /// turn survives and the caller keeps `previous`.
    pub async fn run_turn(
        &self,
        session_id: &str,
        previous: &ConversationState,
        input: &str,
    ) -> Result<ConversationState, TurnError> {
        // Routing reads the state before this turn's input is added
        let mut stage = resume_stage(previous, self.gate);
        tracing::info!(session_id = %session_id, entry = %stage, "Starting turn");

        let mut state = previous.clone();
        state.messages.push(Message::user(input));

        let definitions = self.tools.definitions();
        let ctx = StageContext {
            oracle: &self.oracle,
            gate: self.gate,
            merge_policy: &self.merge_policy,
            tools: &definitions,
        };

        // Every cycle in the graph passes through a suspend point, so a run
        // visits each stage at most once
        let max_executions = Stage::ALL.len() + 1;
        let mut executions = 0;

        loop {
            executions += 1;
            assert!(
                executions <= max_executions,
                "stage graph did not halt after {max_executions} executions (at {stage})"
            );

            let entered_after = state.last_stage;
            let started = Instant::now();
            let update = stages::execute(stage, &state, &ctx).await.map_err(|source| {
                tracing::warn!(
                    session_id = %session_id,
                    stage = %stage,
                    error = %source,
                    "Stage failed, turn aborted"
                );
                TurnError::Oracle { stage, source }
            })?;
            update.apply(&mut state);

            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = started.elapsed().as_millis() as u64;
            tracing::info!(
                session_id = %session_id,
                stage = %stage,
                duration_ms,
                "Stage completed"
            );

            match transition(stage, entered_after, &state, self.gate) {
                Next::Stage(next) => stage = next,
                Next::ExecuteTools => {
                    self.execute_tools(session_id, &mut state).await;
                    break;
                }
                Next::Suspend => break,
            }
        }

        tracing::info!(
            session_id = %session_id,
            halted_at = %stage,
            executions,
            "Turn complete"
        );
        Ok(state)
    }

    /// Run the tool calls on the last assistant message and append results.
    /// Tool failures become transcript content, never turn errors.
    async fn execute_tools(&self, session_id: &str, state: &mut ConversationState) {
        let calls = state
            .messages
            .last()
            .map(|m| m.tool_calls().to_vec())
            .unwrap_or_default();

        for call in calls {
            let ctx = ToolContext::new(session_id, &self.export_dir);
            let (content, is_error) =
                match self.tools.execute(&call.name, call.input.clone(), ctx).await {
                    Some(output) => (output.output, !output.success),
                    None => (format!("{FAILURE_MARKER}Unknown tool: {}", call.name), true),
                };

            let artifact = if is_error {
                tracing::warn!(session_id = %session_id, tool = %call.name, output = %content, "Tool failed");
                None
            } else {
                parse_artifact(&content)
            };

            state.messages.push(Message::ToolResult {
                tool_call_id: call.id,
                content,
                is_error,
                artifact,
            });
        }
    }
}
