//! Stage implementations
//!
//! A stage reads the current state, consults the oracle, and returns the
//! partial update it is allowed to write. Stages never touch the state
//! directly and never decide what runs next.

mod cross_silo;
mod evaluation;
mod profile;
mod report;

use crate::llm::ToolDefinition;
use crate::oracle::{Oracle, OracleError};
use crate::state_machine::{ConversationState, MergePolicy, QualityGate, Stage, StageUpdate};

/// Collaborators and settings shared by every stage in a run
pub struct StageContext<'a> {
    pub oracle: &'a dyn Oracle,
    pub gate: QualityGate,
    /// Policy `situation` merges extractions with
    pub merge_policy: &'a MergePolicy,
    /// Tools offered to the oracle by `file_export`
    pub tools: &'a [ToolDefinition],
}

/// Run one stage against `state`
pub async fn execute(
    stage: Stage,
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    tracing::debug!(stage = %stage, "Entering stage");
    let update = match stage {
        Stage::Situation => profile::situation(state, ctx).await,
        Stage::Reflection => profile::reflection(state, ctx).await,
        Stage::Summary => profile::summary(state, ctx).await,
        Stage::Evaluation => evaluation::evaluation(state, ctx).await,
        Stage::RefineAsk => evaluation::refine_ask(state, ctx).await,
        Stage::HmwGen => report::hmw_gen(state, ctx).await,
        Stage::CrossSiloAsk => cross_silo::ask(state, ctx).await,
        Stage::CrossSiloEvaluate => cross_silo::evaluate(state, ctx).await,
        Stage::FinalSummary => report::final_summary(state, ctx).await,
        Stage::FileExport => report::file_export(state, ctx).await,
    }?;
    debug_assert_eq!(update.stage(), stage);
    Ok(update)
}
