//! Quality gate stages: evaluation and refine_ask

use super::StageContext;
use crate::oracle::{generate_structured, OracleError, ProblemEvaluation};
use crate::prompts;
use crate::state_machine::{ConversationState, Message, StageUpdate};

/// Score the problem statement against the rubric
///
/// The oracle's own pass flag is ignored; only the gate decides.
pub async fn evaluation(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let prompt = prompts::evaluation(&state.problem_profile);
    let evaluation: ProblemEvaluation =
        generate_structured(ctx.oracle, &prompt, state.latest_user_turn()).await?;

    let evaluation_result = evaluation.into_result();
    let is_passing_evaluation = ctx.gate.passes(evaluation_result.score);

    tracing::info!(
        score = evaluation_result.score,
        threshold = ctx.gate.threshold(),
        passed = is_passing_evaluation,
        "Problem statement evaluated"
    );

    Ok(StageUpdate::Evaluation {
        evaluation_result,
        is_passing_evaluation,
    })
}

/// Turn the critique into one guiding question
pub async fn refine_ask(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let prompt = prompts::refine_ask(&state.evaluation_result);
    let question = ctx
        .oracle
        .generate(&prompt, state.latest_user_turn())
        .await?;

    Ok(StageUpdate::RefineAsk {
        message: Message::assistant(question),
    })
}
