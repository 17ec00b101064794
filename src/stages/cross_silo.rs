//! Cross-department sub-dialogue: cross_silo_ask and cross_silo_evaluate

use super::StageContext;
use crate::oracle::{generate_structured, CrossSiloJudgement, OracleError};
use crate::prompts;
use crate::state_machine::{ConversationState, CrossSiloEvaluation, Message, StageUpdate};

/// Open the sub-dialogue with a resource question
///
/// Starts the accumulated discussion and resets its score.
pub async fn ask(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let prompt = prompts::cross_silo_ask(state.job_title.as_deref(), &state.problem_profile);
    let question = ctx.oracle.generate(&prompt, &[]).await?;

    let cross_silo_evaluation = CrossSiloEvaluation {
        result: format!("AI Question: {question}"),
        score: 0,
        advice: String::new(),
    };

    Ok(StageUpdate::CrossSiloAsk {
        message: Message::assistant(question),
        cross_silo_evaluation,
    })
}

/// Fold the latest answer into the discussion and judge its completeness
pub async fn evaluate(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let answer = state.latest_user_text().unwrap_or_default();
    let mut discussion = format!(
        "{}\nUser Answer: {answer}",
        state.cross_silo_evaluation.result
    );

    let prompt = prompts::cross_silo_evaluate(
        state.job_title.as_deref(),
        &state.problem_profile,
        &discussion,
    );
    let judgement: CrossSiloJudgement =
        generate_structured(ctx.oracle, &prompt, state.latest_user_turn()).await?;
    let score = judgement.clamped_score();
    let passed = ctx.gate.passes(score);

    tracing::info!(score, passed, "Cross-silo discussion judged");

    let reply = if passed {
        prompts::CROSS_SILO_COMPLETE.to_string()
    } else {
        discussion.push_str("\nAI Advice: ");
        discussion.push_str(&judgement.advice);
        judgement.advice.clone()
    };

    Ok(StageUpdate::CrossSiloEvaluate {
        message: Message::assistant(reply),
        cross_silo_evaluation: CrossSiloEvaluation {
            result: discussion,
            score,
            advice: judgement.advice,
        },
    })
}
