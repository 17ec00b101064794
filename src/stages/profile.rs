//! Profile gathering: situation, reflection, summary

use super::StageContext;
use crate::oracle::{generate_structured, OracleError, ProblemExtraction};
use crate::prompts;
use crate::state_machine::{
    merge_job_title, ConversationState, MergePolicy, Message, ReflectionResult, StageUpdate,
};

/// Extract profile fields and job title from the latest user turn
pub async fn situation(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let prompt = prompts::situation(&state.problem_profile, state.job_title.as_deref());
    let extraction: ProblemExtraction =
        generate_structured(ctx.oracle, &prompt, state.latest_user_turn()).await?;

    let problem_profile = state
        .problem_profile
        .merged(&extraction.patch(), ctx.merge_policy);
    let job_title = merge_job_title(
        state.job_title.as_deref(),
        extraction.job_title.as_deref(),
        extraction.job_title_corrected,
    );
    let reflection_result = ReflectionResult::assess(&problem_profile);

    tracing::info!(
        missing = ?reflection_result.missing_fields,
        is_complete = reflection_result.is_complete,
        "Profile extracted"
    );

    Ok(StageUpdate::Situation {
        problem_profile,
        job_title,
        reflection_result,
    })
}

/// Ask a targeted question for the missing fields
pub async fn reflection(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let missing = &state.reflection_result.missing_fields;
    let prompt = prompts::reflection(&state.problem_profile, missing);
    let question = ctx
        .oracle
        .generate(&prompt, state.latest_user_turn())
        .await?;

    Ok(StageUpdate::Reflection {
        message: Message::assistant(question),
        // The question is not profile content
        problem_profile: state.problem_profile.clone(),
    })
}

/// Compact the profile into a consolidated restatement
pub async fn summary(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let prompt = prompts::summary(&state.problem_profile);
    let extraction: ProblemExtraction =
        generate_structured(ctx.oracle, &prompt, state.latest_user_turn()).await?;

    Ok(StageUpdate::Summary {
        problem_profile: state
            .problem_profile
            .merged(&extraction.patch(), &MergePolicy::Replace),
    })
}
