//! Closing stages: hmw_gen, final_summary, file_export

use super::StageContext;
use crate::oracle::OracleError;
use crate::prompts;
use crate::state_machine::{ConversationState, Message, StageUpdate};

/// Restate the problem as a "How might we" question
pub async fn hmw_gen(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let prompt = prompts::hmw(&state.problem_profile);
    let text = ctx
        .oracle
        .generate(&prompt, state.latest_user_turn())
        .await?;

    Ok(StageUpdate::HmwGen {
        message: Message::assistant(text),
    })
}

/// Produce the strategy report and offer to export it
pub async fn final_summary(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let prompt = prompts::final_summary(&state.problem_profile, &state.cross_silo_evaluation);
    let report = ctx.oracle.generate(&prompt, &[]).await?;

    Ok(StageUpdate::FinalSummary {
        message: Message::assistant(report.clone()),
        report,
    })
}

/// Decide on export; the reply may carry tool calls
pub async fn file_export(
    state: &ConversationState,
    ctx: &StageContext<'_>,
) -> Result<StageUpdate, OracleError> {
    let reply = ctx
        .oracle
        .generate_with_tools(prompts::FILE_EXPORT, &state.messages, ctx.tools)
        .await?;

    if !reply.tool_calls.is_empty() {
        let names: Vec<_> = reply.tool_calls.iter().map(|c| c.name.as_str()).collect();
        tracing::info!(tools = ?names, "Export requested tool calls");
    }

    Ok(StageUpdate::FileExport {
        message: Message::Assistant {
            content: reply.text,
            tool_calls: reply.tool_calls,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::OracleReply;
    use crate::runtime::testing::MockOracle;
    use crate::state_machine::{MergePolicy, QualityGate, ToolCall};
    use crate::tools::ToolRegistry;
    use serde_json::json;

    #[tokio::test]
    async fn test_final_summary_stores_report() {
        let oracle = MockOracle::new();
        oracle.queue_text("# 策略報告\n...\n是否需要匯出成檔案？");
        let policy = MergePolicy::Replace;
        let ctx = StageContext {
            oracle: &oracle,
            gate: QualityGate::default(),
            merge_policy: &policy,
            tools: &[],
        };

        let update = final_summary(&ConversationState::new(), &ctx)
            .await
            .unwrap();
        let StageUpdate::FinalSummary { message, report } = update else {
            panic!("unexpected update");
        };
        assert_eq!(message.content(), report);
        assert!(report.starts_with("# 策略報告"));
    }

    #[tokio::test]
    async fn test_file_export_sees_full_history_and_tools() {
        let oracle = MockOracle::new();
        let call = ToolCall::new("call_1", "generate_report", json!({"filename": "plan"}));
        oracle.queue_reply(OracleReply {
            text: String::new(),
            tool_calls: vec![call.clone()],
        });
        let policy = MergePolicy::Replace;
        let tools = ToolRegistry::standard().definitions();
        let ctx = StageContext {
            oracle: &oracle,
            gate: QualityGate::default(),
            merge_policy: &policy,
            tools: &tools,
        };
        let state = ConversationState {
            messages: vec![
                Message::user("a"),
                Message::assistant("report"),
                Message::user("好，請匯出"),
            ],
            ..Default::default()
        };

        let update = file_export(&state, &ctx).await.unwrap();
        assert_eq!(
            update,
            StageUpdate::FileExport {
                message: Message::Assistant {
                    content: String::new(),
                    tool_calls: vec![call],
                }
            }
        );

        let calls = oracle.calls();
        assert_eq!(calls[0].history.len(), 3);
        assert_eq!(calls[0].tools, vec!["generate_report".to_string()]);
    }
}
