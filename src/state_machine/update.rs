//! Partial state updates produced by stages
//!
//! Each variant names exactly the fields its stage may write. Applying an
//! update appends messages and replaces every other written field whole;
//! sub-field merging is the stage's job before it builds the update.

use super::state::{
    ConversationState, CrossSiloEvaluation, EvaluationResult, Message, ProblemProfile,
    ReflectionResult, Stage,
};

/// Output of one stage execution
#[derive(Debug, Clone, PartialEq)]
pub enum StageUpdate {
    Situation {
        problem_profile: ProblemProfile,
        job_title: Option<String>,
        reflection_result: ReflectionResult,
    },
    Reflection {
        message: Message,
        problem_profile: ProblemProfile,
    },
    /// Compaction: replaces the profile wholesale
    Summary { problem_profile: ProblemProfile },
    Evaluation {
        evaluation_result: EvaluationResult,
        is_passing_evaluation: bool,
    },
    RefineAsk { message: Message },
    HmwGen { message: Message },
    CrossSiloAsk {
        message: Message,
        cross_silo_evaluation: CrossSiloEvaluation,
    },
    CrossSiloEvaluate {
        message: Message,
        cross_silo_evaluation: CrossSiloEvaluation,
    },
    FinalSummary { message: Message, report: String },
    FileExport { message: Message },
}

impl StageUpdate {
    /// The stage that produced this update
    pub fn stage(&self) -> Stage {
        match self {
            StageUpdate::Situation { .. } => Stage::Situation,
            StageUpdate::Reflection { .. } => Stage::Reflection,
            StageUpdate::Summary { .. } => Stage::Summary,
            StageUpdate::Evaluation { .. } => Stage::Evaluation,
            StageUpdate::RefineAsk { .. } => Stage::RefineAsk,
            StageUpdate::HmwGen { .. } => Stage::HmwGen,
            StageUpdate::CrossSiloAsk { .. } => Stage::CrossSiloAsk,
            StageUpdate::CrossSiloEvaluate { .. } => Stage::CrossSiloEvaluate,
            StageUpdate::FinalSummary { .. } => Stage::FinalSummary,
            StageUpdate::FileExport { .. } => Stage::FileExport,
        }
    }

    fn status(&self) -> &'static str {
        match self {
            StageUpdate::Situation { .. } => "Profile extracted.",
            StageUpdate::Reflection { .. } => "Asked for missing information.",
            StageUpdate::Summary { .. } => "Summary generated.",
            StageUpdate::Evaluation { .. } => "Problem statement evaluated.",
            StageUpdate::RefineAsk { .. } => "Asked a refinement question.",
            StageUpdate::HmwGen { .. } => "HMW question generated.",
            StageUpdate::CrossSiloAsk { .. } => "Asking cross-silo resources.",
            StageUpdate::CrossSiloEvaluate { .. } => "Cross-silo perspectives evaluated.",
            StageUpdate::FinalSummary { .. } => "Strategy summary generated.",
            StageUpdate::FileExport { .. } => "Exporting file.",
        }
    }

    /// Fold this update into `state`, recording the stage as `last_stage`
    pub fn apply(self, state: &mut ConversationState) {
        state.last_stage = Some(self.stage());
        state.node_status = self.status().to_string();

        match self {
            StageUpdate::Situation {
                problem_profile,
                job_title,
                reflection_result,
            } => {
                state.problem_profile = problem_profile;
                state.job_title = job_title;
                state.reflection_result = reflection_result;
            }
            StageUpdate::Reflection {
                message,
                problem_profile,
            } => {
                state.messages.push(message);
                state.problem_profile = problem_profile;
            }
            StageUpdate::Summary { problem_profile } => {
                state.problem_profile = problem_profile;
            }
            StageUpdate::Evaluation {
                evaluation_result,
                is_passing_evaluation,
            } => {
                state.evaluation_result = evaluation_result;
                state.is_passing_evaluation = is_passing_evaluation;
            }
            StageUpdate::RefineAsk { message }
            | StageUpdate::HmwGen { message }
            | StageUpdate::FileExport { message } => {
                state.messages.push(message);
            }
            StageUpdate::CrossSiloAsk {
                message,
                cross_silo_evaluation,
            }
            | StageUpdate::CrossSiloEvaluate {
                message,
                cross_silo_evaluation,
            } => {
                state.messages.push(message);
                state.cross_silo_evaluation = cross_silo_evaluation;
            }
            StageUpdate::FinalSummary { message, report } => {
                state.messages.push(message);
                state.report = Some(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_appends_messages() {
        let mut state = ConversationState {
            messages: vec![Message::user("hello")],
            ..Default::default()
        };
        StageUpdate::RefineAsk {
            message: Message::assistant("能具體說明指標嗎？"),
        }
        .apply(&mut state);

        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0], Message::user("hello"));
        assert_eq!(state.last_stage, Some(Stage::RefineAsk));
    }

    #[test]
    fn test_apply_leaves_unwritten_fields_alone() {
        let mut state = ConversationState {
            job_title: Some("行銷經理".to_string()),
            is_passing_evaluation: true,
            ..Default::default()
        };
        StageUpdate::Summary {
            problem_profile: ProblemProfile {
                pain_point: Some("a".to_string()),
                goal: Some("b".to_string()),
            },
        }
        .apply(&mut state);

        assert_eq!(state.job_title.as_deref(), Some("行銷經理"));
        assert!(state.is_passing_evaluation);
        assert_eq!(state.problem_profile.goal.as_deref(), Some("b"));
        assert_eq!(state.node_status, "Summary generated.");
    }

    #[test]
    fn test_final_summary_records_report() {
        let mut state = ConversationState::new();
        StageUpdate::FinalSummary {
            message: Message::assistant("報告"),
            report: "報告".to_string(),
        }
        .apply(&mut state);
        assert_eq!(state.report.as_deref(), Some("報告"));
        assert_eq!(state.last_stage, Some(Stage::FinalSummary));
    }

    #[test]
    fn test_every_variant_maps_to_distinct_stage() {
        let message = Message::assistant("x");
        let updates = [
            StageUpdate::Situation {
                problem_profile: ProblemProfile::default(),
                job_title: None,
                reflection_result: ReflectionResult::default(),
            },
            StageUpdate::Reflection {
                message: message.clone(),
                problem_profile: ProblemProfile::default(),
            },
            StageUpdate::Summary {
                problem_profile: ProblemProfile::default(),
            },
            StageUpdate::Evaluation {
                evaluation_result: EvaluationResult::default(),
                is_passing_evaluation: false,
            },
            StageUpdate::RefineAsk {
                message: message.clone(),
            },
            StageUpdate::HmwGen {
                message: message.clone(),
            },
            StageUpdate::CrossSiloAsk {
                message: message.clone(),
                cross_silo_evaluation: CrossSiloEvaluation::default(),
            },
            StageUpdate::CrossSiloEvaluate {
                message: message.clone(),
                cross_silo_evaluation: CrossSiloEvaluation::default(),
            },
            StageUpdate::FinalSummary {
                message: message.clone(),
                report: String::new(),
            },
            StageUpdate::FileExport { message },
        ];
        let stages: Vec<_> = updates.iter().map(StageUpdate::stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }
}
