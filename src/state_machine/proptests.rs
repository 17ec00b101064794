//! Property-based tests for the stage graph
//!
//! These tests drive the pure routing functions over arbitrary persisted
//! states and arbitrary stage outcomes.

use super::profile::{merge_job_title, MergePolicy, ProfilePatch};
use super::state::*;
use super::transition::*;
use super::update::StageUpdate;
use proptest::prelude::*;
use serde_json::json;
use std::collections::HashSet;

// ============================================================================
// Test Helpers
// ============================================================================

/// What each stage would produce if it ran during a simulated run
#[derive(Debug, Clone)]
struct Outcomes {
    profile_complete: bool,
    evaluation_score: u8,
    cross_silo_score: u8,
    wants_tools: bool,
}

fn apply_outcome(stage: Stage, state: &mut ConversationState, outcomes: &Outcomes, gate: QualityGate) {
    match stage {
        Stage::Situation => {
            state.reflection_result.is_complete = outcomes.profile_complete;
        }
        Stage::Evaluation => {
            state.evaluation_result.score = outcomes.evaluation_score;
            state.is_passing_evaluation = gate.passes(outcomes.evaluation_score);
        }
        Stage::CrossSiloAsk => {
            state.cross_silo_evaluation = CrossSiloEvaluation {
                result: "AI Question: ...".to_string(),
                score: 0,
                advice: String::new(),
            };
        }
        Stage::CrossSiloEvaluate => {
            state.cross_silo_evaluation.result.push_str("\nUser Answer: ...");
            state.cross_silo_evaluation.score = outcomes.cross_silo_score;
        }
        Stage::FileExport => {
            let tool_calls = if outcomes.wants_tools {
                vec![ToolCall::new("call_1", "generate_report", json!({}))]
            } else {
                vec![]
            };
            state.messages.push(Message::Assistant {
                content: String::new(),
                tool_calls,
            });
        }
        _ => state.messages.push(Message::assistant(stage.name())),
    }
}

/// Walk the graph the way the run loop does, without any oracle
fn simulate_run(start: &ConversationState, outcomes: &Outcomes, gate: QualityGate) -> Vec<Stage> {
    let mut state = start.clone();
    state.messages.push(Message::user("input"));
    let mut stage = resume_stage(start, gate);
    let mut visited = Vec::new();

    // Generous cap so a cycle shows up as a failed assertion, not a hang
    while visited.len() <= Stage::ALL.len() * 2 {
        let entered_after = state.last_stage;
        apply_outcome(stage, &mut state, outcomes, gate);
        state.last_stage = Some(stage);
        visited.push(stage);

        match transition(stage, entered_after, &state, gate) {
            Next::Stage(next) => stage = next,
            Next::ExecuteTools | Next::Suspend => break,
        }
    }
    visited
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_stage() -> impl Strategy<Value = Stage> {
    proptest::sample::select(Stage::ALL.to_vec())
}

fn arb_text() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("   ".to_string())),
        "[a-z ]{1,20}".prop_map(Some),
    ]
}

fn arb_profile() -> impl Strategy<Value = ProblemProfile> {
    (arb_text(), arb_text()).prop_map(|(pain_point, goal)| ProblemProfile { pain_point, goal })
}

fn arb_patch() -> impl Strategy<Value = ProfilePatch> {
    (arb_text(), arb_text()).prop_map(|(pain_point, goal)| ProfilePatch { pain_point, goal })
}

fn arb_policy() -> impl Strategy<Value = MergePolicy> {
    prop_oneof![Just(MergePolicy::Replace), Just(MergePolicy::append())]
}

fn arb_cross_silo() -> impl Strategy<Value = CrossSiloEvaluation> {
    (
        prop_oneof![Just(String::new()), "AI Question: [a-z ]{1,20}"],
        0u8..=100,
    )
        .prop_map(|(result, score)| CrossSiloEvaluation {
            result,
            score,
            advice: String::new(),
        })
}

fn arb_state() -> impl Strategy<Value = ConversationState> {
    (
        arb_profile(),
        arb_cross_silo(),
        proptest::option::of(arb_stage()),
        any::<bool>(),
        arb_text(),
    )
        .prop_map(|(profile, cross_silo, last_stage, passing, job_title)| {
            ConversationState {
                reflection_result: ReflectionResult::assess(&profile),
                problem_profile: profile,
                cross_silo_evaluation: cross_silo,
                last_stage,
                is_passing_evaluation: passing,
                job_title,
                ..Default::default()
            }
        })
}

fn arb_outcomes() -> impl Strategy<Value = Outcomes> {
    (any::<bool>(), 0u8..=100, 0u8..=100, any::<bool>()).prop_map(
        |(profile_complete, evaluation_score, cross_silo_score, wants_tools)| Outcomes {
            profile_complete,
            evaluation_score,
            cross_silo_score,
            wants_tools,
        },
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Merging never loses a captured field
    #[test]
    fn prop_merge_is_non_destructive(
        prior in arb_profile(),
        patch in arb_patch(),
        policy in arb_policy()
    ) {
        let merged = prior.merged(&patch, &policy);
        for field in ProfileField::ALL {
            if prior.is_captured(field) {
                prop_assert!(merged.is_captured(field), "{field} lost: {prior:?} -> {merged:?}");
            }
        }
    }

    // Replace with a blank patch is the identity
    #[test]
    fn prop_blank_patch_is_identity(prior in arb_profile(), policy in arb_policy()) {
        let blank = ProfilePatch {
            pain_point: Some("  ".to_string()),
            goal: None,
        };
        prop_assert_eq!(prior.merged(&blank, &policy), prior);
    }

    // A recorded job title survives any uncorrected extraction
    #[test]
    fn prop_job_title_sticks(prior in "[a-z]{1,10}", extracted in arb_text()) {
        let merged = merge_job_title(Some(&prior), extracted.as_deref(), false);
        prop_assert_eq!(merged.as_deref(), Some(prior.as_str()));
    }

    #[test]
    fn prop_gate_is_inclusive_threshold(threshold in 1u8..=100, score in 0u8..=100) {
        let gate = QualityGate::new(threshold);
        prop_assert_eq!(gate.passes(score), score >= threshold);
    }

    // Routing depends only on persisted state, so a stored and reloaded
    // session resumes at the same stage
    #[test]
    fn prop_resume_survives_persistence(state in arb_state()) {
        let gate = QualityGate::default();
        let json = serde_json::to_string(&state).unwrap();
        let reloaded: ConversationState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(resume_stage(&state, gate), resume_stage(&reloaded, gate));
    }

    // Every run halts, and no stage executes twice within one run
    #[test]
    fn prop_runs_terminate(state in arb_state(), outcomes in arb_outcomes()) {
        let gate = QualityGate::default();
        let visited = simulate_run(&state, &outcomes, gate);

        prop_assert!(visited.len() <= Stage::ALL.len(), "run too long: {visited:?}");
        let unique: HashSet<_> = visited.iter().collect();
        prop_assert_eq!(unique.len(), visited.len(), "stage repeated: {:?}", visited);
    }

    // The resume router only ever picks one of its three entry stages
    #[test]
    fn prop_resume_entry_points(state in arb_state()) {
        let entry = resume_stage(&state, QualityGate::default());
        prop_assert!(matches!(
            entry,
            Stage::Situation | Stage::CrossSiloEvaluate | Stage::FileExport
        ));
    }

    // Applying any message-bearing update keeps the earlier transcript intact
    #[test]
    fn prop_transcript_is_append_only(
        prior in proptest::collection::vec("[a-z]{1,8}", 0..6),
        reply in "[a-z]{1,8}"
    ) {
        let mut state = ConversationState {
            messages: prior.iter().map(Message::user).collect(),
            ..Default::default()
        };
        let before = state.messages.clone();
        StageUpdate::HmwGen { message: Message::assistant(reply) }.apply(&mut state);

        prop_assert_eq!(&state.messages[..before.len()], &before[..]);
        prop_assert_eq!(state.messages.len(), before.len() + 1);
    }
}

#[test]
fn test_happy_path_first_turn_walk() {
    let outcomes = Outcomes {
        profile_complete: true,
        evaluation_score: 80,
        cross_silo_score: 0,
        wants_tools: false,
    };
    let visited = simulate_run(&ConversationState::new(), &outcomes, QualityGate::default());
    assert_eq!(
        visited,
        vec![
            Stage::Situation,
            Stage::Summary,
            Stage::Evaluation,
            Stage::HmwGen,
            Stage::CrossSiloAsk
        ]
    );
}

#[test]
fn test_cross_silo_pass_walk_reaches_export() {
    let state = ConversationState {
        cross_silo_evaluation: CrossSiloEvaluation {
            result: "AI Question: ...".to_string(),
            score: 0,
            advice: String::new(),
        },
        last_stage: Some(Stage::CrossSiloAsk),
        ..Default::default()
    };
    let outcomes = Outcomes {
        profile_complete: true,
        evaluation_score: 80,
        cross_silo_score: 90,
        wants_tools: true,
    };
    let visited = simulate_run(&state, &outcomes, QualityGate::default());
    assert_eq!(
        visited,
        vec![
            Stage::CrossSiloEvaluate,
            Stage::FinalSummary,
            Stage::FileExport
        ]
    );
}
