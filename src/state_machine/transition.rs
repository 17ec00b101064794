//! Stage graph topology
//!
//! Pure functions of state: the resume router picks the entry stage for a
//! new run, and `transition` picks what follows a completed stage. Neither
//! reads a clock, randomness or anything outside its arguments.

use super::state::{ConversationState, Stage};

/// Default pass mark shared by the evaluation and cross-silo gates
pub const DEFAULT_PASS_THRESHOLD: u8 = 65;

/// Score-threshold check separating "proceed" from "ask for more"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityGate {
    threshold: u8,
}

impl QualityGate {
    /// Threshold is clamped to `1..=100`: a perfect score always passes,
    /// and the zero score of a freshly opened cross-silo round never does.
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.clamp(1, 100),
        }
    }

    pub fn threshold(self) -> u8 {
        self.threshold
    }

    /// Inclusive: a score equal to the threshold passes
    pub fn passes(self, score: u8) -> bool {
        score >= self.threshold
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_THRESHOLD)
    }
}

/// What the run loop does after a stage completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Advance to another stage within this run
    Stage(Stage),
    /// Run the tool calls on the last assistant message, then halt
    ExecuteTools,
    /// Halt and hand the state back, awaiting the next user input
    Suspend,
}

/// Stages that always halt the run after executing: each one asks the
/// user a question and needs the reply.
pub fn is_suspend_point(stage: Stage) -> bool {
    matches!(
        stage,
        Stage::Reflection | Stage::RefineAsk | Stage::CrossSiloAsk
    )
}

/// Pick the entry stage for a new run from persisted state alone.
///
/// Evaluated before the new input is appended to the transcript.
pub fn resume_stage(state: &ConversationState, gate: QualityGate) -> Stage {
    if state.last_stage == Some(Stage::FileExport) {
        // A tool confirmation round is pending
        return Stage::FileExport;
    }

    let cross_silo = &state.cross_silo_evaluation;
    if cross_silo.is_started() && !gate.passes(cross_silo.score) {
        return Stage::CrossSiloEvaluate;
    }

    Stage::Situation
}

/// Pick what follows `completed`.
///
/// `entered_after` is the `last_stage` value as it was before `completed`
/// ran; `state` already has the stage's update applied.
pub fn transition(
    completed: Stage,
    entered_after: Option<Stage>,
    state: &ConversationState,
    gate: QualityGate,
) -> Next {
    match completed {
        Stage::Situation => {
            // An answer to a refinement question goes straight back to scoring
            if entered_after == Some(Stage::RefineAsk) || state.reflection_result.is_complete {
                Next::Stage(Stage::Summary)
            } else {
                Next::Stage(Stage::Reflection)
            }
        }
        Stage::Summary => Next::Stage(Stage::Evaluation),
        Stage::Evaluation => {
            if state.is_passing_evaluation {
                Next::Stage(Stage::HmwGen)
            } else {
                Next::Stage(Stage::RefineAsk)
            }
        }
        Stage::HmwGen => Next::Stage(Stage::CrossSiloAsk),
        Stage::CrossSiloEvaluate => {
            if gate.passes(state.cross_silo_evaluation.score) {
                Next::Stage(Stage::FinalSummary)
            } else {
                Next::Suspend
            }
        }
        Stage::FinalSummary => Next::Stage(Stage::FileExport),
        Stage::FileExport => {
            let wants_tools = state
                .messages
                .last()
                .is_some_and(|m| !m.tool_calls().is_empty());
            if wants_tools {
                Next::ExecuteTools
            } else {
                Next::Suspend
            }
        }
        Stage::Reflection | Stage::RefineAsk | Stage::CrossSiloAsk => Next::Suspend,
    }
}
