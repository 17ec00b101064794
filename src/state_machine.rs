//! Interview state and stage graph
//!
//! Everything here is pure: state types, merge rules, stage updates and the
//! routing functions. Oracle calls and tool side effects live in `stages`
//! and `runtime`.

pub mod profile;
pub mod state;
pub mod transition;
pub mod update;

#[cfg(test)]
mod proptests;

pub use profile::{merge_job_title, MergePolicy, ProfilePatch};
pub use state::{
    ConversationState, CrossSiloEvaluation, EvaluationResult, Message, ProblemProfile,
    ProfileField, Progress, ReflectionResult, ScoreBreakdown, Stage, ToolCall,
};
pub use transition::{
    is_suspend_point, resume_stage, transition, Next, QualityGate, DEFAULT_PASS_THRESHOLD,
};
pub use update::StageUpdate;
