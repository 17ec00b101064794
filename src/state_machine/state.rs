//! Conversation state types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Transcript
// ============================================================================

/// A tool invocation requested by the oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// One transcript entry. The transcript is append-only and chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    System {
        content: String,
    },
    ToolResult {
        tool_call_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
        /// Path of the generated artifact, when the tool produced one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact: Option<PathBuf>,
    },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: vec![],
        }
    }

    #[allow(dead_code)] // Constructor for API completeness
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Text content of the message
    pub fn content(&self) -> &str {
        match self {
            Message::User { content }
            | Message::Assistant { content, .. }
            | Message::System { content }
            | Message::ToolResult { content, .. } => content,
        }
    }

    /// Tool calls requested by an assistant message (empty for other roles)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User { .. })
    }
}

// ============================================================================
// Problem profile and derived results
// ============================================================================

/// Fields of the problem profile that the interview must capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    PainPoint,
    Goal,
}

impl ProfileField {
    pub const ALL: [ProfileField; 2] = [ProfileField::PainPoint, ProfileField::Goal];

    pub fn as_str(self) -> &'static str {
        match self {
            ProfileField::PainPoint => "pain_point",
            ProfileField::Goal => "goal",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user has said about their problem so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemProfile {
    pub pain_point: Option<String>,
    pub goal: Option<String>,
}

impl ProblemProfile {
    pub fn get(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::PainPoint => self.pain_point.as_deref(),
            ProfileField::Goal => self.goal.as_deref(),
        }
    }

    /// A field counts as captured once it holds non-blank text
    pub fn is_captured(&self, field: ProfileField) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn missing_fields(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|f| !self.is_captured(*f))
            .collect()
    }
}

/// Completeness check of the profile, recomputed whenever it changes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionResult {
    pub is_complete: bool,
    pub missing_fields: Vec<ProfileField>,
    #[serde(default)]
    pub advice: String,
}

impl ReflectionResult {
    pub fn assess(profile: &ProblemProfile) -> Self {
        let missing_fields = profile.missing_fields();
        let advice = if missing_fields.is_empty() {
            String::new()
        } else {
            let names: Vec<_> = missing_fields.iter().map(|f| f.as_str()).collect();
            format!("目前還缺少以下資訊：{}。請追問用戶。", names.join(", "))
        };
        Self {
            is_complete: missing_fields.is_empty(),
            missing_fields,
            advice,
        }
    }
}

/// Per-dimension rubric scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Specificity of the pain point (0-30)
    pub pain_point: u8,
    /// Clarity of goal and success metric (0-40)
    pub goal_metric: u8,
    /// Avoiding "the solution is the problem" framing (0-30)
    pub box_trap: u8,
}

/// Outcome of one evaluation stage execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub score: u8,
    pub critique: String,
    pub advice: String,
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub breakdown: ScoreBreakdown,
}

/// Cross-department sub-dialogue record
///
/// `result` grows across turns; an empty `result` means the sub-dialogue
/// has not started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSiloEvaluation {
    pub result: String,
    pub score: u8,
    #[serde(default)]
    pub advice: String,
}

impl CrossSiloEvaluation {
    pub fn is_started(&self) -> bool {
        !self.result.is_empty()
    }
}

// ============================================================================
// Stages
// ============================================================================

/// Named processing stages of the interview graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Situation,
    Reflection,
    Summary,
    Evaluation,
    RefineAsk,
    HmwGen,
    CrossSiloAsk,
    /// Older sessions recorded the combined node as `cross_silo`
    #[serde(alias = "cross_silo")]
    CrossSiloEvaluate,
    FinalSummary,
    FileExport,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Situation,
        Stage::Reflection,
        Stage::Summary,
        Stage::Evaluation,
        Stage::RefineAsk,
        Stage::HmwGen,
        Stage::CrossSiloAsk,
        Stage::CrossSiloEvaluate,
        Stage::FinalSummary,
        Stage::FileExport,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Situation => "situation",
            Stage::Reflection => "reflection",
            Stage::Summary => "summary",
            Stage::Evaluation => "evaluation",
            Stage::RefineAsk => "refine_ask",
            Stage::HmwGen => "hmw_gen",
            Stage::CrossSiloAsk => "cross_silo_ask",
            Stage::CrossSiloEvaluate => "cross_silo_evaluate",
            Stage::FinalSummary => "final_summary",
            Stage::FileExport => "file_export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// The full record threaded through every run
///
/// The caller owns it between turns; the engine only ever reads a
/// previous value and returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub problem_profile: ProblemProfile,
    pub reflection_result: ReflectionResult,
    pub evaluation_result: EvaluationResult,
    #[serde(alias = "cross_silo_output")]
    pub cross_silo_evaluation: CrossSiloEvaluation,
    pub job_title: Option<String>,
    pub is_passing_evaluation: bool,
    /// Most recently completed stage. The only field the resume router reads.
    #[serde(deserialize_with = "empty_stage_as_none")]
    pub last_stage: Option<Stage>,
    /// Free-form diagnostic, never used for control flow
    pub node_status: String,
    pub report: Option<String>,
}

/// Legacy sessions stored "no stage yet" as an empty string
fn empty_stage_as_none<'de, D>(deserializer: D) -> Result<Option<Stage>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(name) => Stage::deserialize(serde_json::Value::String(name.to_string()))
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl ConversationState {
    /// Fresh session state
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent user message as a one-element history, or empty
    pub fn latest_user_turn(&self) -> &[Message] {
        match self.messages.iter().rposition(Message::is_user) {
            Some(idx) => &self.messages[idx..=idx],
            None => &[],
        }
    }

    pub fn latest_user_text(&self) -> Option<&str> {
        self.latest_user_turn().first().map(Message::content)
    }

    /// Collection status summary for front-ends
    pub fn progress(&self) -> Progress {
        Progress {
            captured: ProfileField::ALL
                .into_iter()
                .filter(|f| self.problem_profile.is_captured(*f))
                .collect(),
            missing: self.problem_profile.missing_fields(),
            evaluation_passed: self.is_passing_evaluation,
            cross_silo_open: self.cross_silo_evaluation.is_started(),
            report_ready: self.report.is_some(),
        }
    }
}

/// Read-only progress view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub captured: Vec<ProfileField>,
    pub missing: Vec<ProfileField>,
    pub evaluation_passed: bool,
    pub cross_silo_open: bool,
    pub report_ready: bool,
}
