//! Structured reply records and their JSON schemas
//!
//! Schemas follow the strict JSON-schema subset providers accept: every
//! property is required, optional values are nullable, no extra keys.

use super::OutputSchema;
use crate::state_machine::{EvaluationResult, ProfilePatch, ScoreBreakdown};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

/// A record the oracle can be asked to produce
pub trait StructuredOutput: DeserializeOwned + Send {
    const NAME: &'static str;

    fn schema() -> Value;

    fn output_schema() -> OutputSchema {
        OutputSchema {
            name: Self::NAME,
            schema: Self::schema(),
        }
    }
}

fn clamp_score(raw: i64, max: u8) -> u8 {
    u8::try_from(raw.clamp(0, i64::from(max))).unwrap_or(max)
}

// ============================================================================
// Profile extraction
// ============================================================================

/// Profile values pulled from a user turn
///
/// Every key must be present; an unknown value is an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemExtraction {
    #[serde(deserialize_with = "Option::deserialize")]
    pub job_title: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub pain_point: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub goal: Option<String>,
    /// The user explicitly corrected a previously stated job title
    pub job_title_corrected: bool,
}

impl ProblemExtraction {
    pub fn patch(&self) -> ProfilePatch {
        ProfilePatch {
            pain_point: self.pain_point.clone(),
            goal: self.goal.clone(),
        }
    }
}

impl StructuredOutput for ProblemExtraction {
    const NAME: &'static str = "problem_extraction";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "job_title": {
                    "type": ["string", "null"],
                    "description": "用戶的職位，若無則留空"
                },
                "pain_point": {
                    "type": ["string", "null"],
                    "description": "用戶提到的問題痛點，若無則留空"
                },
                "goal": {
                    "type": ["string", "null"],
                    "description": "用戶想達成的目標，若無則留空"
                },
                "job_title_corrected": {
                    "type": "boolean",
                    "description": "用戶是否明確更正了先前提供的職位"
                }
            },
            "required": ["job_title", "pain_point", "goal", "job_title_corrected"],
            "additionalProperties": false
        })
    }
}

// ============================================================================
// Problem evaluation
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationDimensions {
    pub pain_point_score: i64,
    pub goal_metric_score: i64,
    pub box_trap_score: i64,
}

/// Rubric scoring of the problem statement
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemEvaluation {
    pub score: i64,
    pub dimensions: EvaluationDimensions,
    /// Ignored: the quality gate alone decides pass/fail
    pub is_passing: bool,
    pub critique: String,
    pub advice: String,
    pub missing_fields: Vec<String>,
}

impl ProblemEvaluation {
    /// Clamp every score into its rubric range
    pub fn into_result(self) -> EvaluationResult {
        EvaluationResult {
            score: clamp_score(self.score, 100),
            critique: self.critique,
            advice: self.advice,
            missing_fields: self.missing_fields,
            breakdown: ScoreBreakdown {
                pain_point: clamp_score(self.dimensions.pain_point_score, 30),
                goal_metric: clamp_score(self.dimensions.goal_metric_score, 40),
                box_trap: clamp_score(self.dimensions.box_trap_score, 30),
            },
        }
    }
}

impl StructuredOutput for ProblemEvaluation {
    const NAME: &'static str = "problem_evaluation";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "score": {"type": "integer", "description": "總分 (0-100)"},
                "dimensions": {
                    "type": "object",
                    "properties": {
                        "pain_point_score": {"type": "integer", "description": "痛點描述的具體程度 (0-30)"},
                        "goal_metric_score": {"type": "integer", "description": "目標與指標的清晰度 (0-40)"},
                        "box_trap_score": {"type": "integer", "description": "是否跳脫『手段當目的』的陷阱 (0-30)"}
                    },
                    "required": ["pain_point_score", "goal_metric_score", "box_trap_score"],
                    "additionalProperties": false
                },
                "is_passing": {"type": "boolean", "description": "是否通過門檻"},
                "critique": {"type": "string", "description": "犀利的評語"},
                "advice": {"type": "string", "description": "給用戶的引導建議"},
                "missing_fields": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "缺少的關鍵資訊欄位"
                }
            },
            "required": ["score", "dimensions", "is_passing", "critique", "advice", "missing_fields"],
            "additionalProperties": false
        })
    }
}

// ============================================================================
// Cross-department judgement
// ============================================================================

/// Completeness score of the cross-department discussion
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrossSiloJudgement {
    pub score: i64,
    pub advice: String,
}

impl CrossSiloJudgement {
    pub fn clamped_score(&self) -> u8 {
        clamp_score(self.score, 100)
    }
}

impl StructuredOutput for CrossSiloJudgement {
    const NAME: &'static str = "cross_silo_judgement";

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "score": {"type": "integer", "description": "跨部門討論完整度分數 (0-100)"},
                "advice": {"type": "string", "description": "當前總結、建議，或引導主管深入思考的下一個問題"}
            },
            "required": ["score", "advice"],
            "additionalProperties": false
        })
    }
}
