//! Profile merge rules
//!
//! Stages never write a profile field straight from an extraction. They
//! merge against the prior value under a declared policy, and an absent or
//! blank extraction always keeps what was already captured.

use super::state::{ProblemProfile, ProfileField};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DEFAULT_APPEND_SEPARATOR: &str = "；";

/// How a stage folds newly extracted text into a profile field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MergePolicy {
    /// The extraction is a consolidated restatement and supersedes the prior text
    #[default]
    Replace,
    /// The extraction is additional detail appended after the prior text
    Append { separator: String },
}

impl MergePolicy {
    pub fn append() -> Self {
        MergePolicy::Append {
            separator: DEFAULT_APPEND_SEPARATOR.to_string(),
        }
    }

    /// Merge one field. Never turns a captured value back into `None`.
    pub fn merge_field(&self, prior: Option<&str>, extracted: Option<&str>) -> Option<String> {
        let Some(extracted) = extracted.map(str::trim).filter(|s| !s.is_empty()) else {
            return prior.map(ToString::to_string);
        };

        match self {
            MergePolicy::Replace => Some(extracted.to_string()),
            MergePolicy::Append { separator } => match prior.filter(|p| !p.trim().is_empty()) {
                None => Some(extracted.to_string()),
                Some(prior) if prior.contains(extracted) => Some(prior.to_string()),
                Some(prior) => Some(format!("{prior}{separator}{extracted}")),
            },
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(MergePolicy::Replace),
            "append" => Ok(MergePolicy::append()),
            other => Err(format!("unknown merge policy: {other}")),
        }
    }
}

/// Sparse profile values pulled out of a user turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub pain_point: Option<String>,
    pub goal: Option<String>,
}

impl ProfilePatch {
    fn get(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::PainPoint => self.pain_point.as_deref(),
            ProfileField::Goal => self.goal.as_deref(),
        }
    }
}

impl ProblemProfile {
    /// Apply a patch field by field under `policy`
    #[must_use]
    pub fn merged(&self, patch: &ProfilePatch, policy: &MergePolicy) -> ProblemProfile {
        let merge = |field| policy.merge_field(self.get(field), patch.get(field));
        ProblemProfile {
            pain_point: merge(ProfileField::PainPoint),
            goal: merge(ProfileField::Goal),
        }
    }
}

/// Decide the job title after an extraction
///
/// The first non-blank title sticks; later ones only win when the
/// extraction marks them as an explicit correction.
pub fn merge_job_title(
    prior: Option<&str>,
    extracted: Option<&str>,
    corrected: bool,
) -> Option<String> {
    let extracted = extracted.map(str::trim).filter(|s| !s.is_empty());
    match (prior.filter(|p| !p.trim().is_empty()), extracted) {
        (None, Some(new)) => Some(new.to_string()),
        (Some(_), Some(new)) if corrected => Some(new.to_string()),
        (prior, _) => prior.map(ToString::to_string),
    }
}
