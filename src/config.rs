//! Engine and server configuration from the environment

use crate::oracle::RetryPolicy;
use crate::state_machine::{MergePolicy, QualityGate, DEFAULT_PASS_THRESHOLD};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_ORACLE_RETRIES: u32 = 3;
const DEFAULT_EXPORT_DIR: &str = "./reports";
const DEFAULT_PORT: u16 = 8000;

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `name`, falling back to `default` with a warning on bad input
fn parsed<T: FromStr>(name: &str, default: T) -> T {
    match non_empty(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "Ignoring unparseable setting");
            default
        }),
    }
}

/// Settings for the turn engine and its oracle
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Shared by the evaluation gate, the cross-silo gate and the resume router
    pub gate: QualityGate,
    /// How `situation` folds extractions into the profile
    pub merge_policy: MergePolicy,
    pub oracle_timeout: Duration,
    /// Total attempts per oracle call
    pub oracle_retries: u32,
    pub export_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gate: QualityGate::default(),
            merge_policy: MergePolicy::Replace,
            oracle_timeout: Duration::from_secs(DEFAULT_ORACLE_TIMEOUT_SECS),
            oracle_retries: DEFAULT_ORACLE_RETRIES,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        // Parse wide so that out-of-range thresholds clamp rather than fail
        let threshold: u32 = parsed("COACH_PASS_THRESHOLD", u32::from(DEFAULT_PASS_THRESHOLD));
        let gate = QualityGate::new(u8::try_from(threshold.min(100)).unwrap_or(100));

        Self {
            gate,
            merge_policy: parsed("COACH_PROFILE_MERGE", MergePolicy::Replace),
            oracle_timeout: Duration::from_secs(parsed(
                "COACH_ORACLE_TIMEOUT_SECS",
                DEFAULT_ORACLE_TIMEOUT_SECS,
            )),
            oracle_retries: parsed("COACH_ORACLE_RETRIES", DEFAULT_ORACLE_RETRIES).max(1),
            export_dir: non_empty("COACH_EXPORT_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR), PathBuf::from),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.oracle_retries,
            timeout: self.oracle_timeout,
            ..RetryPolicy::default()
        }
    }
}

/// Settings for the HTTP host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let db_path = non_empty("COACH_DB_PATH").map_or_else(
            || {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(format!("{home}/.problem-coach/sessions.db"))
            },
            PathBuf::from,
        );

        Self {
            db_path,
            port: parsed("COACH_PORT", DEFAULT_PORT),
        }
    }
}
