//! Tools the oracle may invoke from the export stage

mod report_export;

pub use report_export::{ReportExportTool, ReportInput, ReportSection};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix of a successful export result; the artifact path follows it
pub const SUCCESS_MARKER: &str = "成功生成檔案：";
/// Prefix of a failed export result; the reason follows it
pub const FAILURE_MARKER: &str = "生成失敗：";

/// Extract the artifact path from a success marker
pub fn parse_artifact(output: &str) -> Option<PathBuf> {
    output
        .trim()
        .strip_prefix(SUCCESS_MARKER)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
        }
    }
}

/// All context needed for a tool invocation.
///
/// Created fresh for each call. Tools are stateless and derive everything
/// from this struct.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Session the call belongs to
    pub session_id: String,
    /// Directory artifacts are written into
    pub export_dir: PathBuf,
}

impl ToolContext {
    pub fn new(session_id: impl Into<String>, export_dir: impl AsRef<Path>) -> Self {
        Self {
            session_id: session_id.into(),
            export_dir: export_dir.as_ref().to_path_buf(),
        }
    }
}

/// Trait for tools that can be executed on the oracle's request
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Tool description for LLM
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Failures are reported in the output, never as a panic or error
    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput;
}

/// Collection of available tools
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the report export tool
    pub fn standard() -> Self {
        Self {
            tools: vec![Arc::new(ReportExportTool)],
        }
    }

    /// Get all tool definitions for LLM
    pub fn definitions(&self) -> Vec<crate::llm::ToolDefinition> {
        self.tools
            .iter()
            .map(|t| crate::llm::ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name; `None` when no tool has that name
    pub async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput> {
        for tool in &self.tools {
            if tool.name() == name {
                return Some(tool.run(input, ctx).await);
            }
        }
        None
    }
}
