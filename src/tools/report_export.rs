//! Report export tool - writes the strategy report as a Markdown file

use super::{Tool, ToolContext, ToolOutput, FAILURE_MARKER, SUCCESS_MARKER};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::path::PathBuf;

const DEFAULT_FILENAME: &str = "strategy_report";

pub struct ReportExportTool;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportSection {
    pub header: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportInput {
    pub filename: String,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<ReportSection>,
}

impl ReportInput {
    fn render(&self) -> String {
        let mut out = format!("# {}\n", self.title.trim());
        for section in &self.sections {
            let _ = write!(out, "\n## {}\n\n", section.header.trim());
            for bullet in &section.bullets {
                let _ = writeln!(out, "- {}", bullet.trim());
            }
        }
        out
    }
}

/// Restrict a file stem to `[A-Za-z0-9_-]`
fn sanitize_filename(raw: &str) -> String {
    let stem = raw.trim().trim_end_matches(".md");
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl Tool for ReportExportTool {
    fn name(&self) -> &'static str {
        "generate_report"
    }

    fn description(&self) -> String {
        "用來生成策略報告檔案的工具。當使用者同意或要求下載、匯出報告時，請呼叫此工具。".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["filename", "title", "sections"],
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "輸出的檔案名稱，使用英文，不需要包含副檔名"
                },
                "title": {
                    "type": "string",
                    "description": "報告的主標題"
                },
                "sections": {
                    "type": "array",
                    "description": "報告的段落，依序排列",
                    "items": {
                        "type": "object",
                        "required": ["header", "bullets"],
                        "properties": {
                            "header": {"type": "string", "description": "段落標題"},
                            "bullets": {
                                "type": "array",
                                "items": {"type": "string"},
                                "description": "段落的重點列表"
                            }
                        }
                    }
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: ReportInput = match serde_json::from_value(input) {
            Ok(i) => i,
            Err(e) => return ToolOutput::error(format!("{FAILURE_MARKER}Invalid input: {e}")),
        };

        let path: PathBuf = ctx
            .export_dir
            .join(format!("{}.md", sanitize_filename(&input.filename)));

        if let Err(e) = tokio::fs::create_dir_all(&ctx.export_dir).await {
            return ToolOutput::error(format!("{FAILURE_MARKER}{e}"));
        }
        if let Err(e) = tokio::fs::write(&path, input.render()).await {
            return ToolOutput::error(format!("{FAILURE_MARKER}{e}"));
        }

        tracing::info!(
            session_id = %ctx.session_id,
            path = %path.display(),
            sections = input.sections.len(),
            "Report exported"
        );
        ToolOutput::success(format!("{SUCCESS_MARKER}{}", path.display()))
    }
}
