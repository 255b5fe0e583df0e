//! Grep tool — content search via ripgrep, with an output cap.

use std::sync::Arc;

use async_trait::async_trait;
use patchloom_config::GrepSettings;
use patchloom_core::error::ToolError;
use patchloom_core::output::OutputSink;
use patchloom_core::tool::Tool;
use serde::Deserialize;

use crate::command;

pub struct GrepTool {
    description: String,
    line_limit: usize,
}

impl GrepTool {
    pub fn new(settings: &GrepSettings) -> Self {
        Self {
            description: settings.description.clone(),
            line_limit: settings.line_limit,
        }
    }

    /// Cap output at the configured line limit, reporting the elided count.
    fn truncate(&self, output: &str) -> String {
        let lines: Vec<&str> = output.split('\n').collect();
        if lines.len() <= self.line_limit {
            return output.to_string();
        }
        format!(
            "{}\n... and {} more lines",
            lines[..self.line_limit].join("\n"),
            lines.len() - self.line_limit
        )
    }
}

#[derive(Deserialize)]
struct GrepArgs {
    pattern: String,
}

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regular expression pattern"
                }
            },
            "required": ["pattern"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: &str,
        _sink: Option<&Arc<dyn OutputSink>>,
    ) -> Result<String, ToolError> {
        let args: GrepArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let output = match command::run("rg", &["--line-number", "--", &args.pattern]).await {
            Ok(output) => output,
            Err(ToolError::CommandFailed { stderr, .. }) => {
                return Ok(format!("Error executing grep command: {stderr}"));
            }
            Err(e) => return Err(e),
        };

        if output.is_empty() {
            return Ok("No files found matching the pattern.".into());
        }
        Ok(self.truncate(&output))
    }
}
