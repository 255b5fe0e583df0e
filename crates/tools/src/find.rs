//! Find tool — filename search via fd.

use std::sync::Arc;

use async_trait::async_trait;
use patchloom_config::ToolDescription;
use patchloom_core::error::ToolError;
use patchloom_core::output::OutputSink;
use patchloom_core::tool::Tool;
use serde::Deserialize;

use crate::command;

pub struct FindTool {
    description: String,
}

impl FindTool {
    pub fn new(settings: &ToolDescription) -> Self {
        Self {
            description: settings.description.clone(),
        }
    }
}

#[derive(Deserialize)]
struct FindArgs {
    pattern: String,
}

#[async_trait]
impl Tool for FindTool {
    fn name(&self) -> &str {
        "find"
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
                    "description": "Regular expression pattern to search for in the file names."
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
        let args: FindArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let output = match command::run(
            "fd",
            &[
                "--type",
                "f",
                "--color=never",
                "--hidden",
                "--exclude=.git",
                "--",
                &args.pattern,
            ],
        )
        .await
        {
            Ok(output) => output,
            Err(ToolError::CommandFailed { stderr, .. }) => {
                return Ok(format!("Error executing find command: {stderr}"));
            }
            Err(e) => return Err(e),
        };

        if output.is_empty() {
            return Ok("No files found matching the pattern.".into());
        }
        Ok(output)
    }
}
