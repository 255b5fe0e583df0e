//! Read_file tool — ranged, optionally line-numbered file reads.

use std::sync::Arc;

use async_trait::async_trait;
use patchloom_config::ToolDescription;
use patchloom_core::error::ToolError;
use patchloom_core::output::OutputSink;
use patchloom_core::tool::Tool;
use serde::Deserialize;

pub struct ReadFileTool {
    description: String,
}

impl ReadFileTool {
    pub fn new(settings: &ToolDescription) -> Self {
        Self {
            description: settings.description.clone(),
        }
    }
}

#[derive(Deserialize)]
struct ReadFileArgs {
    file_path: String,
    range: String,
    line_numbers: bool,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file to read. Path should start with `./`"
                },
                "range": {
                    "type": "string",
                    "description": "Range to read from the file, in the format 'start-end', or 'full' to read the entire file."
                },
                "line_numbers": {
                    "type": "boolean",
                    "description": "If true, the output will include line numbers."
                }
            },
            "required": ["file_path", "range", "line_numbers"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: &str,
        _sink: Option<&Arc<dyn OutputSink>>,
    ) -> Result<String, ToolError> {
        let args: ReadFileArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        if !args.file_path.starts_with("./") {
            return Ok("Error: file_path must be a string starting with './'.".into());
        }

        let content = match tokio::fs::read_to_string(&args.file_path).await {
            Ok(content) => content,
            Err(e) => return Ok(format!("Error reading file: {e}")),
        };

        let mut lines: Vec<String> = content.split('\n').map(String::from).collect();
        if args.line_numbers {
            let digits = lines.len().to_string().len();
            lines = lines
                .iter()
                .enumerate()
                .map(|(i, line)| format!("{:>digits$}: {line}", i + 1))
                .collect();
        }

        if args.range.contains('-') {
            let parts: Vec<&str> = args.range.splitn(2, '-').collect();
            let start = parts[0].parse::<usize>().ok();
            let end = parts[1].parse::<usize>().ok();
            match (start, end) {
                (Some(start), Some(end))
                    if start > 0 && end >= start && end <= lines.len() =>
                {
                    return Ok(lines[start - 1..end].join("\n"));
                }
                _ => {
                    return Ok(format!(
                        "Error: Invalid range specified. The file has {} lines. Available range is 1-{}.",
                        lines.len(),
                        lines.len()
                    ));
                }
            }
        }

        Ok(lines.join("\n"))
    }
}
