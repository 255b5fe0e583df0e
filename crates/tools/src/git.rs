//! Git tools — status, add, commit, diff, log.
//!
//! Each runs the git binary, captures stdout, and fails loudly on non-zero
//! exit; the dispatch layer converts failures into data for the model.

use std::sync::Arc;

use async_trait::async_trait;
use patchloom_config::ToolDescription;
use patchloom_core::agent::ModelParams;
use patchloom_core::error::ToolError;
use patchloom_core::output::{NullSink, OutputSink, Style};
use patchloom_core::provider::{CompletionProvider, CompletionRequest};
use patchloom_core::stream::await_completion;
use patchloom_core::tool::Tool;
use patchloom_core::turn::Turn;
use serde::Deserialize;
use tracing::info;

use crate::command;

// ── git_status ────────────────────────────────────────────────────────────

pub struct GitStatusTool {
    description: String,
}

impl GitStatusTool {
    pub fn new(settings: &ToolDescription) -> Self {
        Self {
            description: settings.description.clone(),
        }
    }
}

#[async_trait]
impl Tool for GitStatusTool {
    fn name(&self) -> &str {
        "git_status"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": [],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _arguments: &str,
        _sink: Option<&Arc<dyn OutputSink>>,
    ) -> Result<String, ToolError> {
        command::run("git", &["status", "--porcelain"]).await
    }
}

// ── git_add ───────────────────────────────────────────────────────────────

pub struct GitAddTool {
    description: String,
}

impl GitAddTool {
    pub fn new(settings: &ToolDescription) -> Self {
        Self {
            description: settings.description.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GitAddArgs {
    files: Vec<String>,
}

#[async_trait]
impl Tool for GitAddTool {
    fn name(&self) -> &str {
        "git_add"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "files": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "File paths to add to the git staging area."
                }
            },
            "required": ["files"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: &str,
        _sink: Option<&Arc<dyn OutputSink>>,
    ) -> Result<String, ToolError> {
        let args: GitAddArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if args.files.is_empty() {
            return Err(ToolError::InvalidArguments(
                "files must be a non-empty array of paths".into(),
            ));
        }

        let mut argv = vec!["add", "--"];
        argv.extend(args.files.iter().map(String::as_str));
        command::run("git", &argv).await
    }
}

// ── git_commit ────────────────────────────────────────────────────────────

pub struct GitCommitTool {
    description: String,
    model: ModelParams,
    provider: Arc<dyn CompletionProvider>,
}

impl GitCommitTool {
    pub fn new(
        settings: &ToolDescription,
        model: ModelParams,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            description: settings.description.clone(),
            model,
            provider,
        }
    }

    /// Ask the provider for a one-line message describing the staged diff.
    async fn generate_message(&self) -> Result<String, ToolError> {
        let diff = command::run("git", &["diff", "--cached"]).await?;

        let request = CompletionRequest {
            previous_turn_id: None,
            turns: vec![Turn::user(format!(
                "Write a commit message for the following staged changes:\n\n{diff}"
            ))],
            instructions: "You write git commit messages: a concise imperative subject line \
                           under 72 characters, nothing else."
                .into(),
            tools: vec![],
            model: self.model.clone(),
        };

        let events = self
            .provider
            .stream(request)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "git_commit".into(),
                reason: e.to_string(),
            })?;
        let null_sink: Arc<dyn OutputSink> = Arc::new(NullSink);
        let turn = await_completion(events, &null_sink, Style::Plain, Style::Plain)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "git_commit".into(),
                reason: e.to_string(),
            })?;

        let message = turn
            .output_text()
            .lines()
            .find(|l| !l.trim().is_empty())
            .unwrap_or_default()
            .trim()
            .to_string();
        if message.is_empty() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "git_commit".into(),
                reason: "provider returned an empty commit message".into(),
            });
        }
        info!(message = %message, "Generated commit message");
        Ok(message)
    }
}

#[derive(Deserialize)]
struct GitCommitArgs {
    message: Option<String>,
}

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        "git_commit"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": ["string", "null"],
                    "description": "Commit message. Pass null to generate one from the staged diff."
                }
            },
            "required": ["message"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: &str,
        _sink: Option<&Arc<dyn OutputSink>>,
    ) -> Result<String, ToolError> {
        let args: GitCommitArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let message = match args.message.filter(|m| !m.trim().is_empty()) {
            Some(message) => message,
            None => self.generate_message().await?,
        };

        command::run("git", &["commit", "-m", &message]).await
    }
}

// ── git_diff ──────────────────────────────────────────────────────────────

pub struct GitDiffTool {
    description: String,
}

impl GitDiffTool {
    pub fn new(settings: &ToolDescription) -> Self {
        Self {
            description: settings.description.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GitDiffArgs {
    args: Vec<String>,
}

#[async_trait]
impl Tool for GitDiffTool {
    fn name(&self) -> &str {
        "git_diff"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "args": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Arguments for git diff."
                }
            },
            "required": ["args"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: &str,
        _sink: Option<&Arc<dyn OutputSink>>,
    ) -> Result<String, ToolError> {
        let args: GitDiffArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let mut argv = vec!["diff"];
        argv.extend(args.args.iter().map(String::as_str));
        command::run("git", &argv).await
    }
}

// ── git_log ───────────────────────────────────────────────────────────────

pub struct GitLogTool {
    description: String,
}

impl GitLogTool {
    pub fn new(settings: &ToolDescription) -> Self {
        Self {
            description: settings.description.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GitLogArgs {
    max_count: u32,
}

#[async_trait]
impl Tool for GitLogTool {
    fn name(&self) -> &str {
        "git_log"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "max_count": {
                    "type": "number",
                    "description": "Maximum number of log entries to show."
                }
            },
            "required": ["max_count"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: &str,
        _sink: Option<&Arc<dyn OutputSink>>,
    ) -> Result<String, ToolError> {
        let args: GitLogArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let count = args.max_count.to_string();
        command::run("git", &["log", "-n", &count]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn git_add_rejects_empty_file_list() {
        let tool = GitAddTool::new(&ToolDescription::default());
        let err = tool.execute(r#"{"files": []}"#, None).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn commit_schema_allows_null_message() {
        let schema_type = serde_json::json!(["string", "null"]);
        // keep the schema honest about optional messages
        struct Never;
        #[async_trait]
        impl CompletionProvider for Never {
            fn name(&self) -> &str {
                "never"
            }
            async fn stream(
                &self,
                _request: CompletionRequest,
            ) -> Result<
                tokio::sync::mpsc::Receiver<
                    Result<patchloom_core::provider::StreamEvent, patchloom_core::error::ProviderError>,
                >,
                patchloom_core::error::ProviderError,
            > {
                unreachable!("not used in this test")
            }
        }
        let tool = GitCommitTool::new(
            &ToolDescription::default(),
            ModelParams::default(),
            Arc::new(Never),
        );
        let schema = tool.parameters_schema();
        assert_eq!(schema["properties"]["message"]["type"], schema_type);
        assert_eq!(schema["required"], serde_json::json!(["message"]));
    }
}
