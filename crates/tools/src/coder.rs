//! Coder tool — model-driven code editing through the patch engine.
//!
//! Sends the target files and the request to the coder model, streams the
//! reply, applies the edit blocks it contains (restricted to the target
//! files), and feeds application errors back to the model for up to three
//! attempts.

use std::sync::Arc;

use async_trait::async_trait;
use patchloom_config::CoderSettings;
use patchloom_core::error::ToolError;
use patchloom_core::output::{NullSink, OutputSink, Style};
use patchloom_core::provider::{CompletionProvider, CompletionRequest};
use patchloom_core::stream::await_completion;
use patchloom_core::tool::Tool;
use patchloom_core::turn::Turn;
use patchloom_patch::{apply_edit, parse_blocks, BlockItem, ParseOptions, PatchReport};
use serde::Deserialize;
use tracing::{debug, info};

const MAX_ATTEMPTS: usize = 3;

pub struct CoderTool {
    settings: CoderSettings,
    provider: Arc<dyn CompletionProvider>,
}

impl CoderTool {
    pub fn new(settings: CoderSettings, provider: Arc<dyn CompletionProvider>) -> Self {
        Self { settings, provider }
    }

    /// One content turn per readable target file, plus a single turn listing
    /// the files that do not exist yet but may be created.
    async fn file_turns(&self, target_files: &[String]) -> Vec<Turn> {
        let mut turns = Vec::new();
        let mut missing = Vec::new();
        for file in target_files {
            match tokio::fs::read_to_string(file).await {
                Ok(content) => turns.push(Turn::user(format!(
                    "Here is the content of the file {file}:\n\n{content}"
                ))),
                Err(_) => missing.push(format!("- File {file} is allowed to write and empty.")),
            }
        }
        if !missing.is_empty() {
            turns.push(Turn::user(missing.join("\n")));
        }
        turns
    }

    /// Parse `output_text` and apply each block, reporting progress to the
    /// sink. Edits outside `target_files` are rejected by the patch engine.
    async fn apply_output(
        &self,
        output_text: &str,
        target_files: &[String],
        sink: &Arc<dyn OutputSink>,
    ) -> PatchReport {
        let mut report = PatchReport::default();
        for (i, item) in parse_blocks(output_text, ParseOptions::default()).enumerate() {
            let index = i + 1;
            match item {
                BlockItem::Block(block) => {
                    info!(file = %block.file, "Applying edit");
                    sink.write(
                        &format!("Applying edit to file: {}\n", block.file),
                        Style::Success,
                    )
                    .await;
                    let outcome = apply_edit(&block, Some(target_files));
                    if let Err(reason) = &outcome {
                        sink.write(&format!("{reason}\n"), Style::Failure).await;
                    }
                    report.record(index, &block.file, outcome);
                }
                BlockItem::Malformed(message) => {
                    sink.write(&format!("{message}\n"), Style::Failure).await;
                    report.record_malformed(index, &message);
                }
            }
        }
        report
    }
}

#[derive(Deserialize)]
struct CoderArgs {
    request: String,
    target_files: Vec<String>,
}

#[async_trait]
impl Tool for CoderTool {
    fn name(&self) -> &str {
        "coder"
    }

    fn description(&self) -> &str {
        &self.settings.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "request": {
                    "type": "string",
                    "description": "Request to the coder tool, including the code to edit and the changes to apply."
                },
                "target_files": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "The target file to apply the changes to. Path should start with `./`"
                }
            },
            "required": ["request", "target_files"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: &str,
        sink: Option<&Arc<dyn OutputSink>>,
    ) -> Result<String, ToolError> {
        let args: CoderArgs = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        if args.target_files.is_empty() {
            return Ok("Error: target_files must be a non-empty array.".into());
        }

        let null_sink: Arc<dyn OutputSink> = Arc::new(NullSink);
        let sink = sink.unwrap_or(&null_sink);

        let mut turns = self.file_turns(&args.target_files).await;
        turns.push(Turn::user(args.request));

        let mut previous_turn_id = None;
        let mut total = PatchReport::default();

        for attempt in 1..=MAX_ATTEMPTS {
            debug!(attempt, model = %self.settings.model.model_id, "Requesting edits");
            let request = CompletionRequest {
                previous_turn_id: previous_turn_id.take(),
                turns: std::mem::take(&mut turns),
                instructions: self.settings.prompt.clone(),
                tools: vec![],
                model: self.settings.model.clone(),
            };

            let events = self
                .provider
                .stream(request)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "coder".into(),
                    reason: e.to_string(),
                })?;
            let turn = await_completion(events, sink, Style::Plain, Style::Reasoning)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "coder".into(),
                    reason: e.to_string(),
                })?;

            let report = self
                .apply_output(&turn.output_text(), &args.target_files, sink)
                .await;
            let continuation = report.error_report();
            total.merge(report);

            match continuation {
                Some(errors) if attempt < MAX_ATTEMPTS => {
                    previous_turn_id = Some(turn.id);
                    turns = vec![Turn::user(errors)];
                }
                _ => break,
            }
        }

        Ok(total.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchloom_core::error::ProviderError;
    use patchloom_core::provider::{CompletedTurn, OutputItem, StreamEvent};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Provider that replays a fixed sequence of completed turns, one per
    /// request, and records the requests it saw.
    struct ScriptedProvider {
        replies: Mutex<Vec<String>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(mut replies: Vec<String>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn stream(
            &self,
            request: CompletionRequest,
        ) -> Result<mpsc::Receiver<Result<StreamEvent, ProviderError>>, ProviderError> {
            self.requests.lock().unwrap().push(request);
            let text = self.replies.lock().unwrap().pop().unwrap_or_default();
            let (tx, rx) = mpsc::channel(4);
            let turn = CompletedTurn {
                id: format!("resp_{}", self.requests.lock().unwrap().len()),
                output: vec![OutputItem::Message { text }],
            };
            tx.send(Ok(StreamEvent::Completed { turn })).await.unwrap();
            Ok(rx)
        }
    }

    fn settings() -> CoderSettings {
        CoderSettings {
            prompt: "Emit search/replace blocks.".into(),
            ..Default::default()
        }
    }

    fn edit_block(file: &str, search: &str, replace: &str) -> String {
        format!("{file}\n<<<<<<< SEARCH\n{search}\n=======\n{replace}\n>>>>>>> REPLACE\n")
    }

    #[tokio::test]
    async fn applies_edit_and_reports_tally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello\nworld\n").unwrap();
        let path = path.to_str().unwrap().to_string();

        let provider = Arc::new(ScriptedProvider::new(vec![edit_block(
            &path, "hello", "goodbye",
        )]));
        let tool = CoderTool::new(settings(), provider.clone());

        let arguments = serde_json::json!({
            "request": "rename hello",
            "target_files": [path.clone()],
        })
        .to_string();
        let out = tool.execute(&arguments, None).await.unwrap();

        assert!(out.starts_with("1 changes applied successfully, 0 changes failed."));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "goodbye\nworld\n");
        assert_eq!(provider.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn retries_with_error_report_then_stops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.txt");
        std::fs::write(&path, "alpha\n").unwrap();
        let path = path.to_str().unwrap().to_string();

        // every attempt fails to match, so all three attempts are used
        let bad = edit_block(&path, "no such text", "x");
        let provider = Arc::new(ScriptedProvider::new(vec![bad.clone(), bad.clone(), bad]));
        let tool = CoderTool::new(settings(), provider.clone());

        let arguments = serde_json::json!({
            "request": "change it",
            "target_files": [path],
        })
        .to_string();
        let out = tool.execute(&arguments, None).await.unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        // follow-ups carry the error list and thread the previous turn id
        assert_eq!(requests[1].previous_turn_id.as_deref(), Some("resp_1"));
        assert!(matches!(
            &requests[1].turns[0],
            Turn::User { content } if content.contains("encountered the following errors")
        ));
        assert!(out.starts_with("0 changes applied successfully, 3 changes failed."));
    }

    #[tokio::test]
    async fn rejects_edits_outside_target_files() {
        let dir = tempfile::tempdir().unwrap();
        let allowed = dir.path().join("c.txt");
        let stray = dir.path().join("d.txt");
        std::fs::write(&allowed, "one\n").unwrap();
        std::fs::write(&stray, "two\n").unwrap();
        let allowed = allowed.to_str().unwrap().to_string();
        let stray = stray.to_str().unwrap().to_string();

        let reply = edit_block(&stray, "two", "three");
        let provider = Arc::new(ScriptedProvider::new(vec![
            reply,
            String::new(),
            String::new(),
        ]));
        let tool = CoderTool::new(settings(), provider);

        let arguments = serde_json::json!({
            "request": "edit",
            "target_files": [allowed],
        })
        .to_string();
        let out = tool.execute(&arguments, None).await.unwrap();

        assert!(out.contains("changes failed"));
        assert_eq!(std::fs::read_to_string(&stray).unwrap(), "two\n");
    }

    #[tokio::test]
    async fn empty_target_files_is_a_data_error() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new()));
        let tool = CoderTool::new(settings(), provider);
        let out = tool
            .execute(r#"{"request": "x", "target_files": []}"#, None)
            .await
            .unwrap();
        assert_eq!(out, "Error: target_files must be a non-empty array.");
    }

    #[tokio::test]
    async fn missing_target_file_announced_as_writable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt").to_str().unwrap().to_string();

        let reply = edit_block(&path, "", "created\n");
        let provider = Arc::new(ScriptedProvider::new(vec![reply]));
        let tool = CoderTool::new(settings(), provider.clone());

        let arguments = serde_json::json!({
            "request": "create it",
            "target_files": [path.clone()],
        })
        .to_string();
        let out = tool.execute(&arguments, None).await.unwrap();

        let requests = provider.requests.lock().unwrap();
        assert!(matches!(
            &requests[0].turns[0],
            Turn::User { content } if content.contains("allowed to write and empty")
        ));
        assert!(out.starts_with("1 changes applied successfully"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("created"));
    }
}
