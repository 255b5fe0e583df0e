//! The conversation loop: stream, dispatch, filter, continue or return.

use std::sync::Arc;

use futures::future::BoxFuture;
use patchloom_core::agent::AgentDefinition;
use patchloom_core::error::{AgentError, Result};
use patchloom_core::input::InputSource;
use patchloom_core::output::{OutputSink, Style};
use patchloom_core::provider::{CompletionRequest, ToolDefinition};
use patchloom_core::stream::await_completion;
use patchloom_core::turn::Turn;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::context::context_section;
use crate::RuntimeContext;

const SEPARATOR: &str = "--------------------------------------------------\n";

/// Run one agent's conversation to completion and return its final text.
///
/// `input` is the first user turn; a top-level invocation with no input
/// blocks on the input source for one (fatal if the source is already
/// closed), while a nested invocation returns empty text immediately.
/// Nested invocations (`top_level = false`) never block on external input.
pub fn run_agent<'a>(
    ctx: &'a RuntimeContext,
    definition: &'a AgentDefinition,
    input: Option<String>,
    top_level: bool,
    sink: Arc<dyn OutputSink>,
    input_source: Arc<dyn InputSource>,
) -> BoxFuture<'a, Result<String>> {
    Box::pin(run_loop(ctx, definition, input, top_level, sink, input_source))
}

async fn run_loop(
    ctx: &RuntimeContext,
    definition: &AgentDefinition,
    input: Option<String>,
    top_level: bool,
    sink: Arc<dyn OutputSink>,
    input_source: Arc<dyn InputSource>,
) -> Result<String> {
    let first_input = match input.filter(|text| !text.trim().is_empty()) {
        Some(text) => text,
        None => {
            if !top_level {
                return Ok(String::new());
            }
            match input_source.next(true).await {
                Some(text) => text,
                None => return Err(AgentError::NoInput.into()),
            }
        }
    };

    let schema = tool_schema(ctx, definition);
    debug!(
        model = %definition.model.model_id,
        tools = %schema.iter().map(|d| d.name.as_str()).collect::<Vec<_>>().join(", "),
        "Starting agent loop"
    );

    let mut previous_turn_id: Option<String> = None;
    let mut queued = vec![Turn::user(first_input)];
    let mut last_text = String::new();

    loop {
        let request = CompletionRequest {
            previous_turn_id: previous_turn_id.take(),
            turns: std::mem::take(&mut queued),
            instructions: build_instructions(ctx, definition).await,
            tools: schema.clone(),
            model: definition.model.clone(),
        };

        let events = ctx.provider.stream(request).await?;
        let turn = await_completion(events, &sink, Style::Text, Style::Reasoning).await?;
        previous_turn_id = Some(turn.id.clone());

        // sequential, in emission order; a call's side effects are visible
        // to the next call
        let calls: Vec<(String, String, String)> = turn
            .function_calls()
            .map(|(name, arguments, call_id)| {
                (name.to_string(), arguments.to_string(), call_id.to_string())
            })
            .collect();
        for (name, arguments, call_id) in calls {
            let result = dispatch(ctx, &name, &arguments, &sink, &input_source).await?;
            queued.push(Turn::tool_output(call_id, result));
        }

        let output_text = turn.output_text();
        if !output_text.is_empty() {
            last_text = output_text.clone();
            let continuations = ctx
                .filters
                .outlets(&definition.filters, &output_text, &sink)
                .await;
            for continuation in continuations {
                if !continuation.is_empty() {
                    queued.push(Turn::user(continuation));
                }
            }
        }

        if !queued.is_empty() {
            continue;
        }
        if !top_level {
            break;
        }
        match input_source.next(true).await {
            Some(text) => {
                debug!("User input received");
                queued.push(Turn::user(text));
            }
            None => break,
        }
    }

    sink.write(SEPARATOR, Style::Separator).await;
    Ok(last_text)
}

/// Instructions are rebuilt for every request: the agent prompt, the
/// enabled filters' instructions, and freshly re-read context files.
async fn build_instructions(ctx: &RuntimeContext, definition: &AgentDefinition) -> String {
    let mut instructions = definition.prompt.clone();
    let filter_part = ctx.filters.instructions(&definition.filters);
    if !filter_part.is_empty() {
        instructions.push_str("\n\n");
        instructions.push_str(&filter_part);
    }
    instructions.push_str(&context_section(&ctx.config, definition).await);
    instructions
}

/// The schema set for one agent: its enabled tools, then its child agents.
/// A child agent whose name collides with an enabled tool is omitted, since
/// dispatch resolves the name to the tool anyway.
fn tool_schema(ctx: &RuntimeContext, definition: &AgentDefinition) -> Vec<ToolDefinition> {
    let mut defs = Vec::new();
    for name in &definition.tools {
        match ctx.tools.get(name) {
            Some(tool) => defs.push(tool.to_definition()),
            None => warn!(tool = %name, "Tool not found"),
        }
    }
    for name in &definition.child_agents {
        if defs.iter().any(|d| &d.name == name) {
            warn!(agent = %name, "Name already taken by a tool; skipping child agent");
            continue;
        }
        match ctx.config.agents.get(name) {
            Some(agent) => defs.push(ToolDefinition {
                name: name.clone(),
                description: format!("Call the agent \"{name}\". {}", agent.description),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "request": {
                            "type": "string",
                            "description": "Request to the agent"
                        }
                    },
                    "required": ["request"],
                    "additionalProperties": false
                }),
            }),
            None => warn!(agent = %name, "Agent scheme not found"),
        }
    }
    defs
}

#[derive(Deserialize)]
struct ChildRequest {
    request: String,
}

/// Route one call to a tool or a child agent, tool lookup first.
///
/// Tool failures and unknown names come back as `Ok` with a structured
/// `{"error": ...}` payload for the model; only fatal conditions inside a
/// child agent's own loop propagate as `Err`.
async fn dispatch(
    ctx: &RuntimeContext,
    name: &str,
    arguments: &str,
    sink: &Arc<dyn OutputSink>,
    input_source: &Arc<dyn InputSource>,
) -> Result<String> {
    if let Some(tool) = ctx.tools.get(name) {
        debug!(tool = %name, "Dispatching tool call");
        return Ok(match tool.execute(arguments, Some(sink)).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                serde_json::json!({ "error": e.to_string() }).to_string()
            }
        });
    }

    if let Some(child) = ctx.config.agents.get(name) {
        debug!(agent = %name, "Dispatching child agent");
        let request = match serde_json::from_str::<ChildRequest>(arguments) {
            Ok(args) => args.request,
            Err(e) => {
                warn!(agent = %name, error = %e, "Invalid child-agent arguments");
                return Ok(
                    serde_json::json!({ "error": format!("Invalid arguments: {e}") }).to_string(),
                );
            }
        };
        return run_agent(
            ctx,
            child,
            Some(request),
            false,
            sink.child(),
            Arc::clone(input_source),
        )
        .await;
    }

    warn!(name = %name, "Trying to call unknown tool or agent");
    Ok(serde_json::json!({ "error": "Tool or agent not found" }).to_string())
}
