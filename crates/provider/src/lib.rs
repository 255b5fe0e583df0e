//! OpenAI Responses API provider.
//!
//! Implements [`CompletionProvider`] against the `/v1/responses` endpoint:
//! turn-structured input, server-side conversation state chained via
//! `previous_response_id`, and SSE streaming of typed `response.*` events.
//!
//! Every request pins `parallel_tool_calls: false`; dispatch downstream is
//! strictly sequential.

use async_trait::async_trait;
use futures::StreamExt;
use patchloom_core::agent::ReasoningEffort;
use patchloom_core::error::ProviderError;
use patchloom_core::provider::{
    CompletedTurn, CompletionProvider, CompletionRequest, OutputItem, StreamEvent, ToolDefinition,
};
use patchloom_core::turn::Turn;
use serde::Deserialize;
use tracing::{debug, warn};

/// A provider speaking the OpenAI Responses API.
pub struct OpenAiResponsesProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiResponsesProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(600))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// The standard OpenAI endpoint.
    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    fn to_api_input(turns: &[Turn]) -> Vec<serde_json::Value> {
        turns
            .iter()
            .map(|turn| match turn {
                Turn::User { content } => serde_json::json!({
                    "type": "message",
                    "role": "user",
                    "content": content,
                }),
                Turn::ToolOutput { call_id, output } => serde_json::json!({
                    "type": "function_call_output",
                    "call_id": call_id,
                    "output": output,
                }),
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "name": t.name,
                    "description": t.description,
                    "strict": true,
                    "parameters": t.parameters,
                })
            })
            .collect()
    }

    fn build_body(request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model.model_id,
            "input": Self::to_api_input(&request.turns),
            "instructions": request.instructions,
            "stream": true,
            "store": true,
            "truncation": "auto",
            "parallel_tool_calls": false,
        });

        if let Some(id) = &request.previous_turn_id {
            body["previous_response_id"] = serde_json::json!(id);
        }
        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }
        if let Some(max) = request.model.max_output_tokens {
            body["max_output_tokens"] = serde_json::json!(max);
        }
        if let Some(effort) = request.model.reasoning_effort {
            let effort = match effort {
                ReasoningEffort::Low => "low",
                ReasoningEffort::Medium => "medium",
                ReasoningEffort::High => "high",
            };
            body["reasoning"] = serde_json::json!({ "effort": effort });
        }

        body
    }
}

#[async_trait]
impl CompletionProvider for OpenAiResponsesProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<StreamEvent, ProviderError>>,
        ProviderError,
    > {
        let url = format!("{}/responses", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model.model_id,
            turns = request.turns.len(),
            tools = request.tools.len(),
            "Sending streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        // Read the SSE byte stream and translate data lines into events.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    // SSE framing: skip blanks, comments, and `event:` lines;
                    // the data payload carries its own type tag.
                    if line.is_empty() || line.starts_with(':') || line.starts_with("event:") {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        return;
                    }

                    match parse_stream_event(data) {
                        Ok(event) => {
                            if tx.send(Ok(event)).await.is_err() {
                                return; // receiver dropped
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Skipping unparseable stream event");
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

// ── Wire shapes ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<serde_json::Value>,
    #[serde(default)]
    response: Option<WireResponse>,
}

#[derive(Deserialize)]
struct WireResponse {
    id: String,
    #[serde(default)]
    output: Vec<WireOutputItem>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum WireOutputItem {
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        content: Vec<WireContent>,
    },
    #[serde(rename = "function_call")]
    FunctionCall {
        name: String,
        arguments: String,
        call_id: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct WireContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Reasoning deltas are not always plain strings on the wire.
fn delta_text(delta: Option<serde_json::Value>) -> String {
    match delta {
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn parse_stream_event(data: &str) -> Result<StreamEvent, serde_json::Error> {
    let wire: WireEvent = serde_json::from_str(data)?;

    let event = match wire.kind.as_str() {
        "response.output_text.delta" => StreamEvent::TextDelta {
            delta: delta_text(wire.delta),
        },
        "response.output_text.done" => StreamEvent::TextDone,
        "response.reasoning.delta"
        | "response.reasoning_summary.delta"
        | "response.reasoning_summary_text.delta" => StreamEvent::ReasoningDelta {
            delta: delta_text(wire.delta),
        },
        "response.reasoning.done"
        | "response.reasoning_summary.done"
        | "response.reasoning_summary_text.done" => StreamEvent::ReasoningDone,
        "response.completed" => match wire.response {
            Some(response) => StreamEvent::Completed {
                turn: into_completed_turn(response),
            },
            None => StreamEvent::Other,
        },
        _ => StreamEvent::Other,
    };

    Ok(event)
}

fn into_completed_turn(response: WireResponse) -> CompletedTurn {
    let output = response
        .output
        .into_iter()
        .filter_map(|item| match item {
            WireOutputItem::Message { content } => {
                let text = content
                    .iter()
                    .filter(|c| c.kind == "output_text")
                    .map(|c| c.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(OutputItem::Message { text })
            }
            WireOutputItem::FunctionCall {
                name,
                arguments,
                call_id,
            } => Some(OutputItem::FunctionCall {
                name,
                arguments,
                call_id,
            }),
            WireOutputItem::Other => None,
        })
        .collect();

    CompletedTurn {
        id: response.id,
        output,
    }
}
