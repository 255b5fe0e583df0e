//! CompletionProvider trait — the abstraction over the model backend.
//!
//! A provider accepts one turn-structured request and answers with a live
//! stream of typed events. The stream must be terminated by exactly one
//! `Completed` event carrying the full structured turn; a stream that is
//! exhausted without it is a fatal condition for the request
//! (`ProviderError::MissingCompletion`, raised by the consumer).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::ModelParams;
use crate::error::ProviderError;
use crate::turn::Turn;

/// A tool (or child-agent) schema entry sent to the model so it knows what
/// it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// One request to the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Identifier of the previous completed turn, chaining provider-side
    /// context across requests. `None` on the first request of a conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_turn_id: Option<String>,

    /// The new turns since the last response.
    pub turns: Vec<Turn>,

    /// System instructions: agent prompt + filter instructions + context files.
    pub instructions: String,

    /// Declared tool/child-agent schema set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Model parameters from the agent definition.
    pub model: ModelParams,
}

/// An output item inside a completed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// A text message from the model.
    Message { text: String },

    /// A function/tool call the model wants dispatched.
    FunctionCall {
        name: String,
        arguments: String,
        call_id: String,
    },
}

/// The full structured result of one provider turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTurn {
    /// Provider-assigned turn identifier, threaded into the next request.
    pub id: String,

    /// Output items in model-emission order.
    pub output: Vec<OutputItem>,
}

impl CompletedTurn {
    /// All message text in this turn, newline-joined.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The function calls in this turn, in emission order.
    pub fn function_calls(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.output.iter().filter_map(|item| match item {
            OutputItem::FunctionCall {
                name,
                arguments,
                call_id,
            } => Some((name.as_str(), arguments.as_str(), call_id.as_str())),
            _ => None,
        })
    }
}

/// A typed event in a streaming response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Partial output text.
    TextDelta { delta: String },

    /// A text segment finished.
    TextDone,

    /// Partial reasoning/summary text.
    ReasoningDelta { delta: String },

    /// A reasoning segment finished.
    ReasoningDone,

    /// The terminal event: the full structured turn.
    Completed { turn: CompletedTurn },

    /// Any event type the consumer does not interpret.
    Other,
}

/// The completion provider contract.
///
/// The agent loop calls `stream()` without knowing which backend is in use.
/// Implementations: OpenAI Responses API, scripted mocks for tests.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send one request and get a live stream of response events.
    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamEvent, ProviderError>>,
        ProviderError,
    >;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_turn() -> CompletedTurn {
        CompletedTurn {
            id: "resp_1".into(),
            output: vec![
                OutputItem::Message {
                    text: "first".into(),
                },
                OutputItem::FunctionCall {
                    name: "calc".into(),
                    arguments: r#"{"expr":"2+2"}"#.into(),
                    call_id: "call_1".into(),
                },
                OutputItem::Message {
                    text: "second".into(),
                },
            ],
        }
    }

    #[test]
    fn output_text_joins_messages() {
        assert_eq!(sample_turn().output_text(), "first\nsecond");
    }

    #[test]
    fn function_calls_preserve_order_and_ids() {
        let turn = sample_turn();
        let calls: Vec<_> = turn.function_calls().collect();
        assert_eq!(calls, vec![("calc", r#"{"expr":"2+2"}"#, "call_1")]);
    }

    #[test]
    fn output_text_empty_when_only_calls() {
        let turn = CompletedTurn {
            id: "resp_2".into(),
            output: vec![OutputItem::FunctionCall {
                name: "calc".into(),
                arguments: "{}".into(),
                call_id: "call_1".into(),
            }],
        };
        assert_eq!(turn.output_text(), "");
    }

    #[test]
    fn stream_event_serialization() {
        let event = StreamEvent::TextDelta {
            delta: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"text_delta""#));
        assert!(json.contains(r#""delta":"Hello""#));
    }
}
