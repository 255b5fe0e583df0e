//! Conversation turns — the unit of exchange with the completion provider.
//!
//! The loop never resends full history; long-term context is retained by the
//! provider and referenced via the previous turn identifier carried on each
//! request. A request therefore only carries the turns produced since the
//! last completed response: tool outputs, filter continuations, and fresh
//! user input.

use serde::{Deserialize, Serialize};

/// One unit of input sent to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    /// A user-role text message: the initial input, new external input, or a
    /// filter-generated continuation.
    User { content: String },

    /// The result of a dispatched tool or child-agent call.
    ToolOutput { call_id: String, output: String },
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn tool_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ToolOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }
}
