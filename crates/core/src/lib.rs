//! # Patchloom Core
//!
//! Domain types, traits, and error definitions for the Patchloom agent
//! runtime. This crate has **zero framework dependencies** — it defines the
//! contracts that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion provider, output sink, input
//! source, tools) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod error;
pub mod input;
pub mod output;
pub mod provider;
pub mod stream;
pub mod tool;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentDefinition, ModelParams, ReasoningEffort};
pub use error::{AgentError, Error, ProviderError, Result, ToolError};
pub use input::{InputSource, NoInput};
pub use output::{NullSink, OutputSink, Style};
pub use provider::{
    CompletedTurn, CompletionProvider, CompletionRequest, OutputItem, StreamEvent, ToolDefinition,
};
pub use stream::await_completion;
pub use tool::{Tool, ToolRegistry};
pub use turn::Turn;
