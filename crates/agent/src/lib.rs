//! The agent execution loop.
//!
//! Drives one agent's conversation with the completion provider: streams
//! output, dispatches tool and child-agent calls, applies output filters,
//! and decides between continuing, waiting for external input, and
//! returning the final text to the caller.

pub mod context;
pub mod run;

use std::sync::Arc;

use patchloom_config::Config;
use patchloom_core::provider::CompletionProvider;
use patchloom_core::tool::ToolRegistry;
use patchloom_filters::FilterSet;

pub use run::run_agent;

/// Everything the loop needs, constructed once at startup and passed in
/// explicitly. Read-only; no ambient globals.
#[derive(Clone)]
pub struct RuntimeContext {
    pub config: Arc<Config>,
    pub provider: Arc<dyn CompletionProvider>,
    pub tools: Arc<ToolRegistry>,
    pub filters: Arc<FilterSet>,
}
