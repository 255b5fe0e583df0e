//! Built-in tools for Patchloom.
//!
//! Tools:
//! - `calc` — arithmetic expression evaluation
//! - `read_file` — ranged, optionally line-numbered file reads
//! - `find` — filename search (fd)
//! - `grep` — content search (ripgrep) with an output cap
//! - `git_status` / `git_add` / `git_commit` / `git_diff` / `git_log`
//! - `coder` — model-driven code editing through the patch engine

pub mod calc;
pub mod coder;
pub mod command;
pub mod find;
pub mod git;
pub mod grep;
pub mod read_file;

use std::sync::Arc;

use patchloom_config::BuiltinToolSettings;
use patchloom_core::provider::CompletionProvider;
use patchloom_core::tool::ToolRegistry;

pub use calc::CalcTool;
pub use coder::CoderTool;
pub use find::FindTool;
pub use git::{GitAddTool, GitCommitTool, GitDiffTool, GitLogTool, GitStatusTool};
pub use grep::GrepTool;
pub use read_file::ReadFileTool;

/// Assemble the registry of built-in tools.
///
/// The provider handle is shared with the tools that issue their own
/// completion requests (coder, commit-message generation).
pub fn builtin_registry(
    settings: &BuiltinToolSettings,
    provider: Arc<dyn CompletionProvider>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CalcTool::new(&settings.calc)));
    registry.register(Box::new(ReadFileTool::new(&settings.read_file)));
    registry.register(Box::new(FindTool::new(&settings.find)));
    registry.register(Box::new(GrepTool::new(&settings.grep)));
    registry.register(Box::new(GitStatusTool::new(&settings.git.status)));
    registry.register(Box::new(GitAddTool::new(&settings.git.add)));
    registry.register(Box::new(GitCommitTool::new(
        &settings.git.commit,
        settings.coder.model.clone(),
        Arc::clone(&provider),
    )));
    registry.register(Box::new(GitDiffTool::new(&settings.git.diff)));
    registry.register(Box::new(GitLogTool::new(&settings.git.log)));
    registry.register(Box::new(CoderTool::new(settings.coder.clone(), provider)));
    registry
}
