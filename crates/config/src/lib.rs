//! Configuration loading, validation, and the agent registry for Patchloom.
//!
//! Configuration is YAML, layered: built-in defaults (embedded at compile
//! time), then each listed config file in order, deep-merged at the YAML
//! value level. Scalars and sequences from later layers win; mappings merge
//! key-by-key.
//!
//! Validation never blocks startup: references to unknown tools, child
//! agents, or filters are reported as warnings so a half-edited config is
//! still usable.

use std::collections::HashMap;
use std::path::Path;

use patchloom_core::agent::{AgentDefinition, ModelParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Built-in defaults, merged under every user config layer.
const DEFAULT_CONFIG: &str = include_str!("../config.default.yaml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_yaml::Error),
}

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the agent started when none is given on the command line.
    pub default_agent: String,

    /// The process-wide agent registry. Read-only after load.
    #[serde(default)]
    pub agents: HashMap<String, AgentDefinition>,

    #[serde(default)]
    pub tools: ToolSettings,

    #[serde(default)]
    pub filters: FilterSettings,

    #[serde(default)]
    pub context_files: ContextFilesConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default)]
    pub builtin: BuiltinToolSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuiltinToolSettings {
    #[serde(default)]
    pub calc: ToolDescription,
    #[serde(default)]
    pub read_file: ToolDescription,
    #[serde(default)]
    pub find: ToolDescription,
    #[serde(default)]
    pub grep: GrepSettings,
    #[serde(default)]
    pub git: GitSettings,
    #[serde(default)]
    pub coder: CoderSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolDescription {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrepSettings {
    #[serde(default)]
    pub description: String,

    /// Output cap; lines beyond this are elided with a count.
    #[serde(default = "default_grep_line_limit")]
    pub line_limit: usize,
}

fn default_grep_line_limit() -> usize {
    200
}

impl Default for GrepSettings {
    fn default() -> Self {
        Self {
            description: String::new(),
            line_limit: default_grep_line_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitSettings {
    #[serde(default)]
    pub status: ToolDescription,
    #[serde(default)]
    pub add: ToolDescription,
    #[serde(default)]
    pub commit: ToolDescription,
    #[serde(default)]
    pub diff: ToolDescription,
    #[serde(default)]
    pub log: ToolDescription,
}

/// Edit-block dialect. Only `diff` (search/replace blocks) changes parser
/// behavior today; `whole` is accepted for config compatibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditFormat {
    Whole,
    #[default]
    Diff,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoderSettings {
    #[serde(default)]
    pub model: ModelParams,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub edit_format: EditFormat,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub edit_file: EditFileFilterConfig,
    #[serde(default)]
    pub explicit_return: ExplicitReturnFilterConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditFileFilterConfig {
    #[serde(default)]
    pub edit_format: EditFormat,
    #[serde(default)]
    pub instruction: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplicitReturnFilterConfig {
    #[serde(default)]
    pub trigger_word: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub repeating_input: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextFilesConfig {
    #[serde(default)]
    pub prompt_header: String,
    #[serde(default)]
    pub files: Vec<String>,
}

impl Config {
    /// Load the built-in defaults plus the given config files, in order.
    /// Missing files are skipped with a warning.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut merged: serde_yaml::Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                warn!(path = %path.display(), "Config file not found, skipping");
                continue;
            }
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let layer: serde_yaml::Value =
                serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            deep_merge(&mut merged, layer);
        }

        Ok(serde_yaml::from_value(merged)?)
    }

    /// Built-in defaults only.
    pub fn default_config() -> Self {
        Self::load::<&Path>(&[]).expect("embedded default config must parse")
    }

    /// Cross-check agent definitions against the known tool and filter
    /// names. Emits warnings; never fails.
    pub fn validate(&self, tool_names: &[&str], filter_names: &[&str]) {
        if !self.agents.contains_key(&self.default_agent) {
            warn!(agent = %self.default_agent, "default_agent is not defined");
        }
        for (name, def) in &self.agents {
            for child in &def.child_agents {
                if !self.agents.contains_key(child) {
                    warn!(agent = %name, child = %child, "Agent references unknown child agent");
                }
            }
            for tool in &def.tools {
                if !tool_names.contains(&tool.as_str()) {
                    warn!(agent = %name, tool = %tool, "Agent references unknown tool");
                }
            }
            for filter in &def.filters {
                if !filter_names.contains(&filter.as_str()) {
                    warn!(agent = %name, filter = %filter, "Agent references unknown filter");
                }
            }
        }
    }
}

/// Merge `source` into `target`: mappings merge recursively, everything else
/// from `source` replaces the target value.
fn deep_merge(target: &mut serde_yaml::Value, source: serde_yaml::Value) {
    match (target, source) {
        (serde_yaml::Value::Mapping(target_map), serde_yaml::Value::Mapping(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}
