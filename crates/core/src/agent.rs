//! Agent definitions — immutable values looked up by name from the
//! process-wide registry built at config load.

use serde::{Deserialize, Serialize};

/// Model parameters for one agent or the coder tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Provider model identifier, e.g. "gpt-5".
    pub model_id: String,

    /// Maximum output tokens per response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Reasoning effort, for models that support it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

/// One named agent: prompt, model parameters, and the capabilities it may
/// reach (tools, child agents, filters, context files). Never mutated after
/// load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Model parameters for this agent's requests.
    pub model: ModelParams,

    /// Human-readable description, shown to parent agents in the child-agent
    /// tool schema.
    #[serde(default)]
    pub description: String,

    /// System prompt template.
    pub prompt: String,

    /// Names of agents this agent may invoke as tools.
    #[serde(default)]
    pub child_agents: Vec<String>,

    /// Names of built-in tools this agent may invoke.
    #[serde(default)]
    pub tools: Vec<String>,

    /// Names of enabled output filters.
    #[serde(default)]
    pub filters: Vec<String>,

    /// Extra context files loaded fresh into each request's instructions.
    #[serde(default)]
    pub context_files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_deserializes_with_defaults() {
        let yaml_as_json = serde_json::json!({
            "model": { "model_id": "gpt-5" },
            "prompt": "You are a helpful agent."
        });
        let def: AgentDefinition = serde_json::from_value(yaml_as_json).unwrap();
        assert_eq!(def.model.model_id, "gpt-5");
        assert!(def.child_agents.is_empty());
        assert!(def.tools.is_empty());
        assert!(def.filters.is_empty());
        assert!(def.context_files.is_empty());
    }

    #[test]
    fn reasoning_effort_lowercase() {
        let params: ModelParams = serde_json::from_value(serde_json::json!({
            "model_id": "gpt-5",
            "reasoning_effort": "high"
        }))
        .unwrap();
        assert_eq!(params.reasoning_effort, Some(ReasoningEffort::High));
    }
}
