//! Output filters.
//!
//! A filter contributes an instruction to the agent's system prompt and
//! inspects the final text of each completed turn. Its outlet returns zero
//! or more continuation inputs; any non-empty result keeps the agent loop
//! running with those inputs as the next user turns.

pub mod edit_file;
pub mod explicit_return;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use patchloom_config::FilterSettings;
use patchloom_core::output::OutputSink;
use tracing::warn;

pub use edit_file::EditFileFilter;
pub use explicit_return::ExplicitReturnFilter;

#[async_trait]
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    /// Instruction text appended to the agent's system prompt.
    fn instruction(&self) -> String;

    /// Inspect the final output text of a turn. Returned strings become
    /// continuation inputs for the agent loop.
    async fn outlet(&self, output_text: &str, sink: &Arc<dyn OutputSink>) -> Vec<String>;
}

/// The available filters, resolved by name per agent.
pub struct FilterSet {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterSet {
    pub fn new(filters: Vec<Arc<dyn Filter>>) -> Self {
        Self { filters }
    }

    /// The built-in filters, configured from `settings`.
    pub fn builtin(settings: &FilterSettings) -> Self {
        Self::new(vec![
            Arc::new(EditFileFilter::new(settings.edit_file.clone())),
            Arc::new(ExplicitReturnFilter::new(settings.explicit_return.clone())),
        ])
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    fn get(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.iter().find(|f| f.name() == name)
    }

    /// Resolve `enabled` against the set, warning on unknown names.
    fn resolve(&self, enabled: &[String]) -> Vec<&Arc<dyn Filter>> {
        let mut resolved = Vec::new();
        for name in enabled {
            match self.get(name) {
                Some(filter) => resolved.push(filter),
                None => warn!(filter = %name, "Filter not found"),
            }
        }
        resolved
    }

    /// Instructions of the enabled filters, joined in declaration order.
    pub fn instructions(&self, enabled: &[String]) -> String {
        self.resolve(enabled)
            .iter()
            .map(|f| f.instruction())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Run the enabled filters' outlets concurrently and concatenate their
    /// continuation inputs in declaration order.
    pub async fn outlets(
        &self,
        enabled: &[String],
        output_text: &str,
        sink: &Arc<dyn OutputSink>,
    ) -> Vec<String> {
        let pending = self
            .resolve(enabled)
            .into_iter()
            .map(|f| f.outlet(output_text, sink));
        join_all(pending).await.into_iter().flatten().collect()
    }
}
