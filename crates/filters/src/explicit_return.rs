//! Explicit-return filter — keeps the agent working until it says so.
//!
//! The instruction tells the model to end its final answer with a trigger
//! phrase. Output without the phrase gets the configured reminder as a
//! continuation input, so the loop runs another turn.

use std::sync::Arc;

use async_trait::async_trait;
use patchloom_config::ExplicitReturnFilterConfig;
use patchloom_core::output::OutputSink;

use crate::Filter;

pub struct ExplicitReturnFilter {
    config: ExplicitReturnFilterConfig,
}

impl ExplicitReturnFilter {
    pub fn new(config: ExplicitReturnFilterConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Filter for ExplicitReturnFilter {
    fn name(&self) -> &str {
        "explicit_return"
    }

    fn instruction(&self) -> String {
        self.config.instruction.clone()
    }

    async fn outlet(&self, output_text: &str, _sink: &Arc<dyn OutputSink>) -> Vec<String> {
        if output_text.contains(&self.config.trigger_word) {
            vec![]
        } else {
            vec![self.config.repeating_input.clone()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchloom_core::output::NullSink;

    fn filter() -> ExplicitReturnFilter {
        ExplicitReturnFilter::new(ExplicitReturnFilterConfig {
            trigger_word: "TASK COMPLETE".into(),
            instruction: "End with TASK COMPLETE.".into(),
            repeating_input: "Keep going or declare completion.".into(),
        })
    }

    fn sink() -> Arc<dyn OutputSink> {
        Arc::new(NullSink)
    }

    #[tokio::test]
    async fn trigger_anywhere_in_output_stops_continuation() {
        let out = filter()
            .outlet("All done.\nTASK COMPLETE\n", &sink())
            .await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn trigger_matches_as_substring() {
        let out = filter().outlet("mid-sentence TASK COMPLETE.", &sink()).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn missing_trigger_repeats_reminder() {
        let out = filter().outlet("Still thinking about it.", &sink()).await;
        assert_eq!(out, vec!["Keep going or declare completion."]);
    }
}
