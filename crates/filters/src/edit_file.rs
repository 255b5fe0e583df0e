//! Edit-file filter — applies edit blocks found in the agent's final text.
//!
//! Unlike the coder tool there is no target-file allow-list: the agent's
//! own output may touch any path. Successful runs produce no continuation;
//! failures are fed back as a single error-report input so the agent can
//! correct its blocks.

use std::sync::Arc;

use async_trait::async_trait;
use patchloom_config::{EditFileFilterConfig, EditFormat};
use patchloom_core::output::{OutputSink, Style};
use patchloom_patch::{apply_edit, parse_blocks, BlockItem, ParseOptions, PatchReport};
use tracing::info;

use crate::Filter;

pub struct EditFileFilter {
    config: EditFileFilterConfig,
}

impl EditFileFilter {
    pub fn new(config: EditFileFilterConfig) -> Self {
        Self { config }
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            reject_diff_headers: self.config.edit_format == EditFormat::Diff,
        }
    }
}

#[async_trait]
impl Filter for EditFileFilter {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn instruction(&self) -> String {
        self.config.instruction.clone()
    }

    async fn outlet(&self, output_text: &str, sink: &Arc<dyn OutputSink>) -> Vec<String> {
        let mut report = PatchReport::default();
        for (i, item) in parse_blocks(output_text, self.parse_options()).enumerate() {
            let index = i + 1;
            match item {
                BlockItem::Block(block) => {
                    info!(file = %block.file, "Applying edit");
                    sink.write(
                        &format!("Applying edit to file: {}\n", block.file),
                        Style::Success,
                    )
                    .await;
                    let outcome = apply_edit(&block, None);
                    if let Err(reason) = &outcome {
                        sink.write(&format!("{reason}\n"), Style::Failure).await;
                    }
                    report.record(index, &block.file, outcome);
                }
                BlockItem::Malformed(message) => {
                    sink.write(&format!("{message}\n"), Style::Failure).await;
                    report.record_malformed(index, &message);
                }
            }
        }

        match report.error_report() {
            Some(errors) => vec![errors],
            None => vec![],
        }
    }
}
