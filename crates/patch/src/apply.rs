//! Applying edit blocks to the filesystem.
//!
//! Blocks are applied in block order, each against the file's current
//! on-disk state. Re-applying a block that already succeeded is not
//! guaranteed to succeed: the first application may have removed the search
//! text.

use std::collections::BTreeMap;
use std::path::Path;

use crate::block::{parse_blocks, BlockItem, EditBlock, ParseOptions};

/// Added/removed line tally for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineDelta {
    pub added: usize,
    pub removed: usize,
}

/// Aggregated outcome of one patch run. Returned to the caller (tool result
/// or filter continuation), never persisted.
#[derive(Debug, Default)]
pub struct PatchReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub per_file: BTreeMap<String, LineDelta>,
    pub errors: Vec<String>,
}

impl PatchReport {
    /// Fold the outcome of one block into the report. `index` is the
    /// 1-based block position, used in error diagnostics.
    pub fn record(&mut self, index: usize, file: &str, outcome: Result<LineDelta, String>) {
        match outcome {
            Ok(delta) => {
                self.success_count += 1;
                let entry = self.per_file.entry(file.to_string()).or_default();
                entry.added += delta.added;
                entry.removed += delta.removed;
            }
            Err(message) => {
                self.failure_count += 1;
                self.errors.push(format!("Edit #{index}: {message}"));
            }
        }
    }

    /// Fold a parser diagnostic into the report.
    pub fn record_malformed(&mut self, index: usize, message: &str) {
        self.failure_count += 1;
        self.errors.push(format!("Edit #{index}: {message}"));
    }

    /// The summary text handed back to the model as a tool result.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} changes applied successfully, {} changes failed.\n\nChanges made:\n",
            self.success_count, self.failure_count
        );
        out.push_str(
            &self
                .per_file
                .iter()
                .map(|(file, delta)| {
                    format!(
                        "- {file}: {} lines added, {} lines removed",
                        delta.added, delta.removed
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"),
        );
        out
    }

    /// Fold another report into this one, e.g. across retry attempts.
    pub fn merge(&mut self, other: PatchReport) {
        self.success_count += other.success_count;
        self.failure_count += other.failure_count;
        for (file, delta) in other.per_file {
            let entry = self.per_file.entry(file).or_default();
            entry.added += delta.added;
            entry.removed += delta.removed;
        }
        self.errors.extend(other.errors);
    }

    /// Error list formatted as a continuation message, or `None` when the
    /// run was fully successful.
    pub fn error_report(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(format!(
            "encountered the following errors while applying edits:\n{}",
            self.errors.join("\n")
        ))
    }
}

fn newline_count(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

fn search_excerpt(search: &str) -> String {
    search.chars().take(20).collect()
}

/// Apply a single edit block against the current on-disk state.
///
/// `allowed_files` is the tool-mode allow-list; `None` (filter mode) allows
/// the whole tree. Returns the line delta on success or a human-readable
/// failure reason — failures are data for the model, not faults.
pub fn apply_edit(
    block: &EditBlock,
    allowed_files: Option<&[String]>,
) -> Result<LineDelta, String> {
    let file = &block.file;

    if let Some(allowed) = allowed_files {
        if !allowed.iter().any(|f| f == file) {
            return Err(format!("File {file} is not in target_files."));
        }
    }

    let path = Path::new(file);
    if !path.exists() {
        if block.is_creation() {
            std::fs::write(path, &block.replace)
                .map_err(|e| format!("Error writing {file}: {e}"))?;
            return Ok(LineDelta {
                added: newline_count(&block.replace),
                removed: 0,
            });
        }
        return Err(format!(
            "File {file} does not exist, but search text is not empty."
        ));
    }

    let mut content =
        std::fs::read_to_string(path).map_err(|e| format!("Error reading {file}: {e}"))?;
    if !content.ends_with('\n') {
        content.push('\n');
    }

    // first (leftmost) occurrence only
    let Some(index) = content.find(&block.search) else {
        return Err(format!(
            "Search text not found in {file}.\n(search text: \"{}...\")",
            search_excerpt(&block.search)
        ));
    };

    let mut patched = String::with_capacity(content.len() + block.replace.len());
    patched.push_str(&content[..index]);
    patched.push_str(&block.replace);
    patched.push_str(&content[index + block.search.len()..]);
    std::fs::write(path, &patched).map_err(|e| format!("Error writing {file}: {e}"))?;

    Ok(LineDelta {
        added: newline_count(&block.replace),
        removed: newline_count(&block.search),
    })
}

/// Parse `text` and apply every block in order, aggregating the outcome.
pub fn apply_blocks(
    text: &str,
    allowed_files: Option<&[String]>,
    options: ParseOptions,
) -> PatchReport {
    let mut report = PatchReport::default();
    for (i, item) in parse_blocks(text, options).enumerate() {
        let index = i + 1;
        match item {
            BlockItem::Block(block) => {
                report.record(index, &block.file, apply_edit(&block, allowed_files));
            }
            BlockItem::Malformed(message) => report.record_malformed(index, &message),
        }
    }
    report
}
