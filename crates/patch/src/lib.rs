//! # Patchloom Patch
//!
//! The edit-block engine: parses a search/replace block language out of
//! free-form model output and applies the edits to files on disk.
//!
//! The block language is line-oriented:
//!
//! ```text
//! ./src/main.rs
//! <<<<<<< SEARCH
//! old code
//! =======
//! new code
//! >>>>>>> REPLACE
//! ```
//!
//! The last non-empty line before the opening marker names the target file.
//! Parsing never throws: each parsed item is either a well-formed block or a
//! diagnostic, so the coder tool and the edit_file filter consume the same
//! restartable sequence.

pub mod apply;
pub mod block;

pub use apply::{apply_blocks, apply_edit, LineDelta, PatchReport};
pub use block::{parse_blocks, BlockItem, EditBlock, EditBlocks, ParseOptions};
