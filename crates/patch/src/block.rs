//! The edit-block scanner.
//!
//! A three-state line machine: outside a block, capturing search lines,
//! capturing replace lines. Marker lines are matched after trimming, so
//! indented or trailing-whitespace markers still count.

/// Opening marker: begins search capture.
const MARKER_SEARCH: &str = "<<<<<<< SEARCH";
/// Separator: switches from search to replace capture.
const MARKER_DIVIDE: &str = "=======";
/// Closing marker: ends the block.
const MARKER_REPLACE: &str = ">>>>>>> REPLACE";

/// One parsed search/replace unit targeting one file.
///
/// `search` and `replace` are the interior lines newline-joined and
/// newline-terminated. An empty search section comes out as `"\n"`; callers
/// treat blank search text as a file-creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBlock {
    /// Target file path, taken from the last non-empty line preceding the
    /// opening marker.
    pub file: String,
    pub search: String,
    pub replace: String,
}

impl EditBlock {
    /// Whether this block creates a file rather than editing one.
    pub fn is_creation(&self) -> bool {
        self.search.trim().is_empty()
    }
}

/// One item in the parsed sequence: a well-formed block or a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockItem {
    Block(EditBlock),
    Malformed(String),
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Diagnose unified-diff header lines (`--- `/`+++ `) between blocks as
    /// malformed input instead of treating them as filename candidates.
    /// The edit_file filter enables this in diff mode.
    pub reject_diff_headers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InSearch,
    InReplace,
}

/// A restartable iterator over the edit blocks in a piece of text.
pub struct EditBlocks<'a> {
    lines: std::str::Lines<'a>,
    options: ParseOptions,
    state: State,
    file: String,
    search: Vec<&'a str>,
    replace: Vec<&'a str>,
    finished: bool,
}

impl<'a> EditBlocks<'a> {
    pub fn new(text: &'a str, options: ParseOptions) -> Self {
        Self {
            lines: text.lines(),
            options,
            state: State::Outside,
            file: String::new(),
            search: Vec::new(),
            replace: Vec::new(),
            finished: false,
        }
    }

    fn take_block(&mut self) -> EditBlock {
        let mut search = self.search.join("\n");
        search.push('\n');
        let mut replace = self.replace.join("\n");
        replace.push('\n');
        self.search.clear();
        self.replace.clear();
        EditBlock {
            file: std::mem::take(&mut self.file),
            search,
            replace,
        }
    }
}

impl<'a> Iterator for EditBlocks<'a> {
    type Item = BlockItem;

    fn next(&mut self) -> Option<BlockItem> {
        if self.finished {
            return None;
        }

        for line in self.lines.by_ref() {
            let trimmed = line.trim();
            match self.state {
                State::Outside => {
                    if trimmed == MARKER_SEARCH {
                        self.state = State::InSearch;
                    } else if self.options.reject_diff_headers
                        && (trimmed.starts_with("--- ") || trimmed.starts_with("+++ "))
                    {
                        return Some(BlockItem::Malformed(format!(
                            "unexpected unified-diff header \"{trimmed}\"; use search/replace blocks with the file path on its own line"
                        )));
                    } else if !trimmed.is_empty() {
                        // last non-empty line before the opener names the file
                        self.file = trimmed.to_string();
                    }
                }
                State::InSearch => {
                    if trimmed == MARKER_DIVIDE {
                        self.state = State::InReplace;
                    } else {
                        self.search.push(line);
                    }
                }
                State::InReplace => {
                    if trimmed == MARKER_REPLACE {
                        self.state = State::Outside;
                        return Some(BlockItem::Block(self.take_block()));
                    } else {
                        self.replace.push(line);
                    }
                }
            }
        }

        self.finished = true;
        if self.state != State::Outside {
            // block left open at end of input: an error, never a partial block
            return Some(BlockItem::Malformed(
                "unterminated edit block at end of output".into(),
            ));
        }
        None
    }
}

/// Convenience wrapper over [`EditBlocks`].
pub fn parse_blocks(text: &str, options: ParseOptions) -> EditBlocks<'_> {
    EditBlocks::new(text, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(text: &str) -> Vec<BlockItem> {
        parse_blocks(text, ParseOptions::default()).collect()
    }

    #[test]
    fn single_block() {
        let text = "\
./src/main.rs
<<<<<<< SEARCH
old line
=======
new line
>>>>>>> REPLACE
";
        let items = blocks(text);
        assert_eq!(items.len(), 1);
        let BlockItem::Block(block) = &items[0] else {
            panic!("expected block, got {:?}", items[0]);
        };
        assert_eq!(block.file, "./src/main.rs");
        assert_eq!(block.search, "old line\n");
        assert_eq!(block.replace, "new line\n");
    }

    #[test]
    fn multiple_blocks_in_appearance_order() {
        let text = "\
./a.rs
<<<<<<< SEARCH
alpha
=======
ALPHA
>>>>>>> REPLACE

some commentary between blocks

./b.rs
<<<<<<< SEARCH
beta
=======
BETA
>>>>>>> REPLACE
";
        let items = blocks(text);
        assert_eq!(items.len(), 2);
        let files: Vec<_> = items
            .iter()
            .map(|i| match i {
                BlockItem::Block(b) => b.file.as_str(),
                BlockItem::Malformed(_) => panic!("unexpected diagnostic"),
            })
            .collect();
        assert_eq!(files, vec!["./a.rs", "./b.rs"]);
    }

    #[test]
    fn last_nonempty_line_wins_as_filename() {
        let text = "\
Here is the edit you asked for.
./real.rs
<<<<<<< SEARCH
x
=======
y
>>>>>>> REPLACE
";
        let items = blocks(text);
        let BlockItem::Block(block) = &items[0] else {
            panic!()
        };
        assert_eq!(block.file, "./real.rs");
    }

    #[test]
    fn multiline_sections_newline_terminated() {
        let text = "\
./f.rs
<<<<<<< SEARCH
line one
line two
=======
line A
line B
line C
>>>>>>> REPLACE
";
        let items = blocks(text);
        let BlockItem::Block(block) = &items[0] else {
            panic!()
        };
        assert_eq!(block.search, "line one\nline two\n");
        assert_eq!(block.replace, "line A\nline B\nline C\n");
    }

    #[test]
    fn empty_search_section_marks_creation() {
        let text = "\
./new.rs
<<<<<<< SEARCH
=======
fn main() {}
>>>>>>> REPLACE
";
        let items = blocks(text);
        let BlockItem::Block(block) = &items[0] else {
            panic!()
        };
        assert!(block.is_creation());
        assert_eq!(block.replace, "fn main() {}\n");
    }

    #[test]
    fn markers_matched_after_trimming() {
        let text = "./f.rs\n  <<<<<<< SEARCH  \nx\n =======\ny\n >>>>>>> REPLACE \n";
        let items = blocks(text);
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], BlockItem::Block(_)));
    }

    #[test]
    fn unterminated_block_is_one_diagnostic_no_partial() {
        let text = "\
./f.rs
<<<<<<< SEARCH
dangling
=======
never closed
";
        let items = blocks(text);
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], BlockItem::Malformed(_)));
    }

    #[test]
    fn unterminated_after_complete_block() {
        let text = "\
./a.rs
<<<<<<< SEARCH
x
=======
y
>>>>>>> REPLACE
./b.rs
<<<<<<< SEARCH
stuck
";
        let items = blocks(text);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], BlockItem::Block(_)));
        assert!(matches!(items[1], BlockItem::Malformed(_)));
    }

    #[test]
    fn no_markers_yields_nothing() {
        assert!(blocks("just some prose\nwith lines\n").is_empty());
    }

    #[test]
    fn diff_headers_rejected_when_enabled() {
        let text = "\
--- a/src/main.rs
+++ b/src/main.rs
<<<<<<< SEARCH
x
=======
y
>>>>>>> REPLACE
";
        let items: Vec<_> = parse_blocks(
            text,
            ParseOptions {
                reject_diff_headers: true,
            },
        )
        .collect();
        assert!(matches!(items[0], BlockItem::Malformed(_)));
        assert!(matches!(items[1], BlockItem::Malformed(_)));
        // the block itself still parses, attributed to no file
        assert!(matches!(items[2], BlockItem::Block(_)));
    }

    #[test]
    fn diff_headers_are_filenames_when_disabled() {
        let text = "\
+++ b/src/main.rs
<<<<<<< SEARCH
x
=======
y
>>>>>>> REPLACE
";
        let items = blocks(text);
        let BlockItem::Block(block) = &items[0] else {
            panic!()
        };
        assert_eq!(block.file, "+++ b/src/main.rs");
    }

    #[test]
    fn separator_inside_replace_is_content() {
        // once in replace capture, a second ======= is plain content
        let text = "\
./f.rs
<<<<<<< SEARCH
x
=======
y
=======
z
>>>>>>> REPLACE
";
        let items = blocks(text);
        let BlockItem::Block(block) = &items[0] else {
            panic!()
        };
        assert_eq!(block.replace, "y\n=======\nz\n");
    }
}
