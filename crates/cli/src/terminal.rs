//! Terminal output sink.
//!
//! Nested agent output is indented with a `┃ ` gutter per depth level,
//! inserted at the start of every line. Styles map to ANSI escapes.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use patchloom_core::output::{OutputSink, Style};

const GUTTER: &str = "┃ ";
const RESET: &str = "\x1b[0m";

fn style_code(style: Style) -> &'static str {
    match style {
        Style::Plain | Style::Text => "",
        Style::Reasoning | Style::Separator => "\x1b[2m",
        Style::Success => "\x1b[1;32m",
        Style::Failure => "\x1b[1;31m",
    }
}

/// Insert `prefix` at every line start. `at_line_start` carries the
/// partial-line state across calls, since deltas arrive mid-line.
fn indent(prefix: &str, at_line_start: &mut bool, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if *at_line_start && ch != '\n' {
            out.push_str(prefix);
        }
        *at_line_start = ch == '\n';
        out.push(ch);
    }
    out
}

pub struct TerminalSink {
    prefix: String,
    depth: usize,
    at_line_start: Mutex<bool>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::with_depth(0)
    }

    fn with_depth(depth: usize) -> Self {
        Self {
            prefix: GUTTER.repeat(depth),
            depth,
            at_line_start: Mutex::new(true),
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputSink for TerminalSink {
    async fn write(&self, text: &str, style: Style) {
        let rendered = {
            let mut at_line_start = self.at_line_start.lock().unwrap();
            indent(&self.prefix, &mut at_line_start, text)
        };

        let code = style_code(style);
        let mut stdout = std::io::stdout().lock();
        let _ = if code.is_empty() {
            write!(stdout, "{rendered}")
        } else {
            write!(stdout, "{code}{rendered}{RESET}")
        };
        let _ = stdout.flush();
    }

    fn child(&self) -> Arc<dyn OutputSink> {
        Arc::new(Self::with_depth(self.depth + 1))
    }
}
