//! Output sink — where streamed agent output goes.
//!
//! The loop forwards text and reasoning deltas live; nested agent
//! invocations write through a derived child sink that visually indents.
//! Buffering and flushing are the implementation's concern.

use std::sync::Arc;

use async_trait::async_trait;

/// Rendering hint for a piece of output. Implementations may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Plain text (tool progress, prompts).
    Plain,
    /// Model output text.
    Text,
    /// Model reasoning text.
    Reasoning,
    /// A successful operation notice.
    Success,
    /// A failed operation notice.
    Failure,
    /// Dim separator/meta output.
    Separator,
}

/// Sink for live agent output.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Write a piece of output. Not required to flush.
    async fn write(&self, text: &str, style: Style);

    /// Derive a sink for a nested (child-agent) invocation. The derived sink
    /// should visually nest its output under this one.
    fn child(&self) -> Arc<dyn OutputSink>;
}

/// A sink that discards everything. Used in tests and for tools invoked
/// without a rendering surface.
pub struct NullSink;

#[async_trait]
impl OutputSink for NullSink {
    async fn write(&self, _text: &str, _style: Style) {}

    fn child(&self) -> Arc<dyn OutputSink> {
        Arc::new(NullSink)
    }
}
