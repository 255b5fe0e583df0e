//! Consuming a provider event stream.
//!
//! Shared by the agent loop and by tools that issue their own completion
//! requests (coder, commit-message generation): forward deltas to the sink
//! as they arrive, then hand back the structured terminal turn.

use std::sync::Arc;

use tokio::sync::mpsc::Receiver;

use crate::error::ProviderError;
use crate::output::{OutputSink, Style};
use crate::provider::{CompletedTurn, StreamEvent};

/// Drain a response stream, writing text/reasoning deltas live.
///
/// A stream that ends without a `Completed` event is a fatal condition for
/// the request: `ProviderError::MissingCompletion`.
pub async fn await_completion(
    mut events: Receiver<Result<StreamEvent, ProviderError>>,
    sink: &Arc<dyn OutputSink>,
    text_style: Style,
    reasoning_style: Style,
) -> Result<CompletedTurn, ProviderError> {
    let mut completed = None;

    while let Some(event) = events.recv().await {
        match event? {
            StreamEvent::TextDelta { delta } => sink.write(&delta, text_style).await,
            StreamEvent::TextDone => sink.write("\n", text_style).await,
            StreamEvent::ReasoningDelta { delta } => sink.write(&delta, reasoning_style).await,
            StreamEvent::ReasoningDone => sink.write("\n", reasoning_style).await,
            StreamEvent::Completed { turn } => completed = Some(turn),
            StreamEvent::Other => {}
        }
    }

    completed.ok_or(ProviderError::MissingCompletion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::NullSink;
    use crate::provider::OutputItem;

    fn sink() -> Arc<dyn OutputSink> {
        Arc::new(NullSink)
    }

    #[tokio::test]
    async fn returns_completed_turn() {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        tx.send(Ok(StreamEvent::TextDelta { delta: "hi".into() }))
            .await
            .unwrap();
        tx.send(Ok(StreamEvent::Completed {
            turn: CompletedTurn {
                id: "resp_1".into(),
                output: vec![OutputItem::Message { text: "hi".into() }],
            },
        }))
        .await
        .unwrap();
        drop(tx);

        let turn = await_completion(rx, &sink(), Style::Text, Style::Reasoning)
            .await
            .unwrap();
        assert_eq!(turn.id, "resp_1");
    }

    #[tokio::test]
    async fn missing_terminal_event_is_fatal() {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        tx.send(Ok(StreamEvent::TextDelta { delta: "hi".into() }))
            .await
            .unwrap();
        tx.send(Ok(StreamEvent::TextDone)).await.unwrap();
        drop(tx);

        let err = await_completion(rx, &sink(), Style::Text, Style::Reasoning)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCompletion));
    }

    #[tokio::test]
    async fn stream_error_propagates() {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        tx.send(Err(ProviderError::StreamInterrupted("cut".into())))
            .await
            .unwrap();
        drop(tx);

        let err = await_completion(rx, &sink(), Style::Text, Style::Reasoning)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::StreamInterrupted(_)));
    }
}
