//! Provider stream events to client chunks

use std::pin::Pin;

use futures_util::{Stream, StreamExt, stream};
use geochat_core::HttpError;
use geochat_llm::{LlmError, ProviderStream, StreamEvent};
use serde::Serialize;

/// Sent when a turn would otherwise finish without any text
pub const FALLBACK_TEXT: &str = "I'm sorry, I couldn't produce an answer. Please try again.";

/// One increment of answer text, as the browser receives it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamChunk {
    pub content: String,
}

impl StreamChunk {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Final chunk describing a provider failure
    pub fn error(error: &LlmError) -> Self {
        Self::new(format!("Error: {}", error.client_message()))
    }

    fn fallback() -> Self {
        Self::new(FALLBACK_TEXT)
    }
}

/// Ordered answer chunks for one turn
pub type ChunkStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

struct RelayState {
    events: ProviderStream,
    emitted: bool,
    finished: bool,
}

/// Forward each non-empty text delta as soon as it arrives
///
/// Usage frames and empty deltas are dropped. A provider error ends the
/// stream with one error chunk. If nothing was emitted by the time the
/// provider finishes, a single fallback chunk is sent.
pub fn relay(events: ProviderStream) -> ChunkStream {
    let state = RelayState {
        events,
        emitted: false,
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            match state.events.next().await {
                Some(Ok(StreamEvent::Delta(delta))) => match delta.content {
                    Some(text) if !text.is_empty() => {
                        state.emitted = true;
                        return Some((StreamChunk::new(text), state));
                    }
                    _ => {}
                },
                Some(Ok(StreamEvent::Usage(usage))) => {
                    tracing::debug!(total_tokens = usage.total_tokens, "synthesis usage");
                }
                Some(Ok(StreamEvent::Done)) | None => {
                    state.finished = true;
                    return (!state.emitted).then(|| (StreamChunk::fallback(), state));
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, emitted = state.emitted, "model stream failed");
                    state.finished = true;
                    return Some((StreamChunk::error(&e), state));
                }
            }
        }
    }))
}

/// A complete answer delivered as one chunk
pub fn replay(content: Option<String>) -> ChunkStream {
    let chunk = content
        .filter(|text| !text.is_empty())
        .map_or_else(StreamChunk::fallback, StreamChunk::new);

    Box::pin(stream::iter([chunk]))
}

/// A stream holding only the error chunk for a dispatch that never opened
pub fn failure(error: &LlmError) -> ChunkStream {
    Box::pin(stream::iter([StreamChunk::error(error)]))
}
