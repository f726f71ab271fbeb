//! Provider trait and implementations for LLM backends

pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::LlmError;
use crate::types::{CompletionRequest, CompletionResponse, StreamEvent};

/// Incremental output of a streaming completion
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Trait implemented by each LLM provider backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Send a non-streaming completion request
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Send a streaming completion request
    ///
    /// Errors returned here mean the stream never opened; errors inside the
    /// stream arrive after some events may already have been yielded.
    async fn complete_stream(&self, request: &CompletionRequest) -> Result<ProviderStream, LlmError>;
}
