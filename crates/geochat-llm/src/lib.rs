//! Language-model access for geochat
//!
//! A provider-agnostic completion model, the `OpenAI` chat completions wire
//! format with conversions to and from it, and the HTTP provider that
//! speaks it.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod convert;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod types;

pub use error::LlmError;
pub use provider::{Provider, ProviderStream, openai::OpenAiProvider};
pub use types::{CompletionRequest, CompletionResponse, Message, StreamEvent};
