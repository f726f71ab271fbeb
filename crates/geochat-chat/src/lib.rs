//! Conversation handling for geochat
//!
//! One chat turn: compose the prompt, let the model pick tools, run them in
//! order, and stream the model's final answer back to the browser.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod relay;
pub mod routes;
mod transcript;

pub use error::ChatError;
pub use orchestrator::ConversationOrchestrator;
pub use relay::{ChunkStream, StreamChunk};
pub use routes::chat_router;
