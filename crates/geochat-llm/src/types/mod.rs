//! Internal canonical types for LLM request/response representation
//!
//! These types are provider-agnostic; the wire format converts to and from them.

pub mod message;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{FunctionCall, Message, Role, ToolCall};
pub use request::{CompletionParams, CompletionRequest};
pub use response::{Choice, ChoiceMessage, CompletionResponse, FinishReason, Usage};
pub use stream::{StreamDelta, StreamEvent};
pub use tool::{FunctionDefinition, ToolChoice, ToolDefinition};
