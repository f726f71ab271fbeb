//! Tool-server access for geochat
//!
//! Connects to the configured tool servers, caches the tools they advertise
//! in a [`ToolRegistry`], and executes model-requested calls through a
//! [`ToolInvoker`] that turns every outcome into text for the model.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod downstream;
pub mod error;
pub mod invoker;
pub mod registry;
pub mod server;

pub use error::McpError;
pub use invoker::{ToolCallRequest, ToolCallResult, ToolInvoker};
pub use registry::{ModelFunctionSpec, ToolRegistry};
pub use server::{JsonObject, ToolDescriptor, ToolOutput, ToolServer};
