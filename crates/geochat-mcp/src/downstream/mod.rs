//! Connections to configured tool servers

pub mod client;
pub mod session;

pub use client::McpClient;
