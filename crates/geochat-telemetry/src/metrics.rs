//! Instruments recorded over a chat turn

use std::time::Instant;

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

pub const CHAT_TURN_COUNT: &str = "chat.turn.count";
pub const LLM_DISPATCH_DURATION: &str = "llm.dispatch.duration";
pub const MCP_TOOL_CALL_COUNT: &str = "mcp.tool_call.count";
pub const MCP_TOOL_CALL_DURATION: &str = "mcp.tool_call.duration";

/// Handles to every instrument the service records
///
/// Instruments come from the global meter, so they are no-ops until
/// [`crate::init`] installs an exporting provider.
#[derive(Clone)]
pub struct ChatMetrics {
    turns: Counter<u64>,
    dispatch_duration: Histogram<f64>,
    tool_calls: Counter<u64>,
    tool_call_duration: Histogram<f64>,
}

impl ChatMetrics {
    pub fn new() -> Self {
        let meter = global::meter("geochat");

        Self {
            turns: meter
                .u64_counter(CHAT_TURN_COUNT)
                .with_description("Chat turns handled, by outcome")
                .build(),
            dispatch_duration: meter
                .f64_histogram(LLM_DISPATCH_DURATION)
                .with_unit("s")
                .with_description("Time until a model dispatch returned or opened its stream")
                .build(),
            tool_calls: meter
                .u64_counter(MCP_TOOL_CALL_COUNT)
                .with_description("Tool invocations, by tool and outcome")
                .build(),
            tool_call_duration: meter
                .f64_histogram(MCP_TOOL_CALL_DURATION)
                .with_unit("s")
                .build(),
        }
    }

    /// Count one turn; `outcome` is `tools`, `direct`, or `failed`
    pub fn record_turn(&self, outcome: &'static str) {
        self.turns.add(1, &[KeyValue::new("outcome", outcome)]);
    }

    /// Record how long a dispatch took; `phase` is `probe` or `synthesis`
    pub fn record_dispatch(&self, phase: &'static str, start: Instant) {
        self.dispatch_duration
            .record(start.elapsed().as_secs_f64(), &[KeyValue::new("phase", phase)]);
    }

    pub fn record_tool_call(&self, tool: &str, start: Instant, is_error: bool) {
        let attributes = [KeyValue::new("tool", tool.to_owned()), KeyValue::new("error", is_error)];

        self.tool_calls.add(1, &attributes);
        self.tool_call_duration.record(start.elapsed().as_secs_f64(), &attributes);
    }
}

impl Default for ChatMetrics {
    fn default() -> Self {
        Self::new()
    }
}
