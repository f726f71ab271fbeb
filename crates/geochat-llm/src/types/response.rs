use serde::{Deserialize, Serialize};

use super::message::{Message, ToolCall};

/// Reason the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of generation
    Stop,
    /// Hit the `max_tokens` limit
    Length,
    /// Model decided to call a tool
    ToolCalls,
    /// Content was filtered by safety systems
    ContentFilter,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice
    pub index: u32,
    /// Generated message
    pub message: ChoiceMessage,
    /// Why generation stopped
    pub finish_reason: Option<FinishReason>,
}

/// Assistant output within a response choice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Text content
    pub content: Option<String>,
    /// Tool calls requested by the model, in the order issued
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

impl From<ChoiceMessage> for Message {
    fn from(message: ChoiceMessage) -> Self {
        Self::Assistant {
            content: message.content,
            tool_calls: message.tool_calls,
        }
    }
}

/// Internal canonical completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Unique response identifier
    pub id: String,
    /// Model used for generation
    pub model: String,
    /// Generated choices
    pub choices: Vec<Choice>,
    /// Token usage statistics
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Take the first choice's message, or an empty one when the model returned no choices
    pub fn into_message(self) -> ChoiceMessage {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .unwrap_or_default()
    }
}
