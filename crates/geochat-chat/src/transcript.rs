//! Message history threaded through one chat turn

use geochat_llm::Message;

/// Ordered messages of one turn, extended by value so each step yields a new transcript
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new(messages: Vec<Message>) -> Self {
        Self(messages)
    }

    /// This transcript followed by `message`
    #[must_use]
    pub fn with(mut self, message: Message) -> Self {
        self.0.push(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.0
    }
}
