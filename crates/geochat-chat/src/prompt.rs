//! System instructions prepended to every turn

use geochat_config::ChatConfig;
use geochat_llm::Message;

use crate::transcript::Transcript;

/// The two instruction sets; which one applies depends on tool availability
#[derive(Debug, Clone)]
pub struct SystemPrompts {
    tools: String,
    plain: String,
}

impl SystemPrompts {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            tools: config.tools_prompt.clone(),
            plain: config.plain_prompt.clone(),
        }
    }

    /// Instructions for the current mode
    pub fn select(&self, tools_ready: bool) -> &str {
        if tools_ready { &self.tools } else { &self.plain }
    }

    /// Prepend the system message to the caller's history
    pub(crate) fn compose(&self, tools_ready: bool, history: Vec<Message>) -> Transcript {
        history
            .into_iter()
            .fold(Transcript::new(vec![Message::system(self.select(tools_ready))]), Transcript::with)
    }
}
