use serde::Deserialize;

/// Instructions used when tools are available to the model
pub const DEFAULT_TOOLS_PROMPT: &str = "You are a helpful assistant for the European Environment Agency (EEA) \
that helps users explore the EEA SDI Catalogue of geospatial metadata.

You have access to tools that can search the catalogue, browse tags, regions, and get detailed \
information about datasets. Use these tools whenever users ask about environmental data, datasets, \
or the catalogue.

When presenting search results or information from the catalogue, be conversational and helpful. \
Summarize the information in a user-friendly way.";

/// Instructions used when the tool server is unreachable
pub const DEFAULT_PLAIN_PROMPT: &str = "You are a helpful assistant for the European Environment Agency (EEA) \
that helps users with questions about environmental data and the EEA SDI Catalogue of geospatial metadata.

The catalogue tools are currently unavailable, so you cannot search the catalogue or look up records. \
Answer from general knowledge, say so when you are unsure, and suggest that the user try a catalogue \
search again later.";

/// Conversation behaviour
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// System prompt when tools are offered to the model
    #[serde(default = "default_tools_prompt")]
    pub tools_prompt: String,
    /// System prompt in degraded mode
    #[serde(default = "default_plain_prompt")]
    pub plain_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            tools_prompt: default_tools_prompt(),
            plain_prompt: default_plain_prompt(),
        }
    }
}

fn default_tools_prompt() -> String {
    DEFAULT_TOOLS_PROMPT.to_owned()
}

fn default_plain_prompt() -> String {
    DEFAULT_PLAIN_PROMPT.to_owned()
}
