use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Language-model provider configuration
///
/// The provider speaks the `OpenAI` chat completions protocol; `base_url`
/// points it at any compatible deployment.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model used for both dispatches of a turn
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Maximum tokens to generate per dispatch
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Timeout for the non-streaming dispatch (e.g. "60s")
    #[serde(default)]
    pub request_timeout: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_model(),
            temperature: None,
            max_tokens: None,
            request_timeout: None,
        }
    }
}

impl LlmConfig {
    /// Parsed request timeout, if one is configured
    ///
    /// # Errors
    ///
    /// Returns an error if the duration string is malformed
    pub fn request_timeout(&self) -> anyhow::Result<Option<std::time::Duration>> {
        self.request_timeout
            .as_deref()
            .map(|value| crate::parse_duration("llm.request_timeout", value))
            .transpose()
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}
