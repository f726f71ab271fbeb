use geochat_core::HttpError;
use http::StatusCode;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Upstream provider returned an error or could not be reached
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Upstream provider did not answer in time
    #[error("upstream request timed out")]
    Timeout,

    /// Error during streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Provider rejected the request as malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider rejected the configured credentials
    #[error("authentication with the model provider failed")]
    Unauthorized,

    /// Provider quota or rate limit exhausted
    #[error("model provider rate limit exceeded")]
    RateLimited {
        /// Seconds until the rate limit resets, when the provider says
        retry_after: Option<u64>,
    },

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Classify a non-success provider response
    pub fn from_status(status: StatusCode, message: String, retry_after: Option<u64>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { retry_after },
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::InvalidRequest(message)
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Timeout,
            _ => Self::Upstream(format!("provider returned {status}: {message}")),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Upstream(e.to_string())
        }
    }
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Upstream(_) | Self::InvalidRequest(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Streaming(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Upstream(_) => "upstream_error",
            Self::Timeout => "timeout_error",
            Self::Streaming(_) => "streaming_error",
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::Unauthorized => "authentication_error",
            Self::RateLimited { .. } => "rate_limit_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Upstream(_) | Self::InvalidRequest(_) => "the model provider returned an error".to_owned(),
            Self::Streaming(_) => "the model provider stream was interrupted".to_owned(),
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}
