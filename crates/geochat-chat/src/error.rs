use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use geochat_core::HttpError;
use geochat_llm::LlmError;
use thiserror::Error;

/// Errors that end a chat turn before any content is streamed
#[derive(Debug, Error)]
pub enum ChatError {
    /// Client sent a malformed or empty conversation
    #[error("{0}")]
    InvalidRequest(String),

    /// The model provider could not produce the first response
    #[error(transparent)]
    ModelProvider(#[from] LlmError),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError for ChatError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ModelProvider(e) => e.status_code(),
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::ModelProvider(e) => e.error_type(),
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::InvalidRequest(message) => message.clone(),
            Self::ModelProvider(e) => e.client_message(),
            Self::Internal(_) => "an internal error occurred".to_owned(),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.error_body())).into_response()
    }
}
