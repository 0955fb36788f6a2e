use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Errors raised by the maps gateway.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MapsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Google Maps API error: {status}: {message}")]
    Provider { status: String, message: String },

    #[error("Cancelled while waiting for a rate limit permit")]
    RateLimitWaitCancelled,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Too many items in batch: {count} given, maximum {max} allowed")]
    BatchSizeExceeded { count: usize, max: usize },

    #[error("Batch failed: {failed} of {total} requests failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, MapsError>;

impl MapsError {
    /// Builds a provider error from the envelope's status and optional message.
    pub fn provider(status: impl Into<String>, message: Option<String>) -> Self {
        let status = status.into();
        let message = message.unwrap_or_else(|| status.clone());
        MapsError::Provider { status, message }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            MapsError::Provider { .. } | MapsError::BatchSizeExceeded { .. } => {
                StatusCode::BAD_REQUEST
            }
            MapsError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MapsError::Configuration(_) | MapsError::BatchFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            MapsError::Transport(_)
            | MapsError::RateLimitWaitCancelled
            | MapsError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            MapsError::Configuration(_) => "configuration_error",
            MapsError::Transport(_) => "upstream_unavailable",
            MapsError::Provider { .. } => "google_maps_api_error",
            MapsError::RateLimitWaitCancelled => "rate_limit_wait_cancelled",
            MapsError::Cancelled => "cancelled",
            MapsError::BatchSizeExceeded { .. } => "batch_size_exceeded",
            MapsError::BatchFailed { .. } => "batch_geocode_error",
            MapsError::Validation(_) => "validation_error",
        }
    }
}

impl From<reqwest::Error> for MapsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MapsError::Transport(format!("request timed out: {}", err))
        } else {
            MapsError::Transport(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for MapsError {
    fn from(err: validator::ValidationErrors) -> Self {
        MapsError::Validation(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            code,
        }
    }

    pub fn from_maps_error(err: &MapsError) -> Self {
        let message = match err {
            // The provider's own message is what callers need to see.
            MapsError::Provider { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self::new(err.code(), &message, err.status_code().as_u16())
    }
}

impl IntoResponse for MapsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match status {
            StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }
        (status, Json(ErrorResponse::from_maps_error(&self))).into_response()
    }
}
