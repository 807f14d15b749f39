use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("AI service is not configured: {0}")]
    Configuration(String),

    #[error("AI provider authentication failed: {0}")]
    Authentication(String),

    #[error("AI provider rate limit reached: {0}")]
    RateLimited(String),

    #[error("AI provider unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("AI provider timed out: {0}")]
    Timeout(String),

    #[error("AI response could not be parsed: {0}")]
    InvalidResponseFormat(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Configuration(msg) => AppError::Configuration(msg),
            LlmError::Authentication(msg) => AppError::Authentication(msg),
            LlmError::RateLimited(msg) => AppError::RateLimited(msg),
            LlmError::ServiceUnavailable { status } => {
                AppError::ServiceUnavailable(format!("provider returned {status}"))
            }
            LlmError::Timeout(after) => AppError::Timeout(format!("no response after {after:?}")),
            e @ (LlmError::InvalidResponseFormat { .. } | LlmError::EmptyContent) => {
                AppError::InvalidResponseFormat(e.to_string())
            }
            e @ (LlmError::Http(_) | LlmError::Api { .. }) => AppError::Llm(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Configuration(msg) => {
                tracing::error!("AI configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    "AI service is not configured. Please contact the administrator.".to_string(),
                )
            }
            AppError::Authentication(msg) => {
                tracing::error!("AI provider authentication failed: {msg}");
                (
                    StatusCode::UNAUTHORIZED,
                    "AI_AUTHENTICATION_ERROR",
                    "AI service credentials were rejected. Please check the API key configuration."
                        .to_string(),
                )
            }
            AppError::RateLimited(msg) => {
                tracing::warn!("AI provider rate limit: {msg}");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    "AI service rate limit reached. Please try again shortly.".to_string(),
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("AI provider unavailable: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SERVICE_UNAVAILABLE",
                    "AI service is temporarily unavailable. Please try again later.".to_string(),
                )
            }
            AppError::Timeout(msg) => {
                tracing::error!("AI provider timeout: {msg}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "TIMEOUT",
                    "The AI service is taking too long to respond. Please try again.".to_string(),
                )
            }
            AppError::InvalidResponseFormat(msg) => {
                tracing::error!("Invalid AI response: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "INVALID_RESPONSE_FORMAT",
                    "The AI service returned an unexpected response. Please try again.".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status_of(e: impl Into<AppError>) -> StatusCode {
        e.into().into_response().status()
    }

    #[test]
    fn test_llm_errors_map_to_provider_statuses() {
        assert_eq!(
            status_of(LlmError::Authentication("bad".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(LlmError::RateLimited("slow".into())),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(LlmError::ServiceUnavailable { status: 503 }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(LlmError::Timeout(Duration::from_secs(60))),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(LlmError::Configuration("no key".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_is_bad_request() {
        assert_eq!(
            status_of(AppError::Validation("jobid is required".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::NotFound("job".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_format_does_not_leak_raw_output() {
        let raw = "SECRET RAW MODEL OUTPUT {";
        let source = serde_json::from_str::<serde_json::Value>(raw).unwrap_err();
        let err: AppError = LlmError::InvalidResponseFormat {
            raw: raw.to_string(),
            source,
        }
        .into();
        assert!(!err.to_string().contains("SECRET"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
