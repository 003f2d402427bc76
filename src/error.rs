//! Domain error types for Fabric Studio.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Storage (S3) operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generative service rejected the call with a rate limit
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Generative service credits are exhausted
    #[error("AI credits exhausted. Please add funds.")]
    QuotaExhausted,

    /// Source asset was deleted while generation was in flight.
    /// The image may already have been uploaded.
    #[error("The source image was removed while content was being generated. Please re-upload and retry.")]
    SourceRemoved { generated_image_url: Option<String> },

    /// Insert referenced a row that no longer exists (foreign key violation)
    #[error("Referenced row no longer exists: {0}")]
    ReferenceViolation(String),

    /// Generative or audio service failed in a way the caller cannot act on
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// Image generation produced no usable image after retrying
    #[error("{0}")]
    GenerationFailed(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Storage(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::GenerationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
            AppError::SourceRemoved { .. } | AppError::ReferenceViolation(_) => {
                StatusCode::CONFLICT
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message) = match self {
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Storage(err_str) => {
                tracing::error!("Storage error: {}", err_str);
                ("STORAGE_ERROR", "Failed to store generated asset".to_string())
            }
            AppError::Upstream(err_str) => {
                tracing::error!("Upstream error: {}", err_str);
                (
                    "UPSTREAM_ERROR",
                    "The generation service failed. Please try again.".to_string(),
                )
            }
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            AppError::InvalidInput(_) => ("INVALID_INPUT", self.to_string()),
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string()),
            AppError::RateLimited => ("RATE_LIMITED", self.to_string()),
            AppError::QuotaExhausted => ("QUOTA_EXHAUSTED", self.to_string()),
            AppError::SourceRemoved { .. } => ("SOURCE_REMOVED", self.to_string()),
            AppError::ReferenceViolation(_) => ("SOURCE_REMOVED", self.to_string()),
            AppError::GenerationFailed(_) => ("GENERATION_FAILED", self.to_string()),
        };

        let generated_image_url = match self {
            AppError::SourceRemoved {
                generated_image_url,
            } => generated_image_url.clone(),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
            partial_success: generated_image_url.as_ref().map(|_| true),
            generated_image_url,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Set when the image was produced even though the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            partial_success: None,
            generated_image_url: None,
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes_for_upstream_categories() {
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::QuotaExhausted.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            AppError::SourceRemoved {
                generated_image_url: None
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidInput("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_rt::test]
    async fn test_source_removed_body_carries_image_url() {
        let err = AppError::SourceRemoved {
            generated_image_url: Some("https://cdn.example/a.png".to_string()),
        };
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "SOURCE_REMOVED");
        assert_eq!(json["partialSuccess"], true);
        assert_eq!(json["generatedImageUrl"], "https://cdn.example/a.png");
    }

    #[actix_rt::test]
    async fn test_upstream_body_hides_detail() {
        let err = AppError::Upstream("status 500: {\"secret\": \"raw\"}".to_string());
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret"));
        assert!(text.contains("UPSTREAM_ERROR"));
    }
}
