//! Error types for the registration service.

use crate::registration::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use blob_store_client::BlobError;
use sendgrid_client::MailError;
use serde::Serialize;
use thiserror::Error;

/// Failure writing the CSV record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Storage is not configured")]
    NotConfigured,

    #[error("{0}")]
    Blob(#[from] BlobError),

    #[error("CSV record was modified concurrently on {attempts} consecutive attempts")]
    Contended { attempts: u32 },
}

/// Failure sending the notification email.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Email delivery is not configured")]
    NotConfigured,

    #[error("{0}")]
    Mail(#[from] MailError),
}

impl NotifyError {
    /// Detail reported to the caller; provider body when there is one.
    pub fn detail(&self) -> String {
        match self {
            NotifyError::Mail(e) => e.detail(),
            other => other.to_string(),
        }
    }
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON body")]
    InvalidJson(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to save registration data")]
    Storage(#[from] RecordError),

    #[error("Registration saved but email notification failed")]
    Notification(#[from] NotifyError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match &self {
            ServiceError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED", None)
            }
            ServiceError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "INVALID_JSON", None),
            ServiceError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", None)
            }
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", None),
            ServiceError::Storage(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                Some(e.to_string()),
            ),
            ServiceError::Notification(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOTIFICATION_FAILED",
                Some(e.detail()),
            ),
            ServiceError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: ServiceError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let (status, json) = body_json(ValidationError::InvalidEmail.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid email address");
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert!(json.get("detail").is_none());
    }

    #[tokio::test]
    async fn test_storage_error_response_has_detail() {
        let (status, json) = body_json(RecordError::NotConfigured.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to save registration data");
        assert_eq!(json["detail"], "Storage is not configured");
    }

    #[tokio::test]
    async fn test_notification_error_uses_provider_body() {
        let mail = MailError::Api {
            status: 400,
            message: r#"{"errors":[{"message":"bad sender"}]}"#.into(),
        };
        let (status, json) = body_json(NotifyError::Mail(mail).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Registration saved but email notification failed");
        assert_eq!(json["code"], "NOTIFICATION_FAILED");
        assert_eq!(json["detail"], r#"{"errors":[{"message":"bad sender"}]}"#);
    }

    #[tokio::test]
    async fn test_method_not_allowed_response() {
        let (status, json) = body_json(ServiceError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json["error"], "Method not allowed");
    }
}
