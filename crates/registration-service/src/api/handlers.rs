//! HTTP request handlers.

use super::types::{HealthResponse, SubmitResponse};
use super::AppState;
use crate::error::{NotifyError, RecordError, ServiceError};
use crate::registration::{Submission, ValidationError};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        storage_configured: state.recorder.is_some(),
        email_configured: state.notifier.is_some(),
    })
}

/// Accept a registration: validate, append to the CSV record, then notify.
///
/// The body is read as raw bytes so malformed or oversized bodies get our own
/// error body instead of the extractor's rejection.
pub async fn submit(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<SubmitResponse>, ServiceError> {
    let body = body.map_err(|rejection| {
        warn!(status = %rejection.status(), "Could not read submission body");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServiceError::PayloadTooLarge
        } else {
            ServiceError::InvalidJson(rejection.body_text())
        }
    })?;

    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "Rejected malformed submission body");
        ServiceError::InvalidJson(e.to_string())
    })?;
    if !value.is_object() {
        debug!("Rejected non-object submission body");
        return Err(ServiceError::InvalidJson("expected a JSON object".into()));
    }

    // Well-formed JSON whose fields cannot be read as text is a validation failure
    let submission: Submission = serde_json::from_value(value).map_err(|e| {
        warn!(error = %e, "Submission field has an unsupported type");
        ValidationError::InvalidFieldType
    })?;

    let registration = submission.validate().map_err(|e| {
        warn!(error = %e, "Submission failed validation");
        e
    })?;
    info!(full_name = %registration.full_name, "Registration received");

    let recorder = state.recorder.as_deref().ok_or_else(|| {
        error!("Storage is not configured, cannot save registration");
        RecordError::NotConfigured
    })?;
    if let Err(e) = recorder.append(&registration).await {
        error!(error = %e, "Failed to save registration");
        return Err(e.into());
    }

    let notifier = state.notifier.as_deref().ok_or_else(|| {
        error!("Registration saved but email delivery is not configured");
        NotifyError::NotConfigured
    })?;
    if let Err(e) = notifier.notify(&registration).await {
        error!(error = %e, "Registration saved but notification failed");
        return Err(e.into());
    }

    info!(full_name = %registration.full_name, "Registration complete");
    Ok(Json(SubmitResponse::submitted()))
}

/// Any method other than POST on the submission route.
pub async fn method_not_allowed() -> ServiceError {
    ServiceError::MethodNotAllowed
}
