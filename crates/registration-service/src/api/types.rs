//! API response types.

use serde::Serialize;

/// Message returned for an accepted registration.
pub const SUBMITTED_MESSAGE: &str = "Registration submitted successfully";

/// Response after a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
}

impl SubmitResponse {
    pub fn submitted() -> Self {
        Self {
            success: true,
            message: SUBMITTED_MESSAGE.to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// A storage connection is configured (or the record is in-memory)
    pub storage_configured: bool,
    pub email_configured: bool,
}
