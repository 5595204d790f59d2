//! SendGrid client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Authentication failed")]
    Unauthorized(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl MailError {
    /// Provider-supplied detail, suitable for surfacing to callers.
    ///
    /// For API errors this is the raw response body, which SendGrid fills
    /// with a JSON `errors` array.
    pub fn detail(&self) -> String {
        match self {
            MailError::Api { message, .. } | MailError::Unauthorized(message)
                if !message.is_empty() =>
            {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}
