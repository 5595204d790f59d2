//! SendGrid HTTP client.

use crate::error::MailError;
use crate::types::{EmailMessage, MailSendRequest};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Public SendGrid API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";

/// SendGrid mail-send client.
///
/// The API key is stored using `SecretString` to prevent accidental
/// exposure in logs or debug output.
#[derive(Clone)]
pub struct SendGridClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl SendGridClient {
    /// Create a new SendGrid client.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::new(api_key.into()),
        })
    }

    /// Send one message. No batching, no retries.
    #[instrument(skip(self, message), fields(subject = %message.subject))]
    pub async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let request = MailSendRequest::from(message);

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "Mail accepted");
            return Ok(());
        }

        Err(extract_error(response).await)
    }
}

/// Extract error information from failed response.
async fn extract_error(response: reqwest::Response) -> MailError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("SendGrid rate limit exceeded");
            MailError::RateLimit
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!(%status, "SendGrid rejected credentials");
            MailError::Unauthorized(body)
        }
        _ => {
            warn!(%status, body = %body, "SendGrid send failed");
            MailError::Api {
                status: status.as_u16(),
                message: if body.is_empty() {
                    "Unknown error".into()
                } else {
                    body
                },
            }
        }
    }
}
