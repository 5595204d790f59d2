//! Registration notification emails.

use crate::config::EmailConfig;
use crate::error::NotifyError;
use crate::recorder::csv::format_timestamp;
use crate::registration::Registration;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sendgrid_client::{EmailMessage, SendGridClient};
use tracing::{info, instrument, warn};

/// Shown in place of an optional field that was left blank.
pub const NOT_PROVIDED: &str = "Not provided";

/// Sends one email per registration to the operations mailbox.
pub struct Notifier {
    client: SendGridClient,
    from: String,
    to: String,
}

impl Notifier {
    pub fn new(client: SendGridClient, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            client,
            from: from.into(),
            to: to.into(),
        }
    }

    /// Build a notifier from configuration; `Ok(None)` without an API key.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, NotifyError> {
        let Some(api_key) = &config.api_key else {
            warn!("Email API key not configured; notifications will fail");
            return Ok(None);
        };

        let client = SendGridClient::new(
            api_key.expose_secret().as_str(),
            config.base_url.as_str(),
            config.timeout,
        )?;
        info!(from = %config.from, to = %config.to, "Email notifications enabled");

        Ok(Some(Self::new(client, &config.from, &config.to)))
    }

    /// Compose the notification for a registration received at `received_at`.
    pub fn compose(&self, registration: &Registration, received_at: DateTime<Utc>) -> EmailMessage {
        let company = registration.company.as_deref().unwrap_or(NOT_PROVIDED);
        let received = format_timestamp(&received_at);

        let text = format!(
            "New event registration received:\n\n\
             Full Name: {}\n\
             Email: {}\n\
             Phone: {}\n\
             Company: {}\n\n\
             Timestamp: {}",
            registration.full_name, registration.email, registration.phone, company, received
        );

        let html = format!(
            "<h2>New Event Registration</h2>\n\
             <p><strong>Full Name:</strong> {}</p>\n\
             <p><strong>Email:</strong> {}</p>\n\
             <p><strong>Phone:</strong> {}</p>\n\
             <p><strong>Company:</strong> {}</p>\n\
             <p><em>Received: {}</em></p>\n",
            escape_html(&registration.full_name),
            escape_html(&registration.email),
            escape_html(&registration.phone),
            escape_html(company),
            received
        );

        EmailMessage {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: format!("Event Registration: {}", registration.full_name),
            text,
            html,
        }
    }

    /// Send the notification, stamped with the current time.
    #[instrument(skip_all)]
    pub async fn notify(&self, registration: &Registration) -> Result<(), NotifyError> {
        let message = self.compose(registration, Utc::now());
        self.client.send(&message).await?;
        info!("Registration email sent");
        Ok(())
    }
}

/// Escape text for inclusion in HTML element content.
fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn test_notifier() -> Notifier {
        let client =
            SendGridClient::new("test-key", "http://localhost:9999", Duration::from_secs(1))
                .unwrap();
        Notifier::new(client, "noreply@example.com", "events@example.com")
    }

    fn jane() -> Registration {
        Registration {
            full_name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            phone: "555-1234".into(),
            company: Some("Acme".into()),
        }
    }

    #[test]
    fn test_compose_lists_every_field() {
        let received = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
        let message = test_notifier().compose(&jane(), received);

        assert_eq!(message.from, "noreply@example.com");
        assert_eq!(message.to, "events@example.com");
        assert_eq!(message.subject, "Event Registration: Jane Doe");
        assert_eq!(
            message.text,
            "New event registration received:\n\nFull Name: Jane Doe\nEmail: jane@x.com\n\
             Phone: 555-1234\nCompany: Acme\n\nTimestamp: 2026-10-18T09:30:00.000Z"
        );
        assert!(message.html.contains("<p><strong>Company:</strong> Acme</p>"));
        assert!(message.html.contains("Received: 2026-10-18T09:30:00.000Z"));
    }

    #[test]
    fn test_compose_missing_company_placeholder() {
        let registration = Registration {
            company: None,
            ..jane()
        };
        let message = test_notifier().compose(&registration, Utc::now());

        assert!(message.text.contains("Company: Not provided"));
        assert!(message.html.contains("<strong>Company:</strong> Not provided"));
    }

    #[test]
    fn test_compose_escapes_html() {
        let registration = Registration {
            full_name: "<script>alert('x')</script> & Co".into(),
            ..jane()
        };
        let message = test_notifier().compose(&registration, Utc::now());

        assert!(message
            .html
            .contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; Co"));
        assert!(!message.html.contains("<script>"));
        // Plain text keeps the submitted value
        assert!(message.text.contains("<script>"));
    }

    #[test]
    fn test_from_config_without_api_key() {
        let config = EmailConfig::default();
        assert!(Notifier::from_config(&config).unwrap().is_none());
    }
}
