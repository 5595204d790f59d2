//! Request types for the SendGrid v3 mail-send API.

use serde::Serialize;

/// A single email with plain-text and HTML alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// `POST /v3/mail/send` request body.
#[derive(Debug, Serialize)]
pub struct MailSendRequest {
    pub personalizations: Vec<Personalization>,
    pub from: EmailAddress,
    pub subject: String,
    pub content: Vec<Content>,
}

#[derive(Debug, Serialize)]
pub struct Personalization {
    pub to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
pub struct EmailAddress {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub content_type: String,
    pub value: String,
}

impl From<&EmailMessage> for MailSendRequest {
    fn from(message: &EmailMessage) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: message.to.clone(),
                }],
            }],
            from: EmailAddress {
                email: message.from.clone(),
            },
            subject: message.subject.clone(),
            // SendGrid requires text/plain to precede text/html
            content: vec![
                Content {
                    content_type: "text/plain".into(),
                    value: message.text.clone(),
                },
                Content {
                    content_type: "text/html".into(),
                    value: message.html.clone(),
                },
            ],
        }
    }
}
