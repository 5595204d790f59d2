//! SendGrid v3 mail-send client.

mod client;
mod error;
mod types;

pub use client::{SendGridClient, DEFAULT_BASE_URL};
pub use error::MailError;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(mock_server: &MockServer) -> SendGridClient {
        SendGridClient::new("test-api-key", mock_server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn test_message() -> EmailMessage {
        EmailMessage {
            from: "noreply@example.com".into(),
            to: "events@example.com".into(),
            subject: "Event Registration: Jane Doe".into(),
            text: "plain".into(),
            html: "<p>html</p>".into(),
        }
    }

    #[tokio::test]
    async fn test_send_success() {
        let mock_server = MockServer::start().await;

        let expected_body = serde_json::json!({
            "personalizations": [{"to": [{"email": "events@example.com"}]}],
            "from": {"email": "noreply@example.com"},
            "subject": "Event Registration: Jane Doe",
            "content": [
                {"type": "text/plain", "value": "plain"},
                {"type": "text/html", "value": "<p>html</p>"}
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(body_json(&expected_body))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let result = client.send(&test_message()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_api_error_keeps_body() {
        let mock_server = MockServer::start().await;

        let error_body =
            r#"{"errors":[{"message":"The from address does not match a verified Sender Identity."}]}"#;

        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(400).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.send(&test_message()).await.unwrap_err();

        assert!(matches!(err, MailError::Api { status: 400, .. }));
        assert_eq!(err.detail(), error_body);
    }

    #[tokio::test]
    async fn test_send_unauthorized() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.send(&test_message()).await.unwrap_err();

        assert!(matches!(err, MailError::Unauthorized(_)));
        // Empty body falls back to the error description
        assert_eq!(err.detail(), "Authentication failed");
    }

    #[tokio::test]
    async fn test_send_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3/mail/send"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let err = client.send(&test_message()).await.unwrap_err();
        assert!(matches!(err, MailError::RateLimit));
        assert_eq!(err.detail(), "Rate limit exceeded");
    }

    #[test]
    fn test_request_serialization_orders_content() {
        let request = MailSendRequest::from(&test_message());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["content"][0]["type"], "text/plain");
        assert_eq!(json["content"][1]["type"], "text/html");
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "events@example.com");
    }
}
