//! Registration submissions and their validation.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;
use thiserror::Error;

/// Longest address accepted, per the SMTP path limit.
pub const MAX_EMAIL_LEN: usize = 254;

/// `local@domain.tld` with no whitespace and a single `@`.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Raw form submission as posted by the browser.
///
/// Numbers and booleans are accepted and kept as their text form, so a phone
/// number posted as `5551234` is the same as `"5551234"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default, deserialize_with = "scalar_text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    pub company: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
}

fn scalar_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|value| match value {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
        Scalar::Bool(flag) => flag.to_string(),
    }))
}

/// A validated, trimmed registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
}

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Full name, email, and phone number are required")]
    MissingFields,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Registration fields must be text values")]
    InvalidFieldType,
}

impl Submission {
    /// Validate and normalize into a [`Registration`].
    ///
    /// Presence is checked on trimmed values before the email format, so an
    /// all-whitespace name counts as missing.
    pub fn validate(self) -> Result<Registration, ValidationError> {
        let full_name = trimmed(self.full_name);
        let email = trimmed(self.email);
        let phone = trimmed(self.phone);
        let company = trimmed(self.company);

        let (Some(full_name), Some(email), Some(phone)) = (full_name, email, phone) else {
            return Err(ValidationError::MissingFields);
        };

        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(Registration {
            full_name,
            email,
            phone,
            company,
        })
    }
}

/// Check an already-trimmed address against the simplified pattern.
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_PATTERN.is_match(email)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str, email: &str, phone: &str, company: Option<&str>) -> Submission {
        Submission {
            full_name: Some(name.into()),
            email: Some(email.into()),
            phone: Some(phone.into()),
            company: company.map(String::from),
        }
    }

    #[test]
    fn test_valid_submission_is_trimmed() {
        let registration = submission("  Jane Doe ", " jane@x.com", "555-1234 ", Some(" Acme "))
            .validate()
            .unwrap();

        assert_eq!(
            registration,
            Registration {
                full_name: "Jane Doe".into(),
                email: "jane@x.com".into(),
                phone: "555-1234".into(),
                company: Some("Acme".into()),
            }
        );
    }

    #[test]
    fn test_company_is_optional() {
        let registration = submission("Jane Doe", "jane@x.com", "555-1234", None)
            .validate()
            .unwrap();
        assert!(registration.company.is_none());

        let blank = submission("Jane Doe", "jane@x.com", "555-1234", Some("   "))
            .validate()
            .unwrap();
        assert!(blank.company.is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let cases = [
            Submission {
                email: Some("jane@x.com".into()),
                phone: Some("555".into()),
                ..Default::default()
            },
            Submission {
                full_name: Some("Jane".into()),
                phone: Some("555".into()),
                ..Default::default()
            },
            Submission {
                full_name: Some("Jane".into()),
                email: Some("jane@x.com".into()),
                ..Default::default()
            },
            submission("   ", "jane@x.com", "555", None),
            submission("Jane", "", "555", None),
        ];

        for case in cases {
            assert_eq!(case.validate(), Err(ValidationError::MissingFields));
        }
    }

    #[test]
    fn test_missing_fields_checked_before_email_format() {
        let result = submission("", "nodomain", "555", None).validate();
        assert_eq!(result, Err(ValidationError::MissingFields));
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["nodomain", "a@b", "a b@c.d", "a@b@c.d", "@x.com", "jane@.com x"] {
            let result = submission("Jane", email, "555", None).validate();
            assert_eq!(result, Err(ValidationError::InvalidEmail), "{}", email);
        }
    }

    #[test]
    fn test_valid_emails() {
        for email in ["x@y.z", "jane.doe+events@mail.example.co.uk", "o'brien@x.ie"] {
            assert!(is_valid_email(email), "{}", email);
        }
    }

    #[test]
    fn test_overlong_email_rejected() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert!(!is_valid_email(&email));
        let result = submission("Jane", &email, "555", None).validate();
        assert_eq!(result, Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_scalar_fields_kept_as_text() {
        let json = r#"{"fullName":"Jane","email":"j@x.co","phone":5551234,"company":null}"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.phone.as_deref(), Some("5551234"));
        assert!(submission.company.is_none());

        let registration = submission.validate().unwrap();
        assert_eq!(registration.phone, "5551234");
    }

    #[test]
    fn test_structured_field_rejected() {
        let json = r#"{"fullName":{"first":"Jane"},"email":"j@x.co","phone":"1"}"#;
        assert!(serde_json::from_str::<Submission>(json).is_err());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"fullName":"Jane","email":"j@x.co","phone":"1","company":"Acme"}"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.full_name.as_deref(), Some("Jane"));
        assert_eq!(submission.company.as_deref(), Some("Acme"));
    }
}
