//! CSV row formatting for the registration record.

use crate::registration::Registration;
use chrono::{DateTime, SecondsFormat, Utc};

/// First line of every record.
pub const HEADER: &str = "Timestamp,Full Name,Email,Phone,Company\n";

/// Quote a field unconditionally, doubling embedded quotes.
pub fn escape_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-18T09:30:00.000Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One newline-terminated row: timestamp then each registration field.
pub fn format_row(timestamp: &DateTime<Utc>, registration: &Registration) -> String {
    let fields = [
        format_timestamp(timestamp),
        registration.full_name.clone(),
        registration.email.clone(),
        registration.phone.clone(),
        registration.company.clone().unwrap_or_default(),
    ];

    let mut row = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

/// Append a row to existing record content.
///
/// Content written by other tools may lack a trailing newline; one is
/// inserted so the new row never merges into the previous line.
pub fn append_row(existing: &str, row: &str) -> String {
    let mut content = String::with_capacity(existing.len() + row.len() + 1);
    content.push_str(existing);
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(row);
    content
}
