//! Shared Key authorization for the Blob service.
//!
//! See "Authorize with Shared Key" in the Azure Storage REST reference. The
//! string-to-sign is the verb, twelve standard header slots, the canonicalized
//! `x-ms-*` headers and the canonicalized resource, newline separated.

use crate::error::BlobError;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use sha2::Sha256;
use std::collections::BTreeMap;

/// Build the Shared Key string-to-sign for a request.
///
/// `content_length` is passed separately because the HTTP client only fills
/// in the header when the request is sent; a zero length signs as empty.
pub fn string_to_sign(
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    content_length: usize,
    account: &str,
) -> String {
    let header = |name: &str| header_value(headers, name);
    let content_length = if content_length == 0 {
        String::new()
    } else {
        content_length.to_string()
    };

    let slots = [
        method.as_str(),
        header("content-encoding"),
        header("content-language"),
        content_length.as_str(),
        header("content-md5"),
        header("content-type"),
        header("date"),
        header("if-modified-since"),
        header("if-match"),
        header("if-none-match"),
        header("if-unmodified-since"),
        header("range"),
    ];

    let mut out = String::new();
    for slot in slots {
        out.push_str(slot);
        out.push('\n');
    }
    out.push_str(&canonicalized_headers(headers));
    out.push_str(&canonicalized_resource(url, account));
    out
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn canonicalized_headers(headers: &HeaderMap) -> String {
    let mut ms_headers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        if name.starts_with("x-ms-") {
            if let Ok(value) = value.to_str() {
                ms_headers.entry(name).or_default().push(value.trim());
            }
        }
    }

    ms_headers
        .into_iter()
        .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
        .collect()
}

fn canonicalized_resource(url: &Url, account: &str) -> String {
    let mut resource = format!("/{}{}", account, url.path());

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        params
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into_owned());
    }

    for (name, mut values) in params {
        values.sort();
        resource.push('\n');
        resource.push_str(&name);
        resource.push(':');
        resource.push_str(&values.join(","));
    }

    resource
}

/// HMAC-SHA256 the string-to-sign with the account key, base64 encoded.
pub fn sign(key: &[u8], string_to_sign: &str) -> Result<String, BlobError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| BlobError::InvalidAccountKey(e.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Value of the `Authorization` header for a signed request.
pub fn authorization(account: &str, signature: &str) -> String {
    format!("SharedKey {}:{}", account, signature)
}
