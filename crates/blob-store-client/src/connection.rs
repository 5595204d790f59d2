//! Azure Storage connection string parsing.

use crate::error::BlobError;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;
use tracing::debug;

/// Well-known Azurite development account.
const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// How requests to the Blob service are authorized.
#[derive(Clone)]
pub enum Credentials {
    /// Shared Key signing with the decoded account key.
    SharedKey { account: String, key: Vec<u8> },
    /// Pre-issued shared access signature query string.
    Sas(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::SharedKey { account, .. } => f
                .debug_struct("SharedKey")
                .field("account", account)
                .field("key", &"[REDACTED]")
                .finish(),
            Credentials::Sas(_) => f.write_str("Sas([REDACTED])"),
        }
    }
}

/// Parsed storage connection string.
#[derive(Debug, Clone)]
pub struct ConnectionString {
    /// Blob service endpoint without a trailing slash
    pub blob_endpoint: String,
    pub credentials: Credentials,
}

impl ConnectionString {
    /// Parse a `Key=Value;Key=Value` connection string.
    ///
    /// Recognizes `AccountName`, `AccountKey`, `DefaultEndpointsProtocol`,
    /// `EndpointSuffix`, `BlobEndpoint`, `SharedAccessSignature` and
    /// `UseDevelopmentStorage=true`. Values may themselves contain `=`.
    pub fn parse(raw: &str) -> Result<Self, BlobError> {
        let mut account_name: Option<String> = None;
        let mut account_key: Option<String> = None;
        let mut protocol: Option<String> = None;
        let mut endpoint_suffix: Option<String> = None;
        let mut blob_endpoint: Option<String> = None;
        let mut sas: Option<String> = None;
        let mut development = false;

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                BlobError::InvalidConnectionString("segment without '=' separator".into())
            })?;
            let value = value.trim().to_string();

            match key.trim() {
                "AccountName" => account_name = Some(value),
                "AccountKey" => account_key = Some(value),
                "DefaultEndpointsProtocol" => protocol = Some(value),
                "EndpointSuffix" => endpoint_suffix = Some(value),
                "BlobEndpoint" => blob_endpoint = Some(value),
                "SharedAccessSignature" => sas = Some(value),
                "UseDevelopmentStorage" => development = value.eq_ignore_ascii_case("true"),
                other => debug!(key = other, "Ignoring connection string key"),
            }
        }

        if development {
            account_name.get_or_insert_with(|| DEV_ACCOUNT_NAME.into());
            account_key.get_or_insert_with(|| DEV_ACCOUNT_KEY.into());
            blob_endpoint.get_or_insert_with(|| DEV_BLOB_ENDPOINT.into());
        }

        let blob_endpoint = match (blob_endpoint, &account_name) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!(
                "{}://{}.blob.{}",
                protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL),
                account,
                endpoint_suffix.as_deref().unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
            ),
            (None, None) => {
                return Err(BlobError::InvalidConnectionString(
                    "missing AccountName or BlobEndpoint".into(),
                ))
            }
        };

        let credentials = match (account_name, account_key, sas) {
            (Some(account), Some(key), _) => {
                let key = STANDARD
                    .decode(key.as_bytes())
                    .map_err(|e| BlobError::InvalidAccountKey(e.to_string()))?;
                Credentials::SharedKey { account, key }
            }
            (_, _, Some(token)) => Credentials::Sas(token.trim_start_matches('?').to_string()),
            _ => {
                return Err(BlobError::InvalidConnectionString(
                    "missing AccountName/AccountKey or SharedAccessSignature".into(),
                ))
            }
        };

        Ok(Self {
            blob_endpoint: blob_endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }
}
