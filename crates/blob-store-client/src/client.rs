//! Blob service HTTP client.

use crate::connection::{ConnectionString, Credentials};
use crate::error::BlobError;
use crate::signing;
use crate::types::{BlobText, WriteCondition};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, ETAG};
use reqwest::{Client, Method, Response, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// REST API version sent with every request.
pub const API_VERSION: &str = "2021-08-06";

/// Content type used for uploaded text records.
const TEXT_CSV: &str = "text/csv; charset=utf-8";

const ERROR_CODE_HEADER: &str = "x-ms-error-code";

/// Client for a single storage account's Blob service.
#[derive(Clone, Debug)]
pub struct BlobClient {
    client: Client,
    endpoint: String,
    credentials: Credentials,
}

impl BlobClient {
    /// Create a client from a parsed connection string.
    pub fn new(connection: ConnectionString, timeout: Duration) -> Result<Self, BlobError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: connection.blob_endpoint,
            credentials: connection.credentials,
        })
    }

    /// Create a client from a raw connection string.
    pub fn from_connection_string(raw: &str, timeout: Duration) -> Result<Self, BlobError> {
        Self::new(ConnectionString::parse(raw)?, timeout)
    }

    /// Blob service endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Create a container unless it already exists.
    ///
    /// Returns `true` when the container was created by this call.
    #[instrument(skip(self))]
    pub async fn create_container_if_not_exists(&self, container: &str) -> Result<bool, BlobError> {
        let url = format!("{}/{}?restype=container", self.endpoint, encode(container));
        let response = self
            .send(Method::PUT, &url, HeaderMap::new(), Some(Vec::new()))
            .await?;

        match response.status() {
            StatusCode::CREATED => {
                debug!(container, "Container created");
                Ok(true)
            }
            StatusCode::CONFLICT if error_code(&response) == Some("ContainerAlreadyExists") => {
                Ok(false)
            }
            _ => Err(extract_error(response).await),
        }
    }

    /// Download a blob as UTF-8 text.
    ///
    /// A missing blob (or container) yields [`BlobError::NotFound`].
    #[instrument(skip(self))]
    pub async fn download_text(&self, container: &str, blob: &str) -> Result<BlobText, BlobError> {
        let url = self.blob_url(container, blob);
        let response = self.send(Method::GET, &url, HeaderMap::new(), None).await?;

        match response.status() {
            status if status.is_success() => {
                let etag = header_string(&response, ETAG);
                let content = response.text().await?;
                debug!(bytes = content.len(), ?etag, "Downloaded blob");
                Ok(BlobText { content, etag })
            }
            StatusCode::NOT_FOUND => Err(BlobError::NotFound {
                container: container.to_string(),
                blob: blob.to_string(),
            }),
            _ => Err(extract_error(response).await),
        }
    }

    /// Upload text as a block blob, replacing any existing content.
    ///
    /// Returns the new entity tag. A failed [`WriteCondition`] yields
    /// [`BlobError::PreconditionFailed`].
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn upload_text(
        &self,
        container: &str,
        blob: &str,
        content: &str,
        condition: WriteCondition,
    ) -> Result<Option<String>, BlobError> {
        let url = self.blob_url(container, blob);

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-ms-blob-type"),
            HeaderValue::from_static("BlockBlob"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CSV));
        match &condition {
            WriteCondition::Unconditional => {}
            WriteCondition::IfMatch(etag) => {
                headers.insert(reqwest::header::IF_MATCH, header_value(etag)?);
            }
            WriteCondition::IfNotExists => {
                headers.insert(reqwest::header::IF_NONE_MATCH, HeaderValue::from_static("*"));
            }
        }

        let response = self
            .send(Method::PUT, &url, headers, Some(content.as_bytes().to_vec()))
            .await?;

        match response.status() {
            status if status.is_success() => {
                let etag = header_string(&response, ETAG);
                debug!(?etag, "Uploaded blob");
                Ok(etag)
            }
            StatusCode::PRECONDITION_FAILED => Err(BlobError::PreconditionFailed),
            StatusCode::CONFLICT if error_code(&response) == Some("BlobAlreadyExists") => {
                Err(BlobError::PreconditionFailed)
            }
            _ => Err(extract_error(response).await),
        }
    }

    fn blob_url(&self, container: &str, blob: &str) -> String {
        format!("{}/{}/{}", self.endpoint, encode(container), encode(blob))
    }

    /// Stamp, authorize and send a request.
    async fn send(
        &self,
        method: Method,
        url: &str,
        mut headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Result<Response, BlobError> {
        let mut url = Url::parse(url).map_err(|e| BlobError::InvalidRequest(e.to_string()))?;

        headers.insert(
            HeaderName::from_static("x-ms-date"),
            header_value(&Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string())?,
        );
        headers.insert(
            HeaderName::from_static("x-ms-version"),
            HeaderValue::from_static(API_VERSION),
        );

        match &self.credentials {
            Credentials::SharedKey { account, key } => {
                let content_length = body.as_ref().map_or(0, Vec::len);
                let sts = signing::string_to_sign(&method, &url, &headers, content_length, account);
                let signature = signing::sign(key, &sts)?;
                headers.insert(
                    AUTHORIZATION,
                    header_value(&signing::authorization(account, &signature))?,
                );
            }
            Credentials::Sas(token) => {
                let query = match url.query() {
                    Some(existing) => format!("{}&{}", existing, token),
                    None => token.clone(),
                };
                url.set_query(Some(&query));
            }
        }

        debug!(%method, path = url.path(), "Sending storage request");

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, BlobError> {
    HeaderValue::from_str(value).map_err(|e| BlobError::InvalidRequest(e.to_string()))
}

fn header_string(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn error_code(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(ERROR_CODE_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Extract error information from a failed response.
async fn extract_error(response: Response) -> BlobError {
    let status = response.status();
    let code = error_code(&response).map(String::from);
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".into());

    warn!(status = %status, code = ?code, "Storage request failed");

    BlobError::Api {
        status: status.as_u16(),
        code,
        message,
    }
}
