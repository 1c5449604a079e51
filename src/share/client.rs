//! HTTP client for a write-once JSON blob store.
//!
//! Speaks the jsonblob.com protocol, which the bundled `serve` command also
//! implements:
//! - `POST {blob_url}` stores a JSON body and answers with a `Location` header
//!   whose last path segment is the blob id
//! - `GET {blob_url}/{id}` returns the stored JSON

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use thiserror::Error;

/// Public blob store used when nothing else is configured.
pub const DEFAULT_BLOB_URL: &str = "https://jsonblob.com/api/jsonBlob";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob store answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Blob store did not return a usable Location header")]
    MissingLocation,

    #[error("Invalid blob id: {0}")]
    InvalidId(String),
}

/// Client for the blob store that backs short share links.
#[derive(Debug, Clone)]
pub struct BlobStoreClient {
    blob_url: String,
    client: Client,
}

impl BlobStoreClient {
    pub fn new(blob_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self {
            blob_url: blob_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn blob_url(&self) -> &str {
        &self.blob_url
    }

    /// Store `json` and return the id of the new blob.
    pub async fn create(&self, json: String) -> Result<String, ClientError> {
        let response = self
            .client
            .post(&self.blob_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(json)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ClientError::MissingLocation)?;
        let id = location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| is_valid_id(id))
            .ok_or(ClientError::MissingLocation)?;

        tracing::debug!(blob_id = id, "stored share payload");
        Ok(id.to_string())
    }

    /// Fetch the JSON stored under `id`.
    pub async fn fetch(&self, id: &str) -> Result<String, ClientError> {
        if !is_valid_id(id) {
            return Err(ClientError::InvalidId(id.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/{}", self.blob_url, id))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.text().await?)
        } else if status == StatusCode::NOT_FOUND {
            Err(ClientError::NotFound(id.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ClientError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Blob ids end up in a URL path, so only allow a conservative alphabet.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
