//! HTTP client for the certificate API.
//!
//! [`HttpRepository`] lets an [`cert_core::EditorSession`] load and save
//! through a running server.

use async_trait::async_trait;
use cert_core::{Document, DocumentRepository, DocumentSummary, EditorError, EditorResult};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

/// Errors that can occur when talking to the certificate server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL provided by configuration is invalid.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with an error status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: StatusCode,
        /// Error message from the body, if any.
        message: String,
    },
}

impl From<ClientError> for EditorError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, message } if status == StatusCode::NOT_FOUND => {
                Self::NotFound(message)
            }
            ClientError::Status { status, message } if status == StatusCode::BAD_REQUEST => {
                Self::Validation(message)
            }
            other => Self::Persistence(other.to_string()),
        }
    }
}

/// [`DocumentRepository`] backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpRepository {
    http: Client,
    base: Url,
}

impl HttpRepository {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:8080`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed.
    /// Returns [`ClientError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        let mut base =
            Url::parse(base_url.as_ref()).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(concat!("cert-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .query(query)
            .send()
            .await?;
        decode(response).await
    }
}

/// Turn an error status into [`ClientError::Status`], otherwise parse JSON.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);
    tracing::warn!("Certificate server returned {status}: {message}");
    Err(ClientError::Status { status, message })
}

#[async_trait]
impl DocumentRepository for HttpRepository {
    async fn list(&self) -> EditorResult<Vec<DocumentSummary>> {
        Ok(self.get_json("api/certificates", &[]).await?)
    }

    async fn load_default(&self) -> EditorResult<Document> {
        Ok(self.get_json("api/certificates/default", &[]).await?)
    }

    async fn load(&self, id: &str) -> EditorResult<Document> {
        Ok(self.get_json("api/certificates/load", &[("id", id)]).await?)
    }

    async fn save(&self, document: Document) -> EditorResult<Document> {
        let response = self
            .http
            .post(self.endpoint("api/certificates/save")?)
            .json(&document)
            .send()
            .await
            .map_err(ClientError::from)?;
        Ok(decode(response).await?)
    }
}
