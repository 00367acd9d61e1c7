//! API route handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cert_core::{current_timestamp_ms, Document, DocumentSummary};
use serde::Deserialize;

use crate::repository::{default_certificate, RepositoryError};
use crate::AppState;

/// Error returned by API handlers, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request (400).
    #[error("{0}")]
    BadRequest(String),
    /// Unknown certificate (404).
    #[error("{0}")]
    NotFound(String),
    /// Storage failure (500).
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Invalid(msg) => Self::BadRequest(msg),
            RepositoryError::NotFound(_) => Self::NotFound("Certificate not found".to_string()),
            other => {
                tracing::warn!("Repository failure: {other}");
                Self::Internal(format!("Database error: {other}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Query for the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive name substring.
    pub name: Option<String>,
}

/// Query for the load endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct LoadQuery {
    /// Certificate id.
    pub id: Option<String>,
}

/// `GET /api/certificates`
#[tracing::instrument(name = "list_certificates", skip(state))]
pub async fn list_certificates(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DocumentSummary>>, ApiError> {
    let summaries = state.repository.list(query.name.as_deref())?;
    tracing::debug!("Listing {} certificates", summaries.len());
    Ok(Json(summaries))
}

/// `GET /api/certificates/default`
pub async fn default_certificate_handler() -> Json<Document> {
    Json(default_certificate(current_timestamp_ms()))
}

/// `POST /api/certificates/save`
#[tracing::instrument(name = "save_certificate", skip(state, document), fields(name = %document.name))]
pub async fn save_certificate(
    State(state): State<AppState>,
    Json(document): Json<Document>,
) -> Result<Json<Document>, ApiError> {
    let stored = state.repository.save(document)?;
    tracing::info!("Saved certificate {:?}", stored.id);
    Ok(Json(stored))
}

/// `GET /api/certificates/load?id=`
#[tracing::instrument(name = "load_certificate", skip(state))]
pub async fn load_certificate(
    State(state): State<AppState>,
    Query(query): Query<LoadQuery>,
) -> Result<Json<Document>, ApiError> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("ID parameter is required".to_string()))?;
    Ok(Json(state.repository.get(&id)?))
}
