//! Health check endpoints.
//!
//! - `/health/live` - the process is up
//! - `/health/ready` - the repository answers
//! - `/health` - same as ready

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Server version
    pub version: &'static str,
    /// Number of stored certificates
    pub certificates: usize,
    /// Repository could list its documents
    pub repository: bool,
}

/// Liveness probe.
#[tracing::instrument(name = "liveness_probe")]
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: lists the repository to prove it is readable.
#[tracing::instrument(name = "readiness_probe", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let repository_ok = state.repository.list(None).is_ok();

    let status = HealthStatus {
        status: if repository_ok { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        certificates: state.repository.len(),
        repository: repository_ok,
    };

    let code = if repository_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}
