//! # Certificate Studio Server Library
//!
//! Persistence service for certificate documents and an HTTP client that
//! editor sessions use to talk to it. This library is used by both the
//! binary and integration tests.
//!
//! ## Routes
//!
//! ```text
//! GET  /api/certificates?name=   summaries, newest first
//! GET  /api/certificates/default built-in template
//! POST /api/certificates/save    store a document
//! GET  /api/certificates/load?id= one document
//! GET  /health[/live|/ready]     probes
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub mod client;
pub mod config;
pub mod health;
pub mod repository;
pub mod routes;

pub use client::{ClientError, HttpRepository};
pub use config::{CliArgs, ServerConfig};
pub use repository::{
    default_certificate, CertificateRepository, FileRepository, MemoryRepository,
    RepositoryError, RepositoryResult,
};
pub use routes::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Certificate storage.
    pub repository: Arc<dyn CertificateRepository>,
}

impl AppState {
    /// Wrap a repository.
    #[must_use]
    pub fn new(repository: impl CertificateRepository + 'static) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }
}

/// Router with every API and health route, without middleware.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/api/certificates", get(routes::list_certificates))
        .route(
            "/api/certificates/default",
            get(routes::default_certificate_handler),
        )
        .route("/api/certificates/save", post(routes::save_certificate))
        .route("/api/certificates/load", get(routes::load_certificate))
        .with_state(state)
}

/// CORS layer allowing `origin`, or any origin when `None`.
///
/// Credentials are only allowed for an explicit origin.
#[must_use]
pub fn build_cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => layer.allow_origin(origin).allow_credentials(true),
        None => layer.allow_origin(Any),
    }
}

/// Server library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
