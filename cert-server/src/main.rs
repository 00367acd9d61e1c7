//! # Certificate Studio Server
//!
//! Persistence service for certificate documents.
//! Binds to localhost unless `--public` is given.

use clap::Parser;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cert_server::{
    build_cors_layer, build_router, AppState, CliArgs, FileRepository, MemoryRepository,
    ServerConfig,
};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,cert_server=debug,tower_http=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cert_server=debug,tower_http=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from(CliArgs::parse());

    let state = match &config.data_dir {
        Some(dir) => {
            tracing::info!("Storing certificates in {}", dir.display());
            AppState::new(FileRepository::open(dir)?)
        }
        None => {
            tracing::warn!("No data directory configured; certificates are kept in memory");
            AppState::new(MemoryRepository::new())
        }
    };

    let app = build_router(state)
        .layer(build_cors_layer(config.allowed_origin.as_deref()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!("Certificate server starting on http://{}", config.addr);

    axum::serve(listener, app).await?;

    Ok(())
}
