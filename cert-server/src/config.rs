//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Default port for the certificate server.
pub const DEFAULT_PORT: u16 = 8080;

/// CLI arguments for the certificate server.
#[derive(Debug, Clone, Parser)]
#[command(name = "cert-server", version, about = "Certificate Studio persistence service")]
pub struct CliArgs {
    /// Port to listen on.
    #[arg(long, env = "CERT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory for certificate JSON files. Keeps documents in memory when
    /// unset.
    #[arg(long, env = "CERT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Origin allowed by CORS; any origin when unset.
    #[arg(long, env = "CERT_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Listen on all interfaces instead of localhost.
    #[arg(long, env = "CERT_PUBLIC")]
    pub public: bool,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub addr: SocketAddr,
    /// Storage directory, if persisting to disk.
    pub data_dir: Option<PathBuf>,
    /// Allowed CORS origin.
    pub allowed_origin: Option<String>,
}

impl From<CliArgs> for ServerConfig {
    fn from(args: CliArgs) -> Self {
        let ip = if args.public {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };
        Self {
            addr: SocketAddr::new(ip, args.port),
            data_dir: args.data_dir,
            allowed_origin: args
                .allowed_origin
                .filter(|o| !o.trim().is_empty() && o != "*"),
        }
    }
}
