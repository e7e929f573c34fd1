pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod notifiers;
pub mod scrapers;

use tracing_subscriber::EnvFilter;

/// Timestamped log lines on stdout, `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
