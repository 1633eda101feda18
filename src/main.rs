//! Not-found redirector.
//!
//! Serves a health route and, optionally, a small admin API. Every request the
//! application cannot route is matched against the configured redirect rules.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ listener (HTTP / TLS)
//!                       → request id, tracing, timeout
//!                       → application routes ──▶ 2xx/4xx/5xx response
//!                       → fallback 404
//!                           → not-found hook
//!                               → RedirectResolver (first matching rule)
//!     ◀────────────── 301/302/307… + Location, or the original 404
//! ```

use std::path::PathBuf;

use clap::Parser;

use redirector::config::{load_config, RedirectorConfig};
use redirector::lifecycle::startup;
use redirector::observability::logging;

#[derive(Parser)]
#[command(name = "redirector")]
#[command(about = "Redirect requests that match no route, driven by pattern rules", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload redirect rules when the configuration file changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RedirectorConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!("redirector v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        rules = config.redirect.rules.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config, cli.config.as_deref(), cli.watch).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
