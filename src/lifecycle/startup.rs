//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order (metrics, rules, watcher)
//! - Bind the listener and begin accepting traffic
//! - Wire OS signals to graceful shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{ConfigWatcher, RedirectorConfig};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::tls::{load_tls_config, TlsError};
use crate::observability::metrics;
use crate::redirect::RuleConfigError;

/// Anything that stops the redirector from coming up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid redirect rule: {0}")]
    Rules(#[from] RuleConfigError),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error("invalid address: {0}")]
    Address(#[from] AddrParseError),

    #[error("config watcher failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Run the redirector until a shutdown signal arrives.
///
/// `watch` reloads rules from `config_path` whenever the file changes.
pub async fn run(
    config: RedirectorConfig,
    config_path: Option<&Path>,
    watch: bool,
) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let server = HttpServer::new(config.clone())?;

    let (_watcher, config_updates) = match config_path {
        Some(path) if watch => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => (None, mpsc::unbounded_channel().1),
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    match &config.listener.tls {
        Some(tls) => {
            let tls_config = load_tls_config(tls).await?;
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            server
                .run_tls(addr, tls_config, config_updates, server_shutdown)
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, config_updates, server_shutdown).await?;
        }
    }

    Ok(())
}
