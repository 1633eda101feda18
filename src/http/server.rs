//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the application routes (health, admin)
//! - Install the not-found hook around them
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve plain HTTP or TLS
//! - Swap in new rule sets on config reload

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::get, Extension, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::RedirectorConfig;
use crate::http::not_found::NotFoundHandler;
use crate::http::request::SecureConnection;
use crate::observability::metrics;
use crate::redirect::{RedirectResolver, RuleConfigError, RuleSet};

/// How long in-flight TLS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP server for the redirector.
pub struct HttpServer {
    router: Router,
    config: RedirectorConfig,
    resolver: Arc<RedirectResolver>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if any redirect rule is invalid; a partial rule set never serves.
    pub fn new(config: RedirectorConfig) -> Result<Self, RuleConfigError> {
        let rules = RuleSet::from_config(&config.redirect.rules)?;
        tracing::info!(rules = rules.len(), "Redirect rules compiled");
        metrics::set_rule_count(rules.len());

        let resolver = Arc::new(RedirectResolver::new(rules));
        let router = Self::build_router(&config, resolver.clone());

        Ok(Self {
            router,
            config,
            resolver,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RedirectorConfig, resolver: Arc<RedirectResolver>) -> Router {
        let mut app = Router::new().route("/healthz", get(healthz));

        if config.admin.enabled {
            app = app.merge(setup_admin_router(AdminState {
                resolver: resolver.clone(),
                api_key: Arc::from(config.admin.api_key.as_str()),
            }));
        }

        let app = app.fallback(not_found);

        NotFoundHandler::new(resolver, config.redirect.trust_forwarded_headers)
            .wrap(app)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting plain HTTP connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RedirectorConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        spawn_reloader(self.resolver.clone(), config_updates);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS on `addr`. Every request is marked secure.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        config_updates: mpsc::UnboundedReceiver<RedirectorConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        tracing::info!(address = %addr, "HTTPS server starting");

        spawn_reloader(self.resolver.clone(), config_updates);

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.layer(Extension(SecureConnection));
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RedirectorConfig {
        &self.config
    }

    /// The resolver serving this server's requests.
    pub fn resolver(&self) -> &Arc<RedirectResolver> {
        &self.resolver
    }
}

/// Apply reloaded configurations to the live resolver.
///
/// Only the rule set is reloaded; listener and middleware settings need a restart.
fn spawn_reloader(
    resolver: Arc<RedirectResolver>,
    mut config_updates: mpsc::UnboundedReceiver<RedirectorConfig>,
) {
    tokio::spawn(async move {
        while let Some(config) = config_updates.recv().await {
            match RuleSet::from_config(&config.redirect.rules) {
                Ok(rules) => {
                    tracing::info!(rules = rules.len(), "Redirect rules reloaded");
                    metrics::set_rule_count(rules.len());
                    resolver.replace_rules(rules);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Rejected reloaded rules. Keeping current rule set.");
                }
            }
        }
    });
}

async fn healthz() -> &'static str {
    "ok"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use crate::redirect::{RuleRecord, RulesConfig};

    fn config() -> RedirectorConfig {
        let mut config = RedirectorConfig::default();
        config.redirect.rules = RulesConfig::List(vec![RuleRecord::new("/.*old/", "/new")]);
        config
    }

    fn request(path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header("Host", "domain.com")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_invalid_rules_fail_construction() {
        let mut config = RedirectorConfig::default();
        config.redirect.rules = RulesConfig::List(vec![RuleRecord::new("/(bad/", "/new")]);

        assert!(HttpServer::new(config).is_err());
    }

    #[tokio::test]
    async fn test_health_route_is_served() {
        let server = HttpServer::new(config()).unwrap();
        let response = server.router.oneshot(request("/healthz")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_redirected() {
        let server = HttpServer::new(config()).unwrap();
        let response = server.router.oneshot(request("/old/page")).await.unwrap();

        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "http://domain.com/new");
    }

    #[tokio::test]
    async fn test_secure_marker_switches_scheme() {
        let server = HttpServer::new(config()).unwrap();
        let app = server.router.layer(Extension(SecureConnection));
        let response = app.oneshot(request("/old/page")).await.unwrap();

        assert_eq!(response.headers()[header::LOCATION], "https://domain.com/new");
    }

    #[tokio::test]
    async fn test_admin_routes_only_when_enabled() {
        let server = HttpServer::new(config()).unwrap();
        let response = server.router.oneshot(request("/admin/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let mut config = config();
        config.admin.enabled = true;
        config.admin.api_key = "k".into();
        let server = HttpServer::new(config).unwrap();
        let response = server.router.oneshot(request("/admin/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
