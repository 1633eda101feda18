//! Not-found hook.
//!
//! # Responsibilities
//! - Let the application answer first
//! - On `404 Not Found`, ask the resolver for a redirect
//! - Apply the redirect, or leave the original 404 untouched
//!
//! # Design Decisions
//! - Any other status passes through without touching the rule set
//! - A missing rule is expected and only logged at info level
//! - The resolver is injected; there is no global rule registry

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    Router,
};

use crate::http::request::request_context;
use crate::observability::metrics::{self, Outcome};
use crate::redirect::{RedirectResolver, RequestContext};

/// Turns application 404s into configured redirects.
#[derive(Debug, Clone)]
pub struct NotFoundHandler {
    resolver: Arc<RedirectResolver>,
    trust_forwarded_headers: bool,
}

impl NotFoundHandler {
    pub fn new(resolver: Arc<RedirectResolver>, trust_forwarded_headers: bool) -> Self {
        Self {
            resolver,
            trust_forwarded_headers,
        }
    }

    pub fn resolver(&self) -> &Arc<RedirectResolver> {
        &self.resolver
    }

    /// Wrap `router` so its 404 responses go through the resolver.
    ///
    /// Call after every route and the fallback have been added; later
    /// additions are not covered.
    pub fn wrap<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(self, redirect_not_found))
    }

    /// Resolve a not-found condition: a redirect if a rule matches,
    /// otherwise `original` unchanged.
    pub fn handle(&self, ctx: &RequestContext, request_id: &str, original: Response) -> Response {
        let started = Instant::now();

        let decision = match self.resolver.resolve(ctx) {
            Ok(decision) => decision,
            Err(e) => {
                metrics::record_resolve_duration(started);
                metrics::record_outcome(Outcome::Unmatched);
                tracing::info!(request_id = %request_id, uri = %e.uri, "{}", e);
                return original;
            }
        };

        let location = match HeaderValue::from_str(&decision.url) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    location = %decision.url,
                    error = %e,
                    "Redirect target is not a valid Location header"
                );
                metrics::record_resolve_duration(started);
                metrics::record_outcome(Outcome::Invalid);
                return original;
            }
        };

        metrics::record_redirect(decision.status.as_u16(), started);
        metrics::record_outcome(Outcome::Redirected);
        tracing::debug!(
            request_id = %request_id,
            uri = %ctx.uri,
            location = %decision.url,
            status = decision.status.as_u16(),
            "Redirecting"
        );

        let mut response = Response::new(Body::empty());
        *response.status_mut() = decision.status;
        response.headers_mut().insert(header::LOCATION, location);
        response
    }
}

/// Middleware function installed by [`NotFoundHandler::wrap`].
pub async fn redirect_not_found(
    State(handler): State<NotFoundHandler>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = request_context(&request, handler.trust_forwarded_headers);
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(request).await;
    if response.status() != StatusCode::NOT_FOUND {
        metrics::record_outcome(Outcome::Passthrough);
        return response;
    }

    handler.handle(&ctx, &request_id, response)
}
