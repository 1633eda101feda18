//! Request inspection.
//!
//! # Responsibilities
//! - Extract the facts the redirect engine needs (host, scheme, path, query)
//! - Decide whether a request is secure
//!
//! # Design Decisions
//! - Host is lower-cased and reported without its port
//! - `X-Forwarded-Proto` is ignored unless explicitly trusted
//! - The listener marks TLS connections with [`SecureConnection`]

use std::str::FromStr;

use axum::http::uri::Authority;
use axum::http::{header, Request};

use crate::redirect::RequestContext;

/// Header set by TLS-terminating proxies.
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Request extension marking a connection accepted by the TLS listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecureConnection;

/// Build the [`RequestContext`] for `req`.
pub fn request_context<B>(req: &Request<B>, trust_forwarded: bool) -> RequestContext {
    let secure = is_secure(req, trust_forwarded);
    let scheme = if secure { "https" } else { "http" };

    let authority = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| Authority::from_str(h).ok())
        .or_else(|| req.uri().authority().cloned());

    let host = authority
        .as_ref()
        .map(|a| a.host().to_ascii_lowercase())
        .unwrap_or_default();

    let http_host = match authority.as_ref().and_then(Authority::port_u16) {
        Some(port) if !is_default_port(scheme, port) => format!("{host}:{port}"),
        _ => host.clone(),
    };

    let path = req.uri().path().to_string();
    let request_uri = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    RequestContext {
        uri: format!("{scheme}://{http_host}{request_uri}"),
        path,
        secure,
        host,
        request_uri,
    }
}

fn is_secure<B>(req: &Request<B>, trust_forwarded: bool) -> bool {
    if req.extensions().get::<SecureConnection>().is_some() {
        return true;
    }
    if req.uri().scheme_str() == Some("https") {
        return true;
    }
    trust_forwarded
        && req
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
            .unwrap_or(false)
}

fn is_default_port(scheme: &str, port: u16) -> bool {
    matches!((scheme, port), ("http", 80) | ("https", 443))
}
