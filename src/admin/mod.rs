//! Read-only admin API.
//!
//! - `GET /admin/status`: version and active rule count
//! - `GET /admin/rules`: the active rule set, in matching order
//!
//! Every endpoint requires `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::redirect::RedirectResolver;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub resolver: Arc<RedirectResolver>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/rules", get(get_rules))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
