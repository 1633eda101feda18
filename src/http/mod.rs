//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → application routes (health, admin) or fallback 404
//!     → not_found.rs (404 → request.rs context → resolver → redirect)
//!     → Send to client
//! ```

pub mod not_found;
pub mod request;
pub mod server;

pub use not_found::NotFoundHandler;
pub use request::{request_context, SecureConnection};
pub use server::HttpServer;
