//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS handshake, via axum-server)
//!     → Hand off to HTTP layer, marked secure when TLS was used
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled transparently
//! - Certificate problems are startup errors, never per-connection surprises

pub mod tls;
