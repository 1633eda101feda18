//! Not-found redirector library.
//!
//! Turns requests the application could not route into redirects, driven by
//! an ordered list of pattern rules. The engine lives in [`redirect`]; the
//! rest wires it into an axum server.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod redirect;

pub use config::RedirectorConfig;
pub use http::{HttpServer, NotFoundHandler};
pub use lifecycle::Shutdown;
pub use redirect::{RedirectDecision, RedirectResolver, RequestContext, RuleSet};
