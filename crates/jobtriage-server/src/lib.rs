//! Job Triage Server
//!
//! HTTP surface over the two-tier job classifier: per-job and per-call
//! classification, Prometheus metrics, triage stats and the call decision log.

pub mod config;
pub mod routes;
pub mod state;

pub use config::{AuditConfig, Overrides, ServerConfig};
pub use routes::create_router;
pub use state::AppState;
