//! Job Triage Telemetry
//!
//! Provides:
//! - Lock-free triage counters with derived escalation, fallback and
//!   referral rates
//! - A bounded, hash-chained log of call-level decisions

pub mod audit;
pub mod metrics;

pub use audit::{DecisionLog, DecisionRecord};
pub use metrics::{MetricsSnapshot, TriageMetrics};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{DecisionLog, DecisionRecord};
    pub use crate::metrics::{MetricsSnapshot, TriageMetrics};
}
