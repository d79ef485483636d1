//! Job Triage Policy
//!
//! Call-level decisions built on per-job classifications:
//! - Aggregation of a call's jobs into one recommended route
//! - Mapping from a route to the action offered to the call handler

pub mod action;
pub mod aggregate;

pub use action::CallAction;
pub use aggregate::get_overall_route_recommendation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::CallAction;
    pub use crate::aggregate::get_overall_route_recommendation;
}
