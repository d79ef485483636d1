//! Job Triage Core
//!
//! Types and error handling shared across the job triage crates.
//!
//! This crate provides:
//! - The per-job data model: job inputs, traffic lights, routes and
//!   classification results
//! - The call-level recommendation type produced by aggregation
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    ClassificationResult, ClassificationTier, JobDescription, JobInput, OverallRecommendation,
    RecommendedRoute, TrafficLight,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{
        ClassificationResult, ClassificationTier, JobDescription, JobInput,
        OverallRecommendation, RecommendedRoute, TrafficLight,
    };
}
