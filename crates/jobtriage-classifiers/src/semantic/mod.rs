//! Semantic classifier (Tier 2)
//!
//! A language-model judgment used only when the lexical tier is inconclusive.
//! Backends implement [`SemanticClassifier`]; [`tier2_llm_classify`] wraps any
//! backend with a deadline and a cancellation token and turns every failure
//! into `None` so the caller keeps its Tier 1 result.

mod openai;
pub mod parsing;

pub use openai::OpenAiCompatibleClassifier;

use async_trait::async_trait;
use jobtriage_core::{
    ClassificationResult, ClassificationTier, Error, RecommendedRoute, Result, TrafficLight,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Confidence reported for a well-formed verdict that carries no certainty
pub const WELL_FORMED_CONFIDENCE: u8 = 85;

/// Trait for language-model backends
#[async_trait]
pub trait SemanticClassifier: Send + Sync {
    /// Judge a single job description
    async fn judge(&self, description: &str) -> Result<SemanticVerdict>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Validated model judgment for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticVerdict {
    pub traffic_light: TrafficLight,
    pub recommended_route: RecommendedRoute,
    /// Complexity on a 0-10 scale
    pub complexity_score: u8,
    pub needs_specialist: bool,
    pub reasoning: String,
    /// Model-reported certainty (0-100), if any
    pub certainty: Option<u8>,
}

impl SemanticVerdict {
    /// Convert into a Tier 2 classification result.
    ///
    /// A specialist requirement always refers, and a referral is always red.
    /// A light and route that disagree are settled on the more cautious of
    /// the two: green only quotes instantly, amber needs at least a video and
    /// red at least a visit.
    pub fn into_result(self) -> ClassificationResult {
        let refer = self.needs_specialist || self.recommended_route == RecommendedRoute::Refer;
        let (traffic_light, recommended_route) = if refer {
            (TrafficLight::Red, RecommendedRoute::Refer)
        } else {
            reconcile(self.traffic_light, self.recommended_route)
        };

        ClassificationResult {
            traffic_light,
            recommended_route,
            confidence: self.certainty.unwrap_or(WELL_FORMED_CONFIDENCE).min(100),
            tier: ClassificationTier::Semantic,
            signals: Vec::new(),
            complexity_score: Some(self.complexity_score.min(10)),
            needs_specialist: refer,
            reasoning: Some(self.reasoning),
            needs_review: false,
        }
    }
}

/// Align a light with a route the way the call aggregator reads them
fn reconcile(light: TrafficLight, route: RecommendedRoute) -> (TrafficLight, RecommendedRoute) {
    match (light, route) {
        (_, RecommendedRoute::Refer) => (TrafficLight::Red, RecommendedRoute::Refer),
        (TrafficLight::Green, RecommendedRoute::Instant) => (light, route),
        (TrafficLight::Amber, RecommendedRoute::Instant) => (light, RecommendedRoute::Video),
        (TrafficLight::Green | TrafficLight::Amber, _) => (TrafficLight::Amber, route),
        (TrafficLight::Red, RecommendedRoute::Instant | RecommendedRoute::Video) => {
            (TrafficLight::Red, RecommendedRoute::Visit)
        }
        (TrafficLight::Red, RecommendedRoute::Visit) => (light, route),
    }
}

/// Run a backend under a deadline, abandoning it if `cancel` fires first
pub(crate) async fn judge_with_deadline(
    classifier: &dyn SemanticClassifier,
    description: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<SemanticVerdict> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;

        _ = cancel.cancelled() => Err(Error::Cancelled),
        outcome = tokio::time::timeout(timeout, classifier.judge(description)) => match outcome {
            Ok(verdict) => verdict,
            Err(_) => Err(Error::Timeout),
        },
    }
}

/// How a Tier 2 attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Tier2Attempt {
    Answered(ClassificationResult),
    Unavailable,
    Cancelled,
}

/// Ask a backend once and log any failure. Every Tier 2 caller goes through
/// here, so fallback behaviour is decided in one place.
pub(crate) async fn attempt_tier2(
    classifier: &dyn SemanticClassifier,
    description: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Tier2Attempt {
    match judge_with_deadline(classifier, description, timeout, cancel).await {
        Ok(verdict) => Tier2Attempt::Answered(verdict.into_result()),
        Err(Error::Cancelled) => {
            debug!(backend = classifier.name(), "Tier 2 cancelled, keeping Tier 1 result");
            Tier2Attempt::Cancelled
        }
        Err(e) => {
            warn!(
                backend = classifier.name(),
                error = %e,
                "Tier 2 unavailable, keeping Tier 1 result"
            );
            Tier2Attempt::Unavailable
        }
    }
}

/// Ask a semantic backend to classify a description.
///
/// Returns `None` on transport errors, malformed output, timeout or
/// cancellation. No retries are attempted.
pub async fn tier2_llm_classify(
    classifier: &dyn SemanticClassifier,
    description: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Option<ClassificationResult> {
    match attempt_tier2(classifier, description, timeout, cancel).await {
        Tier2Attempt::Answered(result) => Some(result),
        Tier2Attempt::Unavailable | Tier2Attempt::Cancelled => None,
    }
}
