//! Mock semantic classifiers for testing
//!
//! Configurable implementations of the SemanticClassifier trait for testing
//! escalation, fallback and batch concurrency without a network.

#![allow(dead_code)]

use async_trait::async_trait;
use jobtriage_classifiers::{SemanticClassifier, SemanticVerdict};
use jobtriage_core::{Error, RecommendedRoute, Result, TrafficLight};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// A semantic classifier that returns a fixed verdict
pub struct MockSemanticClassifier {
    name: String,
    verdict: SemanticVerdict,
    simulated_latency: Option<Duration>,
    call_count: AtomicU32,
}

impl MockSemanticClassifier {
    /// Create a mock that answers amber/video with no certainty
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            verdict: SemanticVerdict {
                traffic_light: TrafficLight::Amber,
                recommended_route: RecommendedRoute::Video,
                complexity_score: 4,
                needs_specialist: false,
                reasoning: "Needs a closer look".to_string(),
                certainty: None,
            },
            simulated_latency: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the light and route this mock will return
    pub fn with_outcome(mut self, light: TrafficLight, route: RecommendedRoute) -> Self {
        self.verdict.traffic_light = light;
        self.verdict.recommended_route = route;
        self
    }

    /// Set the specialist flag
    pub fn with_specialist(mut self, needs_specialist: bool) -> Self {
        self.verdict.needs_specialist = needs_specialist;
        self
    }

    /// Set the reported certainty
    pub fn with_certainty(mut self, certainty: u8) -> Self {
        self.verdict.certainty = Some(certainty);
        self
    }

    /// Set the reasoning text
    pub fn with_reasoning(mut self, reasoning: &str) -> Self {
        self.verdict.reasoning = reasoning.to_string();
        self
    }

    /// Set simulated latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency = Some(latency);
        self
    }

    /// Number of times judge was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SemanticClassifier for MockSemanticClassifier {
    async fn judge(&self, description: &str) -> Result<SemanticVerdict> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.simulated_latency {
            tokio::time::sleep(latency).await;
        }

        // Text-driven failure for mixed batches
        if description.contains("FAIL") {
            return Err(Error::semantic("Simulated backend failure"));
        }

        Ok(self.verdict.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A semantic classifier that always fails
pub struct FailingSemanticClassifier {
    call_count: AtomicU32,
}

impl FailingSemanticClassifier {
    pub fn new() -> Self {
        Self {
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SemanticClassifier for FailingSemanticClassifier {
    async fn judge(&self, _description: &str) -> Result<SemanticVerdict> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        Err(Error::semantic("connection refused"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
