//! Job classification orchestrator
//!
//! Runs the lexical tier on every job and escalates to the semantic tier only
//! when the lexical result is inconclusive. Batches are classified
//! concurrently; one job's Tier 2 failure never affects its siblings.

use crate::config::{ClassifierConfig, DEFAULT_ESCALATION_THRESHOLD, DEFAULT_TIER2_TIMEOUT_MS};
use crate::lexical::LexicalMatcher;
use crate::semantic::{attempt_tier2, OpenAiCompatibleClassifier, SemanticClassifier, Tier2Attempt};
use futures::future::join_all;
use jobtriage_core::{ClassificationResult, JobDescription, JobInput, Result, TrafficLight};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// What happened to a job's Tier 2 escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EscalationOutcome {
    /// Tier 1 was conclusive
    NotNeeded,
    /// Escalation was wanted but Tier 2 is off for this call or deployment
    Disabled,
    /// Tier 2 answered and its conclusion was used
    Accepted,
    /// Tier 2 failed or timed out; Tier 1 stands
    Unavailable,
    /// The call ended before Tier 2 answered; Tier 1 stands
    Cancelled,
}

impl EscalationOutcome {
    /// Get a label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotNeeded => "not_needed",
            Self::Disabled => "disabled",
            Self::Accepted => "accepted",
            Self::Unavailable => "unavailable",
            Self::Cancelled => "cancelled",
        }
    }

    /// True when escalation was wanted and a backend was asked
    pub fn attempted(&self) -> bool {
        matches!(self, Self::Accepted | Self::Unavailable | Self::Cancelled)
    }
}

/// Full record of one job's classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobClassification {
    /// Final per-job result
    pub result: ClassificationResult,

    /// The lexical result, kept even when Tier 2 decided
    pub tier1: ClassificationResult,

    /// Fate of the Tier 2 escalation
    pub escalation: EscalationOutcome,

    /// Wall-clock time for this job in microseconds
    pub latency_us: u64,
}

/// Per-call options
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Allow Tier 2 for this call
    pub use_tier2: bool,

    /// Cancelled when the surrounding call goes away
    pub cancel: CancellationToken,
}

impl ClassifyOptions {
    /// Tier 1 only
    pub fn lexical_only() -> Self {
        Self {
            use_tier2: false,
            cancel: CancellationToken::new(),
        }
    }

    /// Tier 2 allowed, bound to the given token
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            use_tier2: true,
            cancel,
        }
    }
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self::with_cancel(CancellationToken::new())
    }
}

/// When and how to escalate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// Tier 1 confidence below this escalates
    pub threshold: u8,

    /// Deployment-level Tier 2 switch
    pub tier2_enabled: bool,

    /// Tier 2 deadline
    pub timeout: Duration,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ESCALATION_THRESHOLD,
            tier2_enabled: true,
            timeout: Duration::from_millis(DEFAULT_TIER2_TIMEOUT_MS),
        }
    }
}

/// Two-tier job classifier
pub struct JobClassifier {
    lexical: LexicalMatcher,
    semantic: Option<Arc<dyn SemanticClassifier>>,
    policy: EscalationPolicy,
}

impl JobClassifier {
    /// Create a Tier 1 only classifier
    pub fn new(lexical: LexicalMatcher) -> Self {
        Self {
            lexical,
            semantic: None,
            policy: EscalationPolicy::default(),
        }
    }

    /// Install a Tier 2 backend
    pub fn with_semantic(mut self, semantic: Arc<dyn SemanticClassifier>) -> Self {
        self.semantic = Some(semantic);
        self
    }

    /// Replace the escalation policy
    pub fn with_policy(mut self, policy: EscalationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build from configuration. The OpenAI-compatible backend is installed
    /// only when Tier 2 is enabled.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;
        let lexical = LexicalMatcher::new(config.signal_table()?)?;

        let mut classifier = Self::new(lexical).with_policy(EscalationPolicy {
            threshold: config.escalation_threshold,
            tier2_enabled: config.tier2.enabled,
            timeout: config.tier2_timeout(),
        });

        if config.tier2.enabled {
            let backend = OpenAiCompatibleClassifier::from_config(&config.tier2);
            info!(
                backend = backend.name(),
                base_url = %config.tier2.base_url,
                timeout_ms = config.tier2.timeout_ms,
                "Tier 2 enabled"
            );
            classifier = classifier.with_semantic(Arc::new(backend));
        } else {
            info!("Tier 2 disabled, classifying with lexical signals only");
        }

        info!(
            signals = classifier.lexical.signal_count(),
            threshold = config.escalation_threshold,
            "Job classifier ready"
        );
        Ok(classifier)
    }

    /// The lexical matcher
    pub fn lexical(&self) -> &LexicalMatcher {
        &self.lexical
    }

    /// The escalation policy
    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    /// True when a Tier 2 backend is installed and enabled
    pub fn tier2_active(&self) -> bool {
        self.policy.tier2_enabled && self.semantic.is_some()
    }

    /// Whether a Tier 1 result should be sent to Tier 2.
    ///
    /// Red verdicts and blank descriptions are never escalated.
    pub fn needs_escalation(&self, description: &JobDescription, tier1: &ClassificationResult) -> bool {
        tier1.traffic_light != TrafficLight::Red
            && !description.is_blank()
            && (tier1.needs_review || tier1.below_threshold(self.policy.threshold))
    }

    /// Classify a single job
    pub async fn classify_job_complexity(
        &self,
        description: &JobDescription,
        options: &ClassifyOptions,
    ) -> JobClassification {
        let start = Instant::now();
        let tier1 = self
            .lexical
            .tier1_keyword_match(description.text(), description.catalog_matched());

        let (result, escalation) = if !self.needs_escalation(description, &tier1) {
            (tier1.clone(), EscalationOutcome::NotNeeded)
        } else {
            match self.semantic_backend(options) {
                None => (tier1.clone(), EscalationOutcome::Disabled),
                Some(backend) => self.escalate(backend, description, &tier1, options).await,
            }
        };

        let latency_us = start.elapsed().as_micros() as u64;
        record(&result, escalation, latency_us);
        debug!(
            light = %result.traffic_light,
            route = %result.recommended_route,
            confidence = result.confidence,
            tier = result.tier.number(),
            outcome = escalation.label(),
            latency_us,
            "Job classified"
        );

        JobClassification {
            result,
            tier1,
            escalation,
            latency_us,
        }
    }

    /// Classify a batch concurrently, keyed by job id.
    ///
    /// When an id appears more than once, the later job wins.
    pub async fn classify_batch(
        &self,
        jobs: &[JobInput],
        options: &ClassifyOptions,
    ) -> BTreeMap<String, JobClassification> {
        let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(jobs.len());
        for (index, job) in jobs.iter().enumerate() {
            if last_index.insert(job.id.as_str(), index).is_some() {
                warn!(job_id = %job.id, "Duplicate job id in batch, later description wins");
            }
        }

        let futures = jobs
            .iter()
            .enumerate()
            .filter(|(index, job)| last_index.get(job.id.as_str()) == Some(index))
            .map(|(_, job)| {
                let description = job.to_description();
                let span = info_span!("job", job_id = %job.id);
                async move {
                    let classification = self.classify_job_complexity(&description, options).await;
                    (job.id.clone(), classification)
                }
                .instrument(span)
            });

        join_all(futures).await.into_iter().collect()
    }

    /// Classify a batch and return only the final per-job results
    pub async fn classify_multiple_jobs(
        &self,
        jobs: &[JobInput],
        options: &ClassifyOptions,
    ) -> BTreeMap<String, ClassificationResult> {
        self.classify_batch(jobs, options)
            .await
            .into_iter()
            .map(|(id, classification)| (id, classification.result))
            .collect()
    }

    fn semantic_backend(&self, options: &ClassifyOptions) -> Option<&Arc<dyn SemanticClassifier>> {
        if options.use_tier2 && self.policy.tier2_enabled {
            self.semantic.as_ref()
        } else {
            None
        }
    }

    async fn escalate(
        &self,
        backend: &Arc<dyn SemanticClassifier>,
        description: &JobDescription,
        tier1: &ClassificationResult,
        options: &ClassifyOptions,
    ) -> (ClassificationResult, EscalationOutcome) {
        let attempt = attempt_tier2(
            backend.as_ref(),
            description.text(),
            self.policy.timeout,
            &options.cancel,
        )
        .await;

        match attempt {
            Tier2Attempt::Answered(mut result) => {
                result.signals = tier1.signals.clone();
                (result, EscalationOutcome::Accepted)
            }
            Tier2Attempt::Cancelled => (tier1.clone(), EscalationOutcome::Cancelled),
            Tier2Attempt::Unavailable => (tier1.clone(), EscalationOutcome::Unavailable),
        }
    }
}

impl std::fmt::Debug for JobClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobClassifier")
            .field("lexical", &self.lexical)
            .field("semantic", &self.semantic.as_ref().map(|s| s.name().to_string()))
            .field("policy", &self.policy)
            .finish()
    }
}

fn record(result: &ClassificationResult, escalation: EscalationOutcome, latency_us: u64) {
    metrics::counter!(
        "jobtriage_jobs_classified_total",
        "light" => result.traffic_light.label(),
        "tier" => result.tier.label()
    )
    .increment(1);

    if escalation != EscalationOutcome::NotNeeded {
        metrics::counter!("jobtriage_tier2_outcomes_total", "outcome" => escalation.label())
            .increment(1);
    }

    metrics::histogram!("jobtriage_classification_latency_us").record(latency_us as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtriage_core::RecommendedRoute;

    fn classifier() -> JobClassifier {
        JobClassifier::new(LexicalMatcher::builtin().unwrap())
    }

    #[test]
    fn test_escalation_eligibility() {
        let c = classifier();

        let mould = JobDescription::new("bit of mould in bathroom corner", false);
        let tier1 = c.lexical().tier1_keyword_match(mould.text(), false);
        assert!(c.needs_escalation(&mould, &tier1));

        let tap = JobDescription::new("dripping tap", false);
        let tier1 = c.lexical().tier1_keyword_match(tap.text(), false);
        assert!(!c.needs_escalation(&tap, &tier1));

        let blank = JobDescription::new("  ", false);
        let tier1 = c.lexical().tier1_keyword_match(blank.text(), false);
        assert!(!c.needs_escalation(&blank, &tier1));

        let boiler = JobDescription::new("boiler's not working", false);
        let tier1 = c.lexical().tier1_keyword_match(boiler.text(), false);
        assert!(!c.needs_escalation(&boiler, &tier1));
    }

    #[tokio::test]
    async fn test_without_backend_escalation_is_disabled() {
        let c = classifier();
        let job = JobDescription::new("no idea what's wrong with the sink", false);

        let classification = c.classify_job_complexity(&job, &ClassifyOptions::default()).await;

        assert_eq!(classification.escalation, EscalationOutcome::Disabled);
        assert_eq!(classification.result, classification.tier1);
        assert_eq!(classification.result.recommended_route, RecommendedRoute::Video);
    }

    #[test]
    fn test_outcome_serialises_camel_case() {
        let json = serde_json::to_string(&EscalationOutcome::NotNeeded).unwrap();
        assert_eq!(json, "\"notNeeded\"");
        assert!(EscalationOutcome::Unavailable.attempted());
        assert!(!EscalationOutcome::Disabled.attempted());
    }
}
