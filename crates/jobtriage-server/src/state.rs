//! Shared application state

use crate::config::ServerConfig;
use jobtriage_classifiers::JobClassifier;
use jobtriage_telemetry::{DecisionLog, TriageMetrics};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Two-tier job classifier
    pub classifier: Arc<JobClassifier>,

    /// In-process counters for the stats endpoint
    pub metrics: TriageMetrics,

    /// Call decision log, when auditing is enabled
    pub decisions: Option<Arc<Mutex<DecisionLog>>>,

    /// Prometheus handle for rendering `/metrics`
    pub prometheus: Option<PrometheusHandle>,

    /// Root token; each request classifies under a child of it
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create state around a classifier, with auditing off
    pub fn new(classifier: JobClassifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
            metrics: TriageMetrics::new(),
            decisions: None,
            prometheus: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build state from configuration
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let classifier = JobClassifier::from_config(&config.classifier)?;
        let mut state = Self::new(classifier);
        if config.audit.enabled {
            state = state.with_decision_log(config.audit.capacity);
        }
        Ok(state)
    }

    /// Record call decisions in a log of the given capacity
    pub fn with_decision_log(mut self, capacity: usize) -> Self {
        self.decisions = Some(Arc::new(Mutex::new(DecisionLog::new(capacity))));
        self
    }

    /// Render Prometheus metrics through this handle
    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Use the given root cancellation token
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
