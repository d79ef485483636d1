//! In-process triage counters

use jobtriage_core::{ClassificationResult, RecommendedRoute, TrafficLight};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free counters behind the stats endpoint
#[derive(Clone)]
pub struct TriageMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    jobs: AtomicU64,
    green: AtomicU64,
    amber: AtomicU64,
    red: AtomicU64,
    escalations: AtomicU64,
    tier2_accepted: AtomicU64,
    total_latency_us: AtomicU64,
    calls: AtomicU64,
    instant: AtomicU64,
    video: AtomicU64,
    visit: AtomicU64,
    refer: AtomicU64,
}

impl TriageMetrics {
    /// Create a new set of counters
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record one classified job.
    ///
    /// `escalated` is true when a Tier 2 backend was asked; `accepted` when
    /// its answer was used.
    pub fn record_job(
        &self,
        result: &ClassificationResult,
        escalated: bool,
        accepted: bool,
        latency_us: u64,
    ) {
        let inner = &self.inner;
        inner.jobs.fetch_add(1, Ordering::Relaxed);
        inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);

        let light = match result.traffic_light {
            TrafficLight::Green => &inner.green,
            TrafficLight::Amber => &inner.amber,
            TrafficLight::Red => &inner.red,
        };
        light.fetch_add(1, Ordering::Relaxed);

        if escalated {
            inner.escalations.fetch_add(1, Ordering::Relaxed);
            if accepted {
                inner.tier2_accepted.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record one call-level recommendation
    pub fn record_call(&self, route: RecommendedRoute) {
        let inner = &self.inner;
        inner.calls.fetch_add(1, Ordering::Relaxed);

        let counter = match route {
            RecommendedRoute::Instant => &inner.instant,
            RecommendedRoute::Video => &inner.video,
            RecommendedRoute::Visit => &inner.visit,
            RecommendedRoute::Refer => &inner.refer,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        let inner = &self.inner;

        // Accepted is bumped after escalations, so read it first
        let tier2_accepted = load(&inner.tier2_accepted);

        MetricsSnapshot {
            jobs: load(&inner.jobs),
            green: load(&inner.green),
            amber: load(&inner.amber),
            red: load(&inner.red),
            escalations: load(&inner.escalations),
            tier2_accepted,
            total_latency_us: load(&inner.total_latency_us),
            calls: load(&inner.calls),
            routes: RouteCounts {
                instant: load(&inner.instant),
                video: load(&inner.video),
                visit: load(&inner.visit),
                refer: load(&inner.refer),
            },
        }
    }
}

impl Default for TriageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Calls per recommended route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteCounts {
    pub instant: u64,
    pub video: u64,
    pub visit: u64,
    pub refer: u64,
}

/// Snapshot of current metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub jobs: u64,
    pub green: u64,
    pub amber: u64,
    pub red: u64,
    pub escalations: u64,
    pub tier2_accepted: u64,
    pub total_latency_us: u64,
    pub calls: u64,
    pub routes: RouteCounts,
}

impl MetricsSnapshot {
    /// Escalations that fell back to Tier 1
    pub fn tier2_fallbacks(&self) -> u64 {
        self.escalations.saturating_sub(self.tier2_accepted)
    }

    /// Average per-job latency
    pub fn avg_latency_us(&self) -> u64 {
        if self.jobs == 0 {
            0
        } else {
            self.total_latency_us / self.jobs
        }
    }

    /// Share of jobs sent to Tier 2
    pub fn escalation_rate(&self) -> f64 {
        ratio(self.escalations, self.jobs)
    }

    /// Share of Tier 2 requests that fell back to Tier 1
    pub fn fallback_rate(&self) -> f64 {
        ratio(self.tier2_fallbacks(), self.escalations)
    }

    /// Share of calls referred to a specialist
    pub fn referral_rate(&self) -> f64 {
        ratio(self.routes.refer, self.calls)
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
