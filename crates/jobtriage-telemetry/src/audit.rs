//! Hash-chained decision log
//!
//! Each call-level recommendation is appended with the SHA-256 hash of its
//! contents and of the previous entry, so any edit to a retained entry breaks
//! the chain. The log is bounded: once full, the oldest entry is evicted and
//! its hash becomes the anchor the retained chain is verified against.

use jobtriage_core::{OverallRecommendation, RecommendedRoute};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Default number of retained decisions
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded, tamper-evident log of call decisions
#[derive(Debug)]
pub struct DecisionLog {
    entries: VecDeque<DecisionRecord>,
    capacity: usize,
    anchor: Option<String>,
    chain_hash: Option<String>,
}

impl DecisionLog {
    /// Create a log retaining at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            anchor: None,
            chain_hash: None,
        }
    }

    /// Append a call decision and return its hash
    pub fn append(&mut self, call_id: impl Into<String>, job_count: usize, rec: &OverallRecommendation) -> String {
        let mut record = DecisionRecord {
            call_id: call_id.into(),
            route: rec.route,
            confidence: rec.confidence,
            reason: rec.reason.clone(),
            dominant_job_id: rec.dominant_job_id.clone(),
            job_count,
            timestamp_ms: now_ms(),
            hash: String::new(),
            previous_hash: self.chain_hash.clone(),
        };
        record.hash = compute_hash(&record);
        let hash = record.hash.clone();

        if self.entries.len() == self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                trace!(call_id = %evicted.call_id, "Decision log full, evicting oldest entry");
                self.anchor = Some(evicted.hash);
            }
        }

        self.chain_hash = Some(hash.clone());
        self.entries.push_back(record);
        hash
    }

    /// Verify the integrity of the retained chain
    pub fn verify(&self) -> bool {
        let mut prev_hash = self.anchor.clone();

        for record in &self.entries {
            if record.previous_hash != prev_hash {
                return false;
            }
            if record.hash != compute_hash(record) {
                return false;
            }
            prev_hash = Some(record.hash.clone());
        }

        prev_hash == self.chain_hash
    }

    /// Retained entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &DecisionRecord> {
        self.entries.iter()
    }

    /// Most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<DecisionRecord> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the newest entry
    pub fn head(&self) -> Option<&str> {
        self.chain_hash.as_deref()
    }
}

impl Default for DecisionLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One call-level decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub call_id: String,
    pub route: RecommendedRoute,
    pub confidence: u8,
    pub reason: String,
    pub dominant_job_id: String,
    pub job_count: usize,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    pub hash: String,
    pub previous_hash: Option<String>,
}

fn compute_hash(record: &DecisionRecord) -> String {
    let mut hasher = Sha256::new();

    // Length-prefix variable fields so adjacent values cannot run together
    for field in [
        record.call_id.as_str(),
        record.route.label(),
        record.reason.as_str(),
        record.dominant_job_id.as_str(),
    ] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.update([record.confidence]);
    hasher.update((record.job_count as u64).to_le_bytes());
    hasher.update(record.timestamp_ms.to_le_bytes());
    if let Some(ref prev) = record.previous_hash {
        hasher.update(prev.as_bytes());
    }

    format!("{:x}", hasher.finalize())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommendation(route: RecommendedRoute) -> OverallRecommendation {
        OverallRecommendation {
            route,
            reason: "Job 'a' requires a specialist (matched 'gas leak')".to_string(),
            confidence: 90,
            dominant_job_id: "a".to_string(),
        }
    }

    #[test]
    fn test_decision_log_chains() {
        let mut log = DecisionLog::new(10);

        let first = log.append("call-1", 2, &recommendation(RecommendedRoute::Refer));
        log.append("call-2", 1, &recommendation(RecommendedRoute::Instant));

        assert!(log.verify());
        assert_eq!(log.len(), 2);
        let entries: Vec<_> = log.entries().collect();
        assert_eq!(entries[1].previous_hash.as_deref(), Some(first.as_str()));
        assert_eq!(log.recent(1)[0].call_id, "call-2");
    }

    #[test]
    fn test_tamper_detection() {
        let mut log = DecisionLog::new(10);

        log.append("call-1", 1, &recommendation(RecommendedRoute::Refer));
        log.append("call-2", 1, &recommendation(RecommendedRoute::Video));

        // Downgrade a referral after the fact
        log.entries[0].route = RecommendedRoute::Instant;

        assert!(!log.verify());
    }

    #[test]
    fn test_eviction_keeps_chain_verifiable() {
        let mut log = DecisionLog::new(3);

        for i in 0..5 {
            log.append(format!("call-{}", i), 1, &recommendation(RecommendedRoute::Video));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.entries().next().unwrap().call_id, "call-2");
        assert!(log.verify());
    }

    #[test]
    fn test_removed_entry_detected() {
        let mut log = DecisionLog::new(10);
        for i in 0..3 {
            log.append(format!("call-{}", i), 1, &recommendation(RecommendedRoute::Visit));
        }

        log.entries.pop_back();
        assert!(!log.verify());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut log = DecisionLog::default();
        log.append("call-1", 3, &recommendation(RecommendedRoute::Refer));

        let json = serde_json::to_value(log.recent(1)).unwrap();
        assert_eq!(json[0]["callId"], "call-1");
        assert_eq!(json[0]["route"], "refer");
        assert_eq!(json[0]["jobCount"], 3);
    }
}
