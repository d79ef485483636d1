//! Job Triage Classifiers
//!
//! Two-tier classification of free-text job descriptions.
//!
//! - Tier 1 (sub-millisecond): weighted lexical signals compiled into an
//!   Aho-Corasick automaton. Deterministic, no I/O.
//! - Tier 2 (seconds): a language-model judgment, consulted only when Tier 1
//!   is inconclusive and bounded by a deadline and a cancellation token.
//!
//! The [`JobClassifier`] orchestrates both tiers for single jobs and for
//! concurrent batches.

pub mod config;
pub mod lexical;
pub mod orchestrator;
pub mod semantic;
pub mod signals;

pub use config::{ClassifierConfig, SemanticConfig};
pub use lexical::LexicalMatcher;
pub use orchestrator::{
    ClassifyOptions, EscalationOutcome, EscalationPolicy, JobClassification, JobClassifier,
};
pub use semantic::{
    tier2_llm_classify, OpenAiCompatibleClassifier, SemanticClassifier, SemanticVerdict,
};
pub use signals::{SignalEntry, SignalTable};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::lexical::LexicalMatcher;
    pub use crate::orchestrator::{ClassifyOptions, JobClassification, JobClassifier};
    pub use crate::semantic::{SemanticClassifier, SemanticVerdict};
    pub use crate::signals::SignalTable;
}
