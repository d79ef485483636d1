//! Core types for job triage

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A free-text job description as captured from a call or form.
///
/// `catalog_matched` is supplied by the external price-list lookup and is
/// true when the text already matches a priced service. Fields are private
/// so a description cannot be altered once handed to a classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDescription {
    text: String,
    catalog_matched: bool,
}

impl JobDescription {
    /// Create a new job description
    pub fn new(text: impl Into<String>, catalog_matched: bool) -> Self {
        Self {
            text: text.into(),
            catalog_matched,
        }
    }

    /// The raw description text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the external catalog lookup matched this description
    pub fn catalog_matched(&self) -> bool {
        self.catalog_matched
    }

    /// True when the description has no non-whitespace content
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One job in a batch, as sent by the call-handling layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInput {
    /// Caller-assigned job identifier, unique within a call
    pub id: String,

    /// Free-text description of the job
    pub description: String,

    /// Result of the external catalog lookup
    #[serde(default)]
    pub matched: bool,
}

impl JobInput {
    /// Create a new job input
    pub fn new(id: impl Into<String>, description: impl Into<String>, matched: bool) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            matched,
        }
    }

    /// View this input as an immutable job description
    pub fn to_description(&self) -> JobDescription {
        JobDescription::new(self.description.clone(), self.matched)
    }
}

/// Traffic-light severity of a single job.
///
/// Variant order is the severity order: `Green < Amber < Red`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLight {
    /// Safe to quote instantly
    Green,
    /// Needs a visual assessment before pricing
    Amber,
    /// Specialist referral or high complexity
    Red,
}

impl TrafficLight {
    /// Get a lowercase label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Amber => "amber",
            Self::Red => "red",
        }
    }

    /// The route a job with this light takes when nothing more specific applies
    pub fn default_route(&self) -> RecommendedRoute {
        match self {
            Self::Green => RecommendedRoute::Instant,
            Self::Amber => RecommendedRoute::Video,
            Self::Red => RecommendedRoute::Refer,
        }
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TrafficLight {
    type Err = String;

    /// Case-insensitive parse of a light label
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" => Ok(Self::Green),
            "amber" => Ok(Self::Amber),
            "red" => Ok(Self::Red),
            other => Err(format!("unknown traffic light '{}'", other)),
        }
    }
}

/// Operational next step for a job or a whole call.
///
/// Variant order is the strength order: `Instant < Video < Visit < Refer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendedRoute {
    /// Quote against the price list now
    Instant,
    /// Ask the customer for a video or photos
    Video,
    /// Book an in-person site visit
    Visit,
    /// Refer to a licensed specialist
    Refer,
}

impl RecommendedRoute {
    /// Get a lowercase label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Video => "video",
            Self::Visit => "visit",
            Self::Refer => "refer",
        }
    }
}

impl fmt::Display for RecommendedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecommendedRoute {
    type Err = String;

    /// Case-insensitive parse of a route label
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instant" => Ok(Self::Instant),
            "video" => Ok(Self::Video),
            "visit" => Ok(Self::Visit),
            "refer" => Ok(Self::Refer),
            other => Err(format!("unknown route '{}'", other)),
        }
    }
}

/// Which tier produced a classification. Serialised as the integer 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ClassificationTier {
    /// Lexical keyword matching
    Lexical,
    /// Language-model judgment
    Semantic,
}

impl ClassificationTier {
    /// Numeric tier as exposed to callers
    pub fn number(&self) -> u8 {
        match self {
            Self::Lexical => 1,
            Self::Semantic => 2,
        }
    }

    /// Get a lowercase label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Semantic => "semantic",
        }
    }
}

impl From<ClassificationTier> for u8 {
    fn from(tier: ClassificationTier) -> Self {
        tier.number()
    }
}

impl TryFrom<u8> for ClassificationTier {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Lexical),
            2 => Ok(Self::Semantic),
            other => Err(format!("unknown classification tier {}", other)),
        }
    }
}

/// Classification of a single job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Severity of the job
    pub traffic_light: TrafficLight,

    /// Next step for this job
    pub recommended_route: RecommendedRoute,

    /// Confidence (0-100)
    pub confidence: u8,

    /// Tier that decided the outcome
    pub tier: ClassificationTier,

    /// Lexical signals that fired, strongest class first
    #[serde(default)]
    pub signals: Vec<String>,

    /// Model-estimated complexity (0-10), Tier 2 only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_score: Option<u8>,

    /// Whether a licensed specialist is required
    #[serde(default)]
    pub needs_specialist: bool,

    /// Model-provided justification, Tier 2 only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Tier 1 could not reach a conclusion and wants a human or Tier 2 look
    #[serde(default)]
    pub needs_review: bool,
}

impl ClassificationResult {
    /// Create a lexical result with the light's default route
    pub fn lexical(traffic_light: TrafficLight, confidence: u8) -> Self {
        Self {
            traffic_light,
            recommended_route: traffic_light.default_route(),
            confidence: confidence.min(100),
            tier: ClassificationTier::Lexical,
            signals: Vec::new(),
            complexity_score: None,
            needs_specialist: false,
            reasoning: None,
            needs_review: false,
        }
    }

    /// Check if confidence falls below a threshold
    pub fn below_threshold(&self, threshold: u8) -> bool {
        self.confidence < threshold
    }

    /// True when this job alone forces a specialist referral for its call
    pub fn forces_referral(&self) -> bool {
        self.needs_specialist || self.traffic_light == TrafficLight::Red
    }
}

/// Route recommendation for a whole call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallRecommendation {
    /// Recommended next step for the call
    pub route: RecommendedRoute,

    /// Short human-readable justification
    pub reason: String,

    /// Confidence (0-100) of the weakest job that determined the route
    pub confidence: u8,

    /// Job whose classification the reason cites
    pub dominant_job_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(TrafficLight::Green < TrafficLight::Amber);
        assert!(TrafficLight::Amber < TrafficLight::Red);
        assert_eq!(
            [TrafficLight::Amber, TrafficLight::Red, TrafficLight::Green]
                .into_iter()
                .max(),
            Some(TrafficLight::Red)
        );
    }

    #[test]
    fn test_route_strength_order() {
        assert!(RecommendedRoute::Instant < RecommendedRoute::Video);
        assert!(RecommendedRoute::Video < RecommendedRoute::Visit);
        assert!(RecommendedRoute::Visit < RecommendedRoute::Refer);
    }

    #[test]
    fn test_tier_serializes_as_number() {
        let result = ClassificationResult::lexical(TrafficLight::Green, 75);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["tier"], 1);
        assert_eq!(json["trafficLight"], "green");
        assert_eq!(json["recommendedRoute"], "instant");
        assert!(json.get("complexityScore").is_none());
    }

    #[test]
    fn test_tier_rejects_unknown_number() {
        let json = r#"{"trafficLight":"red","recommendedRoute":"refer","confidence":90,"tier":3}"#;
        let parsed: std::result::Result<ClassificationResult, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("Red".parse::<TrafficLight>(), Ok(TrafficLight::Red));
        assert_eq!(" amber ".parse::<TrafficLight>(), Ok(TrafficLight::Amber));
        assert!("orange".parse::<TrafficLight>().is_err());

        assert_eq!("VISIT".parse::<RecommendedRoute>(), Ok(RecommendedRoute::Visit));
        assert!("quote".parse::<RecommendedRoute>().is_err());
    }

    #[test]
    fn test_job_input_defaults_matched_to_false() {
        let input: JobInput =
            serde_json::from_str(r#"{"id": "job-1", "description": "hang a TV"}"#).unwrap();
        assert!(!input.matched);
        assert!(!input.to_description().catalog_matched());
    }

    #[test]
    fn test_blank_description() {
        assert!(JobDescription::new("   \n\t", false).is_blank());
        assert!(!JobDescription::new("tap", false).is_blank());
    }

    #[test]
    fn test_forces_referral() {
        let mut result = ClassificationResult::lexical(TrafficLight::Amber, 50);
        assert!(!result.forces_referral());

        result.needs_specialist = true;
        assert!(result.forces_referral());

        let red = ClassificationResult::lexical(TrafficLight::Red, 70);
        assert!(red.forces_referral());
        assert_eq!(red.recommended_route, RecommendedRoute::Refer);
    }
}
