//! Decoding of language-model completions into verdicts
//!
//! Completions often wrap the JSON payload in prose or code fences, so the
//! outermost object is extracted first. The payload is then deserialised into
//! a raw shape and validated field by field; a verdict is either fully valid
//! or rejected.

use super::SemanticVerdict;
use jobtriage_core::{Error, RecommendedRoute, Result, TrafficLight};
use serde::Deserialize;

const MAX_RAW_IN_ERROR: usize = 200;

/// Verdict as the model writes it, before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    #[serde(alias = "traffic_light")]
    traffic_light: String,

    #[serde(alias = "recommended_route", alias = "route")]
    recommended_route: String,

    #[serde(alias = "complexity_score", alias = "complexity")]
    complexity_score: f64,

    #[serde(default, alias = "needs_specialist")]
    needs_specialist: bool,

    #[serde(default)]
    reasoning: String,

    #[serde(default, alias = "certainty")]
    confidence: Option<f64>,
}

/// Slice out the outermost JSON object in a completion
pub fn extract_json_object(response: &str) -> Result<&str> {
    let response = response.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::semantic(format!(
            "No JSON found in model response | Raw: {}",
            truncate(response)
        ))),
    }
}

/// Decode and validate a completion into a verdict
pub fn decode_verdict(response: &str) -> Result<SemanticVerdict> {
    let json_str = extract_json_object(response)?;
    let raw: RawVerdict = serde_json::from_str(json_str).map_err(|e| {
        Error::semantic(format!(
            "Invalid verdict JSON from model: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    let traffic_light: TrafficLight = raw.traffic_light.parse().map_err(Error::semantic)?;
    let recommended_route: RecommendedRoute =
        raw.recommended_route.parse().map_err(Error::semantic)?;

    if !raw.complexity_score.is_finite() || !(0.0..=10.0).contains(&raw.complexity_score) {
        return Err(Error::semantic(format!(
            "Complexity score {} outside 0-10",
            raw.complexity_score
        )));
    }

    let reasoning = raw.reasoning.trim();
    if reasoning.is_empty() {
        return Err(Error::semantic("Verdict has no reasoning"));
    }

    let certainty = raw.confidence.map(certainty_percent).transpose()?;

    Ok(SemanticVerdict {
        traffic_light,
        recommended_route,
        complexity_score: raw.complexity_score.round() as u8,
        needs_specialist: raw.needs_specialist,
        reasoning: reasoning.to_string(),
        certainty,
    })
}

/// Accept a 0-1 fraction or a 0-100 percentage
fn certainty_percent(value: f64) -> Result<u8> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(Error::semantic(format!("Confidence {} out of range", value)));
    }

    let percent = if value <= 1.0 { value * 100.0 } else { value };
    Ok(percent.round() as u8)
}

fn truncate(raw: &str) -> String {
    if raw.chars().count() > MAX_RAW_IN_ERROR {
        format!("{}...", raw.chars().take(MAX_RAW_IN_ERROR).collect::<String>())
    } else {
        raw.to_string()
    }
}
