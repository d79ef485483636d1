//! Call-level route aggregation
//!
//! Reduces the per-job results of one call to a single recommendation. The
//! most severe job decides: any specialist or red job refers the whole call,
//! otherwise any amber job needs an assessment, and only an all-green call is
//! quoted instantly.

use jobtriage_core::{
    ClassificationResult, ClassificationTier, Error, OverallRecommendation, RecommendedRoute,
    Result, TrafficLight,
};
use tracing::debug;

/// Recommend a route for a whole call.
///
/// `confidence` is the lowest confidence among the jobs that determined the
/// route. Fails with [`Error::EmptyBatch`] when there are no jobs.
pub fn get_overall_route_recommendation<'a, I>(results: I) -> Result<OverallRecommendation>
where
    I: IntoIterator<Item = (&'a String, &'a ClassificationResult)>,
{
    let jobs: Vec<(&str, &ClassificationResult)> = results
        .into_iter()
        .map(|(id, result)| (id.as_str(), result))
        .collect();

    if jobs.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let referrals = select(&jobs, |r| r.forces_referral());
    let amber = select(&jobs, |r| r.traffic_light == TrafficLight::Amber);

    let (route, determinants) = if !referrals.is_empty() {
        (RecommendedRoute::Refer, referrals)
    } else if !amber.is_empty() {
        let route = if amber
            .iter()
            .any(|(_, r)| r.recommended_route == RecommendedRoute::Visit)
        {
            RecommendedRoute::Visit
        } else {
            RecommendedRoute::Video
        };
        (route, amber)
    } else {
        (RecommendedRoute::Instant, jobs.clone())
    };

    let confidence = determinants
        .iter()
        .map(|(_, r)| r.confidence)
        .min()
        .unwrap_or(0);

    let (dominant_id, dominant) = dominant(&determinants).ok_or(Error::EmptyBatch)?;

    let reason = match route {
        RecommendedRoute::Refer => format!(
            "Job '{}' requires a specialist ({})",
            dominant_id,
            evidence(dominant)
        ),
        RecommendedRoute::Visit => format!(
            "Job '{}' needs a site visit ({})",
            dominant_id,
            evidence(dominant)
        ),
        RecommendedRoute::Video => format!(
            "Job '{}' needs a video assessment ({})",
            dominant_id,
            evidence(dominant)
        ),
        RecommendedRoute::Instant => {
            format!("All {} job(s) can be instantly quoted", jobs.len())
        }
    };

    debug!(
        route = %route,
        confidence,
        jobs = jobs.len(),
        dominant = dominant_id,
        "Call route recommended"
    );

    Ok(OverallRecommendation {
        route,
        reason,
        confidence,
        dominant_job_id: dominant_id.to_string(),
    })
}

fn select<'a>(
    jobs: &[(&'a str, &'a ClassificationResult)],
    predicate: impl Fn(&ClassificationResult) -> bool,
) -> Vec<(&'a str, &'a ClassificationResult)> {
    jobs.iter().copied().filter(|(_, r)| predicate(r)).collect()
}

/// Highest confidence wins; ties go to the smallest id
fn dominant<'a>(
    determinants: &[(&'a str, &'a ClassificationResult)],
) -> Option<(&'a str, &'a ClassificationResult)> {
    determinants.iter().copied().max_by(|(a_id, a), (b_id, b)| {
        a.confidence
            .cmp(&b.confidence)
            .then_with(|| b_id.cmp(a_id))
    })
}

fn evidence(result: &ClassificationResult) -> String {
    if result.tier == ClassificationTier::Semantic {
        if let Some(reasoning) = result.reasoning.as_deref() {
            return reasoning.to_string();
        }
    }

    match result.signals.first() {
        Some(signal) => format!("matched '{}'", signal),
        None => "no recognised signals".to_string(),
    }
}
