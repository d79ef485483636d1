//! HTTP routes and handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jobtriage_classifiers::{ClassifyOptions, EscalationOutcome, JobClassification};
use jobtriage_core::{ClassificationResult, JobDescription, JobInput, OverallRecommendation};
use jobtriage_policy::{get_overall_route_recommendation, CallAction};
use jobtriage_telemetry::DecisionRecord;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{error, info};
use uuid::Uuid;

use crate::state::AppState;

/// Default number of decisions returned by the decision endpoint
const DEFAULT_DECISION_LIMIT: usize = 50;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/v1/stats", get(stats))
        .route("/v1/decisions", get(decisions))
        .route("/v1/jobs/classify", post(classify_job))
        .route("/v1/calls/classify", post(classify_call))
        .fallback(fallback)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.metrics.snapshot();

    let decisions = match &state.decisions {
        Some(log) => match log.lock() {
            Ok(log) => json!({ "retained": log.len(), "verified": log.verify() }),
            Err(_) => json!({ "retained": null, "verified": false }),
        },
        None => serde_json::Value::Null,
    };

    Json(json!({
        "counters": snapshot,
        "avgLatencyUs": snapshot.avg_latency_us(),
        "tier2Fallbacks": snapshot.tier2_fallbacks(),
        "escalationRate": snapshot.escalation_rate(),
        "fallbackRate": snapshot.fallback_rate(),
        "referralRate": snapshot.referral_rate(),
        "tier2Active": state.classifier.tier2_active(),
        "decisions": decisions,
    }))
}

#[derive(Debug, Deserialize)]
struct DecisionQuery {
    limit: Option<usize>,
}

async fn decisions(
    State(state): State<AppState>,
    Query(query): Query<DecisionQuery>,
) -> Result<Json<Vec<DecisionRecord>>, AppError> {
    let log = state
        .decisions
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Decision log is disabled".to_string()))?;
    let log = log
        .lock()
        .map_err(|_| AppError::InternalError("Decision log unavailable".to_string()))?;

    Ok(Json(log.recent(query.limit.unwrap_or(DEFAULT_DECISION_LIMIT))))
}

fn default_true() -> bool {
    true
}

/// Single-job classification request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyJobRequest {
    description: String,
    #[serde(default)]
    matched: bool,
    #[serde(default = "default_true")]
    use_tier2: bool,
}

async fn classify_job(
    State(state): State<AppState>,
    Json(req): Json<ClassifyJobRequest>,
) -> Json<JobClassification> {
    let options = ClassifyOptions {
        use_tier2: req.use_tier2,
        cancel: state.shutdown.child_token(),
    };
    let description = JobDescription::new(req.description, req.matched);

    let classification = state
        .classifier
        .classify_job_complexity(&description, &options)
        .await;
    record_job(&state, &classification);

    Json(classification)
}

/// Call classification request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyCallRequest {
    #[serde(default)]
    call_id: Option<String>,
    jobs: Vec<JobInput>,
    #[serde(default = "default_true")]
    use_tier2: bool,
}

/// Call classification response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyCallResponse {
    call_id: String,
    results: BTreeMap<String, ClassificationResult>,
    escalations: BTreeMap<String, EscalationOutcome>,
    recommendation: OverallRecommendation,
    action: CallAction,
}

async fn classify_call(
    State(state): State<AppState>,
    Json(req): Json<ClassifyCallRequest>,
) -> Result<Json<ClassifyCallResponse>, AppError> {
    if req.jobs.is_empty() {
        return Err(AppError::InvalidRequest(
            "A call needs at least one job".to_string(),
        ));
    }

    let call_id = req
        .call_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let options = ClassifyOptions {
        use_tier2: req.use_tier2,
        cancel: state.shutdown.child_token(),
    };

    let batch = state.classifier.classify_batch(&req.jobs, &options).await;

    let mut results = BTreeMap::new();
    let mut escalations = BTreeMap::new();
    for (id, classification) in batch {
        record_job(&state, &classification);
        escalations.insert(id.clone(), classification.escalation);
        results.insert(id, classification.result);
    }

    let recommendation = get_overall_route_recommendation(&results)?;
    state.metrics.record_call(recommendation.route);
    metrics::counter!("jobtriage_calls_total", "route" => recommendation.route.label())
        .increment(1);

    if let Some(log) = &state.decisions {
        let mut log = log
            .lock()
            .map_err(|_| AppError::InternalError("Decision log unavailable".to_string()))?;
        log.append(call_id.clone(), results.len(), &recommendation);
    }

    info!(
        call_id = %call_id,
        route = %recommendation.route,
        confidence = recommendation.confidence,
        jobs = results.len(),
        "Call classified"
    );

    Ok(Json(ClassifyCallResponse {
        call_id,
        results,
        escalations,
        action: CallAction::from(recommendation.route),
        recommendation,
    }))
}

fn record_job(state: &AppState, classification: &JobClassification) {
    state.metrics.record_job(
        &classification.result,
        classification.escalation.attempted(),
        classification.escalation == EscalationOutcome::Accepted,
        classification.latency_us,
    );
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Error handling
#[derive(Debug)]
enum AppError {
    InvalidRequest(String),
    NotFound(String),
    InternalError(String),
}

impl From<jobtriage_core::Error> for AppError {
    fn from(err: jobtriage_core::Error) -> Self {
        match err {
            jobtriage_core::Error::EmptyBatch => AppError::InvalidRequest(err.to_string()),
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg, "invalid_request_error"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "not_found_error"),
            AppError::InternalError(msg) => {
                error!("Request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "internal_error")
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
