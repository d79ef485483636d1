//! HTTP API tests
//!
//! Drive the router in-process with `oneshot`; Tier 2 is a local mock.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use jobtriage_classifiers::{JobClassifier, LexicalMatcher, SemanticClassifier, SemanticVerdict};
use jobtriage_core::{RecommendedRoute, Result, TrafficLight};
use jobtriage_server::{create_router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct GreenVerdict;

#[async_trait]
impl SemanticClassifier for GreenVerdict {
    async fn judge(&self, _description: &str) -> Result<SemanticVerdict> {
        Ok(SemanticVerdict {
            traffic_light: TrafficLight::Green,
            recommended_route: RecommendedRoute::Instant,
            complexity_score: 2,
            needs_specialist: false,
            reasoning: "Surface mould, a wipe-down job".to_string(),
            certainty: Some(88),
        })
    }

    fn name(&self) -> &str {
        "green-verdict"
    }
}

/// Green light paired with a site visit
struct GreenVisitVerdict;

#[async_trait]
impl SemanticClassifier for GreenVisitVerdict {
    async fn judge(&self, _description: &str) -> Result<SemanticVerdict> {
        Ok(SemanticVerdict {
            traffic_light: TrafficLight::Green,
            recommended_route: RecommendedRoute::Visit,
            complexity_score: 5,
            needs_specialist: false,
            reasoning: "Easy fix but someone should look at it".to_string(),
            certainty: Some(80),
        })
    }

    fn name(&self) -> &str {
        "green-visit-verdict"
    }
}

fn lexical_state() -> AppState {
    let matcher = LexicalMatcher::builtin().unwrap();
    AppState::new(JobClassifier::new(matcher)).with_decision_log(100)
}

fn semantic_state() -> AppState {
    let matcher = LexicalMatcher::builtin().unwrap();
    let classifier = JobClassifier::new(matcher).with_semantic(Arc::new(GreenVerdict));
    AppState::new(classifier).with_decision_log(100)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(create_router(lexical_state()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _) = send(create_router(lexical_state()), get("/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_classify_single_job() {
    let app = create_router(lexical_state());
    let (status, body) = send(
        app,
        post_json(
            "/v1/jobs/classify",
            json!({ "description": "My boiler's not working" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["trafficLight"], "red");
    assert_eq!(body["result"]["recommendedRoute"], "refer");
    assert_eq!(body["result"]["confidence"], 70);
    assert_eq!(body["result"]["tier"], 1);
    assert_eq!(body["result"]["needsSpecialist"], true);
    assert_eq!(body["escalation"], "notNeeded");
}

#[tokio::test]
async fn test_catalog_match_is_respected() {
    let app = create_router(lexical_state());
    let (status, body) = send(
        app,
        post_json(
            "/v1/jobs/classify",
            json!({ "description": "standard service", "matched": true }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["trafficLight"], "green");
    assert_eq!(body["result"]["confidence"], 90);
}

#[tokio::test]
async fn test_call_with_boiler_is_referred() {
    let state = lexical_state();
    let app = create_router(state.clone());

    let (status, body) = send(
        app,
        post_json(
            "/v1/calls/classify",
            json!({
                "callId": "call-42",
                "jobs": [
                    { "id": "tv", "description": "hang a TV" },
                    { "id": "boiler", "description": "boiler servicing" }
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["callId"], "call-42");
    assert_eq!(body["results"]["tv"]["trafficLight"], "green");
    assert_eq!(body["results"]["boiler"]["trafficLight"], "red");
    assert_eq!(body["recommendation"]["route"], "refer");
    assert_eq!(body["recommendation"]["dominantJobId"], "boiler");
    assert_eq!(body["action"], "Refer to Specialist");

    let snapshot = state.metrics.snapshot();
    assert_eq!(snapshot.jobs, 2);
    assert_eq!(snapshot.calls, 1);
    assert_eq!(snapshot.routes.refer, 1);
}

#[tokio::test]
async fn test_call_id_is_generated_when_missing() {
    let app = create_router(lexical_state());
    let (status, body) = send(
        app,
        post_json(
            "/v1/calls/classify",
            json!({ "jobs": [{ "id": "a", "description": "replace toilet seat" }] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["callId"].as_str().unwrap().is_empty());
    assert_eq!(body["recommendation"]["route"], "instant");
    assert_eq!(body["action"], "Book Job");
}

#[tokio::test]
async fn test_empty_call_is_rejected() {
    let app = create_router(lexical_state());
    let (status, body) = send(app, post_json("/v1/calls/classify", json!({ "jobs": [] }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_tier2_is_used_below_threshold() {
    let app = create_router(semantic_state());
    let (status, body) = send(
        app,
        post_json(
            "/v1/jobs/classify",
            json!({ "description": "bit of mould in bathroom corner" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["escalation"], "accepted");
    assert_eq!(body["result"]["tier"], 2);
    assert_eq!(body["result"]["trafficLight"], "green");
    assert_eq!(body["result"]["confidence"], 88);
    assert_eq!(body["result"]["signals"], json!(["mould"]));
    assert_eq!(body["tier1"]["trafficLight"], "amber");
}

#[tokio::test]
async fn test_green_visit_verdict_books_a_visit() {
    let matcher = LexicalMatcher::builtin().unwrap();
    let classifier = JobClassifier::new(matcher).with_semantic(Arc::new(GreenVisitVerdict));
    let app = create_router(AppState::new(classifier));

    let (status, body) = send(
        app,
        post_json(
            "/v1/calls/classify",
            json!({
                "jobs": [
                    { "id": "mould", "description": "bit of mould in bathroom corner" },
                    { "id": "seat", "description": "replace toilet seat" }
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["escalations"]["mould"], "accepted");
    assert_eq!(body["results"]["mould"]["trafficLight"], "amber");
    assert_eq!(body["results"]["mould"]["recommendedRoute"], "visit");
    assert_eq!(body["recommendation"]["route"], "visit");
}

#[tokio::test]
async fn test_tier2_can_be_skipped_per_request() {
    let app = create_router(semantic_state());
    let (_, body) = send(
        app,
        post_json(
            "/v1/jobs/classify",
            json!({ "description": "bit of mould in bathroom corner", "useTier2": false }),
        ),
    )
    .await;

    assert_eq!(body["escalation"], "disabled");
    assert_eq!(body["result"]["tier"], 1);
    assert_eq!(body["result"]["trafficLight"], "amber");
}

#[tokio::test]
async fn test_shutdown_cancels_escalation() {
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    let app = create_router(semantic_state().with_shutdown(shutdown));

    let (status, body) = send(
        app,
        post_json(
            "/v1/jobs/classify",
            json!({ "description": "bit of mould in bathroom corner" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["escalation"], "cancelled");
    assert_eq!(body["result"]["tier"], 1);
}

#[tokio::test]
async fn test_stats_and_decisions() {
    let state = lexical_state();

    for call_id in ["c1", "c2"] {
        let (status, _) = send(
            create_router(state.clone()),
            post_json(
                "/v1/calls/classify",
                json!({
                    "callId": call_id,
                    "jobs": [{ "id": "j1", "description": "bit of mould in bathroom corner" }]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, stats) = send(create_router(state.clone()), get("/v1/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["counters"]["jobs"], 2);
    assert_eq!(stats["counters"]["amber"], 2);
    assert_eq!(stats["tier2Active"], false);
    assert_eq!(stats["decisions"]["retained"], 2);
    assert_eq!(stats["decisions"]["verified"], true);

    let (status, decisions) =
        send(create_router(state), get("/v1/decisions?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    let decisions = decisions.as_array().unwrap();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0]["callId"], "c2");
    assert_eq!(decisions[0]["route"], "video");
}

#[tokio::test]
async fn test_decisions_disabled() {
    let state = AppState::new(JobClassifier::new(LexicalMatcher::builtin().unwrap()));
    let (status, body) = send(create_router(state), get("/v1/decisions")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["type"], "not_found_error");
}

#[tokio::test]
async fn test_metrics_without_exporter_is_empty() {
    let (status, body) = send(create_router(lexical_state()), get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}
