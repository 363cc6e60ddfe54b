use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Json, Query, State},
    http::StatusCode,
    response::Response,
};
use serde_json::{json, Value};

use emr_domain::services::AiRoute;
use emr_domain::testing::StubAiGateway;

use crate::api::handlers::ai::{ai_clinical_note, ai_health, AiGateway};

async fn read_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_query_and_body_are_forwarded() {
    let stub = Arc::new(StubAiGateway::replying(200, json!({ "summary": "stable" })));
    let gateway: AiGateway = stub.clone();

    let mut params = HashMap::new();
    params.insert("provider".to_string(), "llm".to_string());

    let response = ai_clinical_note(State(gateway), Query(params), Some(Json(json!({ "note": "BP 150/95" })))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["summary"], "stable");

    let calls = stub.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].route, AiRoute::ClinicalNote);
    assert_eq!(calls[0].query, vec![("provider".to_string(), "llm".to_string())]);
    assert_eq!(calls[0].body, Some(json!({ "note": "BP 150/95" })));
}

#[tokio::test]
async fn test_missing_body_is_sent_as_empty_object() {
    let stub = Arc::new(StubAiGateway::replying(200, json!({})));
    let gateway: AiGateway = stub.clone();

    ai_clinical_note(State(gateway), Query(HashMap::new()), None).await;

    assert_eq!(stub.calls()[0].body, Some(json!({})));
}

#[tokio::test]
async fn test_gateway_status_is_passed_through() {
    let gateway: AiGateway = Arc::new(StubAiGateway::replying(429, json!({ "error": "rate_limited" })));

    let response = ai_health(State(gateway), Query(HashMap::new())).await;

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(read_json(response).await["error"], "rate_limited");
}

#[tokio::test]
async fn test_unreachable_gateway_is_502() {
    let gateway: AiGateway = Arc::new(StubAiGateway::unreachable());

    let response = ai_health(State(gateway), Query(HashMap::new())).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(read_json(response).await["error"], "ai_gateway_unavailable");
}
