use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use emr_api::api::{create_app, AppState};
use emr_domain::config::AppConfig;
use emr_domain::database::DatabasePool;
use emr_domain::services::DrugDatabase;
use emr_domain::testing::StubAiGateway;

fn test_app_with_gateway(gateway: StubAiGateway) -> Router {
    let pool = DatabasePool::in_memory().unwrap();
    let config = AppConfig {
        salt_rounds: 4,
        jwt_secret: "integration-secret".to_string(),
        ..AppConfig::default()
    };
    let state = AppState::from_config(pool, &config, Arc::new(DrugDatabase::built_in()))
        .with_ai_gateway(Arc::new(gateway));
    create_app(state)
}

fn test_app() -> Router {
    test_app_with_gateway(StubAiGateway::unreachable())
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, json)
}

/// POST a raw, possibly invalid, JSON body
async fn send_raw(app: &Router, uri: &str, token: Option<&str>, raw: &str) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(raw.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Register a user, log in and return the bearer token
async fn login(app: &Router) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "username": "nurse1", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "nurse1", "password": "secret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_patient(app: &Router, token: &str, mrn: &str, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/patients",
        Some(token),
        Some(json!({ "mrn": mrn, "name": name, "birth_date": "1980-05-01", "sex": "M" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "emr-backend");
    assert_eq!(body["components"]["database"]["status"], "ok");
    assert_eq!(body["components"]["drug_database"]["status"], "ok");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/patients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&app, Method::GET, "/api/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_and_current_user() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "nurse1");
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "nurse1", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&app, Method::POST, "/api/auth/login", None, Some(json!({ "username": "nurse1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let app = test_app();
    login(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "username": "nurse1", "password": "another" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_duplicate_mrn_returns_409() {
    let app = test_app();
    let token = login(&app).await;
    create_patient(&app, &token, "P1001", "Kim Minjun").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/patients",
        Some(&token),
        Some(json!({ "mrn": "P1001", "name": "Lee Seoyeon" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "mrn already exists");

    let (status, _) = send(&app, Method::POST, "/api/patients", Some(&token), Some(json!({ "mrn": "P1002" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_bodies_return_json_errors() {
    let app = test_app();
    let token = login(&app).await;

    let (status, content_type, body) = send_raw(&app, "/api/patients", Some(&token), r#"{"mrn":1001,"name":"X"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("mrn"));

    let (status, content_type, body) = send_raw(&app, "/api/patients", Some(&token), r#"{"mrn":"P1001","na"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["error"], "bad_request");

    let (status, _, body) = send_raw(&app, "/api/auth/login", None, "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_blank_mrn_is_rejected() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/patients",
        Some(&token),
        Some(json!({ "mrn": "   ", "name": "Blank" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("mrn and name are required"));

    let (status, body) = send(&app, Method::GET, "/api/patients", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_next_mrn_ignores_oversized_mrns() {
    let app = test_app();
    let token = login(&app).await;

    create_patient(&app, &token, "P99999", "Park Seojun").await;
    create_patient(&app, &token, "P4294967295", "Choi Yuna").await;

    let (status, body) = send(&app, Method::GET, "/api/patients/next-mrn", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mrn"], "P1001");
}

#[tokio::test]
async fn test_patient_registry_flow() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/patients/next-mrn", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mrn"], "P1001");

    let id = create_patient(&app, &token, "P1001", "Kim Minjun").await;
    create_patient(&app, &token, "P1002", "Park Jiwoo").await;

    let (_, body) = send(&app, Method::GET, "/api/patients/next-mrn", Some(&token), None).await;
    assert_eq!(body["mrn"], "P1003");

    let (status, body) = send(&app, Method::GET, "/api/patients?query=minjun", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/encounters",
        Some(&token),
        Some(json!({ "patient_id": id, "type": "OPD", "reason": "Headache" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let encounter_id = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/api/patients/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mrn"], "P1001");
    assert_eq!(body["encounters"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/encounters/{}/close", encounter_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["end_at"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/patients/9999", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/encounters",
        Some(&token),
        Some(json!({ "patient_id": 9999 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_observation_out_of_range_is_flagged() {
    let app = test_app();
    let token = login(&app).await;
    let id = create_patient(&app, &token, "P1001", "Kim Minjun").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/observations",
        Some(&token),
        Some(json!({
            "patient_id": id,
            "category": "vital-signs",
            "code_loinc": "BP-SYS",
            "value": 185,
            "unit": "mmHg"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["flags"], json!(["HIGH_BP_SYSTOLIC", "CRITICAL_BP_SYSTOLIC"]));

    let (status, body) = send(&app, Method::GET, &format!("/api/alerts/patient/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_alert"], true);
    assert_eq!(body["count"], 1);

    let (_, body) = send(&app, Method::GET, &format!("/api/observations/latest/{}", id), Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/observations",
        Some(&token),
        Some(json!({ "patient_id": id, "category": "vital-signs", "code_loinc": "HR" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_drug_endpoints() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = send(&app, Method::GET, "/api/drugs/search?query=warf", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/drugs/interactions",
        Some(&token),
        Some(json!({ "medications": ["Warfarin", "Aspirin"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_interactions"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/drugs/prescription-guide",
        Some(&token),
        Some(json!({ "medications": ["Metformin"], "patient": { "age": 72, "conditions": ["renal disease"] } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["recommendations"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, Method::GET, "/api/drugs/status", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["total_drugs"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_prescription_and_dashboard() {
    let app = test_app();
    let token = login(&app).await;
    let id = create_patient(&app, &token, "P1001", "Kim Minjun").await;

    send(
        &app,
        Method::POST,
        "/api/encounters",
        Some(&token),
        Some(json!({ "patient_id": id, "type": "OPD" })),
    )
    .await;

    let (_, body) = send(&app, Method::GET, "/api/dashboard", Some(&token), None).await;
    assert_eq!(body["patients"][0]["status"], "waiting");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/prescriptions",
        Some(&token),
        Some(json!({
            "patient_id": id,
            "medications": [
                { "name": "Warfarin", "dosage": "5mg", "amount": 30 },
                { "name": "Aspirin", "dosage": "100mg", "amount": 30 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["prescription"]["id"].as_str().unwrap().starts_with("RX"));
    assert_eq!(body["prescription"]["total_amount"], 60.0);
    assert!(!body["prescription"]["interactions"].as_array().unwrap().is_empty());
    assert!(body["text"].as_str().unwrap().contains("Warfarin"));

    let (_, body) = send(&app, Method::GET, "/api/dashboard?window_hours=24", Some(&token), None).await;
    assert_eq!(body["patients"].as_array().unwrap().len(), 1);
    assert_eq!(body["patients"][0]["status"], "prescribed");

    let (_, body) = send(&app, Method::GET, &format!("/api/prescriptions/history/{}", id), Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/api/prescriptions/statistics", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_prescriptions"], 1);

    let (status, _) = send(&app, Method::GET, "/api/dashboard?window_hours=0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/prescriptions",
        Some(&token),
        Some(json!({ "patient_id": 9999, "medications": [{ "name": "Aspirin", "amount": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_test_order_lifecycle() {
    let app = test_app();
    let token = login(&app).await;
    let id = create_patient(&app, &token, "P1001", "Kim Minjun").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tests/request",
        Some(&token),
        Some(json!({
            "patient_id": id,
            "category": "blood",
            "procedure_kind": "blood_test",
            "test_name": "Complete blood count",
            "urgency": "normal"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let test_id = body["id"].as_str().unwrap().to_string();

    let slot = (Utc::now() + Duration::days(1)).to_rfc3339();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tests/schedule",
        Some(&token),
        Some(json!({ "test_request_id": test_id, "available_slots": [slot] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["room"], "Lab 1");

    let date = (Utc::now() + Duration::days(1)).date_naive();
    let (_, body) = send(&app, Method::GET, &format!("/api/tests/schedule?date={}", date), Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tests/results",
        Some(&token),
        Some(json!({ "test_request_id": test_id, "results": { "WBC": 12000, "HGB": 14 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["interpretation"][0]["interpretation"], "abnormal");
    assert_eq!(body["interpretation"][1]["is_normal"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/tests/results",
        Some(&token),
        Some(json!({ "test_request_id": "TEST0", "results": { "WBC": 5000 } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, Method::GET, "/api/tests/statistics", Some(&token), None).await;
    assert_eq!(body["completed_tests"], 1);
}

#[tokio::test]
async fn test_document_lifecycle() {
    let app = test_app();
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/documents/opinion",
        Some(&token),
        Some(json!({
            "patient": { "name": "Choi Yuna", "mrn": "P2001", "sex": "F" },
            "content": "Suspected migraine",
            "referral_reason": "Neurology consult"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let filename = body["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("opinion_P2001_"));

    let (status, body) = send(&app, Method::GET, &format!("/api/documents/{}", filename), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["content"].as_str().unwrap().contains("Choi Yuna"));

    let (_, body) = send(&app, Method::GET, "/api/documents", Some(&token), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/documents/{}", filename), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/documents/{}", filename), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, "/api/documents/medical-report", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ai_proxy() {
    let app = test_app_with_gateway(StubAiGateway::replying(200, json!({ "summary": "no acute findings" })));
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/ai/lab-summary?provider=llm",
        Some(&token),
        Some(json!({ "labs": [{ "code": "GLU", "value": 130 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "no acute findings");

    let app = test_app();
    let token = login(&app).await;
    let (status, body) = send(&app, Method::GET, "/api/ai/models/status", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "ai_gateway_unavailable");
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert_eq!(response.headers().get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
}
