use std::sync::Arc;

use axum::{body::to_bytes, extract::State, http::StatusCode, response::IntoResponse};

use emr_domain::health::ComponentStatus;
use emr_domain::testing::MockHealthService;

use crate::api::handlers::health::{health_check, HealthResponse, HealthService};

async fn call(service: MockHealthService) -> (StatusCode, HealthResponse) {
    let service: HealthService = Arc::new(service);
    let response = health_check(State(service)).await.into_response();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_healthy_system_reports_ok() {
    let (status, body) = call(MockHealthService::new()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "ok");
    assert_eq!(body.service, "emr-backend");
    assert_eq!(body.components.database.status, "ok");
    assert_eq!(body.components.drug_database.status, "ok");
    assert!(!body.version.is_empty());
}

#[tokio::test]
async fn test_degraded_database_returns_503() {
    let (status, body) = call(MockHealthService::new().with_degraded_database()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body.status, "degraded");
    assert_eq!(body.components.database.status, "degraded");
    assert!(body.components.database.message.is_some());
}

#[tokio::test]
async fn test_unhealthy_database_returns_500() {
    let (status, body) = call(MockHealthService::new().with_unhealthy_database()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.status, "error");
    assert_eq!(body.components.database.message.as_deref(), Some("Database connection failed"));
}

#[tokio::test]
async fn test_empty_drug_database_degrades() {
    let service = MockHealthService::new().with_component(
        "drug_database",
        ComponentStatus::Degraded,
        Some("Drug database is empty".to_string()),
    );
    let (status, body) = call(service).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body.components.drug_database.status, "degraded");
    assert_eq!(body.components.api.status, "ok");
}
