use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{info, instrument};

use emr_domain::entities::{
    CreateTestRequest, ScheduleQuery, ScheduleTestRequest, SubmitResultsRequest, TestRequest, TestResults,
    TestSchedule, TestStatistics,
};
use emr_domain::services::TestOrderServiceTrait;

use super::error::{service_error, ErrorResponse};
use super::extract::JsonBody;

/// Service type for dependency injection
pub type TestOrderService = Arc<dyn TestOrderServiceTrait + Send + Sync>;

/// Order a diagnostic test
#[utoipa::path(
    post,
    path = "/api/tests/request",
    request_body = CreateTestRequest,
    responses(
        (status = 201, description = "Test requested", body = TestRequest),
        (status = 400, description = "Missing field or unknown urgency", body = ErrorResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tests"
)]
#[instrument(skip(service, request), fields(category = %request.category))]
pub async fn request_test(
    State(service): State<TestOrderService>,
    JsonBody(request): JsonBody<CreateTestRequest>,
) -> Result<(StatusCode, Json<TestRequest>), ErrorResponse> {
    let test = service.request_test(request).await.map_err(service_error)?;
    info!("Test {} requested for patient {}", test.id, test.patient_id);
    Ok((StatusCode::CREATED, Json(test)))
}

/// Book a slot for a requested test
#[utoipa::path(
    post,
    path = "/api/tests/schedule",
    request_body = ScheduleTestRequest,
    responses(
        (status = 200, description = "Test scheduled", body = TestSchedule),
        (status = 400, description = "Unknown test type or no slot", body = ErrorResponse),
        (status = 404, description = "Test request not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tests"
)]
#[instrument(skip(service, request), fields(test_request_id = %request.test_request_id))]
pub async fn schedule_test(
    State(service): State<TestOrderService>,
    JsonBody(request): JsonBody<ScheduleTestRequest>,
) -> Result<Json<TestSchedule>, ErrorResponse> {
    let schedule = service.schedule_test(request).await.map_err(service_error)?;
    Ok(Json(schedule))
}

/// Enter results and interpret them against the catalog
#[utoipa::path(
    post,
    path = "/api/tests/results",
    request_body = SubmitResultsRequest,
    responses(
        (status = 200, description = "Results stored", body = TestResults),
        (status = 400, description = "No result values", body = ErrorResponse),
        (status = 404, description = "Test request not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "tests"
)]
#[instrument(skip(service, request), fields(test_request_id = %request.test_request_id))]
pub async fn submit_results(
    State(service): State<TestOrderService>,
    JsonBody(request): JsonBody<SubmitResultsRequest>,
) -> Result<Json<TestResults>, ErrorResponse> {
    let results = service.submit_results(request).await.map_err(service_error)?;
    Ok(Json(results))
}

/// Tests booked on a day
#[utoipa::path(
    get,
    path = "/api/tests/schedule",
    params(("date" = Option<String>, Query, description = "YYYY-MM-DD, defaults to today")),
    responses(
        (status = 200, description = "Scheduled tests", body = [TestRequest]),
    ),
    security(("bearer" = [])),
    tag = "tests"
)]
#[instrument(skip(service))]
pub async fn test_schedule(
    State(service): State<TestOrderService>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<TestRequest>>, ErrorResponse> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let tests = service.schedule_for(date).await.map_err(service_error)?;
    Ok(Json(tests))
}

#[utoipa::path(
    get,
    path = "/api/tests/statistics",
    responses(
        (status = 200, description = "Test order totals", body = TestStatistics),
    ),
    security(("bearer" = [])),
    tag = "tests"
)]
#[instrument(skip(service))]
pub async fn test_statistics(State(service): State<TestOrderService>) -> Result<Json<TestStatistics>, ErrorResponse> {
    let statistics = service.statistics().await.map_err(service_error)?;
    Ok(Json(statistics))
}
