use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use tracing::{error, instrument};

use emr_domain::services::{AiGatewayTrait, AiRoute};

use super::error::ErrorResponse;

/// Gateway type for dependency injection
pub type AiGateway = Arc<dyn AiGatewayTrait + Send + Sync>;

type Params = Query<HashMap<String, String>>;

/// Forward a call and mirror the gateway's status and JSON body
async fn forward(gateway: &AiGateway, route: AiRoute, params: HashMap<String, String>, body: Option<Value>) -> Response {
    let mut query: Vec<(String, String)> = params.into_iter().collect();
    query.sort();

    let body = if route.is_post() {
        Some(body.unwrap_or_else(|| json!({})))
    } else {
        None
    };

    match gateway.forward(route, query, body).await {
        Ok(reply) => {
            let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(reply.body)).into_response()
        },
        Err(e) => {
            error!("AI gateway call to {} failed: {}", route.path(), e);
            ErrorResponse::bad_gateway("ai_gateway_unavailable", e.to_string()).into_response()
        },
    }
}

/// Gateway liveness
#[utoipa::path(
    get,
    path = "/api/ai/health",
    responses(
        (status = 200, description = "Gateway answer, passed through"),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "ai"
)]
#[instrument(skip(gateway))]
pub async fn ai_health(State(gateway): State<AiGateway>, Query(params): Params) -> Response {
    forward(&gateway, AiRoute::Health, params, None).await
}

/// Model availability
#[utoipa::path(
    get,
    path = "/api/ai/models/status",
    responses(
        (status = 200, description = "Gateway answer, passed through"),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "ai"
)]
#[instrument(skip(gateway))]
pub async fn ai_models_status(State(gateway): State<AiGateway>, Query(params): Params) -> Response {
    forward(&gateway, AiRoute::ModelsStatus, params, None).await
}

/// Clinical note summary
#[utoipa::path(
    post,
    path = "/api/ai/clinical-note",
    request_body = serde_json::Value,
    params(("provider" = Option<String>, Query, description = "Forwarded unchanged, e.g. llm")),
    responses(
        (status = 200, description = "Gateway answer, passed through"),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "ai"
)]
#[instrument(skip(gateway, body))]
pub async fn ai_clinical_note(
    State(gateway): State<AiGateway>,
    Query(params): Params,
    body: Option<Json<Value>>,
) -> Response {
    forward(&gateway, AiRoute::ClinicalNote, params, body.map(|Json(b)| b)).await
}

#[utoipa::path(
    post,
    path = "/api/ai/lab-summary",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Gateway answer, passed through"),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "ai"
)]
#[instrument(skip(gateway, body))]
pub async fn ai_lab_summary(
    State(gateway): State<AiGateway>,
    Query(params): Params,
    body: Option<Json<Value>>,
) -> Response {
    forward(&gateway, AiRoute::LabSummary, params, body.map(|Json(b)| b)).await
}

#[utoipa::path(
    post,
    path = "/api/ai/symptom-analysis",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Gateway answer, passed through"),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "ai"
)]
#[instrument(skip(gateway, body))]
pub async fn ai_symptom_analysis(
    State(gateway): State<AiGateway>,
    Query(params): Params,
    body: Option<Json<Value>>,
) -> Response {
    forward(&gateway, AiRoute::SymptomAnalysis, params, body.map(|Json(b)| b)).await
}

#[utoipa::path(
    post,
    path = "/api/ai/prescription-guide",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Gateway answer, passed through"),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "ai"
)]
#[instrument(skip(gateway, body))]
pub async fn ai_prescription_guide(
    State(gateway): State<AiGateway>,
    Query(params): Params,
    body: Option<Json<Value>>,
) -> Response {
    forward(&gateway, AiRoute::PrescriptionGuide, params, body.map(|Json(b)| b)).await
}

#[utoipa::path(
    post,
    path = "/api/ai/test-analysis",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Gateway answer, passed through"),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "ai"
)]
#[instrument(skip(gateway, body))]
pub async fn ai_test_analysis(
    State(gateway): State<AiGateway>,
    Query(params): Params,
    body: Option<Json<Value>>,
) -> Response {
    forward(&gateway, AiRoute::TestAnalysis, params, body.map(|Json(b)| b)).await
}
