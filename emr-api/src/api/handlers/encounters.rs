use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use emr_domain::entities::{CloseEncounterRequest, CreateEncounterRequest, Encounter};
use emr_domain::services::EncounterServiceTrait;

use super::error::{service_error, ErrorResponse};
use super::extract::JsonBody;

/// Service type for dependency injection
pub type EncounterService = Arc<dyn EncounterServiceTrait + Send + Sync>;

/// Open an encounter for a patient
#[utoipa::path(
    post,
    path = "/api/encounters",
    request_body = CreateEncounterRequest,
    responses(
        (status = 201, description = "Encounter opened", body = Encounter),
        (status = 400, description = "Missing or unknown patient", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "encounters"
)]
#[instrument(skip(service, request))]
pub async fn create_encounter(
    State(service): State<EncounterService>,
    JsonBody(request): JsonBody<CreateEncounterRequest>,
) -> Result<(StatusCode, Json<Encounter>), ErrorResponse> {
    let encounter = service.create_encounter(request).await.map_err(service_error)?;
    info!("Encounter {} opened for patient {}", encounter.id, encounter.patient_id);
    Ok((StatusCode::CREATED, Json(encounter)))
}

/// Close an encounter; the body is optional
#[utoipa::path(
    post,
    path = "/api/encounters/{id}/close",
    params(("id" = i64, Path, description = "Encounter ID")),
    request_body(content = CloseEncounterRequest, description = "Optional end time"),
    responses(
        (status = 200, description = "Encounter closed", body = Encounter),
        (status = 404, description = "Encounter not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "encounters"
)]
#[instrument(skip(service, body))]
pub async fn close_encounter(
    State(service): State<EncounterService>,
    Path(id): Path<i64>,
    body: Option<Json<CloseEncounterRequest>>,
) -> Result<Json<Encounter>, ErrorResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let encounter = service.close_encounter(id, request).await.map_err(service_error)?;
    Ok(Json(encounter))
}
