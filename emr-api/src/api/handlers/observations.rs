use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use emr_domain::entities::{CreateObservationRequest, Observation, PatientAlerts};
use emr_domain::services::ObservationServiceTrait;

use super::error::{service_error, ErrorResponse};
use super::extract::JsonBody;

/// Service type for dependency injection
pub type ObservationService = Arc<dyn ObservationServiceTrait + Send + Sync>;

/// Record an observation and flag its value
#[utoipa::path(
    post,
    path = "/api/observations",
    request_body = CreateObservationRequest,
    responses(
        (status = 201, description = "Observation stored with its flags", body = Observation),
        (status = 400, description = "Required field missing", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "observations"
)]
#[instrument(skip(service, request), fields(code = %request.code_loinc))]
pub async fn create_observation(
    State(service): State<ObservationService>,
    JsonBody(request): JsonBody<CreateObservationRequest>,
) -> Result<(StatusCode, Json<Observation>), ErrorResponse> {
    let observation = service.record_observation(request).await.map_err(service_error)?;
    if !observation.flags.is_empty() {
        info!("Observation {} flagged {:?}", observation.id, observation.flags);
    }
    Ok((StatusCode::CREATED, Json(observation)))
}

/// Newest observations of a patient
#[utoipa::path(
    get,
    path = "/api/observations/latest/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Up to 50 observations with flags", body = [Observation]),
    ),
    security(("bearer" = [])),
    tag = "observations"
)]
#[instrument(skip(service))]
pub async fn latest_observations(
    State(service): State<ObservationService>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<Observation>>, ErrorResponse> {
    let observations = service.latest_for_patient(patient_id).await.map_err(service_error)?;
    Ok(Json(observations))
}

/// Flagged observations of the last day
#[utoipa::path(
    get,
    path = "/api/alerts/patient/{id}",
    params(("id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Alert summary", body = PatientAlerts),
    ),
    security(("bearer" = [])),
    tag = "observations"
)]
#[instrument(skip(service))]
pub async fn patient_alerts(
    State(service): State<ObservationService>,
    Path(id): Path<i64>,
) -> Result<Json<PatientAlerts>, ErrorResponse> {
    let alerts = service.patient_alerts(id).await.map_err(service_error)?;
    Ok(Json(alerts))
}
