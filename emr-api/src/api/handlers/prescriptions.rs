use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use emr_domain::entities::{
    CheckPrescriptionRequest, CreatePrescriptionRequest, IssuedPrescription, Prescription,
    PrescriptionInteractionCheck, PrescriptionStatistics,
};
use emr_domain::services::PrescriptionServiceTrait;

use super::error::{service_error, ErrorResponse};
use super::extract::JsonBody;

/// Service type for dependency injection
pub type PrescriptionService = Arc<dyn PrescriptionServiceTrait + Send + Sync>;

/// Issue a prescription
#[utoipa::path(
    post,
    path = "/api/prescriptions",
    request_body = CreatePrescriptionRequest,
    responses(
        (status = 201, description = "Prescription issued", body = IssuedPrescription),
        (status = 400, description = "No medications or invalid line", body = ErrorResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "prescriptions"
)]
#[instrument(skip(service, request))]
pub async fn issue_prescription(
    State(service): State<PrescriptionService>,
    JsonBody(request): JsonBody<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<IssuedPrescription>), ErrorResponse> {
    let issued = service.issue_prescription(request).await.map_err(service_error)?;
    info!(
        "Prescription {} issued with {} interaction alerts",
        issued.prescription.id,
        issued.prescription.interactions.len()
    );
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Interactions among prescription lines, without issuing anything
#[utoipa::path(
    post,
    path = "/api/prescriptions/check-interactions",
    request_body = CheckPrescriptionRequest,
    responses(
        (status = 200, description = "Interaction check", body = PrescriptionInteractionCheck),
    ),
    security(("bearer" = [])),
    tag = "prescriptions"
)]
#[instrument(skip(service, request))]
pub async fn check_prescription_interactions(
    State(service): State<PrescriptionService>,
    JsonBody(request): JsonBody<CheckPrescriptionRequest>,
) -> Result<Json<PrescriptionInteractionCheck>, ErrorResponse> {
    let check = service.check_interactions(&request.medications).await.map_err(service_error)?;
    Ok(Json(check))
}

#[utoipa::path(
    get,
    path = "/api/prescriptions/history/{patient_id}",
    params(("patient_id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Prescriptions, newest first", body = [Prescription]),
    ),
    security(("bearer" = [])),
    tag = "prescriptions"
)]
#[instrument(skip(service))]
pub async fn prescription_history(
    State(service): State<PrescriptionService>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Vec<Prescription>>, ErrorResponse> {
    let history = service.history(patient_id).await.map_err(service_error)?;
    Ok(Json(history))
}

#[utoipa::path(
    get,
    path = "/api/prescriptions/statistics",
    responses(
        (status = 200, description = "Prescription totals", body = PrescriptionStatistics),
    ),
    security(("bearer" = [])),
    tag = "prescriptions"
)]
#[instrument(skip(service))]
pub async fn prescription_statistics(State(service): State<PrescriptionService>) -> Result<Json<PrescriptionStatistics>, ErrorResponse> {
    let statistics = service.statistics().await.map_err(service_error)?;
    Ok(Json(statistics))
}
