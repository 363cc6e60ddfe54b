use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::IntoParams;

use emr_domain::entities::{CreatePatientRequest, Encounter, NextMrn, Patient, PatientDetail};
use emr_domain::services::PatientServiceTrait;

use super::encounters::EncounterService;
use super::error::{service_error, ErrorResponse};
use super::extract::JsonBody;

/// Service type for dependency injection
pub type PatientService = Arc<dyn PatientServiceTrait + Send + Sync>;

/// Query parameters for the patient list
#[derive(Debug, Deserialize, IntoParams)]
pub struct PatientSearchParams {
    /// Matches name or MRN; omit to list everyone
    pub query: Option<String>,
}

/// Register a patient
#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "mrn or name missing", body = ErrorResponse),
        (status = 409, description = "MRN already exists", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "patients"
)]
#[instrument(skip(service, request), fields(mrn = %request.mrn))]
pub async fn create_patient(
    State(service): State<PatientService>,
    JsonBody(request): JsonBody<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Patient>), ErrorResponse> {
    let patient = service.create_patient(request).await.map_err(service_error)?;
    info!("Patient created with ID: {}", patient.id);
    Ok((StatusCode::CREATED, Json(patient)))
}

/// List or search patients, newest first
#[utoipa::path(
    get,
    path = "/api/patients",
    params(PatientSearchParams),
    responses(
        (status = 200, description = "Matching patients", body = [Patient]),
    ),
    security(("bearer" = [])),
    tag = "patients"
)]
#[instrument(skip(service))]
pub async fn search_patients(
    State(service): State<PatientService>,
    Query(params): Query<PatientSearchParams>,
) -> Result<Json<Vec<Patient>>, ErrorResponse> {
    let patients = service.search_patients(params.query).await.map_err(service_error)?;
    Ok(Json(patients))
}

/// Suggest the next free MRN
#[utoipa::path(
    get,
    path = "/api/patients/next-mrn",
    responses(
        (status = 200, description = "Next MRN", body = NextMrn),
    ),
    security(("bearer" = [])),
    tag = "patients"
)]
#[instrument(skip(service))]
pub async fn next_mrn(State(service): State<PatientService>) -> Result<Json<NextMrn>, ErrorResponse> {
    let next = service.next_mrn().await.map_err(service_error)?;
    Ok(Json(next))
}

/// A patient with their most recent encounters
#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient found", body = PatientDetail),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "patients"
)]
#[instrument(skip(service))]
pub async fn get_patient(
    State(service): State<PatientService>,
    Path(id): Path<i64>,
) -> Result<Json<PatientDetail>, ErrorResponse> {
    let detail = service.get_patient_detail(id).await.map_err(service_error)?;
    Ok(Json(detail))
}

/// All encounters of a patient
#[utoipa::path(
    get,
    path = "/api/patients/{id}/encounters",
    params(("id" = i64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Encounters, newest first", body = [Encounter]),
    ),
    security(("bearer" = [])),
    tag = "encounters"
)]
#[instrument(skip(service))]
pub async fn list_patient_encounters(
    State(service): State<EncounterService>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Encounter>>, ErrorResponse> {
    let encounters = service.list_for_patient(id).await.map_err(service_error)?;
    Ok(Json(encounters))
}
