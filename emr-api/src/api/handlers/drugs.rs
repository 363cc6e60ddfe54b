use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::IntoParams;

use emr_domain::entities::{
    DrugDatabaseStatus, DrugSearchResult, InteractionCheck, InteractionCheckRequest, PrescriptionGuide,
    PrescriptionGuideRequest,
};
use emr_domain::services::{DrugDatabase, DrugServiceTrait};

use super::extract::JsonBody;

/// Shared drug reference data
pub type DrugService = Arc<DrugDatabase>;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DrugSearchParams {
    /// Name, ingredient or category fragment
    #[serde(default)]
    pub query: String,
}

/// Search the drug database
#[utoipa::path(
    get,
    path = "/api/drugs/search",
    params(DrugSearchParams),
    responses((status = 200, description = "Matching drugs", body = DrugSearchResult)),
    security(("bearer" = [])),
    tag = "drugs"
)]
#[instrument(skip(drugs))]
pub async fn search_drugs(
    State(drugs): State<DrugService>,
    Query(params): Query<DrugSearchParams>,
) -> Json<DrugSearchResult> {
    Json(drugs.search(&params.query))
}

/// Pairwise interaction check
#[utoipa::path(
    post,
    path = "/api/drugs/interactions",
    request_body = InteractionCheckRequest,
    responses(
        (status = 200, description = "Interactions and warnings", body = InteractionCheck),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "drugs"
)]
#[instrument(skip(drugs, request))]
pub async fn check_interactions(
    State(drugs): State<DrugService>,
    JsonBody(request): JsonBody<InteractionCheckRequest>,
) -> Json<InteractionCheck> {
    debug!("Checking {} medications", request.medications.len());
    Json(drugs.check_interactions(&request.medications))
}

/// Dosage guidelines with patient-specific advice
#[utoipa::path(
    post,
    path = "/api/drugs/prescription-guide",
    request_body = PrescriptionGuideRequest,
    responses(
        (status = 200, description = "Prescription guide", body = PrescriptionGuide),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "drugs"
)]
#[instrument(skip(drugs, request))]
pub async fn prescription_guide(
    State(drugs): State<DrugService>,
    JsonBody(request): JsonBody<PrescriptionGuideRequest>,
) -> Json<PrescriptionGuide> {
    Json(drugs.prescription_guide(&request.medications, request.patient))
}

#[utoipa::path(
    get,
    path = "/api/drugs/status",
    responses((status = 200, description = "Drug database summary", body = DrugDatabaseStatus)),
    security(("bearer" = [])),
    tag = "drugs"
)]
#[instrument(skip(drugs))]
pub async fn drug_database_status(State(drugs): State<DrugService>) -> Json<DrugDatabaseStatus> {
    Json(drugs.status())
}
