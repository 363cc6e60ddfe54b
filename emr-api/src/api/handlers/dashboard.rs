use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tracing::{debug, instrument};

use emr_domain::entities::{Dashboard, DashboardQuery};
use emr_domain::services::DashboardServiceTrait;

use super::error::{service_error, ErrorResponse};

/// Service type for dependency injection
pub type DashboardService = Arc<dyn DashboardServiceTrait + Send + Sync>;

/// Unified clinic view: waiting, prescribed, in test, results ready
#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(("window_hours" = Option<i64>, Query, description = "Look-back window, defaults to 24")),
    responses(
        (status = 200, description = "One entry per patient", body = Dashboard),
        (status = 400, description = "Window is not positive", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "dashboard"
)]
#[instrument(skip(service))]
pub async fn get_dashboard(
    State(service): State<DashboardService>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ErrorResponse> {
    let dashboard = service.dashboard(query.window_hours).await.map_err(service_error)?;
    debug!("Dashboard lists {} patients", dashboard.patients.len());
    Ok(Json(dashboard))
}
