pub mod handlers;
pub mod routes;

use axum::Router;

use emr_domain::config::AppConfig;
use emr_domain::database::DatabasePool;
use emr_domain::services::DrugDatabase;

pub use routes::{create_app, AppState};

/// Create the application router over a database pool
pub fn create_application(pool: DatabasePool, config: &AppConfig, drugs: std::sync::Arc<DrugDatabase>) -> Router {
    routes::create_app(AppState::from_config(pool, config, drugs))
}
