use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use emr_domain::auth::{auth_middleware, configure_security, JwtSettings};
use emr_domain::config::AppConfig;
use emr_domain::database::DatabasePool;
use emr_domain::health::create_health_service;
use emr_domain::services::{
    create_default_ai_gateway, create_default_dashboard_service, create_default_document_service,
    create_default_encounter_service, create_default_observation_service, create_default_patient_service,
    create_default_prescription_service, create_default_test_order_service, create_default_user_service,
    DrugDatabase,
};

use crate::api::handlers::{
    ai::{self, AiGateway},
    dashboard::{self, DashboardService},
    documents::{self, DocumentService},
    drugs::{self, DrugService},
    encounters::{self, EncounterService},
    health::{self, HealthService},
    observations::{self, ObservationService},
    patients::{self, PatientService},
    prescriptions::{self, PrescriptionService},
    test_orders::{self, TestOrderService},
    users::{self, UserService},
};
use crate::openapi::configure_swagger_routes;

/// Everything the handlers need; each field is extractable with `State<_>`
#[derive(Clone, FromRef)]
pub struct AppState {
    pub users: UserService,
    pub patients: PatientService,
    pub encounters: EncounterService,
    pub observations: ObservationService,
    pub prescriptions: PrescriptionService,
    pub test_orders: TestOrderService,
    pub documents: DocumentService,
    pub dashboard: DashboardService,
    pub drugs: DrugService,
    pub ai_gateway: AiGateway,
    pub health: HealthService,
    pub jwt: JwtSettings,
}

impl AppState {
    /// Wire every service to the SQLite pool
    pub fn from_config(pool: DatabasePool, config: &AppConfig, drugs: Arc<DrugDatabase>) -> Self {
        let jwt = JwtSettings::from(config);

        Self {
            users: Arc::new(create_default_user_service(pool.clone(), jwt.clone(), config.salt_rounds)),
            patients: Arc::new(create_default_patient_service(pool.clone())),
            encounters: Arc::new(create_default_encounter_service(pool.clone())),
            observations: Arc::new(create_default_observation_service(pool.clone())),
            prescriptions: Arc::new(create_default_prescription_service(pool.clone(), drugs.clone(), config)),
            test_orders: Arc::new(create_default_test_order_service(pool.clone(), config)),
            documents: Arc::new(create_default_document_service(pool.clone(), config)),
            dashboard: Arc::new(create_default_dashboard_service(pool.clone())),
            ai_gateway: Arc::new(create_default_ai_gateway(config)),
            health: Arc::new(create_health_service(pool, drugs.clone())),
            drugs,
            jwt,
        }
    }

    /// Replace the AI gateway client
    pub fn with_ai_gateway(mut self, gateway: AiGateway) -> Self {
        self.ai_gateway = gateway;
        self
    }

    /// Replace the health service
    pub fn with_health_service(mut self, health: HealthService) -> Self {
        self.health = health;
        self
    }
}

/// Routes reachable with a valid bearer token
fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users))
        .route("/me", get(users::current_user))
        // Specific routes before parametrized ones
        .route("/patients/next-mrn", get(patients::next_mrn))
        .route("/patients", get(patients::search_patients).post(patients::create_patient))
        .route("/patients/:id", get(patients::get_patient))
        .route("/patients/:id/encounters", get(patients::list_patient_encounters))
        .route("/encounters", post(encounters::create_encounter))
        .route("/encounters/:id/close", post(encounters::close_encounter))
        .route("/observations", post(observations::create_observation))
        .route("/observations/latest/:patient_id", get(observations::latest_observations))
        .route("/alerts/patient/:id", get(observations::patient_alerts))
        .route("/drugs/search", get(drugs::search_drugs))
        .route("/drugs/interactions", post(drugs::check_interactions))
        .route("/drugs/prescription-guide", post(drugs::prescription_guide))
        .route("/drugs/status", get(drugs::drug_database_status))
        .route("/prescriptions", post(prescriptions::issue_prescription))
        .route("/prescriptions/check-interactions", post(prescriptions::check_prescription_interactions))
        .route("/prescriptions/history/:patient_id", get(prescriptions::prescription_history))
        .route("/prescriptions/statistics", get(prescriptions::prescription_statistics))
        .route("/tests/request", post(test_orders::request_test))
        .route("/tests/schedule", get(test_orders::test_schedule).post(test_orders::schedule_test))
        .route("/tests/results", post(test_orders::submit_results))
        .route("/tests/statistics", get(test_orders::test_statistics))
        .route("/documents", get(documents::list_documents))
        .route("/documents/opinion", post(documents::generate_opinion))
        .route("/documents/medical-report", post(documents::generate_medical_report))
        .route("/documents/prescription", post(documents::generate_prescription))
        .route("/documents/test-request", post(documents::generate_test_request))
        .route("/documents/:filename", get(documents::get_document).delete(documents::delete_document))
        .route("/ai/health", get(ai::ai_health))
        .route("/ai/models/status", get(ai::ai_models_status))
        .route("/ai/clinical-note", post(ai::ai_clinical_note))
        .route("/ai/lab-summary", post(ai::ai_lab_summary))
        .route("/ai/symptom-analysis", post(ai::ai_symptom_analysis))
        .route("/ai/prescription-guide", post(ai::ai_prescription_guide))
        .route("/ai/test-analysis", post(ai::ai_test_analysis))
        .route("/dashboard", get(dashboard::get_dashboard))
}

/// Routes that need no token
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/login", post(users::login))
        .route("/users", post(users::register_user))
}

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    let api_routes = protected_routes()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware::<AppState>))
        .merge(public_routes());

    let app = Router::new()
        .nest("/api", api_routes)
        .with_state(state);

    debug!("API routes nested");

    let app = add_swagger_ui(app);
    debug!("Swagger UI merged");

    let app = configure_security(app).layer(TraceLayer::new_for_http());
    debug!("Security configuration applied");

    health::initialize_server_start_time();

    app
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    app.merge(configure_swagger_routes())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use emr_domain::testing::{MockHealthService, StubAiGateway};

    /// Application over an in-memory database with a stubbed AI gateway
    pub fn create_test_state(gateway: StubAiGateway) -> AppState {
        let pool = DatabasePool::in_memory().expect("in-memory database");
        let config = AppConfig {
            salt_rounds: 4,
            ..AppConfig::default()
        };
        AppState::from_config(pool, &config, Arc::new(DrugDatabase::built_in()))
            .with_ai_gateway(Arc::new(gateway))
            .with_health_service(Arc::new(MockHealthService::new()))
    }

    #[test]
    fn jwt_settings_come_from_config() {
        let state = create_test_state(StubAiGateway::unreachable());
        let jwt = JwtSettings::from_ref(&state);
        assert_eq!(jwt.issuer, "emr-backend");
        assert_eq!(jwt.expiration_hours, 12);
    }
}
