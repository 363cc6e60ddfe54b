use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use emr_domain::auth::{LoginRequest, LoginResponse};
use emr_domain::entities::*;

use crate::api::handlers::{self, error::ErrorResponse, health};

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Registers the `bearer` scheme the protected paths refer to
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health and auth
        handlers::health::health_check,
        handlers::users::login,
        handlers::users::register_user,
        handlers::users::list_users,
        handlers::users::current_user,

        // Patient registry
        handlers::patients::create_patient,
        handlers::patients::search_patients,
        handlers::patients::next_mrn,
        handlers::patients::get_patient,
        handlers::patients::list_patient_encounters,
        handlers::encounters::create_encounter,
        handlers::encounters::close_encounter,
        handlers::observations::create_observation,
        handlers::observations::latest_observations,
        handlers::observations::patient_alerts,

        // Medication
        handlers::drugs::search_drugs,
        handlers::drugs::check_interactions,
        handlers::drugs::prescription_guide,
        handlers::drugs::drug_database_status,
        handlers::prescriptions::issue_prescription,
        handlers::prescriptions::check_prescription_interactions,
        handlers::prescriptions::prescription_history,
        handlers::prescriptions::prescription_statistics,

        // Diagnostics
        handlers::test_orders::request_test,
        handlers::test_orders::schedule_test,
        handlers::test_orders::submit_results,
        handlers::test_orders::test_schedule,
        handlers::test_orders::test_statistics,

        // Documents
        handlers::documents::generate_opinion,
        handlers::documents::generate_medical_report,
        handlers::documents::generate_prescription,
        handlers::documents::generate_test_request,
        handlers::documents::list_documents,
        handlers::documents::get_document,
        handlers::documents::delete_document,

        // AI gateway proxy
        handlers::ai::ai_health,
        handlers::ai::ai_models_status,
        handlers::ai::ai_clinical_note,
        handlers::ai::ai_lab_summary,
        handlers::ai::ai_symptom_analysis,
        handlers::ai::ai_prescription_guide,
        handlers::ai::ai_test_analysis,

        handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            ErrorResponse,
            health::HealthResponse,
            health::ComponentStatus,
            health::ComponentHealthStatus,

            LoginRequest,
            LoginResponse,
            User,
            CreateUserRequest,

            Patient,
            PatientDetail,
            CreatePatientRequest,
            NextMrn,
            Encounter,
            CreateEncounterRequest,
            CloseEncounterRequest,
            Observation,
            CreateObservationRequest,
            AlertEntry,
            PatientAlerts,

            Drug,
            DrugSearchResult,
            InteractionSeverity,
            InteractionCheckRequest,
            DrugInteraction,
            DrugWarning,
            InteractionCheck,
            GuidePatient,
            PrescriptionGuideRequest,
            DosageGuideline,
            PrescriptionGuide,
            DrugDatabaseStatus,

            PrescriptionItem,
            PrescriptionInteraction,
            Contraindication,
            Prescription,
            CreatePrescriptionRequest,
            CheckPrescriptionRequest,
            PrescriptionInteractionCheck,
            IssuedPrescription,
            PrescriptionStatistics,

            CreateTestRequest,
            ScheduleTestRequest,
            SubmitResultsRequest,
            TestSchedule,
            ResultInterpretation,
            TestResults,
            TestRequest,
            TestStatistics,

            DocumentKind,
            DocumentPatient,
            OpinionRequest,
            MedicalReportRequest,
            PrescriptionDocumentRequest,
            TestRequestDocumentRequest,
            GeneratedDocument,
            DocumentSummary,

            DashboardStatus,
            DashboardPatient,
            Dashboard,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "auth", description = "Login"),
        (name = "users", description = "User accounts"),
        (name = "patients", description = "Patient registry"),
        (name = "encounters", description = "Visits"),
        (name = "observations", description = "Vital signs, lab values and alerts"),
        (name = "drugs", description = "Drug reference data and interaction checks"),
        (name = "prescriptions", description = "Prescription issuing and history"),
        (name = "tests", description = "Diagnostic test orders"),
        (name = "documents", description = "Generated clinical documents"),
        (name = "ai", description = "AI gateway proxy"),
        (name = "dashboard", description = "Clinic status board")
    ),
    info(
        title = "EMR API",
        version = "0.1.0",
        description = "REST API of the clinic electronic medical record",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
