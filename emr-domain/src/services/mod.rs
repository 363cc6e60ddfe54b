// Domain services
// This module contains business logic implementations.

pub mod ai_gateway;
pub mod dashboard;
pub mod demo_data;
pub mod documents;
pub mod drugs;
pub mod encounters;
pub mod flags;
pub mod mrn;
pub mod observations;
pub mod patients;
pub mod prescriptions;
pub mod retry;
pub mod seed;
pub mod test_orders;
pub mod users;

// Re-export service traits and factory functions
pub use ai_gateway::{create_default_ai_gateway, AiGatewayError, AiGatewayTrait, AiResponse, AiRoute, HttpAiGateway};
pub use dashboard::{create_default_dashboard_service, DashboardServiceTrait};
pub use documents::{create_default_document_service, DocumentServiceTrait};
pub use drugs::{DrugDatabase, DrugServiceTrait};
pub use encounters::{create_default_encounter_service, EncounterServiceTrait};
pub use observations::{create_default_observation_service, ObservationServiceTrait};
pub use patients::{create_default_patient_service, PatientServiceTrait};
pub use prescriptions::{create_default_prescription_service, PrescriptionServiceTrait};
pub use seed::seed_demo_data;
pub use test_orders::{create_default_test_order_service, TestOrderServiceTrait};
pub use users::{create_default_user_service, UserServiceTrait};
