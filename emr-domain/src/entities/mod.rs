// Domain entities and request/response value objects
pub mod conversions;
pub mod dashboard;
pub mod document;
pub mod drug;
pub mod encounter;
pub mod observation;
pub mod patient;
pub mod prescription;
pub mod test_order;
pub mod user;

// Re-export common types for easier imports
pub use dashboard::{Dashboard, DashboardPatient, DashboardQuery, DashboardStatus};
pub use document::{
    DocumentKind, DocumentPatient, DocumentSummary, GeneratedDocument, MedicalReportRequest,
    OpinionRequest, PrescriptionDocumentRequest, TestRequestDocumentRequest,
};
pub use drug::{
    DosageGuideline, Drug, DrugDatabaseStatus, DrugInteraction, DrugSearchResult, DrugWarning,
    GuidePatient, InteractionCheck, InteractionCheckRequest, InteractionSeverity,
    PrescriptionGuide, PrescriptionGuideRequest,
};
pub use encounter::{CloseEncounterRequest, CreateEncounterRequest, Encounter};
pub use observation::{AlertEntry, CreateObservationRequest, Observation, PatientAlerts};
pub use patient::{CreatePatientRequest, NextMrn, Patient, PatientDetail};
pub use prescription::{
    CheckPrescriptionRequest, Contraindication, CreatePrescriptionRequest, IssuedPrescription,
    Prescription, PrescriptionInteraction, PrescriptionInteractionCheck, PrescriptionItem, PrescriptionStatistics,
};
pub use test_order::{
    CreateTestRequest, ResultInterpretation, ScheduleQuery, ScheduleTestRequest,
    SubmitResultsRequest, TestRequest, TestResults, TestSchedule, TestStatistics,
};
pub use user::{CreateUserRequest, User};

use validator::ValidationError;

/// Rejects empty and whitespace-only strings
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
