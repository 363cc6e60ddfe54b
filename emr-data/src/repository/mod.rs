// Repository module structure
pub mod errors;
mod document;
mod encounter;
mod observation;
mod organization;
mod patient;
mod prescription;
mod test_request;
mod user;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use document::{DocumentRepository, DocumentRepositoryTrait};
pub use encounter::{EncounterRepository, EncounterRepositoryTrait};
pub use observation::{ObservationRepository, ObservationRepositoryTrait};
pub use organization::{OrganizationRepository, OrganizationRepositoryTrait};
pub use patient::{PatientRepository, PatientRepositoryTrait};
pub use prescription::{PrescriptionRepository, PrescriptionRepositoryTrait};
pub use test_request::{TestRequestRepository, TestRequestRepositoryTrait};
pub use user::{UserRepository, UserRepositoryTrait};
