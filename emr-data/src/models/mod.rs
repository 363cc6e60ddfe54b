// Storage records, one module per table group
pub mod document;
pub mod encounter;
pub mod observation;
pub mod organization;
pub mod patient;
pub mod prescription;
pub mod test_request;
pub mod user;

pub use document::{DocumentRecord, NewDocumentRecord};
pub use encounter::{EncounterRecord, NewEncounterRecord};
pub use observation::{NewObservationRecord, ObservationRecord};
pub use organization::{LocationRecord, OrganizationRecord, PractitionerRecord};
pub use patient::{NewPatientRecord, PatientRecord};
pub use prescription::PrescriptionRecord;
pub use test_request::TestRequestRecord;
pub use user::{NewUserRecord, UserRecord};
