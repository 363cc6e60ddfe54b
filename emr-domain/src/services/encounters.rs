use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use emr_data::models::NewEncounterRecord;
use emr_data::repository::{EncounterRepositoryTrait, PatientRepositoryTrait};

use crate::database::DatabasePool;
use crate::entities::conversions;
use crate::entities::encounter::{CloseEncounterRequest, CreateEncounterRequest, Encounter};
use crate::errors::{validate_request, ServiceError};

/// Upper bound for a patient's encounter listing
const MAX_ENCOUNTERS: usize = 200;

#[async_trait]
pub trait EncounterServiceTrait {
    /// Open an encounter; the patient must exist
    async fn create_encounter(&self, request: CreateEncounterRequest) -> Result<Encounter, ServiceError>;

    /// Encounters of a patient, newest first
    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Encounter>, ServiceError>;

    /// Set the end time of an encounter
    async fn close_encounter(&self, id: i64, request: CloseEncounterRequest) -> Result<Encounter, ServiceError>;
}

pub struct EncounterService<E: EncounterRepositoryTrait, P: PatientRepositoryTrait> {
    encounters: E,
    patients: P,
}

impl<E: EncounterRepositoryTrait, P: PatientRepositoryTrait> EncounterService<E, P> {
    pub fn new(encounters: E, patients: P) -> Self {
        Self { encounters, patients }
    }
}

#[async_trait]
impl<E, P> EncounterServiceTrait for EncounterService<E, P>
where
    E: EncounterRepositoryTrait + Send + Sync,
    P: PatientRepositoryTrait + Send + Sync,
{
    async fn create_encounter(&self, request: CreateEncounterRequest) -> Result<Encounter, ServiceError> {
        validate_request(&request)?;
        let patient_id = request
            .patient_id
            .ok_or_else(|| ServiceError::Validation("patient_id is required".to_string()))?;

        if self.patients.get_by_id(patient_id).await?.is_none() {
            return Err(ServiceError::Validation(format!("unknown patient_id {}", patient_id)));
        }

        let record = self.encounters
            .create(NewEncounterRecord {
                patient_id,
                practitioner_id: request.practitioner_id,
                location_id: request.location_id,
                encounter_type: request.encounter_type,
                reason: request.reason,
                start_at: request.start_at.unwrap_or_else(Utc::now),
            })
            .await?;

        info!("Opened {} encounter {} for patient {}", record.encounter_type, record.id, patient_id);
        Ok(conversions::convert_to_domain_encounter(record))
    }

    async fn list_for_patient(&self, patient_id: i64) -> Result<Vec<Encounter>, ServiceError> {
        let records = self.encounters.list_for_patient(patient_id, MAX_ENCOUNTERS).await?;
        Ok(records.into_iter().map(conversions::convert_to_domain_encounter).collect())
    }

    async fn close_encounter(&self, id: i64, request: CloseEncounterRequest) -> Result<Encounter, ServiceError> {
        let end_at = request.end_at.unwrap_or_else(Utc::now);
        let record = self.encounters.close(id, end_at).await?;
        info!("Closed encounter {}", id);
        Ok(conversions::convert_to_domain_encounter(record))
    }
}

pub fn create_default_encounter_service(pool: DatabasePool) -> impl EncounterServiceTrait + Send + Sync {
    EncounterService::new(
        emr_data::repository::EncounterRepository::new(pool.clone()),
        emr_data::repository::PatientRepository::new(pool),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::patient::CreatePatientRequest;
    use crate::services::patients::{create_default_patient_service, PatientServiceTrait};

    async fn setup() -> (DatabasePool, i64) {
        let pool = DatabasePool::in_memory().unwrap();
        let patient = create_default_patient_service(pool.clone())
            .create_patient(CreatePatientRequest {
                mrn: "P0001".to_string(),
                name: "Hong Gildong".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (pool, patient.id)
    }

    #[tokio::test]
    async fn test_open_and_close_encounter() {
        let (pool, patient_id) = setup().await;
        let service = create_default_encounter_service(pool);

        let encounter = service
            .create_encounter(CreateEncounterRequest {
                patient_id: Some(patient_id),
                encounter_type: "OPD".to_string(),
                reason: Some("Health checkup".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(encounter.end_at.is_none());

        let closed = service
            .close_encounter(encounter.id, CloseEncounterRequest::default())
            .await
            .unwrap();
        assert!(closed.end_at.is_some());

        let listed = service.list_for_patient(patient_id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_patient_is_validation_error() {
        let (pool, _) = setup().await;
        let service = create_default_encounter_service(pool);

        let result = service
            .create_encounter(CreateEncounterRequest {
                patient_id: Some(404),
                encounter_type: "OPD".to_string(),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_closing_missing_encounter_is_not_found() {
        let (pool, _) = setup().await;
        let service = create_default_encounter_service(pool);

        let result = service.close_encounter(77, CloseEncounterRequest::default()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
