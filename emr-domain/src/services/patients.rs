use async_trait::async_trait;
use tracing::{debug, info};

use emr_data::models::NewPatientRecord;
use emr_data::repository::{EncounterRepositoryTrait, PatientRepositoryTrait, RepositoryError};

use crate::database::DatabasePool;
use crate::entities::conversions;
use crate::entities::patient::{CreatePatientRequest, NextMrn, Patient, PatientDetail};
use crate::errors::{validate_request, ServiceError};
use crate::services::mrn::next_mrn;

/// Number of encounters shown with a patient
const RECENT_ENCOUNTERS: usize = 5;

/// Trait for patient registry operations
#[async_trait]
pub trait PatientServiceTrait {
    /// Register a patient; a taken MRN is a conflict
    async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, ServiceError>;

    /// Search by name or MRN, newest first; `None` lists everyone
    async fn search_patients(&self, query: Option<String>) -> Result<Vec<Patient>, ServiceError>;

    async fn get_patient(&self, id: i64) -> Result<Patient, ServiceError>;

    /// Patient with their most recent encounters
    async fn get_patient_detail(&self, id: i64) -> Result<PatientDetail, ServiceError>;

    async fn next_mrn(&self) -> Result<NextMrn, ServiceError>;
}

/// Patient service backed by patient and encounter repositories
pub struct PatientService<P: PatientRepositoryTrait, E: EncounterRepositoryTrait> {
    patients: P,
    encounters: E,
}

impl<P: PatientRepositoryTrait, E: EncounterRepositoryTrait> PatientService<P, E> {
    pub fn new(patients: P, encounters: E) -> Self {
        Self { patients, encounters }
    }

    fn map_repo_error(&self, err: RepositoryError) -> ServiceError {
        match err {
            RepositoryError::Duplicate(_) => ServiceError::Conflict("mrn already exists".to_string()),
            other => ServiceError::from(other),
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl<P, E> PatientServiceTrait for PatientService<P, E>
where
    P: PatientRepositoryTrait + Send + Sync,
    E: EncounterRepositoryTrait + Send + Sync,
{
    async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, ServiceError> {
        validate_request(&request)?;

        let record = self.patients
            .create(NewPatientRecord {
                mrn: request.mrn.trim().to_string(),
                name: request.name.trim().to_string(),
                birth_date: request.birth_date,
                sex: blank_to_none(request.sex),
                phone: blank_to_none(request.phone),
                email: blank_to_none(request.email),
                address: blank_to_none(request.address),
            })
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("Registered patient {} ({})", record.id, record.mrn);
        Ok(conversions::convert_to_domain_patient(record))
    }

    async fn search_patients(&self, query: Option<String>) -> Result<Vec<Patient>, ServiceError> {
        let query = blank_to_none(query);
        debug!("Searching patients with query {:?}", query);

        let records = self.patients
            .search(query.as_deref())
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(records.into_iter().map(conversions::convert_to_domain_patient).collect())
    }

    async fn get_patient(&self, id: i64) -> Result<Patient, ServiceError> {
        self.patients
            .get_by_id(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(conversions::convert_to_domain_patient)
            .ok_or_else(|| ServiceError::NotFound(format!("patient {} not found", id)))
    }

    async fn get_patient_detail(&self, id: i64) -> Result<PatientDetail, ServiceError> {
        let patient = self.get_patient(id).await?;

        let encounters = self.encounters
            .list_for_patient(id, RECENT_ENCOUNTERS)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .into_iter()
            .map(conversions::convert_to_domain_encounter)
            .collect();

        Ok(PatientDetail { patient, encounters })
    }

    async fn next_mrn(&self) -> Result<NextMrn, ServiceError> {
        let mrns = self.patients.list_mrns().await.map_err(|e| self.map_repo_error(e))?;
        let mrn = next_mrn(mrns.iter().map(String::as_str))
            .ok_or_else(|| ServiceError::Conflict("no free mrn left".to_string()))?;
        Ok(NextMrn { mrn })
    }
}

/// Create a patient service using the SQLite repositories
pub fn create_default_patient_service(pool: DatabasePool) -> impl PatientServiceTrait + Send + Sync {
    PatientService::new(
        emr_data::repository::PatientRepository::new(pool.clone()),
        emr_data::repository::EncounterRepository::new(pool),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mrn: &str, name: &str) -> CreatePatientRequest {
        CreatePatientRequest {
            mrn: mrn.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_patient() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());

        let created = service.create_patient(request("P1001", "Hong Gildong")).await.unwrap();
        let detail = service.get_patient_detail(created.id).await.unwrap();

        assert_eq!(detail.patient.mrn, "P1001");
        assert!(detail.encounters.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_mrn_is_conflict() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());
        service.create_patient(request("P1001", "Hong Gildong")).await.unwrap();

        let result = service.create_patient(request("P1001", "Kim Minsu")).await;
        assert!(matches!(result, Err(ServiceError::Conflict(msg)) if msg == "mrn already exists"));
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());

        let result = service.create_patient(request("", "Hong Gildong")).await;
        assert!(matches!(result, Err(ServiceError::Validation(msg)) if msg.contains("mrn and name are required")));
    }

    #[tokio::test]
    async fn test_blank_mrn_and_name_are_rejected() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());

        let result = service.create_patient(request("   ", "Hong Gildong")).await;
        assert!(matches!(result, Err(ServiceError::Validation(msg)) if msg.contains("mrn and name are required")));

        let result = service.create_patient(request("P1001", "\t")).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        assert!(service.search_patients(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_patient_is_not_found() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());
        assert!(matches!(service.get_patient(99).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_next_mrn_follows_highest() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());
        assert_eq!(service.next_mrn().await.unwrap().mrn, "P1001");

        service.create_patient(request("P1007", "Lee Jiyoung")).await.unwrap();
        service.create_patient(request("P0001", "Hong Gildong")).await.unwrap();
        assert_eq!(service.next_mrn().await.unwrap().mrn, "P1008");
    }

    #[tokio::test]
    async fn test_next_mrn_skips_oversized_mrns() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());
        service.create_patient(request("P1002", "Lee Jiyoung")).await.unwrap();
        service.create_patient(request("P99999", "Park Seojun")).await.unwrap();
        service.create_patient(request("P4294967295", "Choi Yuna")).await.unwrap();

        assert_eq!(service.next_mrn().await.unwrap().mrn, "P1003");
    }

    #[tokio::test]
    async fn test_next_mrn_reports_exhausted_range() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());
        service.create_patient(request("P9999", "Jung Haneul")).await.unwrap();

        assert!(matches!(service.next_mrn().await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_search_by_name_or_mrn() {
        let service = create_default_patient_service(DatabasePool::in_memory().unwrap());
        service.create_patient(request("P1001", "Hong Gildong")).await.unwrap();
        service.create_patient(request("P1002", "Kim Minsu")).await.unwrap();

        let by_name = service.search_patients(Some("Kim".to_string())).await.unwrap();
        assert_eq!(by_name.len(), 1);

        let by_mrn = service.search_patients(Some("P1001".to_string())).await.unwrap();
        assert_eq!(by_mrn[0].name, "Hong Gildong");

        let everyone = service.search_patients(Some("  ".to_string())).await.unwrap();
        assert_eq!(everyone.len(), 2);
        assert_eq!(everyone[0].mrn, "P1002");
    }
}
