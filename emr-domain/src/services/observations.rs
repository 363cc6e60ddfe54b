use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{info, warn};

use emr_data::models::NewObservationRecord;
use emr_data::repository::{ObservationRepositoryTrait, PatientRepositoryTrait};

use crate::database::DatabasePool;
use crate::entities::conversions;
use crate::entities::observation::{AlertEntry, CreateObservationRequest, Observation, PatientAlerts};
use crate::errors::{validate_request, ServiceError};

/// Observations returned by the latest listing
const LATEST_LIMIT: usize = 50;
/// Look-back window of the alert summary
const ALERT_WINDOW_HOURS: i64 = 24;

const REQUIRED_FIELDS: &str = "patient_id, category, code_loinc, value are required";

#[async_trait]
pub trait ObservationServiceTrait {
    /// Store an observation and return it with its flags
    async fn record_observation(&self, request: CreateObservationRequest) -> Result<Observation, ServiceError>;

    /// Newest observations of a patient with flags
    async fn latest_for_patient(&self, patient_id: i64) -> Result<Vec<Observation>, ServiceError>;

    /// Flagged observations of the last 24 hours
    async fn patient_alerts(&self, patient_id: i64) -> Result<PatientAlerts, ServiceError>;
}

pub struct ObservationService<O: ObservationRepositoryTrait, P: PatientRepositoryTrait> {
    observations: O,
    patients: P,
}

impl<O: ObservationRepositoryTrait, P: PatientRepositoryTrait> ObservationService<O, P> {
    pub fn new(observations: O, patients: P) -> Self {
        Self { observations, patients }
    }
}

/// Accept a JSON string or number as the stored text value
fn value_as_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl<O, P> ObservationServiceTrait for ObservationService<O, P>
where
    O: ObservationRepositoryTrait + Send + Sync,
    P: PatientRepositoryTrait + Send + Sync,
{
    async fn record_observation(&self, request: CreateObservationRequest) -> Result<Observation, ServiceError> {
        validate_request(&request)?;
        let (patient_id, value) = match (request.patient_id, value_as_text(request.value)) {
            (Some(patient_id), Some(value)) => (patient_id, value),
            _ => return Err(ServiceError::Validation(REQUIRED_FIELDS.to_string())),
        };

        if self.patients.get_by_id(patient_id).await?.is_none() {
            return Err(ServiceError::Validation(format!("unknown patient_id {}", patient_id)));
        }

        let record = self.observations
            .create(NewObservationRecord {
                patient_id,
                encounter_id: request.encounter_id,
                category: request.category,
                code_loinc: request.code_loinc,
                value,
                unit: request.unit,
                effective_at: request.effective_at.unwrap_or_else(Utc::now),
            })
            .await?;

        let observation = conversions::convert_to_domain_observation(record);
        if observation.flags.is_empty() {
            info!("Recorded observation {} for patient {}", observation.id, patient_id);
        } else {
            warn!(
                "Observation {} for patient {} raised {:?}",
                observation.id, patient_id, observation.flags
            );
        }
        Ok(observation)
    }

    async fn latest_for_patient(&self, patient_id: i64) -> Result<Vec<Observation>, ServiceError> {
        let records = self.observations.latest_for_patient(patient_id, LATEST_LIMIT).await?;
        Ok(records.into_iter().map(conversions::convert_to_domain_observation).collect())
    }

    async fn patient_alerts(&self, patient_id: i64) -> Result<PatientAlerts, ServiceError> {
        let since = Utc::now() - Duration::hours(ALERT_WINDOW_HOURS);
        let summary: Vec<AlertEntry> = self.observations
            .since_for_patient(patient_id, since)
            .await?
            .into_iter()
            .map(conversions::convert_to_domain_observation)
            .filter(|obs| !obs.flags.is_empty())
            .map(|obs| AlertEntry {
                code: obs.code_loinc,
                value: obs.value,
                unit: obs.unit,
                flags: obs.flags,
                at: obs.effective_at,
            })
            .collect();

        Ok(PatientAlerts {
            has_alert: !summary.is_empty(),
            count: summary.len(),
            summary,
        })
    }
}

pub fn create_default_observation_service(pool: DatabasePool) -> impl ObservationServiceTrait + Send + Sync {
    ObservationService::new(
        emr_data::repository::ObservationRepository::new(pool.clone()),
        emr_data::repository::PatientRepository::new(pool),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::patient::CreatePatientRequest;
    use crate::services::patients::{create_default_patient_service, PatientServiceTrait};
    use serde_json::json;

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

    fn reading(patient_id: i64, code: &str, value: Value) -> CreateObservationRequest {
        CreateObservationRequest {
            patient_id: Some(patient_id),
            category: "vital-signs".to_string(),
            code_loinc: code.to_string(),
            value: Some(value),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_numeric_value_is_flagged() {
        let (pool, patient_id) = setup().await;
        let service = create_default_observation_service(pool);

        let observation = service
            .record_observation(reading(patient_id, "BP-SYS", json!(150)))
            .await
            .unwrap();

        assert_eq!(observation.value, "150");
        assert_eq!(observation.flags, vec!["HIGH_BP_SYSTOLIC"]);
    }

    #[tokio::test]
    async fn test_missing_value_is_rejected() {
        let (pool, patient_id) = setup().await;
        let service = create_default_observation_service(pool);

        let mut request = reading(patient_id, "HR", json!(80));
        request.value = None;

        let result = service.record_observation(request).await;
        assert!(matches!(result, Err(ServiceError::Validation(msg)) if msg == REQUIRED_FIELDS));
    }

    #[tokio::test]
    async fn test_alerts_only_include_recent_flagged_readings() {
        let (pool, patient_id) = setup().await;
        let service = create_default_observation_service(pool);

        service.record_observation(reading(patient_id, "85354-9", json!("150/95"))).await.unwrap();
        service.record_observation(reading(patient_id, "HR", json!(72))).await.unwrap();

        let mut old = reading(patient_id, "GLU-FBS", json!(250));
        old.effective_at = Some(Utc::now() - Duration::hours(48));
        service.record_observation(old).await.unwrap();

        let alerts = service.patient_alerts(patient_id).await.unwrap();
        assert!(alerts.has_alert);
        assert_eq!(alerts.count, 1);
        assert_eq!(alerts.summary[0].flags, vec!["HIGH_BP_SYSTOLIC", "HIGH_BP_DIASTOLIC"]);

        let latest = service.latest_for_patient(patient_id).await.unwrap();
        assert_eq!(latest.len(), 3);
    }

    #[tokio::test]
    async fn test_no_alerts_for_quiet_patient() {
        let (pool, patient_id) = setup().await;
        let service = create_default_observation_service(pool);

        let alerts = service.patient_alerts(patient_id).await.unwrap();
        assert!(!alerts.has_alert);
        assert_eq!(alerts.count, 0);
    }
}
