use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use emr_data::repository::{
    EncounterRepositoryTrait, PatientRepositoryTrait, PrescriptionRepositoryTrait, TestRequestRepositoryTrait,
};

use crate::database::DatabasePool;
use crate::entities::dashboard::{Dashboard, DashboardPatient, DashboardStatus};
use crate::errors::ServiceError;
use crate::services::test_orders::{STATUS_COMPLETED, STATUS_REQUESTED, STATUS_SCHEDULED};

pub const DEFAULT_WINDOW_HOURS: i64 = 24;

#[async_trait]
pub trait DashboardServiceTrait {
    /// One row per active patient, most urgent status first
    async fn dashboard(&self, window_hours: Option<i64>) -> Result<Dashboard, ServiceError>;
}

pub struct DashboardService<E, T, R, P>
where
    E: EncounterRepositoryTrait,
    T: TestRequestRepositoryTrait,
    R: PrescriptionRepositoryTrait,
    P: PatientRepositoryTrait,
{
    encounters: E,
    tests: T,
    prescriptions: R,
    patients: P,
}

impl<E, T, R, P> DashboardService<E, T, R, P>
where
    E: EncounterRepositoryTrait,
    T: TestRequestRepositoryTrait,
    R: PrescriptionRepositoryTrait,
    P: PatientRepositoryTrait,
{
    pub fn new(encounters: E, tests: T, prescriptions: R, patients: P) -> Self {
        Self { encounters, tests, prescriptions, patients }
    }
}

/// Keep the higher-precedence status; within a status keep the newest event
fn merge(rows: &mut HashMap<i64, DashboardPatient>, candidate: DashboardPatient) {
    match rows.get(&candidate.patient_id) {
        Some(current)
            if current.status < candidate.status
                || (current.status == candidate.status && current.since >= candidate.since) => {},
        _ => {
            rows.insert(candidate.patient_id, candidate);
        },
    }
}

#[async_trait]
impl<E, T, R, P> DashboardServiceTrait for DashboardService<E, T, R, P>
where
    E: EncounterRepositoryTrait + Send + Sync,
    T: TestRequestRepositoryTrait + Send + Sync,
    R: PrescriptionRepositoryTrait + Send + Sync,
    P: PatientRepositoryTrait + Send + Sync,
{
    async fn dashboard(&self, window_hours: Option<i64>) -> Result<Dashboard, ServiceError> {
        let window_hours = window_hours.unwrap_or(DEFAULT_WINDOW_HOURS);
        if window_hours <= 0 {
            return Err(ServiceError::Validation("window_hours must be positive".to_string()));
        }
        let generated_at = Utc::now();
        let since = generated_at - Duration::hours(window_hours);
        let mut rows: HashMap<i64, DashboardPatient> = HashMap::new();

        for encounter in self.encounters.list_open(since).await? {
            let Some(patient) = self.patients.get_by_id(encounter.patient_id).await? else {
                continue;
            };
            merge(&mut rows, DashboardPatient {
                patient_id: patient.id,
                patient_name: patient.name,
                mrn: patient.mrn,
                status: DashboardStatus::Waiting,
                since: encounter.start_at,
                detail: encounter.reason,
            });
        }

        for prescription in self.prescriptions.list_since(since).await? {
            merge(&mut rows, DashboardPatient {
                patient_id: prescription.patient_id,
                patient_name: prescription.patient_name,
                mrn: prescription.mrn,
                status: DashboardStatus::Prescribed,
                since: prescription.prescribed_at,
                detail: Some(prescription.id),
            });
        }

        for status in [STATUS_REQUESTED, STATUS_SCHEDULED] {
            for test in self.tests.list_by_status(status).await? {
                if test.requested_at < since {
                    continue;
                }
                merge(&mut rows, DashboardPatient {
                    patient_id: test.patient_id,
                    patient_name: test.patient_name,
                    mrn: test.mrn,
                    status: DashboardStatus::InTest,
                    since: test.scheduled_at.unwrap_or(test.requested_at),
                    detail: Some(test.test_name),
                });
            }
        }

        for test in self.tests.list_by_status(STATUS_COMPLETED).await? {
            let Some(completed_at) = test.completed_at.filter(|at| *at >= since) else {
                continue;
            };
            merge(&mut rows, DashboardPatient {
                patient_id: test.patient_id,
                patient_name: test.patient_name,
                mrn: test.mrn,
                status: DashboardStatus::ResultsReady,
                since: completed_at,
                detail: Some(test.test_name),
            });
        }

        let mut patients: Vec<DashboardPatient> = rows.into_values().collect();
        patients.sort_by(|a, b| a.status.cmp(&b.status).then(b.since.cmp(&a.since)));

        debug!("Dashboard over {}h lists {} patients", window_hours, patients.len());
        Ok(Dashboard { generated_at, window_hours, patients })
    }
}

pub fn create_default_dashboard_service(pool: DatabasePool) -> impl DashboardServiceTrait + Send + Sync {
    DashboardService::new(
        emr_data::repository::EncounterRepository::new(pool.clone()),
        emr_data::repository::TestRequestRepository::new(pool.clone()),
        emr_data::repository::PrescriptionRepository::new(pool.clone()),
        emr_data::repository::PatientRepository::new(pool),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::entities::encounter::CreateEncounterRequest;
    use crate::entities::patient::CreatePatientRequest;
    use crate::entities::test_order::CreateTestRequest;
    use crate::services::encounters::{create_default_encounter_service, EncounterServiceTrait};
    use crate::services::patients::{create_default_patient_service, PatientServiceTrait};
    use crate::services::test_orders::{create_default_test_order_service, TestOrderServiceTrait};
    use crate::entities::test_order::SubmitResultsRequest;
    use indexmap::IndexMap;

    async fn patient(pool: &DatabasePool, mrn: &str, name: &str) -> i64 {
        create_default_patient_service(pool.clone())
            .create_patient(CreatePatientRequest {
                mrn: mrn.to_string(),
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn visit(pool: &DatabasePool, patient_id: i64) {
        create_default_encounter_service(pool.clone())
            .create_encounter(CreateEncounterRequest {
                patient_id: Some(patient_id),
                encounter_type: "OPD".to_string(),
                reason: Some("Cough".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_precedence() {
        let pool = DatabasePool::in_memory().unwrap();
        let waiting = patient(&pool, "P0001", "Kim Minsu").await;
        let testing = patient(&pool, "P0002", "Lee Jiwoo").await;
        let done = patient(&pool, "P0003", "Park Seoyeon").await;

        visit(&pool, waiting).await;
        visit(&pool, testing).await;
        visit(&pool, done).await;

        let tests = create_default_test_order_service(pool.clone(), &AppConfig::default());
        let order = |patient_id| CreateTestRequest {
            patient_id: Some(patient_id),
            category: "chemistry".to_string(),
            test_name: "Lipid panel".to_string(),
            ..Default::default()
        };
        tests.request_test(order(testing)).await.unwrap();
        let finished = tests.request_test(order(done)).await.unwrap();

        let mut values = IndexMap::new();
        values.insert("CHOL".to_string(), 180.0);
        tests
            .submit_results(SubmitResultsRequest { test_request_id: finished.id, results: values })
            .await
            .unwrap();

        let dashboard = create_default_dashboard_service(pool).dashboard(None).await.unwrap();
        assert_eq!(dashboard.window_hours, 24);

        let statuses: Vec<(i64, DashboardStatus)> =
            dashboard.patients.iter().map(|p| (p.patient_id, p.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (done, DashboardStatus::ResultsReady),
                (testing, DashboardStatus::InTest),
                (waiting, DashboardStatus::Waiting),
            ]
        );
        assert_eq!(dashboard.patients[2].detail.as_deref(), Some("Cough"));
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let pool = DatabasePool::in_memory().unwrap();
        let dashboard = create_default_dashboard_service(pool).dashboard(Some(1)).await.unwrap();
        assert!(dashboard.patients.is_empty());
    }

    #[tokio::test]
    async fn test_non_positive_window_is_rejected() {
        let pool = DatabasePool::in_memory().unwrap();
        let result = create_default_dashboard_service(pool).dashboard(Some(0)).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_merge_keeps_newest_within_status() {
        let now = Utc::now();
        let row = |status, minutes_ago: i64, detail: &str| DashboardPatient {
            patient_id: 1,
            patient_name: "Kim Minsu".to_string(),
            mrn: "P0001".to_string(),
            status,
            since: now - Duration::minutes(minutes_ago),
            detail: Some(detail.to_string()),
        };

        let mut rows = HashMap::new();
        merge(&mut rows, row(DashboardStatus::Prescribed, 30, "RX1"));
        merge(&mut rows, row(DashboardStatus::Prescribed, 5, "RX2"));
        merge(&mut rows, row(DashboardStatus::Waiting, 1, "visit"));
        assert_eq!(rows[&1].detail.as_deref(), Some("RX2"));

        merge(&mut rows, row(DashboardStatus::ResultsReady, 60, "CBC"));
        assert_eq!(rows[&1].status, DashboardStatus::ResultsReady);
    }
}
