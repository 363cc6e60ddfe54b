use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::prescription::PrescriptionRecord;
use super::errors::RepositoryError;

/// Repository trait for prescriptions
#[async_trait]
pub trait PrescriptionRepositoryTrait {
    /// Persist an issued prescription
    async fn create(&self, prescription: PrescriptionRecord) -> Result<PrescriptionRecord, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<PrescriptionRecord>, RepositoryError>;

    /// Prescriptions of a patient, newest first
    async fn history_for_patient(&self, patient_id: i64) -> Result<Vec<PrescriptionRecord>, RepositoryError>;

    /// Prescriptions issued at or after `since`, newest first
    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<PrescriptionRecord>, RepositoryError>;

    /// Every prescription, newest first
    async fn all(&self) -> Result<Vec<PrescriptionRecord>, RepositoryError>;
}

/// SQLite-backed prescription repository
#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    pool: DatabasePool,
}

impl PrescriptionRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn query(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<PrescriptionRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM prescriptions {} ORDER BY prescribed_at DESC, id DESC",
            PRESCRIPTION_COLUMNS, filter
        ))?;
        let prescriptions = stmt
            .query_map(args, map_prescription)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(prescriptions)
    }
}

const PRESCRIPTION_COLUMNS: &str = "id, patient_id, patient_name, mrn, doctor, prescribed_at, status, \
    total_amount, notes, medications, interactions, contraindications";

fn map_prescription(row: &Row<'_>) -> rusqlite::Result<PrescriptionRecord> {
    Ok(PrescriptionRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_name: row.get(2)?,
        mrn: row.get(3)?,
        doctor: row.get(4)?,
        prescribed_at: row.get(5)?,
        status: row.get(6)?,
        total_amount: row.get(7)?,
        notes: row.get(8)?,
        medications: row.get(9)?,
        interactions: row.get(10)?,
        contraindications: row.get(11)?,
    })
}

#[async_trait]
impl PrescriptionRepositoryTrait for PrescriptionRepository {
    async fn create(&self, prescription: PrescriptionRecord) -> Result<PrescriptionRecord, RepositoryError> {
        debug!("Storing prescription {} for patient {}", prescription.id, prescription.patient_id);
        let conn = self.pool.get()?;

        conn.execute(
            &format!(
                "INSERT INTO prescriptions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                PRESCRIPTION_COLUMNS
            ),
            params![
                prescription.id,
                prescription.patient_id,
                prescription.patient_name,
                prescription.mrn,
                prescription.doctor,
                prescription.prescribed_at,
                prescription.status,
                prescription.total_amount,
                prescription.notes,
                prescription.medications,
                prescription.interactions,
                prescription.contraindications,
            ],
        )?;

        Ok(prescription)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<PrescriptionRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let prescription = conn
            .query_row(
                &format!("SELECT {} FROM prescriptions WHERE id = ?1", PRESCRIPTION_COLUMNS),
                [id],
                map_prescription,
            )
            .optional()?;
        Ok(prescription)
    }

    async fn history_for_patient(&self, patient_id: i64) -> Result<Vec<PrescriptionRecord>, RepositoryError> {
        self.query("WHERE patient_id = ?1", &[&patient_id])
    }

    async fn list_since(&self, since: DateTime<Utc>) -> Result<Vec<PrescriptionRecord>, RepositoryError> {
        self.query("WHERE prescribed_at >= ?1", &[&since])
    }

    async fn all(&self) -> Result<Vec<PrescriptionRecord>, RepositoryError> {
        self.query("", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use crate::models::patient::NewPatientRecord;
    use crate::repository::{PatientRepository, PatientRepositoryTrait};

    async fn setup() -> (PrescriptionRepository, i64) {
        let pool = DatabasePool::in_memory().unwrap();
        let patient = PatientRepository::new(pool.clone())
            .create(NewPatientRecord {
                mrn: "P0001".to_string(),
                name: "Kim Minji".to_string(),
                birth_date: None,
                sex: None,
                phone: None,
                email: None,
                address: None,
            })
            .await
            .unwrap();
        (PrescriptionRepository::new(pool), patient.id)
    }

    fn record(id: &str, patient_id: i64, at: DateTime<Utc>) -> PrescriptionRecord {
        PrescriptionRecord {
            id: id.to_string(),
            patient_id,
            patient_name: "Kim Minji".to_string(),
            mrn: "P0001".to_string(),
            doctor: "Dr. Kim".to_string(),
            prescribed_at: at,
            status: "active".to_string(),
            total_amount: 30.0,
            notes: String::new(),
            medications: json!([{ "name": "Amlodipine", "amount": 30.0 }]),
            interactions: json!([]),
            contraindications: json!([]),
        }
    }

    #[tokio::test]
    async fn json_columns_round_trip() {
        let (repo, patient_id) = setup().await;
        repo.create(record("RX1", patient_id, Utc::now())).await.unwrap();

        let loaded = repo.get_by_id("RX1").await.unwrap().unwrap();
        assert_eq!(loaded.medications[0]["name"], "Amlodipine");
        assert_eq!(loaded.total_amount, 30.0);
    }

    #[tokio::test]
    async fn history_and_window_queries() {
        let (repo, patient_id) = setup().await;
        let now = Utc::now();
        repo.create(record("RX1", patient_id, now - Duration::days(3))).await.unwrap();
        repo.create(record("RX2", patient_id, now - Duration::hours(1))).await.unwrap();

        let history = repo.history_for_patient(patient_id).await.unwrap();
        let ids: Vec<_> = history.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["RX2", "RX1"]);

        let recent = repo.list_since(now - Duration::hours(24)).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(repo.all().await.unwrap().len(), 2);

        let err = repo.create(record("RX2", patient_id, now)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }
}
