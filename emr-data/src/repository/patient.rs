use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::patient::{NewPatientRecord, PatientRecord};
use super::errors::RepositoryError;

/// Repository trait for the patient registry
#[async_trait]
pub trait PatientRepositoryTrait {
    /// Register a patient; a taken MRN yields `RepositoryError::Duplicate`
    async fn create(&self, patient: NewPatientRecord) -> Result<PatientRecord, RepositoryError>;

    /// Get a patient by id
    async fn get_by_id(&self, id: i64) -> Result<Option<PatientRecord>, RepositoryError>;

    /// Get a patient by MRN
    async fn get_by_mrn(&self, mrn: &str) -> Result<Option<PatientRecord>, RepositoryError>;

    /// Patients whose name or MRN contains `query`, newest first; all patients when `None`
    async fn search(&self, query: Option<&str>) -> Result<Vec<PatientRecord>, RepositoryError>;

    /// Every MRN in the registry
    async fn list_mrns(&self) -> Result<Vec<String>, RepositoryError>;
}

/// SQLite-backed patient repository
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: DatabasePool,
}

impl PatientRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const PATIENT_COLUMNS: &str = "id, mrn, name, birth_date, sex, phone, email, address, created_at";

fn map_patient(row: &Row<'_>) -> rusqlite::Result<PatientRecord> {
    Ok(PatientRecord {
        id: row.get(0)?,
        mrn: row.get(1)?,
        name: row.get(2)?,
        birth_date: row.get(3)?,
        sex: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        address: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[async_trait]
impl PatientRepositoryTrait for PatientRepository {
    async fn create(&self, patient: NewPatientRecord) -> Result<PatientRecord, RepositoryError> {
        debug!("Storing patient in database: mrn={}", patient.mrn);
        let conn = self.pool.get()?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO patients (mrn, name, birth_date, sex, phone, email, address, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                patient.mrn,
                patient.name,
                patient.birth_date,
                patient.sex,
                patient.phone,
                patient.email,
                patient.address,
                created_at,
            ],
        )?;

        Ok(PatientRecord {
            id: conn.last_insert_rowid(),
            mrn: patient.mrn,
            name: patient.name,
            birth_date: patient.birth_date,
            sex: patient.sex,
            phone: patient.phone,
            email: patient.email,
            address: patient.address,
            created_at,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<PatientRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let patient = conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?1", PATIENT_COLUMNS),
                [id],
                map_patient,
            )
            .optional()?;
        Ok(patient)
    }

    async fn get_by_mrn(&self, mrn: &str) -> Result<Option<PatientRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let patient = conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE mrn = ?1", PATIENT_COLUMNS),
                [mrn],
                map_patient,
            )
            .optional()?;
        Ok(patient)
    }

    async fn search(&self, query: Option<&str>) -> Result<Vec<PatientRecord>, RepositoryError> {
        let conn = self.pool.get()?;

        let patients = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(term) => {
                debug!("Searching patients for term: {}", term);
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM patients
                     WHERE instr(name, ?1) > 0 OR instr(mrn, ?1) > 0
                     ORDER BY id DESC",
                    PATIENT_COLUMNS
                ))?;
                let rows = stmt.query_map([term], map_patient)?;
                rows.collect::<Result<Vec<_>, _>>()?
            },
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM patients ORDER BY id DESC",
                    PATIENT_COLUMNS
                ))?;
                let rows = stmt.query_map([], map_patient)?;
                rows.collect::<Result<Vec<_>, _>>()?
            },
        };

        Ok(patients)
    }

    async fn list_mrns(&self) -> Result<Vec<String>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT mrn FROM patients")?;
        let mrns = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(mrns)
    }
}
