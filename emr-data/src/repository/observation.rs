use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::observation::{NewObservationRecord, ObservationRecord};
use super::errors::RepositoryError;

/// Repository trait for observations
#[async_trait]
pub trait ObservationRepositoryTrait {
    /// Record an observation
    async fn create(&self, observation: NewObservationRecord) -> Result<ObservationRecord, RepositoryError>;

    /// Latest observations of a patient, newest first
    async fn latest_for_patient(&self, patient_id: i64, limit: usize) -> Result<Vec<ObservationRecord>, RepositoryError>;

    /// Observations of a patient effective at or after `since`, newest first
    async fn since_for_patient(&self, patient_id: i64, since: DateTime<Utc>) -> Result<Vec<ObservationRecord>, RepositoryError>;
}

/// SQLite-backed observation repository
#[derive(Debug, Clone)]
pub struct ObservationRepository {
    pool: DatabasePool,
}

impl ObservationRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const OBSERVATION_COLUMNS: &str =
    "id, patient_id, encounter_id, category, code_loinc, value, unit, effective_at";

fn map_observation(row: &Row<'_>) -> rusqlite::Result<ObservationRecord> {
    Ok(ObservationRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        encounter_id: row.get(2)?,
        category: row.get(3)?,
        code_loinc: row.get(4)?,
        value: row.get(5)?,
        unit: row.get(6)?,
        effective_at: row.get(7)?,
    })
}

#[async_trait]
impl ObservationRepositoryTrait for ObservationRepository {
    async fn create(&self, observation: NewObservationRecord) -> Result<ObservationRecord, RepositoryError> {
        debug!(
            "Storing observation {} for patient {}",
            observation.code_loinc, observation.patient_id
        );
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO observations (patient_id, encounter_id, category, code_loinc, value, unit, effective_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                observation.patient_id,
                observation.encounter_id,
                observation.category,
                observation.code_loinc,
                observation.value,
                observation.unit,
                observation.effective_at,
            ],
        )?;

        Ok(ObservationRecord {
            id: conn.last_insert_rowid(),
            patient_id: observation.patient_id,
            encounter_id: observation.encounter_id,
            category: observation.category,
            code_loinc: observation.code_loinc,
            value: observation.value,
            unit: observation.unit,
            effective_at: observation.effective_at,
        })
    }

    async fn latest_for_patient(&self, patient_id: i64, limit: usize) -> Result<Vec<ObservationRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM observations WHERE patient_id = ?1
             ORDER BY effective_at DESC, id DESC LIMIT ?2",
            OBSERVATION_COLUMNS
        ))?;
        let observations = stmt
            .query_map(params![patient_id, limit as i64], map_observation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(observations)
    }

    async fn since_for_patient(&self, patient_id: i64, since: DateTime<Utc>) -> Result<Vec<ObservationRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM observations WHERE patient_id = ?1 AND effective_at >= ?2
             ORDER BY effective_at DESC, id DESC",
            OBSERVATION_COLUMNS
        ))?;
        let observations = stmt
            .query_map(params![patient_id, since], map_observation)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(observations)
    }
}
