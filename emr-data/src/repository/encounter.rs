use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::encounter::{EncounterRecord, NewEncounterRecord};
use super::errors::RepositoryError;

/// Repository trait for patient encounters
#[async_trait]
pub trait EncounterRepositoryTrait {
    /// Open an encounter; an unknown patient yields `RepositoryError::ForeignKey`
    async fn create(&self, encounter: NewEncounterRecord) -> Result<EncounterRecord, RepositoryError>;

    /// Get an encounter by id
    async fn get_by_id(&self, id: i64) -> Result<Option<EncounterRecord>, RepositoryError>;

    /// Most recent encounters of a patient, newest first
    async fn list_for_patient(&self, patient_id: i64, limit: usize) -> Result<Vec<EncounterRecord>, RepositoryError>;

    /// Encounters still open that started at or after `since`
    async fn list_open(&self, since: DateTime<Utc>) -> Result<Vec<EncounterRecord>, RepositoryError>;

    /// Close an encounter at the given time
    async fn close(&self, id: i64, end_at: DateTime<Utc>) -> Result<EncounterRecord, RepositoryError>;
}

/// SQLite-backed encounter repository
#[derive(Debug, Clone)]
pub struct EncounterRepository {
    pool: DatabasePool,
}

impl EncounterRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const ENCOUNTER_COLUMNS: &str =
    "id, patient_id, practitioner_id, location_id, encounter_type, reason, start_at, end_at";

fn map_encounter(row: &Row<'_>) -> rusqlite::Result<EncounterRecord> {
    Ok(EncounterRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        practitioner_id: row.get(2)?,
        location_id: row.get(3)?,
        encounter_type: row.get(4)?,
        reason: row.get(5)?,
        start_at: row.get(6)?,
        end_at: row.get(7)?,
    })
}

#[async_trait]
impl EncounterRepositoryTrait for EncounterRepository {
    async fn create(&self, encounter: NewEncounterRecord) -> Result<EncounterRecord, RepositoryError> {
        debug!("Storing encounter for patient {}", encounter.patient_id);
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO encounters (patient_id, practitioner_id, location_id, encounter_type, reason, start_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                encounter.patient_id,
                encounter.practitioner_id,
                encounter.location_id,
                encounter.encounter_type,
                encounter.reason,
                encounter.start_at,
            ],
        )?;

        Ok(EncounterRecord {
            id: conn.last_insert_rowid(),
            patient_id: encounter.patient_id,
            practitioner_id: encounter.practitioner_id,
            location_id: encounter.location_id,
            encounter_type: encounter.encounter_type,
            reason: encounter.reason,
            start_at: encounter.start_at,
            end_at: None,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<EncounterRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let encounter = conn
            .query_row(
                &format!("SELECT {} FROM encounters WHERE id = ?1", ENCOUNTER_COLUMNS),
                [id],
                map_encounter,
            )
            .optional()?;
        Ok(encounter)
    }

    async fn list_for_patient(&self, patient_id: i64, limit: usize) -> Result<Vec<EncounterRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM encounters WHERE patient_id = ?1 ORDER BY start_at DESC, id DESC LIMIT ?2",
            ENCOUNTER_COLUMNS
        ))?;
        let encounters = stmt
            .query_map(params![patient_id, limit as i64], map_encounter)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(encounters)
    }

    async fn list_open(&self, since: DateTime<Utc>) -> Result<Vec<EncounterRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM encounters WHERE end_at IS NULL AND start_at >= ?1 ORDER BY start_at ASC",
            ENCOUNTER_COLUMNS
        ))?;
        let encounters = stmt
            .query_map([since], map_encounter)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(encounters)
    }

    async fn close(&self, id: i64, end_at: DateTime<Utc>) -> Result<EncounterRecord, RepositoryError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE encounters SET end_at = ?1 WHERE id = ?2",
            params![end_at, id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("encounter {}", id)));
        }

        let encounter = conn.query_row(
            &format!("SELECT {} FROM encounters WHERE id = ?1", ENCOUNTER_COLUMNS),
            [id],
            map_encounter,
        )?;
        Ok(encounter)
    }
}
