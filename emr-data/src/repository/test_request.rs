use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row, ToSql};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::test_request::TestRequestRecord;
use super::errors::RepositoryError;

/// Repository trait for diagnostic test orders
#[async_trait]
pub trait TestRequestRepositoryTrait {
    /// Persist a new test order
    async fn create(&self, request: TestRequestRecord) -> Result<TestRequestRecord, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<TestRequestRecord>, RepositoryError>;

    /// Overwrite the mutable lifecycle fields (status, schedule, results, notes)
    async fn update(&self, request: TestRequestRecord) -> Result<TestRequestRecord, RepositoryError>;

    /// Orders scheduled in `[start, end)`, earliest first
    async fn list_scheduled_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TestRequestRecord>, RepositoryError>;

    /// Orders in the given status, most recently requested first
    async fn list_by_status(&self, status: &str) -> Result<Vec<TestRequestRecord>, RepositoryError>;

    async fn all(&self) -> Result<Vec<TestRequestRecord>, RepositoryError>;
}

/// SQLite-backed test order repository
#[derive(Debug, Clone)]
pub struct TestRequestRepository {
    pool: DatabasePool,
}

impl TestRequestRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn query(&self, tail: &str, args: &[&dyn ToSql]) -> Result<Vec<TestRequestRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM test_requests {}", TEST_REQUEST_COLUMNS, tail))?;
        let requests = stmt
            .query_map(args, map_test_request)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }
}

const TEST_REQUEST_COLUMNS: &str = "id, patient_id, patient_name, mrn, category, procedure_kind, test_name, \
    purpose, urgency, requested_by, requested_at, status, scheduled_at, schedule, completed_at, result, notes";

fn map_test_request(row: &Row<'_>) -> rusqlite::Result<TestRequestRecord> {
    Ok(TestRequestRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        patient_name: row.get(2)?,
        mrn: row.get(3)?,
        category: row.get(4)?,
        procedure_kind: row.get(5)?,
        test_name: row.get(6)?,
        purpose: row.get(7)?,
        urgency: row.get(8)?,
        requested_by: row.get(9)?,
        requested_at: row.get(10)?,
        status: row.get(11)?,
        scheduled_at: row.get(12)?,
        schedule: row.get(13)?,
        completed_at: row.get(14)?,
        result: row.get(15)?,
        notes: row.get(16)?,
    })
}

#[async_trait]
impl TestRequestRepositoryTrait for TestRequestRepository {
    async fn create(&self, request: TestRequestRecord) -> Result<TestRequestRecord, RepositoryError> {
        debug!("Storing test request {} ({}) for patient {}", request.id, request.test_name, request.patient_id);
        let conn = self.pool.get()?;

        conn.execute(
            &format!(
                "INSERT INTO test_requests ({}) VALUES
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                TEST_REQUEST_COLUMNS
            ),
            params![
                request.id,
                request.patient_id,
                request.patient_name,
                request.mrn,
                request.category,
                request.procedure_kind,
                request.test_name,
                request.purpose,
                request.urgency,
                request.requested_by,
                request.requested_at,
                request.status,
                request.scheduled_at,
                request.schedule,
                request.completed_at,
                request.result,
                request.notes,
            ],
        )?;

        Ok(request)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<TestRequestRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let request = conn
            .query_row(
                &format!("SELECT {} FROM test_requests WHERE id = ?1", TEST_REQUEST_COLUMNS),
                [id],
                map_test_request,
            )
            .optional()?;
        Ok(request)
    }

    async fn update(&self, request: TestRequestRecord) -> Result<TestRequestRecord, RepositoryError> {
        debug!("Updating test request {} to status {}", request.id, request.status);
        let conn = self.pool.get()?;

        let updated = conn.execute(
            "UPDATE test_requests
             SET status = ?1, scheduled_at = ?2, schedule = ?3, completed_at = ?4, result = ?5, notes = ?6
             WHERE id = ?7",
            params![
                request.status,
                request.scheduled_at,
                request.schedule,
                request.completed_at,
                request.result,
                request.notes,
                request.id,
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("test request {}", request.id)));
        }

        Ok(request)
    }

    async fn list_scheduled_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TestRequestRecord>, RepositoryError> {
        self.query(
            "WHERE scheduled_at >= ?1 AND scheduled_at < ?2 ORDER BY scheduled_at ASC",
            &[&start, &end],
        )
    }

    async fn list_by_status(&self, status: &str) -> Result<Vec<TestRequestRecord>, RepositoryError> {
        self.query("WHERE status = ?1 ORDER BY requested_at DESC", &[&status])
    }

    async fn all(&self) -> Result<Vec<TestRequestRecord>, RepositoryError> {
        self.query("ORDER BY requested_at DESC", &[])
    }
}
