use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::organization::{LocationRecord, OrganizationRecord, PractitionerRecord};
use super::errors::RepositoryError;

/// Repository trait for organizations, locations and practitioners
#[async_trait]
pub trait OrganizationRepositoryTrait {
    async fn create_organization(&self, name: &str) -> Result<OrganizationRecord, RepositoryError>;

    async fn create_location(&self, organization_id: i64, name: &str) -> Result<LocationRecord, RepositoryError>;

    /// Register a practitioner; a taken license number yields `RepositoryError::Duplicate`
    async fn create_practitioner(
        &self,
        organization_id: Option<i64>,
        name: &str,
        license_no: Option<&str>,
        specialty: Option<&str>,
    ) -> Result<PractitionerRecord, RepositoryError>;

    async fn find_practitioner_by_license(&self, license_no: &str) -> Result<Option<PractitionerRecord>, RepositoryError>;

    async fn list_practitioners(&self) -> Result<Vec<PractitionerRecord>, RepositoryError>;
}

/// SQLite-backed organization repository
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: DatabasePool,
}

impl OrganizationRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_practitioner(row: &Row<'_>) -> rusqlite::Result<PractitionerRecord> {
    Ok(PractitionerRecord {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        license_no: row.get(3)?,
        specialty: row.get(4)?,
    })
}

#[async_trait]
impl OrganizationRepositoryTrait for OrganizationRepository {
    async fn create_organization(&self, name: &str) -> Result<OrganizationRecord, RepositoryError> {
        debug!("Storing organization: {}", name);
        let conn = self.pool.get()?;
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO organizations (name, created_at) VALUES (?1, ?2)",
            params![name, created_at],
        )?;
        Ok(OrganizationRecord {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            created_at,
        })
    }

    async fn create_location(&self, organization_id: i64, name: &str) -> Result<LocationRecord, RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO locations (organization_id, name) VALUES (?1, ?2)",
            params![organization_id, name],
        )?;
        Ok(LocationRecord {
            id: conn.last_insert_rowid(),
            organization_id,
            name: name.to_string(),
        })
    }

    async fn create_practitioner(
        &self,
        organization_id: Option<i64>,
        name: &str,
        license_no: Option<&str>,
        specialty: Option<&str>,
    ) -> Result<PractitionerRecord, RepositoryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO practitioners (organization_id, name, license_no, specialty) VALUES (?1, ?2, ?3, ?4)",
            params![organization_id, name, license_no, specialty],
        )?;
        Ok(PractitionerRecord {
            id: conn.last_insert_rowid(),
            organization_id,
            name: name.to_string(),
            license_no: license_no.map(str::to_string),
            specialty: specialty.map(str::to_string),
        })
    }

    async fn find_practitioner_by_license(&self, license_no: &str) -> Result<Option<PractitionerRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let practitioner = conn
            .query_row(
                "SELECT id, organization_id, name, license_no, specialty FROM practitioners WHERE license_no = ?1",
                [license_no],
                map_practitioner,
            )
            .optional()?;
        Ok(practitioner)
    }

    async fn list_practitioners(&self) -> Result<Vec<PractitionerRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, organization_id, name, license_no, specialty FROM practitioners ORDER BY id",
        )?;
        let practitioners = stmt
            .query_map([], map_practitioner)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(practitioners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn organization_graph_is_linked() {
        let repo = OrganizationRepository::new(DatabasePool::in_memory().unwrap());
        let org = repo.create_organization("EMR Clinic").await.unwrap();
        let location = repo.create_location(org.id, "Outpatient 1").await.unwrap();
        assert_eq!(location.organization_id, org.id);

        let doc = repo
            .create_practitioner(Some(org.id), "Dr. Kim", Some("DOC12345"), Some("Internal Medicine"))
            .await
            .unwrap();
        let found = repo.find_practitioner_by_license("DOC12345").await.unwrap().unwrap();
        assert_eq!(found.id, doc.id);

        let err = repo
            .create_practitioner(Some(org.id), "Dr. Lee", Some("DOC12345"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn location_requires_existing_organization() {
        let repo = OrganizationRepository::new(DatabasePool::in_memory().unwrap());
        let err = repo.create_location(42, "Nowhere").await.unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKey(_)));
    }
}
