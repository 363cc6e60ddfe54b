use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::document::{DocumentRecord, NewDocumentRecord};
use super::errors::RepositoryError;

/// Repository trait for generated documents
#[async_trait]
pub trait DocumentRepositoryTrait {
    /// Store a rendered document; a taken filename yields `RepositoryError::Duplicate`
    async fn store(&self, document: NewDocumentRecord) -> Result<DocumentRecord, RepositoryError>;

    /// All documents, most recently created first
    async fn list(&self) -> Result<Vec<DocumentRecord>, RepositoryError>;

    async fn get_by_filename(&self, filename: &str) -> Result<Option<DocumentRecord>, RepositoryError>;

    /// Delete by filename; `NotFound` when nothing matched
    async fn delete(&self, filename: &str) -> Result<(), RepositoryError>;
}

/// SQLite-backed document repository
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: DatabasePool,
}

impl DocumentRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const DOCUMENT_COLUMNS: &str = "id, filename, kind, title, patient_id, content, created_at, updated_at";

fn map_document(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        patient_id: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[async_trait]
impl DocumentRepositoryTrait for DocumentRepository {
    async fn store(&self, document: NewDocumentRecord) -> Result<DocumentRecord, RepositoryError> {
        debug!("Storing document {}", document.filename);
        let conn = self.pool.get()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO documents (filename, kind, title, patient_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                document.filename,
                document.kind,
                document.title,
                document.patient_id,
                document.content,
                now,
                now,
            ],
        )?;

        Ok(DocumentRecord {
            id: conn.last_insert_rowid(),
            filename: document.filename,
            kind: document.kind,
            title: document.title,
            patient_id: document.patient_id,
            content: document.content,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents ORDER BY created_at DESC, id DESC",
            DOCUMENT_COLUMNS
        ))?;
        let documents = stmt
            .query_map([], map_document)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    async fn get_by_filename(&self, filename: &str) -> Result<Option<DocumentRecord>, RepositoryError> {
        let conn = self.pool.get()?;
        let document = conn
            .query_row(
                &format!("SELECT {} FROM documents WHERE filename = ?1", DOCUMENT_COLUMNS),
                [filename],
                map_document,
            )
            .optional()?;
        Ok(document)
    }

    async fn delete(&self, filename: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM documents WHERE filename = ?1", [filename])?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound(format!("document {}", filename)));
        }
        debug!("Deleted document {}", filename);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(filename: &str) -> NewDocumentRecord {
        NewDocumentRecord {
            filename: filename.to_string(),
            kind: "opinion".to_string(),
            title: "Medical opinion".to_string(),
            patient_id: None,
            content: "Patient is fit for work.".to_string(),
        }
    }

    #[tokio::test]
    async fn store_fetch_delete() {
        let repo = DocumentRepository::new(DatabasePool::in_memory().unwrap());
        let stored = repo.store(note("opinion_1.txt")).await.unwrap();
        assert_eq!(stored.size(), "Patient is fit for work.".len());

        let loaded = repo.get_by_filename("opinion_1.txt").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Medical opinion");
        assert_eq!(repo.list().await.unwrap().len(), 1);

        repo.delete("opinion_1.txt").await.unwrap();
        assert!(repo.get_by_filename("opinion_1.txt").await.unwrap().is_none());
        assert!(matches!(repo.delete("opinion_1.txt").await, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn filenames_are_unique() {
        let repo = DocumentRepository::new(DatabasePool::in_memory().unwrap());
        repo.store(note("report.txt")).await.unwrap();
        let err = repo.store(note("report.txt")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }
}
