use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a generated clinical document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub filename: String,
    pub kind: String,
    pub title: String,
    pub patient_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Size of the rendered content in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Input data for storing a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocumentRecord {
    pub filename: String,
    pub kind: String,
    pub title: String,
    pub patient_id: Option<i64>,
    pub content: String,
}
