use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for an application user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    /// bcrypt hash, never the clear-text password
    pub password_hash: String,
    pub status: String,
    /// Practitioner this login belongs to, if any
    pub practitioner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Input data for inserting a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRecord {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub status: String,
}
