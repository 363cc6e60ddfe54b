use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage model for a diagnostic test order and its lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRequestRecord {
    /// Identifier of the form `TEST<millis><n>`
    pub id: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub mrn: String,
    /// Catalog group used to interpret results (blood, chemistry, ...)
    pub category: String,
    /// Procedure used to pick a schedule template
    pub procedure_kind: String,
    pub test_name: String,
    pub purpose: Option<String>,
    pub urgency: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub schedule: Option<Value>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<Value>,
    pub notes: String,
}
