use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage model for an issued prescription
///
/// Line items and the alerts computed when the prescription was issued are
/// kept as JSON documents; the domain layer owns their shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    /// Identifier of the form `RX<millis><n>`
    pub id: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub mrn: String,
    pub doctor: String,
    pub prescribed_at: DateTime<Utc>,
    pub status: String,
    pub total_amount: f64,
    pub notes: String,
    pub medications: Value,
    pub interactions: Value,
    pub contraindications: Value,
}
