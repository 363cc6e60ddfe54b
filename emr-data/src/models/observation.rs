use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a single measured value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub id: i64,
    pub patient_id: i64,
    pub encounter_id: Option<i64>,
    pub category: String,
    pub code_loinc: String,
    /// Raw value as entered, e.g. "142" or "120/80"
    pub value: String,
    pub unit: Option<String>,
    pub effective_at: DateTime<Utc>,
}

/// Input data for recording an observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObservationRecord {
    pub patient_id: i64,
    pub encounter_id: Option<i64>,
    pub category: String,
    pub code_loinc: String,
    pub value: String,
    pub unit: Option<String>,
    pub effective_at: DateTime<Utc>,
}
