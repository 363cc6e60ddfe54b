use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a patient visit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterRecord {
    pub id: i64,
    pub patient_id: i64,
    pub practitioner_id: Option<i64>,
    pub location_id: Option<i64>,
    /// Visit type such as OPD, ER or IPD
    pub encounter_type: String,
    pub reason: Option<String>,
    pub start_at: DateTime<Utc>,
    /// `None` while the patient is still in the clinic
    pub end_at: Option<DateTime<Utc>>,
}

/// Input data for opening an encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEncounterRecord {
    pub patient_id: i64,
    pub practitioner_id: Option<i64>,
    pub location_id: Option<i64>,
    pub encounter_type: String,
    pub reason: Option<String>,
    pub start_at: DateTime<Utc>,
}
