use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a registered patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: i64,
    /// Medical record number, unique across the clinic
    pub mrn: String,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input data for registering a patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatientRecord {
    pub mrn: String,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}
