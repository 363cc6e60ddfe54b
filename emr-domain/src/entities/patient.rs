use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::encounter::Encounter;

/// A registered patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Patient {
    pub id: i64,
    /// Medical record number, unique per patient
    pub mrn: String,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Patient with their most recent encounters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub encounters: Vec<Encounter>,
}

/// Request body for registering a patient
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreatePatientRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "mrn and name are required"))]
    pub mrn: String,

    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "mrn and name are required"))]
    pub name: String,

    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,

    pub address: Option<String>,
}

/// Next free medical record number
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct NextMrn {
    pub mrn: String,
}
