use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// A patient visit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Encounter {
    pub id: i64,
    pub patient_id: i64,
    pub practitioner_id: Option<i64>,
    pub location_id: Option<i64>,
    /// OPD, IPD, ER, ...
    #[serde(rename = "type")]
    pub encounter_type: String,
    pub reason: Option<String>,
    pub start_at: DateTime<Utc>,
    /// `None` while the patient is still being seen
    pub end_at: Option<DateTime<Utc>>,
}

/// Request body for opening an encounter
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateEncounterRequest {
    #[validate(required(message = "patient_id is required"))]
    pub patient_id: Option<i64>,
    pub practitioner_id: Option<i64>,
    pub location_id: Option<i64>,

    #[serde(default = "default_encounter_type", rename = "type")]
    #[validate(custom(function = "crate::entities::not_blank", message = "type must not be empty"))]
    pub encounter_type: String,

    /// Defaults to now
    pub start_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

fn default_encounter_type() -> String {
    "OPD".to_string()
}

/// Request body for closing an encounter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CloseEncounterRequest {
    /// Defaults to now
    pub end_at: Option<DateTime<Utc>>,
}
