use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// A recorded observation with the flags its value raises
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Observation {
    pub id: i64,
    pub patient_id: i64,
    pub encounter_id: Option<i64>,
    /// vital-signs, laboratory, ...
    pub category: String,
    /// LOINC code or local shorthand such as `BP-SYS`
    pub code_loinc: String,
    pub value: String,
    pub unit: Option<String>,
    pub effective_at: DateTime<Utc>,
    pub flags: Vec<String>,
}

/// Request body for recording an observation
///
/// `value` accepts a JSON string or number and is stored as text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateObservationRequest {
    #[validate(required(message = "patient_id, category, code_loinc, value are required"))]
    pub patient_id: Option<i64>,

    pub encounter_id: Option<i64>,

    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "patient_id, category, code_loinc, value are required"))]
    pub category: String,

    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "patient_id, category, code_loinc, value are required"))]
    pub code_loinc: String,

    pub value: Option<serde_json::Value>,

    pub unit: Option<String>,

    /// Defaults to now
    pub effective_at: Option<DateTime<Utc>>,
}

/// One flagged observation in an alert summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct AlertEntry {
    pub code: String,
    pub value: String,
    pub unit: Option<String>,
    pub flags: Vec<String>,
    pub at: DateTime<Utc>,
}

/// Flagged observations of a patient over the last 24 hours
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PatientAlerts {
    pub has_alert: bool,
    pub count: usize,
    pub summary: Vec<AlertEntry>,
}
