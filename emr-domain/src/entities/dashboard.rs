use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Where a patient currently is in the clinic flow
///
/// Variants are ordered by display precedence, highest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DashboardStatus {
    ResultsReady,
    InTest,
    Prescribed,
    Waiting,
}

/// One row of the clinic dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DashboardPatient {
    pub patient_id: i64,
    pub patient_name: String,
    pub mrn: String,
    pub status: DashboardStatus,
    /// Time of the event that decided the status
    pub since: DateTime<Utc>,
    /// Encounter reason, test name or prescription id
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub window_hours: i64,
    pub patients: Vec<DashboardPatient>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DashboardQuery {
    /// Defaults to 24
    pub window_hours: Option<i64>,
}
