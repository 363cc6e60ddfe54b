use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Request body for ordering a diagnostic test
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateTestRequest {
    #[validate(required(message = "patient_id is required"))]
    pub patient_id: Option<i64>,

    /// Result catalog group: blood, chemistry, cardiac, thyroid, tumor
    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "category and test_name are required"))]
    pub category: String,

    /// Procedure used for scheduling: blood_test, urinalysis, ecg, ...
    #[serde(default)]
    pub procedure_kind: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "category and test_name are required"))]
    pub test_name: String,

    pub purpose: Option<String>,

    /// normal, urgent, emergency
    pub urgency: Option<String>,

    /// Defaults to the configured doctor
    pub doctor: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub notes: String,
}

/// Slot assignment for a test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TestSchedule {
    pub test_request_id: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub procedure_kind: String,
    pub test_name: String,
    pub scheduled_at: DateTime<Utc>,
    /// Minutes
    pub duration: u32,
    pub preparation: String,
    pub status: String,
    pub assigned_technician: String,
    pub room: String,
}

/// Interpretation of a single result value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ResultInterpretation {
    pub test_code: String,
    pub test_name: String,
    pub value: f64,
    pub normal_range: String,
    pub unit: String,
    /// normal or abnormal
    pub interpretation: String,
    pub is_normal: bool,
}

/// Entered results of a completed test
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TestResults {
    pub test_request_id: String,
    pub patient_id: i64,
    pub category: String,
    pub test_name: String,
    pub results: IndexMap<String, f64>,
    pub completed_at: DateTime<Utc>,
    pub completed_by: String,
    pub status: String,
    pub interpretation: Vec<ResultInterpretation>,
    pub recommendations: Vec<String>,
}

/// A diagnostic test order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TestRequest {
    /// `TEST<millis><rand>`
    pub id: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub mrn: String,
    pub category: String,
    pub procedure_kind: String,
    pub test_name: String,
    pub purpose: Option<String>,
    pub urgency: String,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    /// requested, scheduled, completed
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub schedule: Option<TestSchedule>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<TestResults>,
    pub notes: String,
}

/// Request body for scheduling a test
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ScheduleTestRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "test_request_id is required"))]
    pub test_request_id: String,
    /// Candidate slots; the first one is taken
    #[serde(default)]
    pub available_slots: Vec<DateTime<Utc>>,
}

/// Request body for entering test results
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SubmitResultsRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::entities::not_blank", message = "test_request_id is required"))]
    pub test_request_id: String,
    /// Value per test code, e.g. `{"GLU": 130}`
    #[serde(default)]
    pub results: IndexMap<String, f64>,
}

/// Query string of the schedule listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ScheduleQuery {
    /// Defaults to today (UTC)
    pub date: Option<NaiveDate>,
}

/// Aggregate figures over all test orders
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TestStatistics {
    pub total_requests: usize,
    pub completed_tests: usize,
    pub pending_tests: usize,
    pub by_category: IndexMap<String, usize>,
    pub by_urgency: IndexMap<String, usize>,
}
