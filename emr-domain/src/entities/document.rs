use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Patient details printed in a document header
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DocumentPatient {
    #[serde(default)]
    pub name: String,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
    #[serde(default)]
    pub mrn: String,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Which template a document was rendered from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Opinion,
    MedicalReport,
    Prescription,
    TestRequest,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Opinion => "opinion",
            DocumentKind::MedicalReport => "medical_report",
            DocumentKind::Prescription => "prescription",
            DocumentKind::TestRequest => "test_request",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            DocumentKind::Opinion => "Physician's Opinion",
            DocumentKind::MedicalReport => "Medical Report",
            DocumentKind::Prescription => "Prescription",
            DocumentKind::TestRequest => "Test Request",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opinion and referral letter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct OpinionRequest {
    /// Registered patient; takes precedence over `patient`
    pub patient_id: Option<i64>,
    pub patient: Option<DocumentPatient>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub recommendations: String,
    #[serde(default)]
    pub referral_reason: String,
}

/// SOAP medical report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MedicalReportRequest {
    pub patient_id: Option<i64>,
    pub patient: Option<DocumentPatient>,
    #[serde(default)]
    pub subjective: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub assessment: String,
    #[serde(default)]
    pub treatment_plan: String,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub tests: String,
    #[serde(default)]
    pub next_visit: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PrescriptionDocumentRequest {
    pub patient_id: Option<i64>,
    pub patient: Option<DocumentPatient>,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub precautions: String,
    /// Added to the allergies of the inline patient
    #[serde(default)]
    pub allergies: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TestRequestDocumentRequest {
    pub patient_id: Option<i64>,
    pub patient: Option<DocumentPatient>,
    #[serde(default)]
    pub tests: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub urgency: String,
}

/// A rendered and stored document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct GeneratedDocument {
    pub filename: String,
    pub title: String,
    pub kind: String,
    pub content: String,
    pub generated_at: DateTime<Utc>,
    /// Bytes
    pub size: usize,
}

/// Listing entry without the document body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DocumentSummary {
    pub filename: String,
    pub title: String,
    pub kind: String,
    pub size: usize,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}
