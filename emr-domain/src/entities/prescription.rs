use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::drug::InteractionSeverity;

/// One line of a prescription
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PrescriptionItem {
    #[serde(default)]
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    /// Quantity dispensed
    #[serde(default)]
    pub amount: f64,
}

/// Interaction between two prescribed medications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PrescriptionInteraction {
    pub medication1: String,
    pub medication2: String,
    pub interaction: String,
    pub severity: InteractionSeverity,
}

/// A contraindication that applies to this patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Contraindication {
    pub medication: String,
    pub contraindication: String,
    pub severity: InteractionSeverity,
}

/// An issued prescription
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Prescription {
    /// `RX<millis><rand>`
    pub id: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub mrn: String,
    pub doctor: String,
    pub prescribed_at: DateTime<Utc>,
    /// active, completed
    pub status: String,
    pub total_amount: f64,
    pub notes: String,
    pub medications: Vec<PrescriptionItem>,
    pub interactions: Vec<PrescriptionInteraction>,
    pub contraindications: Vec<Contraindication>,
}

/// Request body for issuing a prescription
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreatePrescriptionRequest {
    #[validate(required(message = "patient_id is required"))]
    pub patient_id: Option<i64>,
    /// Defaults to the configured doctor
    pub doctor: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one medication is required"))]
    pub medications: Vec<PrescriptionItem>,
    #[serde(default)]
    pub notes: String,
    /// Known conditions checked against drug contraindications
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Request body for an interaction check over prescription lines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CheckPrescriptionRequest {
    #[serde(default)]
    pub medications: Vec<PrescriptionItem>,
}

/// Interactions found among prescription lines
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PrescriptionInteractionCheck {
    pub has_interactions: bool,
    pub interactions: Vec<PrescriptionInteraction>,
}

/// Issued prescription plus its printable text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct IssuedPrescription {
    pub prescription: Prescription,
    pub text: String,
}

/// Aggregate figures over all prescriptions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PrescriptionStatistics {
    pub total_prescriptions: usize,
    pub active_prescriptions: usize,
    pub completed_prescriptions: usize,
    /// Prescribed lines per drug category
    pub by_category: IndexMap<String, usize>,
    pub by_doctor: IndexMap<String, usize>,
    pub interaction_alerts: usize,
    pub contraindication_alerts: usize,
}
