use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// A drug entry of the reference database
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Drug {
    #[serde(default, alias = "drug_name")]
    pub name: String,
    #[serde(default)]
    pub ingredient: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    /// Free-text interaction notes naming the other drug or ingredient
    #[serde(default)]
    pub interactions: Vec<String>,
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(default, alias = "sideEffects")]
    pub side_effects: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
}

/// How serious a drug interaction is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum InteractionSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for InteractionSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionSeverity::Low => write!(f, "low"),
            InteractionSeverity::Medium => write!(f, "medium"),
            InteractionSeverity::High => write!(f, "high"),
            InteractionSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Search response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DrugSearchResult {
    pub query: String,
    pub count: usize,
    pub drugs: Vec<Drug>,
}

/// Request body listing the medications to check
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct InteractionCheckRequest {
    #[serde(default)]
    pub medications: Vec<String>,
}

/// An interaction found between two requested medications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DrugInteraction {
    pub drug1: String,
    pub drug2: String,
    pub interaction: String,
    pub severity: InteractionSeverity,
}

/// Contraindications listed for one requested medication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DrugWarning {
    pub drug: String,
    pub warnings: Vec<String>,
}

/// Result of a pairwise interaction check
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct InteractionCheck {
    pub has_interactions: bool,
    pub interactions: Vec<DrugInteraction>,
    pub warnings: Vec<DrugWarning>,
    pub recommendations: Vec<String>,
}

/// Patient traits that influence a prescription guide
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct GuidePatient {
    pub age: Option<u32>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Request body for a prescription guide
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PrescriptionGuideRequest {
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub patient: GuidePatient,
}

/// Dosage information for one medication of a guide
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DosageGuideline {
    pub drug: String,
    pub ingredient: String,
    pub category: String,
    pub dosage: String,
    pub side_effects: Vec<String>,
    pub precautions: Vec<String>,
}

/// Interaction check plus dosage guidelines and patient-specific advice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct PrescriptionGuide {
    pub medications: Vec<String>,
    pub patient: GuidePatient,
    pub interaction_check: InteractionCheck,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub dosage_guidelines: Vec<DosageGuideline>,
}

/// Drug database status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DrugDatabaseStatus {
    pub total_drugs: usize,
    /// Drug count per category, in first-seen order
    pub categories: IndexMap<String, usize>,
    pub last_updated: DateTime<Utc>,
    pub is_loaded: bool,
    /// File path the drugs came from, or `built-in`
    pub source: String,
}
