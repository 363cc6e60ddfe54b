//! Drug reference database
//!
//! Loads a `{ "drugs": [...] }` dataset from disk, or a small built-in table
//! when no dataset is configured, and answers search, interaction and
//! prescription-guide queries against it.

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::entities::drug::{
    DosageGuideline, Drug, DrugDatabaseStatus, DrugInteraction, DrugSearchResult, DrugWarning,
    GuidePatient, InteractionCheck, InteractionSeverity, PrescriptionGuide,
};

const BUILT_IN_SOURCE: &str = "built-in";
const DEFAULT_CATEGORY: &str = "other";

const CRITICAL_KEYWORDS: &[&str] = &["금기", "위험", "사망", "치명적", "contraindicated", "fatal", "death", "life-threatening"];
const HIGH_KEYWORDS: &[&str] = &["주의", "피해야", "위험도", "avoid", "caution", "risk"];
const MEDIUM_KEYWORDS: &[&str] = &["모니터링", "관찰", "주의깊게", "monitor", "observe", "carefully"];

const ELDERLY_AGE: u32 = 65;
const RENAL_MARKERS: &[&str] = &["신장질환", "renal"];

/// Errors raised while loading a drug dataset
#[derive(Debug, Error)]
pub enum DrugDatabaseError {
    #[error("failed to read drug dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse drug dataset {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct DrugDataset {
    #[serde(default)]
    drugs: Vec<Drug>,
}

/// Read-only operations exposed over HTTP
pub trait DrugServiceTrait {
    /// Case-insensitive match on name, ingredient or category
    fn search(&self, query: &str) -> DrugSearchResult;

    /// Pairwise interaction check plus per-drug contraindication warnings
    fn check_interactions(&self, medications: &[String]) -> InteractionCheck;

    fn prescription_guide(&self, medications: &[String], patient: GuidePatient) -> PrescriptionGuide;

    fn status(&self) -> DrugDatabaseStatus;
}

/// In-memory drug reference table
#[derive(Debug, Clone)]
pub struct DrugDatabase {
    drugs: Vec<Drug>,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl DrugDatabase {
    pub fn from_drugs(drugs: Vec<Drug>, source: impl Into<String>) -> Self {
        Self {
            drugs,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    /// The table used when no dataset file is available
    pub fn built_in() -> Self {
        Self::from_drugs(built_in_drugs(), BUILT_IN_SOURCE)
    }

    /// Parse a dataset file
    pub fn from_file(path: &Path) -> Result<Self, DrugDatabaseError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| DrugDatabaseError::Io {
            path: display.clone(),
            source,
        })?;
        let dataset: DrugDataset = serde_json::from_str(&raw).map_err(|source| DrugDatabaseError::Parse {
            path: display.clone(),
            source,
        })?;
        let total = dataset.drugs.len();
        let drugs: Vec<Drug> = dataset.drugs.into_iter().filter(|drug| !drug.name.trim().is_empty()).collect();
        if drugs.len() < total {
            let dataset_path = display.as_str();
            warn!("Skipped {} unnamed entries in drug dataset {}", total - drugs.len(), dataset_path);
        }
        Ok(Self::from_drugs(drugs, display))
    }

    /// Load the configured dataset, falling back to the built-in table
    pub fn load(path: Option<&str>) -> Self {
        let Some(path) = path.filter(|p| !p.trim().is_empty()) else {
            info!("No drug dataset configured, using built-in drug table");
            return Self::built_in();
        };

        match Self::from_file(Path::new(path)) {
            Ok(db) if !db.drugs.is_empty() => {
                info!("✅ Drug database loaded: {} drugs from {}", db.drugs.len(), path);
                db
            },
            Ok(_) => {
                warn!("Drug dataset {} contains no drugs, using built-in drug table", path);
                Self::built_in()
            },
            Err(e) => {
                error!("❌ {}; using built-in drug table", e);
                Self::built_in()
            },
        }
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    /// Dataset path or `built-in`
    pub fn source(&self) -> &str {
        &self.source
    }

    /// First drug whose name or ingredient contains `name`
    pub fn find_drug_by_name(&self, name: &str) -> Option<&Drug> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.drugs.iter().find(|drug| {
            drug.name.to_lowercase().contains(&needle) || drug.ingredient.to_lowercase().contains(&needle)
        })
    }

    /// Interaction text between two drugs, looked up in both directions
    pub fn find_interaction(&self, drug1: &str, drug2: &str) -> Option<String> {
        let info1 = self.find_drug_by_name(drug1)?;
        let info2 = self.find_drug_by_name(drug2)?;

        mentions(info1, drug2, &info2.ingredient)
            .or_else(|| mentions(info2, drug1, &info1.ingredient))
    }

    /// Drug count per category, in first-seen order
    pub fn category_stats(&self) -> IndexMap<String, usize> {
        let mut stats = IndexMap::new();
        for drug in &self.drugs {
            let category = if drug.category.trim().is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                drug.category.clone()
            };
            *stats.entry(category).or_insert(0) += 1;
        }
        stats
    }
}

/// Interaction entry of `drug` naming `other` or its ingredient
fn mentions(drug: &Drug, other: &str, other_ingredient: &str) -> Option<String> {
    let other = other.trim().to_lowercase();
    let other_ingredient = other_ingredient.trim().to_lowercase();

    drug.interactions
        .iter()
        .find(|interaction| {
            let text = interaction.to_lowercase();
            (!other.is_empty() && text.contains(&other))
                || (!other_ingredient.is_empty() && text.contains(&other_ingredient))
        })
        .cloned()
}

/// Classify interaction text by keyword, most severe first
pub fn interaction_severity(interaction: &str) -> InteractionSeverity {
    let text = interaction.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if has_any(CRITICAL_KEYWORDS) {
        InteractionSeverity::Critical
    } else if has_any(HIGH_KEYWORDS) {
        InteractionSeverity::High
    } else if has_any(MEDIUM_KEYWORDS) {
        InteractionSeverity::Medium
    } else {
        InteractionSeverity::Low
    }
}

impl DrugServiceTrait for DrugDatabase {
    fn search(&self, query: &str) -> DrugSearchResult {
        let needle = query.trim().to_lowercase();
        let drugs: Vec<Drug> = if needle.is_empty() {
            Vec::new()
        } else {
            self.drugs
                .iter()
                .filter(|drug| {
                    drug.name.to_lowercase().contains(&needle)
                        || drug.ingredient.to_lowercase().contains(&needle)
                        || drug.category.to_lowercase().contains(&needle)
                })
                .cloned()
                .collect()
        };

        DrugSearchResult {
            query: query.to_string(),
            count: drugs.len(),
            drugs,
        }
    }

    fn check_interactions(&self, medications: &[String]) -> InteractionCheck {
        let mut check = InteractionCheck::default();
        if medications.len() < 2 {
            return check;
        }

        for (i, drug1) in medications.iter().enumerate() {
            for drug2 in &medications[i + 1..] {
                if let Some(interaction) = self.find_interaction(drug1, drug2) {
                    check.interactions.push(DrugInteraction {
                        drug1: drug1.clone(),
                        drug2: drug2.clone(),
                        severity: interaction_severity(&interaction),
                        interaction,
                    });
                }
            }
        }
        check.has_interactions = !check.interactions.is_empty();

        for medication in medications {
            if let Some(drug) = self.find_drug_by_name(medication) {
                if !drug.contraindications.is_empty() {
                    check.warnings.push(DrugWarning {
                        drug: medication.clone(),
                        warnings: drug.contraindications.clone(),
                    });
                }
            }
        }

        if check.interactions.iter().any(|i| i.severity >= InteractionSeverity::High) {
            check.recommendations.push("Review the combination or choose an alternative drug".to_string());
        }

        check
    }

    fn prescription_guide(&self, medications: &[String], patient: GuidePatient) -> PrescriptionGuide {
        let interaction_check = self.check_interactions(medications);

        let dosage_guidelines = medications
            .iter()
            .filter_map(|medication| {
                self.find_drug_by_name(medication).map(|drug| DosageGuideline {
                    drug: medication.clone(),
                    ingredient: drug.ingredient.clone(),
                    category: drug.category.clone(),
                    dosage: drug.dosage.clone(),
                    side_effects: drug.side_effects.clone(),
                    precautions: drug.precautions.clone(),
                })
            })
            .collect();

        let mut recommendations = Vec::new();
        if patient.age.is_some_and(|age| age > ELDERLY_AGE) {
            recommendations.push("Elderly patient: adjust dosage and monitor side effects".to_string());
        }
        let renal = patient.conditions.iter().any(|condition| {
            let condition = condition.to_lowercase();
            RENAL_MARKERS.iter().any(|marker| condition.contains(marker))
        });
        if renal {
            recommendations.push("Renal disease: adjust dose of renally excreted drugs".to_string());
        }

        let warnings = interaction_check
            .interactions
            .iter()
            .filter(|i| i.severity >= InteractionSeverity::High)
            .map(|i| format!("{} + {}: {}", i.drug1, i.drug2, i.interaction))
            .collect();

        PrescriptionGuide {
            medications: medications.to_vec(),
            patient,
            interaction_check,
            recommendations,
            warnings,
            dosage_guidelines,
        }
    }

    fn status(&self) -> DrugDatabaseStatus {
        DrugDatabaseStatus {
            total_drugs: self.drugs.len(),
            categories: self.category_stats(),
            last_updated: self.loaded_at,
            is_loaded: !self.drugs.is_empty(),
            source: self.source.clone(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn drug(
    name: &str,
    ingredient: &str,
    category: &str,
    dosage: &str,
    frequency: &str,
    interactions: &[&str],
    contraindications: &[&str],
    side_effects: &[&str],
    precautions: &[&str],
) -> Drug {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    Drug {
        name: name.to_string(),
        ingredient: ingredient.to_string(),
        category: category.to_string(),
        dosage: dosage.to_string(),
        frequency: frequency.to_string(),
        interactions: owned(interactions),
        contraindications: owned(contraindications),
        side_effects: owned(side_effects),
        precautions: owned(precautions),
    }
}

fn built_in_drugs() -> Vec<Drug> {
    vec![
        drug(
            "Amlodipine", "amlodipine besylate", "Calcium channel blocker", "5mg", "once daily",
            &["Simvastatin: increased simvastatin exposure, monitor for muscle pain"],
            &["Cardiogenic shock", "Severe hypotension"],
            &["Ankle edema", "Headache", "Flushing"],
            &["Check blood pressure regularly"],
        ),
        drug(
            "Losartan", "losartan", "Angiotensin receptor blocker", "50mg", "once daily",
            &[
                "Potassium Chloride: risk of hyperkalemia, avoid routine combination",
                "Lithium: increased lithium levels, monitor serum lithium",
            ],
            &["Pregnancy", "Hyperkalemia"],
            &["Dizziness", "Hyperkalemia"],
            &["Monitor potassium and renal function"],
        ),
        drug(
            "Metformin", "metformin hydrochloride", "Biguanide", "500mg", "twice daily with meals",
            &["Iodinated contrast: contraindicated around contrast studies because of lactic acidosis"],
            &["Renal failure", "Metabolic acidosis"],
            &["Nausea", "Diarrhea", "Vitamin B12 deficiency"],
            &["Hold before procedures with contrast media"],
        ),
        drug(
            "Metoprolol", "metoprolol tartrate", "Beta blocker", "50mg", "twice daily",
            &["Verapamil: risk of severe bradycardia and heart block, avoid"],
            &["Severe bradycardia", "Cardiogenic shock"],
            &["Fatigue", "Bradycardia", "Cold extremities"],
            &["Do not stop abruptly"],
        ),
        drug(
            "Warfarin", "warfarin sodium", "Anticoagulant", "5mg", "once daily",
            &[
                "Aspirin: increased bleeding risk, avoid unless directed",
                "Amiodarone: potentiates anticoagulation, monitor INR closely",
            ],
            &["Active bleeding", "Pregnancy"],
            &["Bleeding", "Bruising"],
            &["Regular INR monitoring", "Consistent vitamin K intake"],
        ),
        drug(
            "Aspirin", "acetylsalicylic acid", "Antiplatelet", "100mg", "once daily",
            &["Ibuprofen: reduced antiplatelet effect, take aspirin first"],
            &["Peptic ulcer", "Aspirin allergy"],
            &["Dyspepsia", "Bleeding"],
            &["Take with food"],
        ),
        drug(
            "Digoxin", "digoxin", "Cardiac glycoside", "0.125mg", "once daily",
            &["Amiodarone: raised digoxin levels, fatal toxicity possible without dose reduction"],
            &["Ventricular fibrillation"],
            &["Nausea", "Visual disturbance", "Arrhythmia"],
            &["Monitor serum digoxin and potassium"],
        ),
        drug(
            "Glimepiride", "glimepiride", "Sulfonylurea", "2mg", "once daily with breakfast",
            &["Fluconazole: increased hypoglycemic effect, monitor blood glucose"],
            &["Type 1 diabetes", "Sulfonamide allergy"],
            &["Hypoglycemia", "Weight gain"],
            &["Do not skip meals"],
        ),
        drug(
            "Potassium Chloride", "potassium chloride", "Electrolyte supplement", "600mg", "twice daily",
            &["Spironolactone: hyperkalemia, contraindicated without potassium monitoring"],
            &["Hyperkalemia"],
            &["Gastrointestinal irritation"],
            &["Swallow tablets whole with water"],
        ),
        drug(
            "Atorvastatin", "atorvastatin calcium", "Statin", "10mg", "once daily in the evening",
            &["Clarithromycin: increased risk of myopathy, avoid combination"],
            &["Active liver disease", "Pregnancy"],
            &["Myalgia", "Elevated liver enzymes"],
            &["Report unexplained muscle pain"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn meds(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_severity_keywords() {
        assert_eq!(interaction_severity("Contraindicated combination"), InteractionSeverity::Critical);
        assert_eq!(interaction_severity("병용 금기"), InteractionSeverity::Critical);
        assert_eq!(interaction_severity("Avoid taking together"), InteractionSeverity::High);
        assert_eq!(interaction_severity("병용 주의"), InteractionSeverity::High);
        assert_eq!(interaction_severity("Monitor INR"), InteractionSeverity::Medium);
        assert_eq!(interaction_severity("Take two hours apart"), InteractionSeverity::Low);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let db = DrugDatabase::built_in();

        let result = db.search("WARF");
        assert_eq!(result.count, 1);
        assert_eq!(result.drugs[0].name, "Warfarin");

        assert_eq!(db.search("beta blocker").count, 1);
        assert_eq!(db.search("   ").count, 0);
    }

    #[test]
    fn test_find_interaction_in_both_directions() {
        let db = DrugDatabase::built_in();

        let forward = db.find_interaction("Warfarin", "Aspirin").unwrap();
        let backward = db.find_interaction("Aspirin", "Warfarin").unwrap();
        assert_eq!(forward, backward);
        assert!(db.find_interaction("Amlodipine", "Metformin").is_none());
        assert!(db.find_interaction("Warfarin", "Unknownium").is_none());
    }

    #[test]
    fn test_check_interactions() {
        let db = DrugDatabase::built_in();

        let check = db.check_interactions(&meds(&["Warfarin", "Aspirin", "Metformin"]));
        assert!(check.has_interactions);
        assert_eq!(check.interactions.len(), 1);
        assert_eq!(check.interactions[0].severity, InteractionSeverity::High);
        assert_eq!(check.warnings.len(), 3);

        let single = db.check_interactions(&meds(&["Warfarin"]));
        assert_eq!(single, InteractionCheck::default());
    }

    #[test]
    fn test_prescription_guide_recommendations() {
        let db = DrugDatabase::built_in();
        let patient = GuidePatient {
            age: Some(72),
            conditions: vec!["Chronic renal disease".to_string()],
            allergies: vec![],
        };

        let guide = db.prescription_guide(&meds(&["Losartan", "Potassium"]), patient);
        assert_eq!(guide.dosage_guidelines.len(), 2);
        assert_eq!(guide.recommendations.len(), 2);
        assert_eq!(guide.warnings.len(), 1);

        let young = db.prescription_guide(&meds(&["Losartan"]), GuidePatient { age: Some(40), ..Default::default() });
        assert!(young.recommendations.is_empty());
    }

    #[test]
    fn test_status_counts_categories() {
        let mut drugs = built_in_drugs();
        drugs.push(Drug { name: "Mystery".to_string(), ..Default::default() });
        let db = DrugDatabase::from_drugs(drugs, "test");

        let status = db.status();
        assert_eq!(status.total_drugs, 11);
        assert!(status.is_loaded);
        assert_eq!(status.categories.get(DEFAULT_CATEGORY), Some(&1));
        assert_eq!(status.categories.keys().next().map(String::as_str), Some("Calcium channel blocker"));
    }

    #[test]
    fn test_load_dataset_file_with_aliases() {
        let path = std::env::temp_dir().join(format!("drug_dataset_{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"drugs": [{{"drug_name": "Tylenol", "ingredient": "acetaminophen", "category": "Analgesic", "sideEffects": ["Liver injury"]}}]}}"#
        )
        .unwrap();

        let db = DrugDatabase::load(path.to_str());
        std::fs::remove_file(&path).ok();

        assert_eq!(db.len(), 1);
        assert_eq!(db.find_drug_by_name("acetaminophen").unwrap().side_effects, vec!["Liver injury"]);
    }

    #[test]
    fn test_unnamed_entries_do_not_discard_dataset() {
        let path = std::env::temp_dir().join(format!("drug_dataset_unnamed_{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"drugs": [{{"drug_name": "Tylenol", "ingredient": "acetaminophen"}}, {{"ingredient": "mystery"}}, {{"name": "  "}}]}}"#
        )
        .unwrap();

        let db = DrugDatabase::load(path.to_str());
        std::fs::remove_file(&path).ok();

        assert_ne!(db.status().source, BUILT_IN_SOURCE);
        assert_eq!(db.len(), 1);
        assert!(db.find_drug_by_name("Tylenol").is_some());
    }

    #[test]
    fn test_missing_file_falls_back_to_built_in() {
        let db = DrugDatabase::load(Some("/nonexistent/drugs.json"));
        assert_eq!(db.status().source, BUILT_IN_SOURCE);
        assert!(!db.is_empty());
    }
}
