use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use rand::Rng;
use tracing::{info, warn};

use emr_data::repository::{PatientRepositoryTrait, PrescriptionRepositoryTrait};

use crate::config::AppConfig;
use crate::database::DatabasePool;
use crate::entities::conversions;
use crate::entities::drug::InteractionSeverity;
use crate::entities::patient::Patient;
use crate::entities::prescription::{
    Contraindication, CreatePrescriptionRequest, IssuedPrescription, Prescription,
    PrescriptionInteraction, PrescriptionInteractionCheck, PrescriptionItem, PrescriptionStatistics,
};
use crate::errors::{validate_request, ServiceError};
use crate::services::documents::sex_label;
use crate::services::drugs::DrugDatabase;

const HIGH_KEYWORDS: &[&str] = &["위험", "금기", "고칼륨혈증", "항응고", "risk", "contraindicated", "hyperkalemia", "anticoagula"];
const MEDIUM_KEYWORDS: &[&str] = &["증가", "감소", "변화", "increase", "decrease", "change"];

const DEFAULT_CATEGORY: &str = "other";

#[async_trait]
pub trait PrescriptionServiceTrait {
    /// Issue and persist a prescription for a registered patient
    async fn issue_prescription(&self, request: CreatePrescriptionRequest) -> Result<IssuedPrescription, ServiceError>;

    /// Pairwise interactions among prescription lines
    async fn check_interactions(&self, medications: &[PrescriptionItem]) -> Result<PrescriptionInteractionCheck, ServiceError>;

    /// Prescriptions of a patient, newest first
    async fn history(&self, patient_id: i64) -> Result<Vec<Prescription>, ServiceError>;

    async fn statistics(&self) -> Result<PrescriptionStatistics, ServiceError>;
}

pub struct PrescriptionService<R: PrescriptionRepositoryTrait, P: PatientRepositoryTrait> {
    prescriptions: R,
    patients: P,
    drugs: Arc<DrugDatabase>,
    default_doctor: String,
    hospital_name: String,
}

impl<R: PrescriptionRepositoryTrait, P: PatientRepositoryTrait> PrescriptionService<R, P> {
    pub fn new(
        prescriptions: R,
        patients: P,
        drugs: Arc<DrugDatabase>,
        default_doctor: impl Into<String>,
        hospital_name: impl Into<String>,
    ) -> Self {
        Self {
            prescriptions,
            patients,
            drugs,
            default_doctor: default_doctor.into(),
            hospital_name: hospital_name.into(),
        }
    }
}

/// `RX<millis><0..999>`
pub fn generate_prescription_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("RX{}{}", Utc::now().timestamp_millis(), suffix)
}

/// Severity of an interaction note on a prescription
pub fn prescription_severity(interaction: &str) -> InteractionSeverity {
    let text = interaction.to_lowercase();
    if HIGH_KEYWORDS.iter().any(|k| text.contains(k)) {
        InteractionSeverity::High
    } else if MEDIUM_KEYWORDS.iter().any(|k| text.contains(k)) {
        InteractionSeverity::Medium
    } else {
        InteractionSeverity::Low
    }
}

pub fn find_prescription_interactions(drugs: &DrugDatabase, medications: &[PrescriptionItem]) -> Vec<PrescriptionInteraction> {
    let mut interactions = Vec::new();
    for (i, first) in medications.iter().enumerate() {
        for second in &medications[i + 1..] {
            if let Some(interaction) = drugs.find_interaction(&first.name, &second.name) {
                interactions.push(PrescriptionInteraction {
                    medication1: first.name.clone(),
                    medication2: second.name.clone(),
                    severity: prescription_severity(&interaction),
                    interaction,
                });
            }
        }
    }
    interactions
}

/// Drug contraindications that match a patient condition or allergy
pub fn find_contraindications(
    drugs: &DrugDatabase,
    medications: &[PrescriptionItem],
    conditions: &[String],
    allergies: &[String],
) -> Vec<Contraindication> {
    let traits: Vec<String> = conditions
        .iter()
        .chain(allergies)
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut found = Vec::new();
    for medication in medications {
        let Some(drug) = drugs.find_drug_by_name(&medication.name) else {
            continue;
        };
        for contraindication in &drug.contraindications {
            let lowered = contraindication.to_lowercase();
            if traits.iter().any(|t| lowered.contains(t.as_str()) || t.contains(lowered.as_str())) {
                found.push(Contraindication {
                    medication: medication.name.clone(),
                    contraindication: contraindication.clone(),
                    severity: InteractionSeverity::High,
                });
            }
        }
    }
    found
}

fn validate_items(medications: &[PrescriptionItem]) -> Result<(), ServiceError> {
    if medications.iter().any(|m| m.name.trim().is_empty()) {
        return Err(ServiceError::Validation("medication name is required".to_string()));
    }
    if medications.iter().any(|m| !m.amount.is_finite() || m.amount < 0.0) {
        return Err(ServiceError::Validation("amount must not be negative".to_string()));
    }
    Ok(())
}

fn precautions(prescription: &Prescription) -> String {
    let mut items = Vec::new();
    if !prescription.interactions.is_empty() {
        items.push("Watch for drug interactions");
    }
    if !prescription.contraindications.is_empty() {
        items.push("Check contraindications");
    }
    items.push("Do not stop without consulting your doctor");
    items.push("Contact your doctor immediately if side effects occur");
    items.join(", ")
}

fn format_interactions(interactions: &[PrescriptionInteraction]) -> String {
    if interactions.is_empty() {
        return "None".to_string();
    }
    interactions
        .iter()
        .map(|i| format!("{} + {}: {}", i.medication1, i.medication2, i.interaction))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Printable prescription
pub fn render_prescription_text(
    prescription: &Prescription,
    patient: &Patient,
    allergies: &[String],
    drugs: &DrugDatabase,
    hospital_name: &str,
) -> String {
    let date = prescription.prescribed_at.format("%Y-%m-%d").to_string();
    let birth_date = patient.birth_date.map(|d| d.to_string()).unwrap_or_default();

    let mut text = format!(
        "[Prescription]\n\
         Patient: {}\n\
         Birth date: {}\n\
         Sex: {}\n\
         MRN: {}\n\
         Prescribed: {}\n\
         Doctor: {}\n\
         Hospital: {}\n",
        prescription.patient_name,
        birth_date,
        sex_label(patient.sex.as_deref()),
        prescription.mrn,
        date,
        prescription.doctor,
        hospital_name,
    );

    for item in &prescription.medications {
        let drug = drugs.find_drug_by_name(&item.name);
        let pick = |given: &Option<String>, fallback: Option<&String>| {
            given.clone().or_else(|| fallback.cloned()).unwrap_or_default()
        };
        text.push_str(&format!(
            "\nMedication: {}\n\
             Ingredient: {}\n\
             Dosage: {}\n\
             Frequency: {}\n\
             Duration: {}\n\
             Total amount: {}\n",
            item.name,
            drug.map(|d| d.ingredient.as_str()).unwrap_or_default(),
            pick(&item.dosage, drug.map(|d| &d.dosage)),
            pick(&item.frequency, drug.map(|d| &d.frequency)),
            item.duration.clone().unwrap_or_default(),
            item.amount,
        ));
    }

    let allergies = if allergies.is_empty() {
        "None".to_string()
    } else {
        allergies.join(", ")
    };

    text.push_str(&format!(
        "\nPrecautions: {}\n\
         Allergies: {}\n\
         Interactions: {}\n\
         Issued: {}\n\
         Doctor: {}\n\
         Hospital: {}\n",
        precautions(prescription),
        allergies,
        format_interactions(&prescription.interactions),
        date,
        prescription.doctor,
        hospital_name,
    ));

    text
}

#[async_trait]
impl<R, P> PrescriptionServiceTrait for PrescriptionService<R, P>
where
    R: PrescriptionRepositoryTrait + Send + Sync,
    P: PatientRepositoryTrait + Send + Sync,
{
    async fn issue_prescription(&self, request: CreatePrescriptionRequest) -> Result<IssuedPrescription, ServiceError> {
        validate_request(&request)?;
        validate_items(&request.medications)?;
        let patient_id = request
            .patient_id
            .ok_or_else(|| ServiceError::Validation("patient_id is required".to_string()))?;

        let patient = self.patients
            .get_by_id(patient_id)
            .await?
            .map(conversions::convert_to_domain_patient)
            .ok_or_else(|| ServiceError::NotFound(format!("patient {} not found", patient_id)))?;

        let interactions = find_prescription_interactions(&self.drugs, &request.medications);
        let contraindications = find_contraindications(
            &self.drugs,
            &request.medications,
            &request.conditions,
            &request.allergies,
        );

        let doctor = request
            .doctor
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| self.default_doctor.clone());

        let prescription = Prescription {
            id: generate_prescription_id(),
            patient_id,
            patient_name: patient.name.clone(),
            mrn: patient.mrn.clone(),
            doctor,
            prescribed_at: Utc::now(),
            status: "active".to_string(),
            total_amount: request.medications.iter().map(|m| m.amount).sum(),
            notes: request.notes,
            medications: request.medications,
            interactions,
            contraindications,
        };

        let record = conversions::convert_to_data_prescription(&prescription)?;
        self.prescriptions.create(record).await?;

        if !prescription.interactions.is_empty() || !prescription.contraindications.is_empty() {
            warn!(
                "Prescription {} issued with {} interaction(s) and {} contraindication(s)",
                prescription.id,
                prescription.interactions.len(),
                prescription.contraindications.len()
            );
        } else {
            info!("Prescription {} issued for patient {}", prescription.id, patient_id);
        }

        let text = render_prescription_text(
            &prescription,
            &patient,
            &request.allergies,
            &self.drugs,
            &self.hospital_name,
        );
        Ok(IssuedPrescription { prescription, text })
    }

    async fn check_interactions(&self, medications: &[PrescriptionItem]) -> Result<PrescriptionInteractionCheck, ServiceError> {
        let interactions = find_prescription_interactions(&self.drugs, medications);
        Ok(PrescriptionInteractionCheck {
            has_interactions: !interactions.is_empty(),
            interactions,
        })
    }

    async fn history(&self, patient_id: i64) -> Result<Vec<Prescription>, ServiceError> {
        let records = self.prescriptions.history_for_patient(patient_id).await?;
        records
            .into_iter()
            .map(|r| conversions::convert_to_domain_prescription(r).map_err(ServiceError::from))
            .collect()
    }

    async fn statistics(&self) -> Result<PrescriptionStatistics, ServiceError> {
        let mut stats = PrescriptionStatistics::default();
        let mut by_category: IndexMap<String, usize> = IndexMap::new();
        let mut by_doctor: IndexMap<String, usize> = IndexMap::new();

        for record in self.prescriptions.all().await? {
            let prescription = conversions::convert_to_domain_prescription(record)?;
            stats.total_prescriptions += 1;
            match prescription.status.as_str() {
                "active" => stats.active_prescriptions += 1,
                "completed" => stats.completed_prescriptions += 1,
                _ => {},
            }
            for item in &prescription.medications {
                let category = self.drugs
                    .find_drug_by_name(&item.name)
                    .map(|d| d.category.clone())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
                *by_category.entry(category).or_insert(0) += 1;
            }
            *by_doctor.entry(prescription.doctor.clone()).or_insert(0) += 1;
            stats.interaction_alerts += prescription.interactions.len();
            stats.contraindication_alerts += prescription.contraindications.len();
        }

        stats.by_category = by_category;
        stats.by_doctor = by_doctor;
        Ok(stats)
    }
}

pub fn create_default_prescription_service(
    pool: DatabasePool,
    drugs: Arc<DrugDatabase>,
    config: &AppConfig,
) -> impl PrescriptionServiceTrait + Send + Sync {
    PrescriptionService::new(
        emr_data::repository::PrescriptionRepository::new(pool.clone()),
        emr_data::repository::PatientRepository::new(pool),
        drugs,
        config.default_doctor.clone(),
        config.hospital_name.clone(),
    )
}
