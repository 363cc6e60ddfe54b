use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use emr_data::models::{DocumentRecord, NewDocumentRecord};
use emr_data::repository::{DocumentRepositoryTrait, PatientRepositoryTrait};

use crate::config::AppConfig;
use crate::database::DatabasePool;
use crate::entities::conversions;
use crate::entities::document::{
    DocumentKind, DocumentPatient, DocumentSummary, GeneratedDocument, MedicalReportRequest, OpinionRequest,
    PrescriptionDocumentRequest, TestRequestDocumentRequest,
};
use crate::errors::ServiceError;

const OPINION_TEMPLATE: &str = "\
[Physician's Opinion]

Patient: {patient_name}
Birth date: {birth_date}
Sex: {sex}
MRN: {mrn}

Opinion:
{content}

Recommendations:
{recommendations}

Referral to a tertiary hospital:
{referral_reason}

Issued: {issue_date}
Doctor: {doctor_name}
Hospital: {hospital_name}
";

const MEDICAL_REPORT_TEMPLATE: &str = "\
[Medical Report]

Patient: {patient_name}
Birth date: {birth_date}
Sex: {sex}
MRN: {mrn}
Visit date: {issue_date}

Subjective (S):
{subjective}

Objective (O):
{objective}

Assessment (A):
{assessment}

Plan (P):
{treatment_plan}

Medications:
{medications}

Additional tests:
{tests}

Next visit: {next_visit}

Doctor: {doctor_name}
Hospital: {hospital_name}
";

const PRESCRIPTION_TEMPLATE: &str = "\
[Prescription]

Patient: {patient_name}
Birth date: {birth_date}
Sex: {sex}
MRN: {mrn}
Prescribed: {issue_date}

Medications:
{medications}

Dosage instructions:
{dosage}

Precautions:
{precautions}

Allergies:
{allergies}

Issued: {issue_date}
Prescriber: {doctor_name}
Hospital: {hospital_name}
";

const TEST_REQUEST_TEMPLATE: &str = "\
[Test Request]

Patient: {patient_name}
Birth date: {birth_date}
Sex: {sex}
MRN: {mrn}
Requested: {issue_date}

Requested tests:
{tests}

Purpose:
{purpose}

Clinical findings:
{findings}

Urgency: {urgency}

Requesting doctor: {doctor_name}
Hospital: {hospital_name}
";

/// Printed form of the stored sex code
pub fn sex_label(sex: Option<&str>) -> &'static str {
    match sex {
        Some("M") => "Male",
        _ => "Female",
    }
}

/// Replace every `{key}` placeholder with its value
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{}}}", key), value)
    })
}

/// `<kind>_<mrn>_<8 hex>.txt`
pub fn document_filename(kind: DocumentKind, mrn: &str) -> String {
    let mrn = if mrn.trim().is_empty() { "unknown" } else { mrn.trim() };
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.txt", kind, mrn, &suffix[..8])
}

#[async_trait]
pub trait DocumentServiceTrait {
    async fn generate_opinion(&self, request: OpinionRequest) -> Result<GeneratedDocument, ServiceError>;

    /// SOAP note of a visit
    async fn generate_medical_report(&self, request: MedicalReportRequest) -> Result<GeneratedDocument, ServiceError>;

    async fn generate_prescription(&self, request: PrescriptionDocumentRequest) -> Result<GeneratedDocument, ServiceError>;

    async fn generate_test_request(&self, request: TestRequestDocumentRequest) -> Result<GeneratedDocument, ServiceError>;

    /// Stored documents without their content
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ServiceError>;

    async fn get_document(&self, filename: &str) -> Result<GeneratedDocument, ServiceError>;

    async fn delete_document(&self, filename: &str) -> Result<(), ServiceError>;
}

pub struct DocumentService<D: DocumentRepositoryTrait, P: PatientRepositoryTrait> {
    documents: D,
    patients: P,
    hospital_name: String,
    doctor_name: String,
}

impl<D: DocumentRepositoryTrait, P: PatientRepositoryTrait> DocumentService<D, P> {
    pub fn new(documents: D, patients: P, hospital_name: impl Into<String>, doctor_name: impl Into<String>) -> Self {
        Self {
            documents,
            patients,
            hospital_name: hospital_name.into(),
            doctor_name: doctor_name.into(),
        }
    }

    /// A registered patient wins over inline details
    async fn resolve_patient(
        &self,
        patient_id: Option<i64>,
        inline: Option<DocumentPatient>,
    ) -> Result<(Option<i64>, DocumentPatient), ServiceError> {
        if let Some(id) = patient_id {
            let record = self.patients
                .get_by_id(id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("patient {} not found", id)))?;
            let patient = DocumentPatient {
                name: record.name,
                birth_date: record.birth_date.map(|d| d.to_string()),
                sex: record.sex,
                mrn: record.mrn,
                allergies: inline.map(|p| p.allergies).unwrap_or_default(),
            };
            return Ok((Some(id), patient));
        }

        match inline {
            Some(patient) if !patient.name.trim().is_empty() => Ok((None, patient)),
            _ => Err(ServiceError::Validation("patient_id or patient is required".to_string())),
        }
    }

    async fn render_and_store(
        &self,
        kind: DocumentKind,
        patient_id: Option<i64>,
        patient: &DocumentPatient,
        template: &str,
        fields: &[(&str, &str)],
    ) -> Result<GeneratedDocument, ServiceError> {
        let issue_date = Utc::now().format("%Y-%m-%d").to_string();
        let birth_date = patient.birth_date.clone().unwrap_or_default();

        let mut values: Vec<(&str, &str)> = vec![
            ("patient_name", patient.name.as_str()),
            ("birth_date", birth_date.as_str()),
            ("sex", sex_label(patient.sex.as_deref())),
            ("mrn", patient.mrn.as_str()),
            ("issue_date", issue_date.as_str()),
            ("doctor_name", self.doctor_name.as_str()),
            ("hospital_name", self.hospital_name.as_str()),
        ];
        values.extend_from_slice(fields);

        let record = self.documents
            .store(NewDocumentRecord {
                filename: document_filename(kind, &patient.mrn),
                kind: kind.as_str().to_string(),
                title: kind.title().to_string(),
                patient_id,
                content: fill_template(template, &values),
            })
            .await?;

        info!("Generated {} document {}", kind, record.filename);
        Ok(to_generated(record))
    }
}

fn to_generated(record: DocumentRecord) -> GeneratedDocument {
    GeneratedDocument {
        size: record.size(),
        filename: record.filename,
        title: record.title,
        kind: record.kind,
        content: record.content,
        generated_at: record.created_at,
    }
}

#[async_trait]
impl<D, P> DocumentServiceTrait for DocumentService<D, P>
where
    D: DocumentRepositoryTrait + Send + Sync,
    P: PatientRepositoryTrait + Send + Sync,
{
    async fn generate_opinion(&self, request: OpinionRequest) -> Result<GeneratedDocument, ServiceError> {
        let (patient_id, patient) = self.resolve_patient(request.patient_id, request.patient).await?;
        self.render_and_store(
            DocumentKind::Opinion,
            patient_id,
            &patient,
            OPINION_TEMPLATE,
            &[
                ("content", request.content.as_str()),
                ("recommendations", request.recommendations.as_str()),
                ("referral_reason", request.referral_reason.as_str()),
            ],
        )
        .await
    }

    async fn generate_medical_report(&self, request: MedicalReportRequest) -> Result<GeneratedDocument, ServiceError> {
        let (patient_id, patient) = self.resolve_patient(request.patient_id, request.patient).await?;
        self.render_and_store(
            DocumentKind::MedicalReport,
            patient_id,
            &patient,
            MEDICAL_REPORT_TEMPLATE,
            &[
                ("subjective", request.subjective.as_str()),
                ("objective", request.objective.as_str()),
                ("assessment", request.assessment.as_str()),
                ("treatment_plan", request.treatment_plan.as_str()),
                ("medications", request.medications.as_str()),
                ("tests", request.tests.as_str()),
                ("next_visit", request.next_visit.as_str()),
            ],
        )
        .await
    }

    async fn generate_prescription(&self, request: PrescriptionDocumentRequest) -> Result<GeneratedDocument, ServiceError> {
        let (patient_id, patient) = self.resolve_patient(request.patient_id, request.patient).await?;

        let mut allergies = patient.allergies.clone();
        for allergy in request.allergies {
            if !allergies.contains(&allergy) {
                allergies.push(allergy);
            }
        }
        let allergies = if allergies.is_empty() { "None".to_string() } else { allergies.join(", ") };

        self.render_and_store(
            DocumentKind::Prescription,
            patient_id,
            &patient,
            PRESCRIPTION_TEMPLATE,
            &[
                ("medications", request.medications.as_str()),
                ("dosage", request.dosage.as_str()),
                ("precautions", request.precautions.as_str()),
                ("allergies", allergies.as_str()),
            ],
        )
        .await
    }

    async fn generate_test_request(&self, request: TestRequestDocumentRequest) -> Result<GeneratedDocument, ServiceError> {
        let (patient_id, patient) = self.resolve_patient(request.patient_id, request.patient).await?;
        self.render_and_store(
            DocumentKind::TestRequest,
            patient_id,
            &patient,
            TEST_REQUEST_TEMPLATE,
            &[
                ("tests", request.tests.as_str()),
                ("purpose", request.purpose.as_str()),
                ("findings", request.findings.as_str()),
                ("urgency", request.urgency.as_str()),
            ],
        )
        .await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>, ServiceError> {
        let records = self.documents.list().await?;
        Ok(records.iter().map(conversions::convert_to_domain_document_summary).collect())
    }

    async fn get_document(&self, filename: &str) -> Result<GeneratedDocument, ServiceError> {
        self.documents
            .get_by_filename(filename)
            .await?
            .map(to_generated)
            .ok_or_else(|| ServiceError::NotFound(format!("document {} not found", filename)))
    }

    async fn delete_document(&self, filename: &str) -> Result<(), ServiceError> {
        self.documents.delete(filename).await?;
        info!("Deleted document {}", filename);
        Ok(())
    }
}

pub fn create_default_document_service(pool: DatabasePool, config: &AppConfig) -> impl DocumentServiceTrait + Send + Sync {
    DocumentService::new(
        emr_data::repository::DocumentRepository::new(pool.clone()),
        emr_data::repository::PatientRepository::new(pool),
        config.hospital_name.clone(),
        config.default_doctor.clone(),
    )
}
