use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use rand::Rng;
use tracing::{info, warn};

use emr_data::repository::{PatientRepositoryTrait, TestRequestRepositoryTrait};

use crate::config::AppConfig;
use crate::database::DatabasePool;
use crate::entities::conversions;
use crate::entities::test_order::{
    CreateTestRequest, ResultInterpretation, ScheduleTestRequest, SubmitResultsRequest, TestRequest,
    TestResults, TestSchedule, TestStatistics,
};
use crate::errors::{validate_request, ServiceError};

/// Range value meaning any result is normal
const ALWAYS_NORMAL: &str = "normal";
const DEFAULT_PROCEDURE: &str = "blood_test";
const DEFAULT_URGENCY: &str = "normal";
const URGENCIES: &[&str] = &["normal", "urgent", "emergency"];
const COMPLETED_BY: &str = "Lab technician";

pub const STATUS_REQUESTED: &str = "requested";
pub const STATUS_SCHEDULED: &str = "scheduled";
pub const STATUS_COMPLETED: &str = "completed";

/// A test code with its reference range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestCode {
    pub code: &'static str,
    pub name: &'static str,
    /// `min-max`, thousands separators allowed, or `normal`
    pub normal_range: &'static str,
    pub unit: &'static str,
}

const fn test(code: &'static str, name: &'static str, normal_range: &'static str, unit: &'static str) -> TestCode {
    TestCode { code, name, normal_range, unit }
}

const BLOOD: &[TestCode] = &[
    test("CBC", "Complete blood count", ALWAYS_NORMAL, ""),
    test("WBC", "White blood cells", "4,000-10,000", "/μL"),
    test("RBC", "Red blood cells", "4.0-5.5", "×10⁶/μL"),
    test("HGB", "Hemoglobin", "12-16", "g/dL"),
    test("HCT", "Hematocrit", "36-46", "%"),
    test("PLT", "Platelets", "150,000-450,000", "/μL"),
    test("ESR", "Erythrocyte sedimentation rate", "0-20", "mm/hr"),
    test("CRP", "C-reactive protein", "0-3", "mg/L"),
];

const CHEMISTRY: &[TestCode] = &[
    test("GLU", "Glucose", "70-110", "mg/dL"),
    test("BUN", "Blood urea nitrogen", "7-20", "mg/dL"),
    test("CRE", "Creatinine", "0.6-1.2", "mg/dL"),
    test("ALT", "Alanine aminotransferase", "0-40", "U/L"),
    test("AST", "Aspartate aminotransferase", "0-40", "U/L"),
    test("ALP", "Alkaline phosphatase", "30-120", "U/L"),
    test("T-BIL", "Total bilirubin", "0.2-1.2", "mg/dL"),
    test("TP", "Total protein", "6.0-8.0", "g/dL"),
    test("ALB", "Albumin", "3.5-5.0", "g/dL"),
    test("CHOL", "Total cholesterol", "0-200", "mg/dL"),
    test("TG", "Triglycerides", "0-150", "mg/dL"),
    test("HDL", "HDL cholesterol", "40-60", "mg/dL"),
    test("LDL", "LDL cholesterol", "0-100", "mg/dL"),
];

const CARDIAC: &[TestCode] = &[
    test("CK", "Creatine kinase", "20-200", "U/L"),
    test("CK-MB", "CK-MB", "0-25", "U/L"),
    test("TROPONIN", "Troponin", "0-0.04", "ng/mL"),
    test("BNP", "B-type natriuretic peptide", "0-100", "pg/mL"),
];

const THYROID: &[TestCode] = &[
    test("TSH", "Thyroid stimulating hormone", "0.4-4.0", "mIU/L"),
    test("T3", "Triiodothyronine", "80-200", "ng/dL"),
    test("T4", "Thyroxine", "4.5-12.5", "μg/dL"),
    test("FT3", "Free T3", "2.3-4.2", "pg/mL"),
    test("FT4", "Free T4", "0.8-1.8", "ng/dL"),
];

const TUMOR: &[TestCode] = &[
    test("AFP", "Alpha-fetoprotein", "0-20", "ng/mL"),
    test("CEA", "Carcinoembryonic antigen", "0-5", "ng/mL"),
    test("CA19-9", "CA19-9", "0-37", "U/mL"),
    test("CA125", "CA125", "0-35", "U/mL"),
    test("PSA", "Prostate specific antigen", "0-4", "ng/mL"),
];

/// Test codes of a result category
pub fn test_catalog(category: &str) -> Option<&'static [TestCode]> {
    match category {
        "blood" => Some(BLOOD),
        "chemistry" => Some(CHEMISTRY),
        "cardiac" => Some(CARDIAC),
        "thyroid" => Some(THYROID),
        "tumor" => Some(TUMOR),
        _ => None,
    }
}

pub fn lookup_test(category: &str, code: &str) -> Option<&'static TestCode> {
    test_catalog(category)?.iter().find(|t| t.code == code)
}

/// How a procedure is booked
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcedureTemplate {
    pub kind: &'static str,
    /// Minutes
    pub duration: u32,
    pub preparation: &'static str,
    pub technician: &'static str,
    pub room: &'static str,
}

const PROCEDURES: &[ProcedureTemplate] = &[
    ProcedureTemplate { kind: "blood_test", duration: 30, preparation: "Fast for 12 hours", technician: "Technician Kim", room: "Lab 1" },
    ProcedureTemplate { kind: "urinalysis", duration: 15, preparation: "Collect a midstream urine sample", technician: "Technician Lee", room: "Lab 2" },
    ProcedureTemplate { kind: "ecg", duration: 20, preparation: "No special preparation", technician: "Technician Park", room: "Lab 3" },
    ProcedureTemplate { kind: "chest_xray", duration: 25, preparation: "No special preparation", technician: "Technician Choi", room: "Radiology 1" },
    ProcedureTemplate { kind: "abdominal_ultrasound", duration: 40, preparation: "Fast for 8 hours", technician: "Technician Jung", room: "Ultrasound 1" },
    ProcedureTemplate { kind: "ct", duration: 60, preparation: "Fast before contrast injection", technician: "Technician Kang", room: "CT 1" },
    ProcedureTemplate { kind: "mri", duration: 90, preparation: "Remove all metal objects", technician: "Technician Cho", room: "MRI 1" },
];

pub fn procedure_template(kind: &str) -> Option<&'static ProcedureTemplate> {
    PROCEDURES.iter().find(|p| p.kind == kind)
}

/// Whether `value` lies inside `normal_range`; unparsable ranges count as normal
pub fn is_normal_value(value: f64, normal_range: &str) -> bool {
    if normal_range == ALWAYS_NORMAL {
        return true;
    }
    let parse = |s: &str| s.replace(',', "").trim().parse::<f64>().ok();

    match normal_range.split_once('-') {
        Some((min, max)) => match (parse(min), parse(max)) {
            (Some(min), Some(max)) => value >= min && value <= max,
            _ => true,
        },
        None => true,
    }
}

/// Follow-up advice for an abnormal result
pub fn recommendation_for(code: &str) -> Option<&'static str> {
    match code {
        "GLU" => Some("Diabetes work-up and endocrinology consultation recommended"),
        "CHOL" => Some("Lipid management and dietary changes recommended"),
        "TG" => Some("Triglyceride management and exercise recommended"),
        "ALT" | "AST" => Some("Liver function work-up and hepatology consultation recommended"),
        "CRE" => Some("Kidney function work-up and nephrology consultation recommended"),
        "TSH" => Some("Thyroid function work-up and endocrinology consultation recommended"),
        _ => None,
    }
}

pub fn interpret_results(category: &str, results: &IndexMap<String, f64>) -> Vec<ResultInterpretation> {
    results
        .iter()
        .filter_map(|(code, &value)| {
            let info = lookup_test(category, code)?;
            let is_normal = is_normal_value(value, info.normal_range);
            Some(ResultInterpretation {
                test_code: code.clone(),
                test_name: info.name.to_string(),
                value,
                normal_range: info.normal_range.to_string(),
                unit: info.unit.to_string(),
                interpretation: if is_normal { "normal" } else { "abnormal" }.to_string(),
                is_normal,
            })
        })
        .collect()
}

pub fn generate_recommendations(interpretations: &[ResultInterpretation]) -> Vec<String> {
    interpretations
        .iter()
        .filter(|i| !i.is_normal)
        .filter_map(|i| recommendation_for(&i.test_code))
        .map(str::to_string)
        .collect()
}

/// `TEST<millis><0..999>`
pub fn generate_test_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("TEST{}{}", Utc::now().timestamp_millis(), suffix)
}

#[async_trait]
pub trait TestOrderServiceTrait {
    async fn request_test(&self, request: CreateTestRequest) -> Result<TestRequest, ServiceError>;

    /// Book the first available slot with the procedure template
    async fn schedule_test(&self, request: ScheduleTestRequest) -> Result<TestSchedule, ServiceError>;

    /// Record, interpret and close a test
    async fn submit_results(&self, request: SubmitResultsRequest) -> Result<TestResults, ServiceError>;

    /// Tests booked on a calendar day (UTC)
    async fn schedule_for(&self, date: NaiveDate) -> Result<Vec<TestRequest>, ServiceError>;

    async fn statistics(&self) -> Result<TestStatistics, ServiceError>;
}

pub struct TestOrderService<T: TestRequestRepositoryTrait, P: PatientRepositoryTrait> {
    tests: T,
    patients: P,
    default_doctor: String,
}

impl<T: TestRequestRepositoryTrait, P: PatientRepositoryTrait> TestOrderService<T, P> {
    pub fn new(tests: T, patients: P, default_doctor: impl Into<String>) -> Self {
        Self { tests, patients, default_doctor: default_doctor.into() }
    }

    async fn load(&self, id: &str) -> Result<TestRequest, ServiceError> {
        let record = self.tests
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("test request {} not found", id)))?;
        Ok(conversions::convert_to_domain_test_request(record)?)
    }

    async fn save(&self, request: &TestRequest) -> Result<(), ServiceError> {
        let record = conversions::convert_to_data_test_request(request)?;
        self.tests.update(record).await?;
        Ok(())
    }
}

#[async_trait]
impl<T, P> TestOrderServiceTrait for TestOrderService<T, P>
where
    T: TestRequestRepositoryTrait + Send + Sync,
    P: PatientRepositoryTrait + Send + Sync,
{
    async fn request_test(&self, request: CreateTestRequest) -> Result<TestRequest, ServiceError> {
        validate_request(&request)?;
        let patient_id = request
            .patient_id
            .ok_or_else(|| ServiceError::Validation("patient_id is required".to_string()))?;

        let urgency = request
            .urgency
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URGENCY.to_string());
        if !URGENCIES.contains(&urgency.as_str()) {
            return Err(ServiceError::Validation(format!("unknown urgency: {}", urgency)));
        }

        let patient = self.patients
            .get_by_id(patient_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("patient {} not found", patient_id)))?;

        let test_request = TestRequest {
            id: generate_test_id(),
            patient_id,
            patient_name: patient.name,
            mrn: patient.mrn,
            category: request.category,
            procedure_kind: request
                .procedure_kind
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROCEDURE.to_string()),
            test_name: request.test_name,
            purpose: request.purpose,
            urgency,
            requested_by: request
                .doctor
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| self.default_doctor.clone()),
            requested_at: Utc::now(),
            status: STATUS_REQUESTED.to_string(),
            scheduled_at: request.scheduled_at,
            schedule: None,
            completed_at: None,
            result: None,
            notes: request.notes,
        };

        self.tests.create(conversions::convert_to_data_test_request(&test_request)?).await?;
        info!("Test {} ({}) requested for patient {}", test_request.id, test_request.test_name, patient_id);
        Ok(test_request)
    }

    async fn schedule_test(&self, request: ScheduleTestRequest) -> Result<TestSchedule, ServiceError> {
        validate_request(&request)?;
        let mut test_request = self.load(&request.test_request_id).await?;

        let template = procedure_template(&test_request.procedure_kind).ok_or_else(|| {
            ServiceError::Validation(format!("unknown test type: {}", test_request.procedure_kind))
        })?;

        let slot = request
            .available_slots
            .first()
            .copied()
            .or(test_request.scheduled_at)
            .ok_or_else(|| ServiceError::Validation("no available slot".to_string()))?;

        let schedule = TestSchedule {
            test_request_id: test_request.id.clone(),
            patient_id: test_request.patient_id,
            patient_name: test_request.patient_name.clone(),
            procedure_kind: test_request.procedure_kind.clone(),
            test_name: test_request.test_name.clone(),
            scheduled_at: slot,
            duration: template.duration,
            preparation: template.preparation.to_string(),
            status: STATUS_SCHEDULED.to_string(),
            assigned_technician: template.technician.to_string(),
            room: template.room.to_string(),
        };

        test_request.status = STATUS_SCHEDULED.to_string();
        test_request.scheduled_at = Some(slot);
        test_request.schedule = Some(schedule.clone());
        self.save(&test_request).await?;

        info!("Test {} scheduled at {} in {}", test_request.id, slot, schedule.room);
        Ok(schedule)
    }

    async fn submit_results(&self, request: SubmitResultsRequest) -> Result<TestResults, ServiceError> {
        validate_request(&request)?;
        let mut test_request = self.load(&request.test_request_id).await?;
        if request.results.is_empty() {
            return Err(ServiceError::Validation("results are required".to_string()));
        }

        let interpretation = interpret_results(&test_request.category, &request.results);
        let recommendations = generate_recommendations(&interpretation);
        let completed_at = Utc::now();

        let results = TestResults {
            test_request_id: test_request.id.clone(),
            patient_id: test_request.patient_id,
            category: test_request.category.clone(),
            test_name: test_request.test_name.clone(),
            results: request.results,
            completed_at,
            completed_by: COMPLETED_BY.to_string(),
            status: STATUS_COMPLETED.to_string(),
            interpretation,
            recommendations,
        };

        test_request.status = STATUS_COMPLETED.to_string();
        test_request.completed_at = Some(completed_at);
        test_request.result = Some(results.clone());
        self.save(&test_request).await?;

        let abnormal = results.interpretation.iter().filter(|i| !i.is_normal).count();
        if abnormal > 0 {
            warn!("Test {} completed with {} abnormal value(s)", test_request.id, abnormal);
        } else {
            info!("Test {} completed", test_request.id);
        }
        Ok(results)
    }

    async fn schedule_for(&self, date: NaiveDate) -> Result<Vec<TestRequest>, ServiceError> {
        let start = date.and_hms_opt(0, 0, 0).map(|d| d.and_utc()).ok_or_else(|| {
            ServiceError::Validation(format!("invalid date {}", date))
        })?;
        let end = start + Duration::days(1);

        self.tests
            .list_scheduled_between(start, end)
            .await?
            .into_iter()
            .map(|r| conversions::convert_to_domain_test_request(r).map_err(ServiceError::from))
            .collect()
    }

    async fn statistics(&self) -> Result<TestStatistics, ServiceError> {
        let mut stats = TestStatistics {
            by_urgency: URGENCIES.iter().map(|u| (u.to_string(), 0)).collect(),
            ..Default::default()
        };

        for record in self.tests.all().await? {
            stats.total_requests += 1;
            if record.status == STATUS_COMPLETED {
                stats.completed_tests += 1;
            } else {
                stats.pending_tests += 1;
            }
            *stats.by_category.entry(record.category).or_insert(0) += 1;
            *stats.by_urgency.entry(record.urgency).or_insert(0) += 1;
        }

        Ok(stats)
    }
}

pub fn create_default_test_order_service(pool: DatabasePool, config: &AppConfig) -> impl TestOrderServiceTrait + Send + Sync {
    TestOrderService::new(
        emr_data::repository::TestRequestRepository::new(pool.clone()),
        emr_data::repository::PatientRepository::new(pool),
        config.default_doctor.clone(),
    )
}
