//! Synthetic patients for demos and local development
//!
//! Names are romanized Korean names, phone numbers use mobile prefixes and
//! birth days stop at the 28th so every generated date is valid.

use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const LAST_NAMES: &[&str] = &[
    "Kim", "Lee", "Park", "Choi", "Jung", "Kang", "Cho", "Yoon", "Jang", "Lim",
    "Han", "Oh", "Seo", "Shin", "Kwon", "Hwang", "Ahn", "Song", "Jeon", "Ko",
];

const MALE_NAMES: &[&str] = &[
    "Minsu", "Youngsu", "Cheolsu", "Junho", "Sungho", "Dongho", "Hyunwoo", "Jihoon", "Minho", "Junyoung",
    "Sungmin", "Donghyun", "Hyunsu", "Jiho", "Mincheol", "Youngho", "Cheolho", "Junsu", "Sungsu", "Dongsu",
];

const FEMALE_NAMES: &[&str] = &[
    "Younghee", "Minhee", "Soonhee", "Junghee", "Youngsook", "Minsook", "Jungsook", "Youngja", "Minja", "Soonja",
    "Youngmi", "Minmi", "Jungmi", "Youngju", "Minju", "Jungju", "Minkyung", "Jungkyung", "Youngae", "Minae",
];

const DISEASES: &[&str] = &[
    "Hypertension", "Diabetes", "Common cold", "Gastritis", "Headache", "Back pain", "Arthritis", "Asthma",
    "Allergy", "Insomnia", "Depression", "Anxiety disorder", "Heart disease", "Liver disease", "Kidney disease",
    "Thyroid disease", "Rheumatism", "Osteoporosis", "Dementia", "Parkinson's disease",
];

const SYMPTOMS: &[&str] = &[
    "Headache", "Dizziness", "Vomiting", "Abdominal pain", "Chest pain", "Shortness of breath", "Cough",
    "Runny nose", "Sore throat", "Fever", "Chills", "Fatigue", "Sleeplessness", "Loss of appetite",
    "Indigestion", "Diarrhea", "Constipation", "Back pain", "Joint pain", "Muscle pain",
];

const MEDICATIONS: &[&str] = &[
    "Amlodipine", "Losartan", "Metoprolol", "Captopril", "Valsartan", "Metformin", "Glimepiride", "Glipizide",
    "Sitagliptin", "Insulin", "Acetaminophen", "Ibuprofen", "Aspirin", "Omeprazole", "Lansoprazole",
    "Loratadine", "Cetirizine", "Prednisolone", "Hydrocortisone", "Digoxin",
];

const ALLERGIES: &[&str] = &["Penicillin", "Aspirin", "Sulfonamide", "Cefaclor", "Erythromycin"];

const PHONE_PREFIXES: &[&str] = &["010", "011", "016", "017", "018", "019"];
const CITIES: &[&str] = &["Seoul", "Busan", "Daegu", "Incheon", "Gwangju", "Daejeon", "Ulsan"];
const DISTRICTS: &[&str] = &[
    "Gangnam-gu", "Gangdong-gu", "Gangbuk-gu", "Gangseo-gu", "Gwanak-gu", "Gwangjin-gu", "Guro-gu", "Nowon-gu",
];
const STREETS: &[&str] = &[
    "Teheran-ro", "Gangnam-daero", "Seocho-daero", "Banpo-daero", "Nonhyeon-ro", "Yeoksam-ro", "Samseong-ro",
];
const EMAIL_DOMAINS: &[&str] = &["gmail.com", "naver.com", "daum.net", "hanmail.net", "yahoo.com"];

/// A past visit attached to a generated patient
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeneratedVisit {
    pub date: NaiveDate,
    pub disease: String,
    pub symptom: String,
    pub medication: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeneratedPatient {
    pub mrn: String,
    pub name: String,
    pub birth_date: NaiveDate,
    pub sex: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub allergies: Vec<String>,
    /// Newest first
    pub history: Vec<GeneratedVisit>,
}

pub struct PatientDataGenerator {
    rng: StdRng,
}

impl Default for PatientDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

impl PatientDataGenerator {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Reproducible output for tests
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn random_sex(&mut self) -> &'static str {
        if self.rng.gen_bool(0.5) { "M" } else { "F" }
    }

    pub fn random_name(&mut self, sex: &str) -> String {
        let last = pick(&mut self.rng, LAST_NAMES);
        let first = pick(&mut self.rng, if sex == "M" { MALE_NAMES } else { FEMALE_NAMES });
        format!("{} {}", last, first)
    }

    pub fn random_birth_date(&mut self) -> NaiveDate {
        let year = self.rng.gen_range(1950..=2010);
        let month = self.rng.gen_range(1..=12);
        let day = self.rng.gen_range(1..=28);
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    pub fn random_phone(&mut self) -> String {
        let prefix = pick(&mut self.rng, PHONE_PREFIXES);
        format!("{}-{}-{}", prefix, self.rng.gen_range(1000..10000), self.rng.gen_range(1000..10000))
    }

    pub fn random_address(&mut self) -> String {
        let city = pick(&mut self.rng, CITIES);
        let district = pick(&mut self.rng, DISTRICTS);
        let street = pick(&mut self.rng, STREETS);
        format!(
            "{} {}-gil, {}, {}, Unit {}",
            street,
            self.rng.gen_range(1..=200),
            district,
            city,
            self.rng.gen_range(1..=100)
        )
    }

    pub fn random_email(&mut self, name: &str) -> String {
        let local: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect::<String>().to_lowercase();
        let domain = pick(&mut self.rng, EMAIL_DOMAINS);
        format!("{}{}@{}", local, self.rng.gen_range(0..1000), domain)
    }

    /// Roughly 30% of patients have one to three allergies
    pub fn random_allergies(&mut self) -> Vec<String> {
        if !self.rng.gen_bool(0.3) {
            return Vec::new();
        }
        let count = self.rng.gen_range(1..=3);
        ALLERGIES
            .choose_multiple(&mut self.rng, count)
            .map(|a| a.to_string())
            .collect()
    }

    /// One to five visits within the last year, newest first
    pub fn random_history(&mut self) -> Vec<GeneratedVisit> {
        let today = Utc::now().date_naive();
        let visits = self.rng.gen_range(1..=5);

        let mut history: Vec<GeneratedVisit> = (0..visits)
            .map(|_| {
                let disease = pick(&mut self.rng, DISEASES);
                let symptom = pick(&mut self.rng, SYMPTOMS);
                let medication = pick(&mut self.rng, MEDICATIONS);
                GeneratedVisit {
                    date: today - Duration::days(self.rng.gen_range(0..365)),
                    disease: disease.to_string(),
                    symptom: symptom.to_string(),
                    medication: medication.to_string(),
                    notes: format!("Seen for {}, presenting with {}; prescribed {}", disease, symptom.to_lowercase(), medication),
                }
            })
            .collect();
        history.sort_by(|a, b| b.date.cmp(&a.date));
        history
    }

    pub fn generate_patient(&mut self, mrn: impl Into<String>) -> GeneratedPatient {
        let sex = self.random_sex();
        let name = self.random_name(sex);
        GeneratedPatient {
            mrn: mrn.into(),
            birth_date: self.random_birth_date(),
            sex: sex.to_string(),
            phone: self.random_phone(),
            email: self.random_email(&name),
            address: self.random_address(),
            allergies: self.random_allergies(),
            history: self.random_history(),
            name,
        }
    }

    /// `count` patients numbered from `first_number` (`P<number>`)
    pub fn generate_patients(&mut self, count: usize, first_number: u32) -> Vec<GeneratedPatient> {
        (0..count as u32)
            .map(|i| self.generate_patient(format!("P{:04}", first_number + i)))
            .collect()
    }
}
