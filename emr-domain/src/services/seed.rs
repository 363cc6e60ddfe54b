use chrono::{NaiveDate, Utc};
use tracing::info;

use emr_data::models::{NewEncounterRecord, NewObservationRecord, NewPatientRecord, NewUserRecord};
use emr_data::repository::{
    EncounterRepository, EncounterRepositoryTrait, ObservationRepository, ObservationRepositoryTrait,
    OrganizationRepository, OrganizationRepositoryTrait, PatientRepository, PatientRepositoryTrait, UserRepository,
    UserRepositoryTrait,
};

use crate::database::DatabasePool;
use crate::errors::ServiceError;
use crate::services::demo_data::PatientDataGenerator;
use crate::services::mrn::next_mrn_number;
use crate::services::users::hash_password;

pub const DEMO_USERNAME: &str = "doctor1";
pub const DEMO_PASSWORD: &str = "password123";
const DEMO_LICENSE: &str = "DOC12345";
const DEMO_MRN: &str = "P0001";

/// What a seeding run inserted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedSummary {
    /// `false` when the demo user already existed
    pub seeded: bool,
    pub generated_patients: usize,
}

/// Insert the demo clinic: organization, location, doctor with a login,
/// one patient with a visit and a vital sign, plus `generated` random patients
pub async fn seed_demo_data(pool: &DatabasePool, salt_rounds: u32, generated: usize) -> Result<SeedSummary, ServiceError> {
    let users = UserRepository::new(pool.clone());
    if users.find_by_username(DEMO_USERNAME).await?.is_some() {
        info!("Demo data already present, skipping seed");
        return Ok(SeedSummary::default());
    }

    let organizations = OrganizationRepository::new(pool.clone());
    let organization = organizations.create_organization("Hipster Medical Center").await?;
    let location = organizations.create_location(organization.id, "Main Outpatient").await?;
    let practitioner = match organizations.find_practitioner_by_license(DEMO_LICENSE).await? {
        Some(existing) => existing,
        None => {
            organizations
                .create_practitioner(Some(organization.id), "Dr. Kim", Some(DEMO_LICENSE), Some("Internal Medicine"))
                .await?
        },
    };

    let password_hash = hash_password(DEMO_PASSWORD.to_string(), salt_rounds).await?;
    let user = users
        .create(NewUserRecord {
            username: DEMO_USERNAME.to_string(),
            email: Some("doctor1@example.com".to_string()),
            password_hash,
            status: "active".to_string(),
        })
        .await?;
    users.link_practitioner(user.id, practitioner.id).await?;

    let patients = PatientRepository::new(pool.clone());
    let patient = match patients.get_by_mrn(DEMO_MRN).await? {
        Some(existing) => existing,
        None => {
            patients
                .create(NewPatientRecord {
                    mrn: DEMO_MRN.to_string(),
                    name: "Hong Gildong".to_string(),
                    birth_date: NaiveDate::from_ymd_opt(1998, 2, 21),
                    sex: Some("F".to_string()),
                    phone: Some("010-1234-5678".to_string()),
                    email: None,
                    address: None,
                })
                .await?
        },
    };

    let encounter = EncounterRepository::new(pool.clone())
        .create(NewEncounterRecord {
            patient_id: patient.id,
            practitioner_id: Some(practitioner.id),
            location_id: Some(location.id),
            encounter_type: "OPD".to_string(),
            reason: Some("Health checkup".to_string()),
            start_at: Utc::now(),
        })
        .await?;

    ObservationRepository::new(pool.clone())
        .create(NewObservationRecord {
            patient_id: patient.id,
            encounter_id: Some(encounter.id),
            category: "vital-signs".to_string(),
            code_loinc: "85354-9".to_string(),
            value: "120/80".to_string(),
            unit: Some("mmHg".to_string()),
            effective_at: Utc::now(),
        })
        .await?;

    let existing = patients.list_mrns().await?;
    let first_number = next_mrn_number(existing.iter().map(String::as_str))
        .ok_or_else(|| ServiceError::Conflict("no free mrn left".to_string()))?;

    let mut generator = PatientDataGenerator::new();
    for generated_patient in generator.generate_patients(generated, first_number) {
        patients
            .create(NewPatientRecord {
                mrn: generated_patient.mrn,
                name: generated_patient.name,
                birth_date: Some(generated_patient.birth_date),
                sex: Some(generated_patient.sex),
                phone: Some(generated_patient.phone),
                email: Some(generated_patient.email),
                address: Some(generated_patient.address),
            })
            .await?;
    }

    info!(
        "Seeded demo clinic: user {} / practitioner {} / patient {} plus {} generated patients",
        DEMO_USERNAME, practitioner.id, patient.mrn, generated
    );
    Ok(SeedSummary { seeded: true, generated_patients: generated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtSettings, LoginRequest};
    use crate::services::users::{create_default_user_service, UserServiceTrait};

    #[tokio::test]
    async fn seeding_is_idempotent_and_login_works() {
        let pool = DatabasePool::in_memory().unwrap();

        let first = seed_demo_data(&pool, 4, 5).await.unwrap();
        assert_eq!(first, SeedSummary { seeded: true, generated_patients: 5 });

        let second = seed_demo_data(&pool, 4, 5).await.unwrap();
        assert!(!second.seeded);

        let patients = PatientRepository::new(pool.clone());
        let mrns = patients.list_mrns().await.unwrap();
        assert_eq!(mrns.len(), 6);
        assert!(mrns.iter().any(|m| m == "P1001"));

        let hong = patients.get_by_mrn(DEMO_MRN).await.unwrap().unwrap();
        let observations = ObservationRepository::new(pool.clone())
            .latest_for_patient(hong.id, 10)
            .await
            .unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value, "120/80");

        let jwt = JwtSettings {
            secret: "test-secret".to_string(),
            issuer: "emr-backend".to_string(),
            expiration_hours: 1,
        };
        let login = create_default_user_service(pool, jwt, 4)
            .login(LoginRequest {
                username: DEMO_USERNAME.to_string(),
                password: DEMO_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.user.username, DEMO_USERNAME);
    }
}
