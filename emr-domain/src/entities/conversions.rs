use emr_data::models::{
    DocumentRecord, EncounterRecord, ObservationRecord, PatientRecord, PrescriptionRecord,
    TestRequestRecord, UserRecord,
};

use crate::entities::{
    DocumentSummary, Encounter, Observation, Patient, Prescription, TestRequest, User,
};
use crate::services::flags::calc_flags_for_observation;

/// Conversion functions between storage records and domain entities,
/// named convert_to_[target_layer]_[model_name]

/// Drop the password hash and link fields
pub fn convert_to_domain_user(record: UserRecord) -> User {
    User {
        id: record.id,
        username: record.username,
        email: record.email,
        status: record.status,
        created_at: record.created_at,
    }
}

pub fn convert_to_domain_patient(record: PatientRecord) -> Patient {
    Patient {
        id: record.id,
        mrn: record.mrn,
        name: record.name,
        birth_date: record.birth_date,
        sex: record.sex,
        phone: record.phone,
        email: record.email,
        address: record.address,
        created_at: record.created_at,
    }
}

pub fn convert_to_domain_encounter(record: EncounterRecord) -> Encounter {
    Encounter {
        id: record.id,
        patient_id: record.patient_id,
        practitioner_id: record.practitioner_id,
        location_id: record.location_id,
        encounter_type: record.encounter_type,
        reason: record.reason,
        start_at: record.start_at,
        end_at: record.end_at,
    }
}

/// Flags are derived from the stored value, never persisted
pub fn convert_to_domain_observation(record: ObservationRecord) -> Observation {
    let flags = calc_flags_for_observation(&record.code_loinc, &record.value);
    Observation {
        id: record.id,
        patient_id: record.patient_id,
        encounter_id: record.encounter_id,
        category: record.category,
        code_loinc: record.code_loinc,
        value: record.value,
        unit: record.unit,
        effective_at: record.effective_at,
        flags,
    }
}

pub fn convert_to_domain_prescription(record: PrescriptionRecord) -> Result<Prescription, serde_json::Error> {
    Ok(Prescription {
        id: record.id,
        patient_id: record.patient_id,
        patient_name: record.patient_name,
        mrn: record.mrn,
        doctor: record.doctor,
        prescribed_at: record.prescribed_at,
        status: record.status,
        total_amount: record.total_amount,
        notes: record.notes,
        medications: serde_json::from_value(record.medications)?,
        interactions: serde_json::from_value(record.interactions)?,
        contraindications: serde_json::from_value(record.contraindications)?,
    })
}

pub fn convert_to_data_prescription(prescription: &Prescription) -> Result<PrescriptionRecord, serde_json::Error> {
    Ok(PrescriptionRecord {
        id: prescription.id.clone(),
        patient_id: prescription.patient_id,
        patient_name: prescription.patient_name.clone(),
        mrn: prescription.mrn.clone(),
        doctor: prescription.doctor.clone(),
        prescribed_at: prescription.prescribed_at,
        status: prescription.status.clone(),
        total_amount: prescription.total_amount,
        notes: prescription.notes.clone(),
        medications: serde_json::to_value(&prescription.medications)?,
        interactions: serde_json::to_value(&prescription.interactions)?,
        contraindications: serde_json::to_value(&prescription.contraindications)?,
    })
}

pub fn convert_to_domain_test_request(record: TestRequestRecord) -> Result<TestRequest, serde_json::Error> {
    Ok(TestRequest {
        id: record.id,
        patient_id: record.patient_id,
        patient_name: record.patient_name,
        mrn: record.mrn,
        category: record.category,
        procedure_kind: record.procedure_kind,
        test_name: record.test_name,
        purpose: record.purpose,
        urgency: record.urgency,
        requested_by: record.requested_by,
        requested_at: record.requested_at,
        status: record.status,
        scheduled_at: record.scheduled_at,
        schedule: record.schedule.map(serde_json::from_value).transpose()?,
        completed_at: record.completed_at,
        result: record.result.map(serde_json::from_value).transpose()?,
        notes: record.notes,
    })
}

pub fn convert_to_data_test_request(request: &TestRequest) -> Result<TestRequestRecord, serde_json::Error> {
    Ok(TestRequestRecord {
        id: request.id.clone(),
        patient_id: request.patient_id,
        patient_name: request.patient_name.clone(),
        mrn: request.mrn.clone(),
        category: request.category.clone(),
        procedure_kind: request.procedure_kind.clone(),
        test_name: request.test_name.clone(),
        purpose: request.purpose.clone(),
        urgency: request.urgency.clone(),
        requested_by: request.requested_by.clone(),
        requested_at: request.requested_at,
        status: request.status.clone(),
        scheduled_at: request.scheduled_at,
        schedule: request.schedule.as_ref().map(serde_json::to_value).transpose()?,
        completed_at: request.completed_at,
        result: request.result.as_ref().map(serde_json::to_value).transpose()?,
        notes: request.notes.clone(),
    })
}

pub fn convert_to_domain_document_summary(record: &DocumentRecord) -> DocumentSummary {
    DocumentSummary {
        filename: record.filename.clone(),
        title: record.title.clone(),
        kind: record.kind.clone(),
        size: record.size(),
        created: record.created_at,
        modified: record.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{InteractionSeverity, PrescriptionInteraction, PrescriptionItem};
    use chrono::Utc;

    #[test]
    fn test_convert_to_domain_user_drops_hash() {
        let record = UserRecord {
            id: 7,
            username: "doctor1".to_string(),
            email: None,
            password_hash: "$2b$10$abc".to_string(),
            status: "active".to_string(),
            practitioner_id: Some(1),
            created_at: Utc::now(),
        };

        let user = convert_to_domain_user(record);
        assert_eq!(user.id, 7);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_convert_to_domain_observation_derives_flags() {
        let record = ObservationRecord {
            id: 1,
            patient_id: 1,
            encounter_id: None,
            category: "vital-signs".to_string(),
            code_loinc: "BP-SYS".to_string(),
            value: "150".to_string(),
            unit: Some("mmHg".to_string()),
            effective_at: Utc::now(),
        };

        let observation = convert_to_domain_observation(record);
        assert_eq!(observation.flags, vec!["HIGH_BP_SYSTOLIC".to_string()]);
    }

    #[test]
    fn test_prescription_json_columns_survive_conversion() {
        let prescription = Prescription {
            id: "RX1".to_string(),
            patient_id: 3,
            patient_name: "Hong Gildong".to_string(),
            mrn: "P0001".to_string(),
            doctor: "Dr. Kim".to_string(),
            prescribed_at: Utc::now(),
            status: "active".to_string(),
            total_amount: 30.0,
            notes: String::new(),
            medications: vec![PrescriptionItem {
                name: "Warfarin".to_string(),
                amount: 30.0,
                ..Default::default()
            }],
            interactions: vec![PrescriptionInteraction {
                medication1: "Warfarin".to_string(),
                medication2: "Aspirin".to_string(),
                interaction: "bleeding risk".to_string(),
                severity: InteractionSeverity::High,
            }],
            contraindications: vec![],
        };

        let record = convert_to_data_prescription(&prescription).unwrap();
        assert_eq!(record.interactions[0]["severity"], "high");

        let back = convert_to_domain_prescription(record).unwrap();
        assert_eq!(back.medications, prescription.medications);
        assert_eq!(back.interactions, prescription.interactions);
    }

    #[test]
    fn test_malformed_test_request_schedule_is_an_error() {
        let record = TestRequestRecord {
            id: "TEST1".to_string(),
            patient_id: 1,
            patient_name: "Hong Gildong".to_string(),
            mrn: "P0001".to_string(),
            category: "blood".to_string(),
            procedure_kind: "blood_test".to_string(),
            test_name: "CBC".to_string(),
            purpose: None,
            urgency: "normal".to_string(),
            requested_by: "Dr. Kim".to_string(),
            requested_at: Utc::now(),
            status: "scheduled".to_string(),
            scheduled_at: None,
            schedule: Some(serde_json::json!({"room": 3})),
            completed_at: None,
            result: None,
            notes: String::new(),
        };

        assert!(convert_to_domain_test_request(record).is_err());
    }
}
