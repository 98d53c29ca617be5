use log::{info, warn};
use serde::Serialize;

use crate::{
    db::{
        helpers::{decode_or_default, encode},
        keys, ItemWrite, PageStorage,
    },
    error::{CareError, CareResult},
    models::{AdmissionInput, Patient},
};

const QUICK_DETAIL_COUNT: usize = 2;

/// Demo roster written on first read of an empty store.
pub fn initial_patients() -> Vec<Patient> {
    [
        ("P1001", "Karan S.", 34, "A-101", "Critical", "10 min ago"),
        ("P1002", "Ria V.", 67, "B-205", "Stable", "2 min ago"),
        ("P1003", "Manish R.", 55, "C-310", "Serious", "25 min ago"),
        ("P1004", "Sarah L.", 22, "A-105", "Fair", "1 hour ago"),
    ]
    .into_iter()
    .map(|(id, name, age, room, condition, last_update)| Patient {
        id: id.into(),
        name: name.into(),
        age,
        room: room.into(),
        condition: condition.into(),
        last_update: last_update.into(),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Census {
    pub total: usize,
    pub critical: usize,
    pub stable: usize,
    /// First patients on the roster, shown as quick-detail cards.
    pub highlights: Vec<Patient>,
}

#[derive(Clone)]
pub struct PatientRegistry<S> {
    storage: S,
}

fn decode_roster(raw: Option<&str>) -> Vec<Patient> {
    match raw {
        Some(raw) => decode_or_default(keys::HOSPITAL_PATIENTS, Some(raw)),
        None => initial_patients(),
    }
}

impl<S: PageStorage> PatientRegistry<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The roster, seeding the demo patients if nothing is stored yet.
    pub async fn list(&self) -> CareResult<Vec<Patient>> {
        let patients = self
            .storage
            .update_item(keys::HOSPITAL_PATIENTS, |raw| {
                let patients = decode_roster(raw);
                let write = if raw.is_none() {
                    ItemWrite::Set(encode(keys::HOSPITAL_PATIENTS, &patients)?)
                } else {
                    ItemWrite::Keep
                };
                Ok((write, patients))
            })
            .await?;
        Ok(patients)
    }

    pub async fn admit(&self, input: AdmissionInput) -> CareResult<Patient> {
        let patient = validate_admission(input)?;
        let admitted = patient.clone();

        self.storage
            .update_item(keys::HOSPITAL_PATIENTS, move |raw| {
                let mut patients = decode_roster(raw);
                if patients.iter().any(|existing| existing.id == patient.id) {
                    return Err(anyhow::Error::new(CareError::DuplicateKey(format!(
                        "Patient ID {}",
                        patient.id
                    ))));
                }
                patients.push(patient);
                Ok((ItemWrite::Set(encode(keys::HOSPITAL_PATIENTS, &patients)?), ()))
            })
            .await
            .map_err(|err| {
                let err = CareError::from(err);
                if err.is_user_facing() {
                    warn!("Admission rejected: {err}");
                }
                err
            })?;

        info!("Patient {} ({}) admitted successfully", admitted.name, admitted.id);
        Ok(admitted)
    }

    pub async fn census(&self) -> CareResult<Census> {
        let patients = self.list().await?;
        let critical = patients.iter().filter(|p| p.is_critical()).count();
        Ok(Census {
            total: patients.len(),
            critical,
            stable: patients.len() - critical,
            highlights: patients.into_iter().take(QUICK_DETAIL_COUNT).collect(),
        })
    }
}

fn validate_admission(input: AdmissionInput) -> CareResult<Patient> {
    let id = input.id.trim().to_uppercase();
    let name = input.name.trim();
    let ward = input.ward.trim();
    let condition = input.condition.trim();
    let age = input.age.trim();

    if id.is_empty() || name.is_empty() || ward.is_empty() || condition.is_empty() || age.is_empty()
    {
        return Err(CareError::validation("Please fill in all required fields."));
    }

    let age: u32 = age
        .parse()
        .map_err(|_| CareError::validation(format!("Age '{age}' is not a valid number.")))?;

    Ok(Patient {
        id,
        name: name.to_string(),
        age,
        room: ward.to_string(),
        condition: condition.to_string(),
        last_update: "Just now".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;

    fn admission(id: &str) -> AdmissionInput {
        AdmissionInput {
            id: id.into(),
            name: " Omar K. ".into(),
            ward: "D-402".into(),
            condition: "Improving".into(),
            age: "41".into(),
        }
    }

    #[tokio::test]
    async fn first_read_seeds_demo_roster() {
        let storage = MemoryStorage::new();
        let registry = PatientRegistry::new(storage.clone());

        let patients = registry.list().await.unwrap();
        assert_eq!(patients, initial_patients());
        assert!(storage
            .get_item(keys::HOSPITAL_PATIENTS)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn admission_normalizes_and_appends() {
        let registry = PatientRegistry::new(MemoryStorage::new());
        let patient = registry.admit(admission(" p2001 ")).await.unwrap();
        assert_eq!(patient.id, "P2001");
        assert_eq!(patient.name, "Omar K.");
        assert_eq!(patient.last_update, "Just now");

        let patients = registry.list().await.unwrap();
        assert_eq!(patients.len(), 5);
        assert_eq!(patients.last(), Some(&patient));
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_case_insensitively() {
        let registry = PatientRegistry::new(MemoryStorage::new());
        let err = registry.admit(admission("p1001")).await.unwrap_err();
        assert!(matches!(err, CareError::DuplicateKey(ref id) if id == "Patient ID P1001"));
        assert_eq!(registry.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn missing_fields_and_bad_age_fail_validation() {
        let registry = PatientRegistry::new(MemoryStorage::new());

        let mut missing = admission("P3000");
        missing.ward = "  ".into();
        assert!(matches!(
            registry.admit(missing).await.unwrap_err(),
            CareError::Validation(_)
        ));

        let mut bad_age = admission("P3001");
        bad_age.age = "forty".into();
        assert!(matches!(
            registry.admit(bad_age).await.unwrap_err(),
            CareError::Validation(_)
        ));

        assert_eq!(registry.list().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn census_counts_serious_as_critical() {
        let registry = PatientRegistry::new(MemoryStorage::new());
        let census = registry.census().await.unwrap();
        assert_eq!(census.total, 4);
        assert_eq!(census.critical, 2);
        assert_eq!(census.stable, 2);
        let ids: Vec<&str> = census.highlights.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P1001", "P1002"]);
    }

    #[tokio::test]
    async fn malformed_roster_reads_as_empty() {
        let storage = MemoryStorage::new();
        storage
            .set_item(keys::HOSPITAL_PATIENTS, "[{]".into())
            .await
            .unwrap();
        let registry = PatientRegistry::new(storage);
        let census = registry.census().await.unwrap();
        assert_eq!(census.total, 0);
        assert!(census.highlights.is_empty());
    }
}
