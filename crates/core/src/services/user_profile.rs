//! Flat patient intake profile.
//!
//! The patient record document is the source of truth for patient-facing data. Saving an intake
//! profile copies its fields into that document in the same transaction; edits made to the
//! document never flow back here.

use super::{current_user, patient_record, required};
use crate::model::{User, UserProfile};
use crate::store::{Store, Tables};
use crate::{TrackerError, TrackerResult};
use serde_json::Value;
use std::sync::Arc;

pub struct UserProfileService {
    store: Arc<Store>,
}

impl UserProfileService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create or replace the caller's intake profile.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::BadRequest`] if the patient name is blank.
    pub fn save(&self, user: &User, profile: &UserProfile) -> TrackerResult<UserProfile> {
        let patient_name = required("Patient name", &profile.patient_name)?;

        self.store.transaction(|t| {
            let user = current_user(t, user)?;
            let mut saved = UserProfile {
                id: 0,
                user_id: user.id,
                patient_name: patient_name.into_inner(),
                gender: profile.gender.trim().to_string(),
                age: profile.age,
                phone_number: profile.phone_number.trim().to_string(),
                blood_group: profile.blood_group.trim().to_string(),
                address: profile.address.trim().to_string(),
            };

            match t.user_profile_for(user.id).map(|p| p.id) {
                Some(id) => {
                    saved.id = id;
                    t.user_profiles.save(saved.clone());
                }
                None => saved = t.user_profiles.insert(saved),
            }

            project(t, &user, &saved)?;
            Ok(saved)
        })
    }

    pub fn get(&self, user: &User) -> TrackerResult<UserProfile> {
        self.store
            .read(|t| t.user_profile_for(user.id).cloned())?
            .ok_or_else(|| TrackerError::not_found("Profile not found"))
    }
}

/// Copy intake fields into the patient's record, creating the record if needed.
fn project(tables: &mut Tables, user: &User, profile: &UserProfile) -> TrackerResult<()> {
    let mut doc = patient_record::find_or_insert_record(tables, user, None)?.into_inner();
    doc.name = profile.patient_name.clone();
    doc.gender = profile.gender.clone();
    doc.age = Value::from(profile.age);
    doc.blood_group = profile.blood_group.clone();
    doc.contact.phone = profile.phone_number.clone();
    doc.contact.address = profile.address.clone();

    let row = tables
        .patient_record_for(user.id)
        .cloned()
        .ok_or_else(|| TrackerError::not_found("Patient record not found"))?;
    patient_record::save_document(tables, row, &doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use crate::model::Role;
    use crate::records::PatientDocument;
    use crate::services::testing;

    fn intake(name: &str, age: u32) -> UserProfile {
        UserProfile {
            id: 0,
            user_id: 0,
            patient_name: name.into(),
            gender: "Female".into(),
            age,
            phone_number: "9876543210".into(),
            blood_group: "B+".into(),
            address: "12 Lakeview Street".into(),
        }
    }

    #[test]
    fn test_save_upserts_and_projects_into_record() {
        let store = Arc::new(Store::new());
        let h = testing::hospital(&store, "General");
        let patient = testing::user(&store, h.id, Role::Patient, "Ananya", "ananya@example.org");
        let svc = UserProfileService::new(store.clone());

        let first = svc.save(&patient, &intake("Ananya Rao", 34)).unwrap();
        let second = svc.save(&patient, &intake("Ananya Rao", 35)).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(svc.get(&patient).unwrap().age, 35);

        let doc: PatientDocument = store
            .read(|t| document::decode(&t.patient_record_for(patient.id).unwrap().data_json))
            .unwrap();
        assert_eq!(doc.name, "Ananya Rao");
        assert_eq!(doc.age, Value::from(35));
        assert_eq!(doc.blood_group, "B+");
        assert_eq!(doc.contact.phone, "9876543210");
        assert_eq!(doc.contact.email, "ananya@example.org");
    }

    #[test]
    fn test_get_without_profile() {
        let store = Arc::new(Store::new());
        let h = testing::hospital(&store, "General");
        let patient = testing::user(&store, h.id, Role::Patient, "Kiran", "kiran@example.org");
        let svc = UserProfileService::new(store);

        assert!(matches!(svc.get(&patient), Err(TrackerError::NotFound(_))));
        assert!(matches!(
            svc.save(&patient, &intake(" ", 20)),
            Err(TrackerError::BadRequest(_))
        ));
    }
}
