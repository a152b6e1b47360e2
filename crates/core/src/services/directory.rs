//! Hospital directory: tenant registration and the public hospital list.

use super::{check_password, email, required};
use crate::auth::CredentialService;
use crate::model::{AccountStatus, Hospital, Role, User};
use crate::store::Store;
use crate::{TrackerError, TrackerResult};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct HospitalRegistration {
    pub hospital_name: String,
    pub admin_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HospitalSummary {
    pub id: i64,
    pub name: String,
}

pub struct HospitalService {
    store: Arc<Store>,
    credentials: Arc<dyn CredentialService>,
}

impl HospitalService {
    pub fn new(store: Arc<Store>, credentials: Arc<dyn CredentialService>) -> Self {
        Self { store, credentials }
    }

    /// Create a hospital together with its first, active admin.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::BadRequest`] if a field is blank, the email is malformed or the
    ///   password is too short.
    /// - [`TrackerError::Conflict`] if the hospital name or the email is taken.
    pub fn register(&self, registration: &HospitalRegistration) -> TrackerResult<(Hospital, User)> {
        let hospital_name = required("Hospital name", &registration.hospital_name)?;
        let admin_name = required("Admin name", &registration.admin_name)?;
        let admin_email = email(&registration.email)?;
        check_password(&registration.password)?;
        let password_hash = self.credentials.hash(&registration.password);

        let (hospital, admin) = self.store.transaction(|t| {
            if t.hospital_by_name(hospital_name.as_str()).is_some() {
                return Err(TrackerError::conflict("Hospital already registered"));
            }
            if t.email_registered(admin_email.as_str()) {
                return Err(TrackerError::conflict("Email already registered"));
            }

            let hospital = t.hospitals.insert(Hospital {
                id: 0,
                name: hospital_name.as_str().to_string(),
                active: true,
                created_at: Utc::now(),
            });

            let admin = t.users.insert(User {
                id: 0,
                role: Role::Admin,
                name: admin_name.into_inner(),
                email: admin_email.into(),
                status: AccountStatus::Active,
                password_hash: Some(password_hash),
                reset_token_hash: None,
                reset_token_expiry: None,
                hospital_id: hospital.id,
            });
            Ok((hospital, admin))
        })?;

        tracing::info!(hospital_id = hospital.id, admin_id = admin.id, "hospital registered");
        Ok((hospital, admin))
    }

    /// Every active hospital, alphabetically.
    pub fn list(&self) -> TrackerResult<Vec<HospitalSummary>> {
        self.store.read(|t| {
            let mut hospitals: Vec<HospitalSummary> = t
                .hospitals
                .filter(|h| h.active)
                .map(|h| HospitalSummary {
                    id: h.id,
                    name: h.name.clone(),
                })
                .collect();
            hospitals.sort_by_key(|h| h.name.to_lowercase());
            hospitals
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Sha256Credentials;
    use crate::services::testing;

    fn service() -> (Arc<Store>, HospitalService) {
        let store = Arc::new(Store::new());
        let svc = HospitalService::new(store.clone(), Arc::new(Sha256Credentials));
        (store, svc)
    }

    fn registration(hospital: &str, email: &str) -> HospitalRegistration {
        HospitalRegistration {
            hospital_name: hospital.into(),
            admin_name: "Admin".into(),
            email: email.into(),
            password: "Pass@1234".into(),
        }
    }

    #[test]
    fn test_register_creates_active_admin() {
        let (store, svc) = service();
        let (hospital, admin) = svc
            .register(&registration("City Hospital", "Admin@City.org"))
            .unwrap();

        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.status, AccountStatus::Active);
        assert_eq!(admin.email, "admin@city.org");
        assert_eq!(admin.hospital_id, hospital.id);
        assert!(hospital.active);
        let stored = store
            .read(|t| t.user_by_email("admin@city.org").cloned())
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, admin.id);
    }

    #[test]
    fn test_register_conflicts_roll_back() {
        let (store, svc) = service();
        svc.register(&registration("City Hospital", "admin@city.org"))
            .unwrap();

        let err = svc
            .register(&registration(" city hospital ", "other@city.org"))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));

        testing::pharmacy(&store, "Care", "care@example.org");
        let err = svc
            .register(&registration("Second", "care@example.org"))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
        assert_eq!(store.read(|t| t.hospitals.len()).unwrap(), 1);
    }

    #[test]
    fn test_register_name_conflict_ignores_non_ascii_case() {
        let (store, svc) = service();
        svc.register(&registration("Ärztehaus Süd", "a@sued.de"))
            .unwrap();

        let err = svc
            .register(&registration("ärztehaus SÜD", "b@sued.de"))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
        assert_eq!(store.read(|t| t.hospitals.len()).unwrap(), 1);
    }

    #[test]
    fn test_register_validates_input() {
        let (_, svc) = service();
        let mut short = registration("City", "a@city.org");
        short.password = "short".into();
        assert!(matches!(svc.register(&short), Err(TrackerError::BadRequest(_))));
        assert!(matches!(
            svc.register(&registration(" ", "a@city.org")),
            Err(TrackerError::BadRequest(_))
        ));
    }

    #[test]
    fn test_list_is_sorted() {
        let (_, svc) = service();
        svc.register(&registration("Zeta", "z@example.org")).unwrap();
        svc.register(&registration("alpha", "a@example.org")).unwrap();
        let names: Vec<String> = svc.list().unwrap().into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["alpha", "Zeta"]);
    }
}
