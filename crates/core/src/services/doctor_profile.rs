//! Doctor profile engine.
//!
//! A doctor's HR and clinical data lives in one [`DoctorDocument`] per doctor user. The
//! document's `personal.fullName` and `personal.email` mirror the user row; every write goes
//! through [`normalize`], which reconciles the two and keeps them in step. Hospital id and
//! name are never trusted from a stored or submitted document and are joined fresh each time.

use super::{current_user, email, Materialised};
use crate::auth::CredentialService;
use crate::config::CoreConfig;
use crate::document::{self, lenient};
use crate::model::{AccountStatus, DoctorProfileRow, Role, User};
use crate::notifier::Notifier;
use crate::records::DoctorDocument;
use crate::store::{Store, Tables};
use crate::{TrackerError, TrackerResult};
use chrono::Utc;
use medtrack_types::eq_ignore_case;
use medtrack_uuid::UuidService;
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct DoctorProfileService {
    store: Arc<Store>,
    credentials: Arc<dyn CredentialService>,
    notifier: Arc<dyn Notifier>,
    cfg: Arc<CoreConfig>,
}

/// What must be sent once an onboarding transaction has committed.
struct Activation {
    email: String,
    hospital_name: String,
    token: String,
}

impl DoctorProfileService {
    pub fn new(
        store: Arc<Store>,
        credentials: Arc<dyn CredentialService>,
        notifier: Arc<dyn Notifier>,
        cfg: Arc<CoreConfig>,
    ) -> Self {
        Self {
            store,
            credentials,
            notifier,
            cfg,
        }
    }

    /// Blank profile for an admin to fill in.
    pub fn template(&self) -> DoctorDocument {
        DoctorDocument::template(None, "", "")
    }

    /// Load the doctor's profile, creating it from the template if missing.
    pub fn get_or_create(&self, doctor: &User) -> TrackerResult<Materialised<DoctorDocument>> {
        self.store.transaction(|t| materialise(t, doctor))
    }

    /// Profiles of every doctor in a hospital. Missing profiles are created on the way.
    pub fn list_by_hospital(&self, hospital_id: i64) -> TrackerResult<Vec<DoctorDocument>> {
        self.materialise_all(|u| u.hospital_id == hospital_id)
    }

    /// Profiles of every doctor in every hospital. Missing profiles are created on the way.
    pub fn list_all_doctors(&self) -> TrackerResult<Vec<DoctorDocument>> {
        self.materialise_all(|_| true)
    }

    fn materialise_all(
        &self,
        mut include: impl FnMut(&User) -> bool,
    ) -> TrackerResult<Vec<DoctorDocument>> {
        self.store.transaction(|t| {
            let doctors: Vec<User> = t
                .users
                .filter(|u| u.is(Role::Doctor) && include(u))
                .cloned()
                .collect();

            doctors
                .iter()
                .map(|doctor| materialise(t, doctor).map(Materialised::into_inner))
                .collect()
        })
    }

    /// Onboard a doctor from a full profile document.
    ///
    /// The new user is `PENDING` with no password. A one-time activation token is stored
    /// hashed and its plaintext is sent to the doctor once the transaction commits.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Forbidden`] unless `admin` is an admin.
    /// - [`TrackerError::BadRequest`] if `personal.fullName` or `personal.email` is blank, the
    ///   email is malformed or the payload is not an object.
    /// - [`TrackerError::Conflict`] if the email is already registered.
    pub fn admin_create(&self, admin: &User, payload: Value) -> TrackerResult<DoctorDocument> {
        if !admin.is(Role::Admin) {
            return Err(TrackerError::forbidden("Only admin can register doctors"));
        }
        let payload = into_object(payload)?;

        let name = lenient::as_text(payload.pointer("/personal/fullName").cloned().unwrap_or_default());
        let mail = lenient::as_text(payload.pointer("/personal/email").cloned().unwrap_or_default());
        if name.trim().is_empty() || mail.trim().is_empty() {
            return Err(TrackerError::bad_request(
                "Doctor name and email are required",
            ));
        }
        let mail = email(&mail)?;

        let token = UuidService::new().to_string();
        let token_hash = self.credentials.hash(&token);
        let expiry = Utc::now() + self.cfg.activation_ttl();

        let (document, activation) = self.store.transaction(|t| {
            let admin = current_user(t, admin)?;
            if t.email_registered(mail.as_str()) {
                return Err(TrackerError::conflict("Doctor email already exists"));
            }
            let hospital_name = t
                .hospital_of(&admin)
                .map(|h| h.name.clone())
                .ok_or_else(|| TrackerError::not_found("Hospital not found"))?;

            let doctor = t.users.insert(User {
                id: 0,
                role: Role::Doctor,
                name: name.trim().to_string(),
                email: mail.to_string(),
                status: AccountStatus::Pending,
                password_hash: None,
                reset_token_hash: Some(token_hash),
                reset_token_expiry: Some(expiry),
                hospital_id: admin.hospital_id,
            });

            let document = normalize(t, payload, &doctor)?;
            store_profile(t, doctor.id, &document)?;

            let activation = Activation {
                email: mail.to_string(),
                hospital_name,
                token,
            };
            Ok((document, activation))
        })?;

        tracing::info!(doctor_id = ?document.id, "doctor onboarded, awaiting activation");
        self.notify(&activation);
        Ok(document)
    }

    /// Onboard a doctor from just a name and email.
    ///
    /// Same rules as [`admin_create`](Self::admin_create), starting from the blank template.
    pub fn admin_register(
        &self,
        admin: &User,
        name: &str,
        email: &str,
    ) -> TrackerResult<DoctorDocument> {
        let payload = serde_json::to_value(DoctorDocument::template(None, name, email))
            .map_err(TrackerError::Serialization)?;
        self.admin_create(admin, payload)
    }

    /// Replace a doctor's profile on behalf of their hospital's admin.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Forbidden`] unless `admin` is an admin, or if the target is not a
    ///   doctor in the admin's hospital.
    /// - [`TrackerError::NotFound`] if `doctor_id` is unknown.
    /// - [`TrackerError::Conflict`] if the document changes the email to one in use.
    pub fn admin_update(
        &self,
        admin: &User,
        doctor_id: i64,
        payload: Value,
    ) -> TrackerResult<DoctorDocument> {
        if !admin.is(Role::Admin) {
            return Err(TrackerError::forbidden("Only admin can update doctors"));
        }
        let payload = into_object(payload)?;

        self.store.transaction(|t| {
            let admin = current_user(t, admin)?;
            let doctor = t
                .users
                .get(doctor_id)
                .cloned()
                .ok_or_else(|| TrackerError::not_found("Doctor not found"))?;

            if !doctor.is(Role::Doctor) || doctor.hospital_id != admin.hospital_id {
                return Err(TrackerError::forbidden("Doctor not in your hospital"));
            }

            let document = normalize(t, payload, &doctor)?;
            store_profile(t, doctor.id, &document)?;
            Ok(document)
        })
    }

    pub fn self_get(&self, doctor: &User) -> TrackerResult<DoctorDocument> {
        if !doctor.is(Role::Doctor) {
            return Err(TrackerError::forbidden(
                "Only doctor can access doctor profile",
            ));
        }
        Ok(self.get_or_create(doctor)?.into_inner())
    }

    /// Replace the caller's own profile. The login email cannot be changed this way.
    pub fn self_update(&self, doctor: &User, payload: Value) -> TrackerResult<DoctorDocument> {
        if !doctor.is(Role::Doctor) {
            return Err(TrackerError::forbidden(
                "Only doctor can update doctor profile",
            ));
        }
        let mut payload = into_object(payload)?;

        self.store.transaction(|t| {
            let doctor = current_user(t, doctor)?;

            if let Value::Object(root) = &mut payload {
                let personal = root
                    .entry("personal")
                    .or_insert_with(|| Value::Object(Map::new()));
                if !personal.is_object() {
                    *personal = Value::Object(Map::new());
                }
                if let Value::Object(personal) = personal {
                    personal.insert("email".into(), Value::String(doctor.email.clone()));
                }
            }

            let document = normalize(t, payload, &doctor)?;
            store_profile(t, doctor.id, &document)?;
            Ok(document)
        })
    }

    fn notify(&self, activation: &Activation) {
        if let Err(e) = self.notifier.send_activation(
            &activation.email,
            &activation.hospital_name,
            &activation.token,
        ) {
            tracing::error!(to = %activation.email, "failed to send activation notice: {e}");
        }
    }
}

fn into_object(payload: Value) -> TrackerResult<Value> {
    if payload.is_object() {
        Ok(payload)
    } else {
        Err(TrackerError::bad_request("Profile must be a JSON object"))
    }
}

/// Load or create a doctor's profile, with the hospital context joined in.
pub(crate) fn materialise(
    tables: &mut Tables,
    doctor: &User,
) -> TrackerResult<Materialised<DoctorDocument>> {
    let hospital = tables.hospital_of(doctor).map(|h| (h.id, h.name.clone()));

    let found = match tables.doctor_profile_for(doctor.id) {
        Some(row) => Materialised::Found(document::decode::<DoctorDocument>(&row.profile_json)),
        None => {
            let template = DoctorDocument::template(Some(doctor.id), &doctor.name, &doctor.email);
            store_profile(tables, doctor.id, &template)?;
            tracing::debug!(doctor_id = doctor.id, "doctor profile created");
            Materialised::Created(template)
        }
    };

    Ok(found.map(|mut doc| {
        doc.set_hospital(hospital.as_ref().map(|(id, name)| (*id, name.as_str())));
        doc
    }))
}

/// Write a doctor's profile, inserting the row if it does not exist yet.
pub(crate) fn store_profile(
    tables: &mut Tables,
    doctor_id: i64,
    document: &DoctorDocument,
) -> TrackerResult<()> {
    let profile_json = document::encode(document)?;
    let now = Utc::now();

    match tables.doctor_profile_for(doctor_id).cloned() {
        Some(mut row) => {
            row.profile_json = profile_json;
            row.updated_at = now;
            tables.doctor_profiles.save(row);
        }
        None => {
            tables.doctor_profiles.insert(DoctorProfileRow {
                id: 0,
                user_id: doctor_id,
                profile_json,
                updated_at: now,
            });
        }
    }
    Ok(())
}

/// Reconcile a submitted profile with the doctor's user row.
///
/// Forces `id` and the hospital context, resolves name and email (blank means "keep the
/// current value"), enforces email uniqueness across users and pharmacies, saves the user,
/// and writes the resolved identity back into `personal`.
pub(crate) fn normalize(
    tables: &mut Tables,
    payload: Value,
    doctor: &User,
) -> TrackerResult<DoctorDocument> {
    let mut doc: DoctorDocument = document::from_value(payload);
    let mut user = current_user(tables, doctor)?;

    doc.id = Some(user.id);
    let hospital = tables.hospital_of(&user).map(|h| (h.id, h.name.clone()));
    doc.set_hospital(hospital.as_ref().map(|(id, name)| (*id, name.as_str())));

    let name = doc.personal.full_name.trim();
    if !name.is_empty() {
        user.name = name.to_string();
    }

    let requested = doc.personal.email.trim();
    if !requested.is_empty() && !eq_ignore_case(requested, &user.email) {
        let requested = email(requested)?;
        if tables.email_registered(requested.as_str()) {
            return Err(TrackerError::conflict("Email already registered"));
        }
        user.email = requested.into();
    }

    tables.users.save(user.clone());

    doc.personal.full_name = user.name;
    doc.personal.email = user.email;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Sha256Credentials;
    use crate::notifier::OutboxNotifier;
    use crate::services::testing;
    use serde_json::json;

    struct Fixture {
        store: Arc<Store>,
        outbox: Arc<OutboxNotifier>,
        svc: DoctorProfileService,
        admin: User,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(Store::new());
        let cfg = Arc::new(CoreConfig::default());
        let outbox = Arc::new(OutboxNotifier::new(cfg.clone()));
        let svc = DoctorProfileService::new(
            store.clone(),
            Arc::new(Sha256Credentials),
            outbox.clone(),
            cfg,
        );
        let h = testing::hospital(&store, "General");
        let admin = testing::user(&store, h.id, Role::Admin, "Admin", "admin@example.org");
        Fixture {
            store,
            outbox,
            svc,
            admin,
        }
    }

    fn profile_json(store: &Store, doctor_id: i64) -> Option<String> {
        store
            .read(|t| t.doctor_profile_for(doctor_id).map(|p| p.profile_json.clone()))
            .unwrap()
    }

    #[test]
    fn test_get_or_create_is_idempotent_and_joins_hospital() {
        let f = fixture();
        let doctor = testing::user(&f.store, f.admin.hospital_id, Role::Doctor, "Dr. A", "a@example.org");

        let first = f.svc.get_or_create(&doctor).unwrap();
        assert!(first.was_created());
        let second = f.svc.get_or_create(&doctor).unwrap();
        assert!(!second.was_created());

        let doc = second.into_inner();
        assert_eq!(doc.hospital_name.as_deref(), Some("General"));
        assert_eq!(doc.personal.full_name, "Dr. A");
        assert_eq!(f.store.read(|t| t.doctor_profiles.len()).unwrap(), 1);
    }

    #[test]
    fn test_admin_create_onboards_pending_doctor() {
        let f = fixture();
        let payload = json!({
            "personal": {"fullName": "Dr. Ravi Iyer", "email": "Ravi@Example.org"},
            "qualifications": {"specialization": "Cardiology"},
            "hospitalName": "Spoofed"
        });

        let doc = f.svc.admin_create(&f.admin, payload).unwrap();
        assert_eq!(doc.personal.email, "ravi@example.org");
        assert_eq!(doc.hospital_name.as_deref(), Some("General"));
        assert_eq!(doc.qualifications.specialization, "Cardiology");

        let doctor = f
            .store
            .read(|t| t.user_by_email("ravi@example.org").cloned())
            .unwrap()
            .unwrap();
        assert_eq!(doctor.status, AccountStatus::Pending);
        assert!(doctor.password_hash.is_none());
        assert_eq!(doc.id, Some(doctor.id));

        let token = f.outbox.activation_token_for("ravi@example.org").unwrap();
        let hash = doctor.reset_token_hash.unwrap();
        assert_ne!(hash, token);
        assert!(Sha256Credentials.verify(&token, &hash));
        assert!(profile_json(&f.store, doctor.id).is_some());
    }

    #[test]
    fn test_admin_create_rejections() {
        let f = fixture();
        let doctor = testing::user(&f.store, f.admin.hospital_id, Role::Doctor, "Dr. A", "a@example.org");

        let err = f.svc.admin_create(&doctor, json!({})).unwrap_err();
        assert!(matches!(err, TrackerError::Forbidden(_)));

        let err = f
            .svc
            .admin_create(&f.admin, json!({"personal": {"fullName": " ", "email": "x@example.org"}}))
            .unwrap_err();
        assert!(matches!(err, TrackerError::BadRequest(_)));

        let err = f
            .svc
            .admin_create(&f.admin, json!({"personal": {"fullName": "Dup", "email": "A@example.org"}}))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));

        assert!(f.outbox.sent().is_empty());
    }

    #[test]
    fn test_admin_update_cross_hospital_is_forbidden() {
        let f = fixture();
        let other = testing::hospital(&f.store, "Elsewhere");
        let doctor = testing::user(&f.store, other.id, Role::Doctor, "Dr. B", "b@example.org");
        f.svc.get_or_create(&doctor).unwrap();
        let before = profile_json(&f.store, doctor.id);

        let err = f
            .svc
            .admin_update(&f.admin, doctor.id, json!({"personal": {"fullName": "Hijack"}}))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Forbidden(_)));
        assert_eq!(profile_json(&f.store, doctor.id), before);

        let err = f.svc.admin_update(&f.admin, 999, json!({})).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }

    #[test]
    fn test_admin_update_syncs_identity() {
        let f = fixture();
        let doctor = testing::user(&f.store, f.admin.hospital_id, Role::Doctor, "Dr. C", "c@example.org");
        testing::pharmacy(&f.store, "Care", "care@example.org");

        let err = f
            .svc
            .admin_update(&f.admin, doctor.id, json!({"personal": {"email": "care@example.org"}}))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));

        let doc = f
            .svc
            .admin_update(
                &f.admin,
                doctor.id,
                json!({"personal": {"fullName": "Dr. Chitra", "email": "Chitra@example.org"}}),
            )
            .unwrap();
        assert_eq!(doc.personal.full_name, "Dr. Chitra");
        assert_eq!(doc.personal.email, "chitra@example.org");

        let user = f.store.read(|t| t.users.get(doctor.id).cloned()).unwrap().unwrap();
        assert_eq!(user.name, "Dr. Chitra");
        assert_eq!(user.email, "chitra@example.org");
    }

    #[test]
    fn test_self_update_keeps_login_email() {
        let f = fixture();
        let doctor = testing::user(&f.store, f.admin.hospital_id, Role::Doctor, "Dr. D", "d@example.org");

        let doc = f
            .svc
            .self_update(
                &doctor,
                json!({"personal": {"fullName": "Dr. Devi", "email": "new@example.org"}, "research": {"publications": "3"}}),
            )
            .unwrap();
        assert_eq!(doc.personal.email, "d@example.org");
        assert_eq!(doc.personal.full_name, "Dr. Devi");
        assert_eq!(doc.research.publications, "3");

        assert!(matches!(
            f.svc.self_update(&f.admin, json!({})),
            Err(TrackerError::Forbidden(_))
        ));
        assert!(matches!(
            f.svc.self_update(&doctor, json!([1, 2])),
            Err(TrackerError::BadRequest(_))
        ));
    }

    #[test]
    fn test_listing_materialises_missing_profiles() {
        let f = fixture();
        let other = testing::hospital(&f.store, "Elsewhere");
        testing::user(&f.store, f.admin.hospital_id, Role::Doctor, "Dr. E", "e@example.org");
        testing::user(&f.store, other.id, Role::Doctor, "Dr. F", "f@example.org");

        let local = f.svc.list_by_hospital(f.admin.hospital_id).unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(f.svc.list_all_doctors().unwrap().len(), 2);
        assert_eq!(f.store.read(|t| t.doctor_profiles.len()).unwrap(), 2);
    }
}
