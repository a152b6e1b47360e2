//! Hospital user accounts: registration, login and password recovery.
//!
//! One-time secrets (doctor activation tokens, password reset codes) are stored only as hashes in
//! `reset_token_hash` with an expiry, and are cleared once used.

use super::{check_password, current_user, doctor_profile, email, patient_record, required};
use crate::auth::{CredentialService, TokenService};
use crate::config::CoreConfig;
use crate::model::{AccountStatus, Role, User};
use crate::notifier::Notifier;
use crate::store::{Store, Tables};
use crate::{TrackerError, TrackerResult};
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

const INVALID_TOKEN: &str = "Invalid or Expired Token";
const INVALID_CREDENTIALS: &str = "Invalid Credentials";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub hospital_id: i64,
    pub hospital_name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub hospital_id: i64,
    /// Only used for patients.
    pub doctor_assigned_id: Option<i64>,
}

pub struct AccountService {
    store: Arc<Store>,
    credentials: Arc<dyn CredentialService>,
    tokens: Arc<dyn TokenService>,
    notifier: Arc<dyn Notifier>,
    cfg: Arc<CoreConfig>,
}

impl AccountService {
    pub fn new(
        store: Arc<Store>,
        credentials: Arc<dyn CredentialService>,
        tokens: Arc<dyn TokenService>,
        notifier: Arc<dyn Notifier>,
        cfg: Arc<CoreConfig>,
    ) -> Self {
        Self {
            store,
            credentials,
            tokens,
            notifier,
            cfg,
        }
    }

    /// Register an active patient and create their record straight away.
    ///
    /// The assigned doctor is attached when `doctor_assigned_id` names an existing doctor and
    /// silently dropped otherwise.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Conflict`] if the email is already registered.
    /// - [`TrackerError::BadRequest`] for an unknown hospital, blank name, malformed email or
    ///   short password.
    pub fn register_patient(&self, registration: &Registration) -> TrackerResult<User> {
        let patient = self.store.transaction(|t| {
            let patient = self.insert_user(t, registration, Role::Patient)?;
            let doctor_id = registration
                .doctor_assigned_id
                .filter(|id| t.users.get(*id).is_some_and(|u| u.is(Role::Doctor)));
            patient_record::find_or_insert_record(t, &patient, doctor_id)?;
            Ok(patient)
        })?;

        tracing::info!(user_id = patient.id, "patient registered");
        Ok(patient)
    }

    /// Register an active doctor and create their profile straight away.
    pub fn register_doctor(&self, registration: &Registration) -> TrackerResult<User> {
        let doctor = self.store.transaction(|t| {
            let doctor = self.insert_user(t, registration, Role::Doctor)?;
            doctor_profile::materialise(t, &doctor)?;
            Ok(doctor)
        })?;

        tracing::info!(user_id = doctor.id, "doctor registered");
        Ok(doctor)
    }

    fn insert_user(
        &self,
        t: &mut Tables,
        registration: &Registration,
        role: Role,
    ) -> TrackerResult<User> {
        let name = required("Name", &registration.name)?;
        let email = email(&registration.email)?;
        check_password(&registration.password)?;

        if t.email_registered(email.as_str()) {
            return Err(TrackerError::conflict("Email already registered"));
        }
        if t.hospitals.get(registration.hospital_id).is_none() {
            return Err(TrackerError::bad_request("Invalid hospital"));
        }

        Ok(t.users.insert(User {
            id: 0,
            role,
            name: name.into_inner(),
            email: email.into(),
            status: AccountStatus::Active,
            password_hash: Some(self.credentials.hash(&registration.password)),
            reset_token_hash: None,
            reset_token_expiry: None,
            hospital_id: registration.hospital_id,
        }))
    }

    /// Check credentials and issue a bearer token carrying the user's role.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Unauthorised`] for an unknown email, an account that is not
    /// active yet, or a wrong password.
    pub fn login(&self, email: &str, password: &str) -> TrackerResult<(String, User)> {
        let user = self
            .store
            .read(|t| t.user_by_email(email).cloned())?
            .ok_or_else(|| TrackerError::unauthorised(INVALID_CREDENTIALS))?;

        if user.status != AccountStatus::Active {
            return Err(TrackerError::unauthorised("Account is not active"));
        }
        let verified = user
            .password_hash
            .as_deref()
            .is_some_and(|hash| self.credentials.verify(password, hash));
        if !verified {
            return Err(TrackerError::unauthorised(INVALID_CREDENTIALS));
        }

        let token = self.tokens.issue(&user.email, user.role.as_str())?;
        tracing::debug!(user_id = user.id, "login succeeded");
        Ok((token, user))
    }

    /// Set the first password of an onboarded doctor from their activation token.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::BadRequest`] if no unexpired token matches, or the password is
    /// too short.
    pub fn activate(&self, token: &str, new_password: &str) -> TrackerResult<User> {
        let user = self.redeem_token(token, new_password, true)?;
        tracing::info!(user_id = user.id, "account activated");
        Ok(user)
    }

    /// Set a new password from an emailed one-time token. The account status is left as it is.
    pub fn reset_password(&self, token: &str, new_password: &str) -> TrackerResult<User> {
        let user = self.redeem_token(token, new_password, false)?;
        tracing::info!(user_id = user.id, "password reset");
        Ok(user)
    }

    fn redeem_token(&self, token: &str, new_password: &str, activate: bool) -> TrackerResult<User> {
        check_password(new_password)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(TrackerError::bad_request(INVALID_TOKEN));
        }
        let password_hash = self.credentials.hash(new_password);

        self.store.transaction(|t| {
            let now = Utc::now();
            let mut user = t
                .users
                .find(|u| {
                    u.reset_token_expiry.is_some_and(|exp| exp > now)
                        && u.reset_token_hash
                            .as_deref()
                            .is_some_and(|hash| self.credentials.verify(token, hash))
                })
                .cloned()
                .ok_or_else(|| TrackerError::bad_request(INVALID_TOKEN))?;

            user.password_hash = Some(password_hash);
            if activate {
                user.status = AccountStatus::Active;
            }
            user.reset_token_hash = None;
            user.reset_token_expiry = None;
            t.users.save(user.clone());
            Ok(user)
        })
    }

    /// Email a short-lived reset code. Unknown emails are ignored without error.
    pub fn forgot_password(&self, email: &str) -> TrackerResult<()> {
        let code = format!("{:06}", rand::thread_rng().gen_range(100_000..1_000_000));
        let code_hash = self.credentials.hash(&code);
        let expiry = Utc::now() + self.cfg.reset_code_ttl();

        let recipient = self.store.transaction(|t| {
            let Some(mut user) = t.user_by_email(email).cloned() else {
                return Ok(None);
            };
            user.reset_token_hash = Some(code_hash);
            user.reset_token_expiry = Some(expiry);
            let recipient = user.email.clone();
            t.users.save(user);
            Ok(Some(recipient))
        })?;

        match recipient {
            Some(to) => self.notifier.send_password_reset_code(&to, &code),
            None => {
                tracing::debug!("password reset requested for unknown email");
                Ok(())
            }
        }
    }

    /// Check a reset code without consuming it.
    pub fn verify_reset_code(&self, email: &str, code: &str) -> TrackerResult<()> {
        self.store
            .read(|t| self.check_code(t, email, code).map(|_| ()))?
    }

    /// Set a new password using an emailed reset code. The code is consumed.
    pub fn reset_password_with_code(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> TrackerResult<()> {
        check_password(new_password)?;
        let password_hash = self.credentials.hash(new_password);

        self.store.transaction(|t| {
            let mut user = self.check_code(t, email, code)?;
            user.password_hash = Some(password_hash);
            user.reset_token_hash = None;
            user.reset_token_expiry = None;
            t.users.save(user);
            Ok(())
        })
    }

    fn check_code(&self, t: &Tables, email: &str, code: &str) -> TrackerResult<User> {
        let now = Utc::now();
        t.user_by_email(email)
            .filter(|u| u.reset_token_expiry.is_some_and(|exp| exp > now))
            .filter(|u| {
                u.reset_token_hash
                    .as_deref()
                    .is_some_and(|hash| self.credentials.verify(code.trim(), hash))
            })
            .cloned()
            .ok_or_else(|| TrackerError::bad_request(INVALID_TOKEN))
    }

    /// The account behind a bearer token subject.
    pub fn resolve(&self, email: &str) -> TrackerResult<User> {
        self.store
            .read(|t| t.user_by_email(email).cloned())?
            .ok_or_else(|| TrackerError::not_found("User not found"))
    }

    /// The caller's account with their hospital's name.
    pub fn me(&self, user: &User) -> TrackerResult<AccountSummary> {
        self.store.read(|t| {
            let user = current_user(t, user)?;
            Ok(AccountSummary {
                hospital_name: t.hospital_of(&user).map(|h| h.name.clone()),
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
                hospital_id: user.hospital_id,
            })
        })?
    }
}
