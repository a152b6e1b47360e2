//! Business services.
//!
//! Each service holds an `Arc<Store>` plus the collaborators it needs, and runs every
//! multi-step operation inside one [`Store::transaction`](crate::store::Store::transaction).
//! The document engines also expose crate-internal functions over `&mut Tables` so one
//! workflow can reuse another's steps without opening a second transaction.

pub mod accounts;
pub mod catalogue;
pub mod directory;
pub mod doctor_profile;
pub mod ledger;
pub mod patient_record;
pub mod pharmacy;
pub mod user_profile;

use crate::constants::MIN_PASSWORD_LEN;
use crate::model::User;
use crate::store::Tables;
use crate::{TrackerError, TrackerResult};
use medtrack_types::{EmailAddress, NonEmptyText};

/// Result of a find-or-insert.
#[derive(Clone, Debug, PartialEq)]
pub enum Materialised<T> {
    /// The row already existed.
    Found(T),
    /// The row was inserted by this call.
    Created(T),
}

impl<T> Materialised<T> {
    pub fn into_inner(self) -> T {
        match self {
            Materialised::Found(v) | Materialised::Created(v) => v,
        }
    }

    pub fn as_inner(&self) -> &T {
        match self {
            Materialised::Found(v) | Materialised::Created(v) => v,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, Materialised::Created(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Materialised<U> {
        match self {
            Materialised::Found(v) => Materialised::Found(f(v)),
            Materialised::Created(v) => Materialised::Created(f(v)),
        }
    }
}

/// A document after a targeted update, with the number of nested entries it touched.
///
/// `updated == 0` means nothing matched and the stored document was left as it was.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentUpdate<T> {
    pub document: T,
    pub updated: usize,
}

pub(crate) fn required(field: &str, value: &str) -> TrackerResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|_| TrackerError::bad_request(format!("{field} is required")))
}

pub(crate) fn email(value: &str) -> TrackerResult<EmailAddress> {
    Ok(EmailAddress::parse(value)?)
}

pub(crate) fn check_password(password: &str) -> TrackerResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(TrackerError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Re-read `user` so a caller resolved before the transaction sees committed state.
pub(crate) fn current_user(tables: &Tables, user: &User) -> TrackerResult<User> {
    tables
        .users
        .get(user.id)
        .cloned()
        .ok_or_else(|| TrackerError::not_found("User not found"))
}

/// Map blank optional text to `None`.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialised_accessors() {
        let found = Materialised::Found(1);
        let created = Materialised::Created(2).map(|v| v * 10);
        assert!(!found.was_created());
        assert!(created.was_created());
        assert_eq!(created.into_inner(), 20);
        assert_eq!(*found.as_inner(), 1);
    }

    #[test]
    fn test_check_password_length() {
        assert!(check_password("short").is_err());
        assert!(check_password("longenough").is_ok());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" x ")), Some("x"));
        assert_eq!(non_blank(None), None);
    }
}
