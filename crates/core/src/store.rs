//! In-process relational store.
//!
//! All tables live behind one `Mutex`. [`Store::transaction`] hands the closure a working copy
//! and publishes it only if the closure returns `Ok`, so a multi-step operation either lands in
//! full or not at all. Writers are serialised by the lock; readers never see a half-applied
//! change.
//!
//! The working copy clones every table, so a write costs time proportional to the whole
//! dataset. Larger deployments need per-table copy-on-write or a database behind the same
//! `read`/`transaction` API.

use crate::model::{
    Delivery, DoctorProfileRow, Hospital, InventoryItem, MedicineMaster, PatientRecordRow,
    Pharmacy, User, UserProfile,
};
use crate::{TrackerError, TrackerResult};
use medtrack_types::eq_ignore_case;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A row with a store-allocated id.
pub trait Row: Clone {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

macro_rules! impl_row {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Row for $ty {
                fn id(&self) -> i64 {
                    self.id
                }

                fn set_id(&mut self, id: i64) {
                    self.id = id;
                }
            }
        )+
    };
}

impl_row!(
    User,
    Hospital,
    Pharmacy,
    InventoryItem,
    Delivery,
    PatientRecordRow,
    DoctorProfileRow,
    UserProfile,
    MedicineMaster,
);

/// One table, keyed by id. Ids start at 1 and are never reused.
#[derive(Clone, Debug)]
pub struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Row> Table<T> {
    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<&T> {
        self.rows.values().find(|row| pred(row))
    }

    pub fn filter<'a, P>(&'a self, mut pred: P) -> impl Iterator<Item = &'a T> + 'a
    where
        P: FnMut(&T) -> bool + 'a,
    {
        self.rows.values().filter(move |row| pred(row))
    }

    /// Allocate an id for `row`, store it and return the stored copy.
    pub fn insert(&mut self, mut row: T) -> T {
        self.last_id += 1;
        row.set_id(self.last_id);
        self.rows.insert(self.last_id, row.clone());
        row
    }

    /// Overwrite the row with the same id.
    pub fn save(&mut self, row: T) {
        self.rows.insert(row.id(), row);
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Tables {
    pub hospitals: Table<Hospital>,
    pub users: Table<User>,
    pub pharmacies: Table<Pharmacy>,
    pub inventory: Table<InventoryItem>,
    pub deliveries: Table<Delivery>,
    pub patient_records: Table<PatientRecordRow>,
    pub doctor_profiles: Table<DoctorProfileRow>,
    pub user_profiles: Table<UserProfile>,
    pub medicines: Table<MedicineMaster>,
}

impl Tables {
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.find(|u| eq_ignore_case(&u.email, email))
    }

    pub fn pharmacy_by_email(&self, email: &str) -> Option<&Pharmacy> {
        self.pharmacies.find(|p| eq_ignore_case(&p.email, email))
    }

    /// True when any user or pharmacy already uses `email`, ignoring case.
    pub fn email_registered(&self, email: &str) -> bool {
        self.user_by_email(email).is_some() || self.pharmacy_by_email(email).is_some()
    }

    pub fn hospital_by_name(&self, name: &str) -> Option<&Hospital> {
        self.hospitals.find(|h| eq_ignore_case(&h.name, name))
    }

    pub fn patient_record_for(&self, user_id: i64) -> Option<&PatientRecordRow> {
        self.patient_records.find(|r| r.user_id == user_id)
    }

    pub fn doctor_profile_for(&self, user_id: i64) -> Option<&DoctorProfileRow> {
        self.doctor_profiles.find(|p| p.user_id == user_id)
    }

    pub fn user_profile_for(&self, user_id: i64) -> Option<&UserProfile> {
        self.user_profiles.find(|p| p.user_id == user_id)
    }

    /// The hospital a user belongs to, if it still exists.
    pub fn hospital_of(&self, user: &User) -> Option<&Hospital> {
        self.hospitals.get(user.hospital_id)
    }
}

#[derive(Debug, Default)]
pub struct Store {
    tables: Mutex<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a read-only query against the current tables.
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> TrackerResult<R> {
        let guard = self.tables.lock().map_err(|_| TrackerError::StorePoisoned)?;
        Ok(f(&guard))
    }

    /// Run `f` against a working copy of the tables and commit it if `f` succeeds.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns; nothing `f` wrote is kept in that case.
    pub fn transaction<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> TrackerResult<R>,
    ) -> TrackerResult<R> {
        let mut guard = self.tables.lock().map_err(|_| TrackerError::StorePoisoned)?;
        let mut working = guard.clone();
        let out = f(&mut working)?;
        *guard = working;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hospital(name: &str) -> Hospital {
        Hospital {
            id: 0,
            name: name.into(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_allocates_sequential_ids() {
        let mut table = Table::default();
        let a = table.insert(hospital("A"));
        let b = table.insert(hospital("B"));
        assert_eq!((a.id, b.id), (1, 2));

        table.remove(b.id);
        let c = table.insert(hospital("C"));
        assert_eq!(c.id, 3);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_failed_transaction_rolls_back() {
        let store = Store::new();
        store
            .transaction(|t| {
                t.hospitals.insert(hospital("General"));
                Ok(())
            })
            .unwrap();

        let result: TrackerResult<()> = store.transaction(|t| {
            t.hospitals.insert(hospital("Second"));
            Err(TrackerError::conflict("nope"))
        });
        assert!(result.is_err());

        let count = store.read(|t| t.hospitals.len()).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_hospital_lookup_ignores_case() {
        let mut tables = Tables::default();
        tables.hospitals.insert(hospital("OMPT Demo Hospital"));
        assert!(tables.hospital_by_name(" ompt demo hospital ").is_some());
        assert!(tables.hospital_by_name("Other").is_none());
    }

    #[test]
    fn test_email_registered_spans_users_and_pharmacies() {
        let mut tables = Tables::default();
        tables.pharmacies.insert(Pharmacy {
            id: 0,
            pharmacy_name: "Care".into(),
            location: "Ground floor".into(),
            email: "care@example.org".into(),
            password_hash: String::new(),
        });

        assert!(tables.email_registered("CARE@example.org"));
        assert!(!tables.email_registered("someone@example.org"));
    }
}
