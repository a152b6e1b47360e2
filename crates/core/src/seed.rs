//! Demo data.
//!
//! [`DemoSeeder::run`] is idempotent: rows are looked up by their natural keys (email, hospital
//! name, catalogue name and strength) and only created when missing, and demo prescriptions are
//! only issued to patients whose record has no medicines yet. Prescriptions go through
//! [`PatientRecordService::assign_medicine`] so stock and the delivery ledger move as they would
//! for a real doctor.

use crate::auth::CredentialService;
use crate::model::{AccountStatus, Hospital, InventoryItem, Pharmacy, Role, User, UserProfile};
use crate::services::catalogue::MedicineCatalogue;
use crate::services::doctor_profile;
use crate::services::ledger;
use crate::services::patient_record::{self, AssignMedicine, PatientRecordService};
use crate::services::user_profile::UserProfileService;
use crate::store::{Store, Tables};
use crate::TrackerResult;
use chrono::{Duration, Months, Utc};
use medtrack_types::eq_ignore_case;
use std::sync::Arc;

/// Password of every demo account.
pub const DEMO_PASSWORD: &str = "Pass@1234";
pub const DEMO_HOSPITAL: &str = "OMPT Demo Hospital";
pub const DEMO_PHARMACY_EMAIL: &str = "demo.pharmacy@ompt.test";

const CATALOGUE: &[(&str, &str, &str, &[&str])] = &[
    ("Metformin", "500mg", "Tablet", &["08:00", "20:00"]),
    ("Amlodipine", "5mg", "Tablet", &["09:00"]),
    ("Atorvastatin", "10mg", "Tablet", &["21:00"]),
    ("Omeprazole", "20mg", "Capsule", &["07:00"]),
    ("Amoxicillin", "500mg", "Capsule", &["08:00", "14:00", "20:00"]),
    ("Ibuprofen", "400mg", "Tablet", &["10:00", "22:00"]),
    ("Cetirizine", "10mg", "Tablet", &["21:00"]),
    ("Insulin Glargine", "100IU", "Injection", &["22:00"]),
    ("Salbutamol", "100mcg", "Inhaler", &["As needed"]),
    ("Losartan", "50mg", "Tablet", &["08:00"]),
    ("Aspirin", "75mg", "Tablet", &["13:00"]),
    ("Clopidogrel", "75mg", "Tablet", &["13:00"]),
    ("Levothyroxine", "50mcg", "Tablet", &["06:00"]),
    ("Azithromycin", "500mg", "Tablet", &["10:00"]),
    ("Pantoprazole", "40mg", "Tablet", &["07:00"]),
];

/// name, dosage, quantity, price, months to expiry
const STOCK: &[(&str, &str, u32, f64, u32)] = &[
    ("Metformin", "500mg", 180, 5.50, 18),
    ("Amlodipine", "5mg", 75, 4.75, 14),
    ("Insulin Glargine", "100IU", 20, 22.00, 10),
];

struct DemoPatient {
    email: &'static str,
    name: &'static str,
    gender: &'static str,
    age: u32,
    phone: &'static str,
    blood_group: &'static str,
    address: &'static str,
}

const PATIENTS: [DemoPatient; 2] = [
    DemoPatient {
        email: "demo.patient1@ompt.test",
        name: "Ananya Rao",
        gender: "Female",
        age: 34,
        phone: "9876543210",
        blood_group: "B+",
        address: "12 Lakeview Street",
    },
    DemoPatient {
        email: "demo.patient2@ompt.test",
        name: "Kiran Patel",
        gender: "Male",
        age: 41,
        phone: "9123456780",
        blood_group: "O+",
        address: "88 Hillcrest Avenue",
    },
];

const DOCTORS: [(&str, &str); 2] = [
    ("demo.doctor1@ompt.test", "Dr. Asha Menon"),
    ("demo.doctor2@ompt.test", "Dr. Ravi Iyer"),
];

/// Counts of what a seeding run created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub prescriptions: usize,
}

pub struct DemoSeeder {
    store: Arc<Store>,
    credentials: Arc<dyn CredentialService>,
}

impl DemoSeeder {
    pub fn new(store: Arc<Store>, credentials: Arc<dyn CredentialService>) -> Self {
        Self { store, credentials }
    }

    pub fn run(&self) -> TrackerResult<SeedReport> {
        self.seed_catalogue()?;
        self.seed_pharmacy()?;
        let report = self.seed_hospital()?;
        tracing::info!(prescriptions = report.prescriptions, "demo data seeded");
        Ok(report)
    }

    fn seed_catalogue(&self) -> TrackerResult<()> {
        let catalogue = MedicineCatalogue::new(self.store.clone());
        for (name, strength, medicine_type, schedule) in CATALOGUE {
            catalogue.add(name, strength, medicine_type, schedule)?;
        }
        Ok(())
    }

    fn seed_pharmacy(&self) -> TrackerResult<()> {
        let password_hash = self.credentials.hash(DEMO_PASSWORD);

        self.store.transaction(|t| {
            let mut pharmacy = t.pharmacy_by_email(DEMO_PHARMACY_EMAIL).cloned().unwrap_or(Pharmacy {
                id: 0,
                pharmacy_name: String::new(),
                location: String::new(),
                email: DEMO_PHARMACY_EMAIL.to_string(),
                password_hash: String::new(),
            });
            pharmacy.pharmacy_name = "OMPT Care Pharmacy".into();
            pharmacy.location = format!("2nd Floor, {DEMO_HOSPITAL}");
            pharmacy.password_hash = password_hash;
            let pharmacy = if pharmacy.id == 0 {
                t.pharmacies.insert(pharmacy)
            } else {
                t.pharmacies.save(pharmacy.clone());
                pharmacy
            };

            if !t.inventory.iter().any(|i| i.pharmacy_id == pharmacy.id) {
                let today = Utc::now().date_naive();
                for (name, dosage, quantity, price, months) in STOCK {
                    let mut item = InventoryItem {
                        id: 0,
                        pharmacy_id: pharmacy.id,
                        name: name.to_string(),
                        dosage: Some(dosage.to_string()),
                        quantity: 0,
                        price: Some(*price),
                        expiry: today.checked_add_months(Months::new(*months)),
                        low_stock: false,
                    };
                    item.set_quantity(*quantity);
                    t.inventory.insert(item);
                }
            }

            if !t.deliveries.iter().any(|d| d.pharmacy_id == pharmacy.id) {
                let now = Utc::now();
                ledger::record_delivery(
                    t,
                    pharmacy.id,
                    "Ananya Rao",
                    "Metformin 500mg",
                    "pending",
                    Some(now - Duration::days(1)),
                );
                ledger::record_delivery(
                    t,
                    pharmacy.id,
                    "Kiran Patel",
                    "Amlodipine 5mg",
                    "delivered",
                    Some(now - Duration::days(2)),
                );
            }
            Ok(())
        })
    }

    fn seed_hospital(&self) -> TrackerResult<SeedReport> {
        let password_hash = self.credentials.hash(DEMO_PASSWORD);

        let (doctors, patients) = self.store.transaction(|t| {
            let hospital_id = match t.hospital_by_name(DEMO_HOSPITAL) {
                Some(h) => h.id,
                None => {
                    t.hospitals
                        .insert(Hospital {
                            id: 0,
                            name: DEMO_HOSPITAL.to_string(),
                            active: true,
                            created_at: Utc::now(),
                        })
                        .id
                }
            };

            let mut upsert = |email: &str, name: &str, role: Role| {
                upsert_user(t, hospital_id, email, name, role, &password_hash)
            };
            upsert("demo.admin@ompt.test", "Demo Admin", Role::Admin);
            let doctors: Vec<User> = DOCTORS
                .iter()
                .map(|(email, name)| upsert(email, name, Role::Doctor))
                .collect();
            let patients: Vec<User> = PATIENTS
                .iter()
                .map(|p| upsert(p.email, p.name, Role::Patient))
                .collect();

            for doctor in &doctors {
                doctor_profile::materialise(t, doctor)?;
            }
            for (patient, doctor) in patients.iter().zip(&doctors) {
                patient_record::find_or_insert_record(t, patient, Some(doctor.id))?;
            }
            Ok((doctors, patients))
        })?;

        let profiles = UserProfileService::new(self.store.clone());
        for (patient, demo) in patients.iter().zip(&PATIENTS) {
            let missing = self
                .store
                .read(|t| t.user_profile_for(patient.id).is_none())?;
            if missing {
                profiles.save(
                    patient,
                    &UserProfile {
                        id: 0,
                        user_id: patient.id,
                        patient_name: demo.name.to_string(),
                        gender: demo.gender.to_string(),
                        age: demo.age,
                        phone_number: demo.phone.to_string(),
                        blood_group: demo.blood_group.to_string(),
                        address: demo.address.to_string(),
                    },
                )?;
            }
        }

        let records = PatientRecordService::new(self.store.clone());
        let mut report = SeedReport::default();
        for (patient, doctor) in patients.iter().zip(&doctors) {
            report.prescriptions += self.prescribe(&records, doctor, patient)?;
        }
        Ok(report)
    }

    /// Give a patient the demo prescriptions unless they already have medicines.
    fn prescribe(
        &self,
        records: &PatientRecordService,
        doctor: &User,
        patient: &User,
    ) -> TrackerResult<usize> {
        if !records.get_or_create(patient)?.into_inner().medicines.is_empty() {
            return Ok(0);
        }

        let plans = [
            ("Metformin", "500mg", "After meals", vec!["08:00", "20:00"]),
            ("Amlodipine", "5mg", "Once daily", vec!["09:00"]),
        ];

        let mut issued = 0;
        for (name, dosage, instructions, times) in plans {
            let Some(item_id) = self.store.read(|t| in_stock(t, name))? else {
                continue;
            };
            records.assign_medicine(
                doctor,
                patient.id,
                &AssignMedicine {
                    name: name.to_string(),
                    dosage: Some(dosage.to_string()),
                    medicine_type: Some("Tablet".to_string()),
                    instructions: Some(instructions.to_string()),
                    schedule_times: times.into_iter().map(str::to_string).collect(),
                    inventory_item_id: Some(item_id),
                },
            )?;
            issued += 1;
        }
        Ok(issued)
    }
}

fn in_stock(tables: &Tables, name: &str) -> Option<i64> {
    tables
        .inventory
        .find(|i| i.quantity > 0 && eq_ignore_case(&i.name, name))
        .map(|i| i.id)
}

fn upsert_user(
    tables: &mut Tables,
    hospital_id: i64,
    email: &str,
    name: &str,
    role: Role,
    password_hash: &str,
) -> User {
    let mut user = tables.user_by_email(email).cloned().unwrap_or(User {
        id: 0,
        role,
        name: String::new(),
        email: email.to_lowercase(),
        status: AccountStatus::Active,
        password_hash: None,
        reset_token_hash: None,
        reset_token_expiry: None,
        hospital_id,
    });
    user.name = name.to_string();
    user.role = role;
    user.status = AccountStatus::Active;
    user.hospital_id = hospital_id;
    user.password_hash = Some(password_hash.to_string());

    if user.id == 0 {
        tables.users.insert(user)
    } else {
        tables.users.save(user.clone());
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Sha256Credentials;

    fn seeder() -> (Arc<Store>, DemoSeeder) {
        let store = Arc::new(Store::new());
        let seeder = DemoSeeder::new(store.clone(), Arc::new(Sha256Credentials));
        (store, seeder)
    }

    #[test]
    fn test_seed_populates_demo_tenant() {
        let (store, seeder) = seeder();
        let report = seeder.run().unwrap();
        assert_eq!(report.prescriptions, 4);

        store
            .read(|t| {
                assert_eq!(t.medicines.len(), 15);
                assert_eq!(t.hospitals.len(), 1);
                assert_eq!(t.users.len(), 5);
                assert_eq!(t.doctor_profiles.len(), 2);
                assert_eq!(t.patient_records.len(), 2);
                assert_eq!(t.user_profiles.len(), 2);
                assert_eq!(t.deliveries.len(), 6);

                let metformin = t.inventory.find(|i| i.name == "Metformin").unwrap();
                assert_eq!(metformin.quantity, 178);
                let insulin = t.inventory.find(|i| i.name == "Insulin Glargine").unwrap();
                assert!(insulin.low_stock);
            })
            .unwrap();
    }

    #[test]
    fn test_seed_is_idempotent() {
        let (store, seeder) = seeder();
        seeder.run().unwrap();
        let again = seeder.run().unwrap();
        assert_eq!(again.prescriptions, 0);

        let (users, deliveries, inventory) = store
            .read(|t| (t.users.len(), t.deliveries.len(), t.inventory.len()))
            .unwrap();
        assert_eq!((users, deliveries, inventory), (5, 6, 3));
    }

    #[test]
    fn test_demo_accounts_use_demo_password() {
        let (store, seeder) = seeder();
        seeder.run().unwrap();
        let hash = store
            .read(|t| t.user_by_email("demo.doctor1@ompt.test").unwrap().password_hash.clone())
            .unwrap()
            .unwrap();
        assert!(Sha256Credentials.verify(DEMO_PASSWORD, &hash));
    }
}
