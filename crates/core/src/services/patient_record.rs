//! Patient record engine.
//!
//! Each patient owns one [`PatientDocument`]. The row also carries the assigned doctor id so
//! doctors can list their patients without opening every document; the two copies are written
//! together. Assigning a medicine spans the record, the pharmacy's inventory and its delivery
//! ledger, and commits all three or none.

use super::{current_user, doctor_profile, non_blank, required, DocumentUpdate, Materialised};
use crate::constants::{
    DEFAULT_INSTRUCTIONS, DEFAULT_MEDICINE_TYPE, MAX_RATING, MIN_RATING, NOT_AVAILABLE,
    STATUS_PENDING,
};
use crate::document;
use crate::model::{PatientRecordRow, Role, User};
use crate::records::{DoctorDocument, DoseMark, MedicineEntry, PatientDocument, ScheduleSlot};
use crate::services::ledger;
use crate::store::{Store, Tables};
use crate::{TrackerError, TrackerResult};
use chrono::{Local, SecondsFormat, Utc};
use medtrack_types::eq_ignore_case;
use medtrack_uuid::UuidService;
use serde_json::Value;
use std::sync::Arc;

/// A doctor's prescription for one patient.
#[derive(Clone, Debug, Default)]
pub struct AssignMedicine {
    pub name: String,
    pub dosage: Option<String>,
    pub medicine_type: Option<String>,
    pub instructions: Option<String>,
    pub schedule_times: Vec<String>,
    pub inventory_item_id: Option<i64>,
}

/// A patient marking one scheduled dose.
#[derive(Clone, Debug, Default)]
pub struct MedicineStatusUpdate {
    pub medicine_id: String,
    pub time: String,
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DoctorRating {
    pub doctor_id: Option<i64>,
    pub rating: f64,
}

pub struct PatientRecordService {
    store: Arc<Store>,
}

impl PatientRecordService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Create a patient's record from the template.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Conflict`] if the patient already has a record.
    pub fn create(
        &self,
        patient: &User,
        assigned_doctor: Option<&User>,
    ) -> TrackerResult<PatientDocument> {
        self.store.transaction(|t| {
            if t.patient_record_for(patient.id).is_some() {
                return Err(TrackerError::conflict("Patient record already exists"));
            }
            find_or_insert_record(t, patient, assigned_doctor.map(|d| d.id))
                .map(Materialised::into_inner)
        })
    }

    pub fn get_or_create(&self, patient: &User) -> TrackerResult<Materialised<PatientDocument>> {
        self.store
            .transaction(|t| find_or_insert_record(t, patient, None))
    }

    /// Records of every patient whose account belongs to `hospital_id`.
    pub fn list_by_hospital(&self, hospital_id: i64) -> TrackerResult<Vec<PatientDocument>> {
        self.store.read(|t| {
            t.patient_records
                .filter(|row| {
                    t.users
                        .get(row.user_id)
                        .is_some_and(|u| u.hospital_id == hospital_id)
                })
                .map(|row| document::decode(&row.data_json))
                .collect()
        })
    }

    /// Records of every patient assigned to `doctor`.
    pub fn list_by_doctor(&self, doctor: &User) -> TrackerResult<Vec<PatientDocument>> {
        self.store.read(|t| {
            t.patient_records
                .filter(|row| row.assigned_doctor_id == Some(doctor.id))
                .map(|row| document::decode(&row.data_json))
                .collect()
        })
    }

    /// Replace a patient's record with a client-edited copy.
    ///
    /// The identity fields are not the client's to change: `id`, `contact.email` and
    /// `doctorAssignedId` are taken from the account and the row, whatever the payload says.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::BadRequest`] if the payload is not a JSON object.
    /// - [`TrackerError::NotFound`] if the patient has no record yet.
    pub fn replace(&self, patient: &User, payload: Value) -> TrackerResult<PatientDocument> {
        if !payload.is_object() {
            return Err(TrackerError::bad_request("Record must be a JSON object"));
        }

        self.store.transaction(|t| {
            let patient = current_user(t, patient)?;
            let row = t
                .patient_record_for(patient.id)
                .cloned()
                .ok_or_else(|| TrackerError::not_found("Patient record not found"))?;

            let mut doc: PatientDocument = document::from_value(payload);
            doc.id = Some(patient.id);
            doc.contact.email = patient.email.clone();
            doc.doctor_assigned_id = row.assigned_doctor_id;

            save_document(t, row, &doc)?;
            Ok(doc)
        })
    }

    /// Prescribe a medicine from a pharmacy's stock.
    ///
    /// Takes one unit of the chosen inventory item, opens a pending delivery, appends the
    /// entry to the patient's record and makes `doctor` the patient's assigned doctor.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::Forbidden`] unless `doctor` is a doctor.
    /// - [`TrackerError::BadRequest`] if no pharmacy item was chosen, the name is blank, the
    ///   schedule is empty, the item is out of stock or is a different medicine.
    /// - [`TrackerError::NotFound`] if the patient or the item does not exist.
    pub fn assign_medicine(
        &self,
        doctor: &User,
        patient_id: i64,
        request: &AssignMedicine,
    ) -> TrackerResult<PatientDocument> {
        if !doctor.is(Role::Doctor) {
            return Err(TrackerError::forbidden("Only doctor can assign medicines"));
        }
        let item_id = request
            .inventory_item_id
            .ok_or_else(|| TrackerError::bad_request("Pharmacy selection is required"))?;
        let name = required("Medicine name", &request.name)?;
        let times: Vec<&str> = request
            .schedule_times
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if times.is_empty() {
            return Err(TrackerError::bad_request("Schedule times are required"));
        }

        let document = self.store.transaction(|t| {
            let patient = t
                .users
                .get(patient_id)
                .filter(|u| u.is(Role::Patient))
                .cloned()
                .ok_or_else(|| TrackerError::not_found("Patient not found"))?;

            let row_doc = find_or_insert_record(t, &patient, Some(doctor.id))?.into_inner();

            let item = t
                .inventory
                .get(item_id)
                .cloned()
                .ok_or_else(|| TrackerError::not_found("Selected pharmacy item not found"))?;
            if item.quantity == 0 {
                return Err(TrackerError::bad_request("Selected pharmacy is out of stock"));
            }
            if !eq_ignore_case(&item.name, name.as_str()) {
                return Err(TrackerError::bad_request(
                    "Selected pharmacy does not carry this medicine",
                ));
            }

            let item = ledger::take_one(t, item_id)?;
            let (pharmacy_name, pharmacy_location) = t
                .pharmacies
                .get(item.pharmacy_id)
                .map(|p| (p.pharmacy_name.clone(), p.location.clone()))
                .unwrap_or_else(|| (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()));

            let prescribed_at = Utc::now();
            let delivery = ledger::record_delivery(
                t,
                item.pharmacy_id,
                &patient.name,
                name.as_str(),
                STATUS_PENDING,
                Some(prescribed_at),
            );

            let dosage = non_blank(request.dosage.as_deref())
                .or_else(|| non_blank(item.dosage.as_deref()))
                .unwrap_or_default();

            let entry = MedicineEntry {
                id: UuidService::new().to_string(),
                name: name.as_str().to_string(),
                dosage: dosage.to_string(),
                medicine_type: non_blank(request.medicine_type.as_deref())
                    .unwrap_or(DEFAULT_MEDICINE_TYPE)
                    .to_string(),
                instructions: non_blank(request.instructions.as_deref())
                    .unwrap_or(DEFAULT_INSTRUCTIONS)
                    .to_string(),
                delivery_status: STATUS_PENDING.to_string(),
                delivered_at: None,
                prescribed_at: prescribed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                pharmacy_id: Some(item.pharmacy_id),
                pharmacy_name,
                pharmacy_location,
                inventory_item_id: Some(item.id),
                delivery_id: Some(delivery.id),
                price: item.price,
                schedule: times.iter().map(|time| ScheduleSlot::pending(*time)).collect(),
                ..MedicineEntry::default()
            };

            let mut doc = row_doc;
            doc.medicines.push(entry);
            doc.doctor_assigned_id = Some(doctor.id);

            let mut row = t
                .patient_record_for(patient.id)
                .cloned()
                .ok_or_else(|| TrackerError::not_found("Patient record not found"))?;
            row.assigned_doctor_id = Some(doctor.id);
            save_document(t, row, &doc)?;
            Ok(doc)
        })?;

        tracing::info!(
            patient_id,
            doctor_id = doctor.id,
            inventory_item_id = item_id,
            "medicine assigned"
        );
        Ok(document)
    }

    /// Mark a scheduled dose as taken, missed or anything else the client sends.
    ///
    /// Nothing is written when no slot matches; the caller sees `updated == 0`.
    pub fn update_medicine_status(
        &self,
        patient: &User,
        update: &MedicineStatusUpdate,
    ) -> TrackerResult<DocumentUpdate<PatientDocument>> {
        let medicine_id = required("Medicine id", &update.medicine_id)?;
        let time = required("Time", &update.time)?;
        let status = required("Status", &update.status)?;

        let mark = DoseMark {
            medicine_id: medicine_id.as_str(),
            time: time.as_str(),
            status: status.as_str(),
            reason: update.reason.as_deref(),
        };
        let taken_at = Local::now().format("%H:%M").to_string();

        self.store.transaction(|t| {
            let (row, mut doc) = load_record(t, patient)?;
            let updated = doc.mark_dose(&mark, &taken_at);
            if updated > 0 {
                save_document(t, row, &doc)?;
            }
            Ok(DocumentUpdate {
                document: doc,
                updated,
            })
        })
    }

    /// Set the delivery status of a medicine entry and of the ledger delivery it points to.
    pub fn update_delivery_status(
        &self,
        patient: &User,
        medicine_id: &str,
        status: &str,
    ) -> TrackerResult<DocumentUpdate<PatientDocument>> {
        let medicine_id = required("Medicine id", medicine_id)?;
        let status = required("Delivery status", status)?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        self.store.transaction(|t| {
            let (row, mut doc) = load_record(t, patient)?;
            let deliveries = doc.set_delivery_status(medicine_id.as_str(), status.as_str(), &now);
            let updated = deliveries.len();

            if updated > 0 {
                for delivery_id in deliveries.into_iter().flatten() {
                    if let Some(delivery) = t.deliveries.get_mut(delivery_id) {
                        delivery.status = status.as_str().to_string();
                    }
                }
                save_document(t, row, &doc)?;
            }
            Ok(DocumentUpdate {
                document: doc,
                updated,
            })
        })
    }

    /// Rate the patient's assigned doctor.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::BadRequest`] if the rating is outside 1 to 5, the patient has no
    ///   assigned doctor, or `doctor_id` names someone else.
    /// - [`TrackerError::NotFound`] if the patient has no record.
    pub fn rate_doctor(
        &self,
        patient: &User,
        rating: &DoctorRating,
    ) -> TrackerResult<DoctorDocument> {
        if !rating.rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating.rating) {
            return Err(TrackerError::bad_request(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        self.store.transaction(|t| {
            let row = t
                .patient_record_for(patient.id)
                .cloned()
                .ok_or_else(|| TrackerError::not_found("Patient record not found"))?;
            let assigned = row
                .assigned_doctor_id
                .ok_or_else(|| TrackerError::bad_request("No doctor assigned"))?;
            if rating.doctor_id.is_some_and(|id| id != assigned) {
                return Err(TrackerError::bad_request(
                    "You can only rate your assigned doctor",
                ));
            }

            let doctor = t
                .users
                .get(assigned)
                .filter(|u| u.is(Role::Doctor))
                .cloned()
                .ok_or_else(|| TrackerError::bad_request("Assigned doctor not found"))?;

            let mut profile = doctor_profile::materialise(t, &doctor)?.into_inner();
            profile.performance.record(rating.rating);
            doctor_profile::store_profile(t, doctor.id, &profile)?;

            tracing::info!(
                doctor_id = doctor.id,
                rating = profile.performance.rating,
                count = profile.performance.rating_count,
                "doctor rated"
            );
            Ok(profile)
        })
    }
}

fn load_record(tables: &Tables, patient: &User) -> TrackerResult<(PatientRecordRow, PatientDocument)> {
    let row = tables
        .patient_record_for(patient.id)
        .cloned()
        .ok_or_else(|| TrackerError::not_found("Patient record not found"))?;
    let doc = document::decode(&row.data_json);
    Ok((row, doc))
}

/// Load a patient's record, inserting the template if there is none.
///
/// `assigned_doctor_id` only applies to a newly inserted record.
pub(crate) fn find_or_insert_record(
    tables: &mut Tables,
    patient: &User,
    assigned_doctor_id: Option<i64>,
) -> TrackerResult<Materialised<PatientDocument>> {
    if let Some(row) = tables.patient_record_for(patient.id) {
        return Ok(Materialised::Found(document::decode(&row.data_json)));
    }

    let doc = PatientDocument::template(patient.id, &patient.name, &patient.email, assigned_doctor_id);
    tables.patient_records.insert(PatientRecordRow {
        id: 0,
        user_id: patient.id,
        assigned_doctor_id,
        data_json: document::encode(&doc)?,
        updated_at: Utc::now(),
    });
    tracing::debug!(patient_id = patient.id, "patient record created");
    Ok(Materialised::Created(doc))
}

/// Write `doc` into `row`, keeping the row's assigned doctor as it is.
pub(crate) fn save_document(
    tables: &mut Tables,
    mut row: PatientRecordRow,
    doc: &PatientDocument,
) -> TrackerResult<()> {
    row.data_json = document::encode(doc)?;
    row.updated_at = Utc::now();
    tables.patient_records.save(row);
    Ok(())
}
