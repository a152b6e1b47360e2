//! Patient record document.
//!
//! The JSON shape is fixed by the template below. Every section is typed and defaults to its
//! template value, and keys the template does not declare are carried through in `extra` so a
//! client's additions survive a replace.

use crate::constants::{
    NEW_PATIENT_DIAGNOSIS, NOT_AVAILABLE, STATUS_DELIVERED, STATUS_MISSED, STATUS_PENDING,
};
use crate::document::lenient;
use medtrack_types::eq_ignore_case;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientDocument {
    #[serde(deserialize_with = "lenient::opt_id")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    /// Stored as supplied; clients send either a number or a string.
    pub age: Value,
    #[serde(deserialize_with = "lenient::string")]
    pub gender: String,
    #[serde(deserialize_with = "lenient::string")]
    pub blood_group: String,
    #[serde(deserialize_with = "lenient::section")]
    pub contact: Contact,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub doctor_assigned_id: Option<i64>,
    #[serde(deserialize_with = "lenient::section")]
    pub history: History,
    #[serde(deserialize_with = "lenient::seq")]
    pub medicines: Vec<MedicineEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PatientDocument {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            age: Value::from(0),
            gender: NOT_AVAILABLE.to_string(),
            blood_group: NOT_AVAILABLE.to_string(),
            contact: Contact::default(),
            doctor_assigned_id: None,
            history: History::default(),
            medicines: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct History {
    #[serde(deserialize_with = "lenient::string")]
    pub diagnosis: String,
    #[serde(deserialize_with = "lenient::values")]
    pub allergies: Vec<Value>,
    #[serde(deserialize_with = "lenient::values")]
    pub surgeries: Vec<Value>,
    #[serde(deserialize_with = "lenient::section")]
    pub vitals: Vitals,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            diagnosis: NEW_PATIENT_DIAGNOSIS.to_string(),
            allergies: Vec::new(),
            surgeries: Vec::new(),
            vitals: Vitals::default(),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vitals {
    #[serde(deserialize_with = "lenient::string")]
    pub bp: String,
    #[serde(deserialize_with = "lenient::string")]
    pub heart_rate: String,
    #[serde(deserialize_with = "lenient::string")]
    pub weight: String,
    #[serde(deserialize_with = "lenient::string")]
    pub height: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One prescribed medicine inside a patient record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MedicineEntry {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub dosage: String,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub medicine_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub instructions: String,
    #[serde(deserialize_with = "lenient::string")]
    pub delivery_status: String,
    #[serde(
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivered_at: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub prescribed_at: String,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub pharmacy_id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub pharmacy_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub pharmacy_location: String,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub inventory_item_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub delivery_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_float")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient::seq")]
    pub schedule: Vec<ScheduleSlot>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One scheduled dose time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleSlot {
    #[serde(deserialize_with = "lenient::string")]
    pub time: String,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub taken_at: Option<String>,
    #[serde(
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScheduleSlot {
    pub fn pending(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            status: STATUS_PENDING.to_string(),
            ..Self::default()
        }
    }
}

/// A dose status change for one schedule slot.
#[derive(Clone, Debug)]
pub struct DoseMark<'a> {
    pub medicine_id: &'a str,
    pub time: &'a str,
    pub status: &'a str,
    pub reason: Option<&'a str>,
}

impl PatientDocument {
    /// Canonical record for a patient that has never been edited.
    pub fn template(
        patient_id: i64,
        name: &str,
        email: &str,
        assigned_doctor_id: Option<i64>,
    ) -> Self {
        Self {
            id: Some(patient_id),
            name: name.to_string(),
            contact: Contact {
                email: email.to_string(),
                ..Contact::default()
            },
            doctor_assigned_id: assigned_doctor_id,
            ..Self::default()
        }
    }

    /// Apply a dose status to every slot matching the medicine id and time.
    ///
    /// Returns how many slots changed. `taken_at` is stamped unless the status is "missed",
    /// in which case it is cleared.
    pub fn mark_dose(&mut self, mark: &DoseMark<'_>, taken_at: &str) -> usize {
        let missed = eq_ignore_case(mark.status, STATUS_MISSED);
        let mut updated = 0;

        for entry in self.medicines.iter_mut().filter(|m| m.id == mark.medicine_id) {
            for slot in entry.schedule.iter_mut().filter(|s| s.time == mark.time) {
                slot.status = mark.status.to_string();
                if let Some(reason) = mark.reason {
                    slot.reason = Some(reason.to_string());
                }
                slot.taken_at = (!missed).then(|| taken_at.to_string());
                updated += 1;
            }
        }

        updated
    }

    /// Set the delivery status of every entry with `medicine_id`.
    ///
    /// Returns the linked delivery ids of the entries that changed, one per entry.
    pub fn set_delivery_status(
        &mut self,
        medicine_id: &str,
        status: &str,
        delivered_at: &str,
    ) -> Vec<Option<i64>> {
        let delivered = eq_ignore_case(status, STATUS_DELIVERED);

        self.medicines
            .iter_mut()
            .filter(|m| m.id == medicine_id)
            .map(|entry| {
                entry.delivery_status = status.to_string();
                if delivered {
                    entry.delivered_at = Some(delivered_at.to_string());
                }
                entry.delivery_id
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use serde_json::json;

    fn entry_with_slots(id: &str, times: &[&str]) -> MedicineEntry {
        MedicineEntry {
            id: id.to_string(),
            name: "Metformin 500mg".into(),
            delivery_status: STATUS_PENDING.into(),
            delivery_id: Some(7),
            schedule: times.iter().map(|t| ScheduleSlot::pending(*t)).collect(),
            ..MedicineEntry::default()
        }
    }

    #[test]
    fn test_template_has_every_declared_key() {
        let doc = PatientDocument::template(3, "Kiran Patel", "kiran@example.org", None);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(
            value,
            json!({
                "id": 3,
                "name": "Kiran Patel",
                "age": 0,
                "gender": "N/A",
                "bloodGroup": "N/A",
                "contact": {"phone": "", "email": "kiran@example.org", "address": ""},
                "doctorAssignedId": null,
                "history": {
                    "diagnosis": "New Patient",
                    "allergies": [],
                    "surgeries": [],
                    "vitals": {"bp": "", "heartRate": "", "weight": "", "height": ""}
                },
                "medicines": []
            })
        );
    }

    #[test]
    fn test_decode_empty_object_fills_sections() {
        let doc: PatientDocument = document::decode("{}");
        assert_eq!(doc.history.diagnosis, "New Patient");
        assert_eq!(doc.gender, "N/A");
        assert!(doc.medicines.is_empty());
    }

    #[test]
    fn test_unknown_keys_survive() {
        let doc: PatientDocument = document::from_value(json!({
            "name": "A",
            "insurance": {"provider": "Acme"},
            "contact": {"phone": "1", "whatsapp": true}
        }));

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["insurance"]["provider"], "Acme");
        assert_eq!(value["contact"]["whatsapp"], true);
        assert_eq!(value["contact"]["email"], "");
    }

    #[test]
    fn test_mark_dose_stamps_and_clears() {
        let mut doc = PatientDocument::default();
        doc.medicines.push(entry_with_slots("m1", &["08:00", "20:00"]));

        let taken = DoseMark {
            medicine_id: "m1",
            time: "08:00",
            status: "taken",
            reason: None,
        };
        assert_eq!(doc.mark_dose(&taken, "08:05"), 1);
        assert_eq!(doc.medicines[0].schedule[0].taken_at.as_deref(), Some("08:05"));

        let missed = DoseMark {
            status: "MISSED",
            reason: Some("asleep"),
            ..taken
        };
        assert_eq!(doc.mark_dose(&missed, "09:00"), 1);
        let slot = &doc.medicines[0].schedule[0];
        assert_eq!(slot.taken_at, None);
        assert_eq!(slot.reason.as_deref(), Some("asleep"));
        assert_eq!(doc.medicines[0].schedule[1].status, "pending");
    }

    #[test]
    fn test_mark_dose_reports_no_match() {
        let mut doc = PatientDocument::default();
        doc.medicines.push(entry_with_slots("m1", &["08:00"]));
        let before = doc.clone();

        let mark = DoseMark {
            medicine_id: "m1",
            time: "13:00",
            status: "taken",
            reason: None,
        };
        assert_eq!(doc.mark_dose(&mark, "13:01"), 0);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_mark_dose_updates_duplicate_times() {
        let mut doc = PatientDocument::default();
        doc.medicines.push(entry_with_slots("m1", &["08:00", "08:00"]));

        let mark = DoseMark {
            medicine_id: "m1",
            time: "08:00",
            status: "taken",
            reason: None,
        };
        assert_eq!(doc.mark_dose(&mark, "08:01"), 2);
    }

    #[test]
    fn test_set_delivery_status_returns_links() {
        let mut doc = PatientDocument::default();
        doc.medicines.push(entry_with_slots("m1", &["08:00"]));

        let links = doc.set_delivery_status("m1", "Delivered", "2026-01-01T10:00:00Z");
        assert_eq!(links, vec![Some(7)]);
        assert_eq!(
            doc.medicines[0].delivered_at.as_deref(),
            Some("2026-01-01T10:00:00Z")
        );

        assert!(doc.set_delivery_status("nope", "delivered", "x").is_empty());
    }

    #[test]
    fn test_taken_at_is_always_serialized() {
        let slot = ScheduleSlot::pending("09:00");
        let value = serde_json::to_value(&slot).unwrap();
        assert_eq!(value, json!({"time": "09:00", "status": "pending", "takenAt": null}));
    }
}
