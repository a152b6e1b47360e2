//! Doctor profile document.

use crate::document::lenient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DoctorDocument {
    #[serde(deserialize_with = "lenient::opt_id")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_id")]
    pub hospital_id: Option<i64>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub hospital_name: Option<String>,
    #[serde(deserialize_with = "lenient::section")]
    pub personal: Personal,
    #[serde(deserialize_with = "lenient::section")]
    pub qualifications: Qualifications,
    #[serde(deserialize_with = "lenient::section")]
    pub employment: Employment,
    #[serde(deserialize_with = "lenient::section")]
    pub licensing: Licensing,
    #[serde(deserialize_with = "lenient::section")]
    pub schedule: DutySchedule,
    #[serde(deserialize_with = "lenient::section")]
    pub clinical: Clinical,
    #[serde(deserialize_with = "lenient::section")]
    pub performance: Performance,
    #[serde(deserialize_with = "lenient::section")]
    pub financial: Financial,
    #[serde(deserialize_with = "lenient::section")]
    pub digital: Digital,
    #[serde(deserialize_with = "lenient::section")]
    pub legal: Legal,
    #[serde(deserialize_with = "lenient::section")]
    pub research: Research,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Personal {
    #[serde(deserialize_with = "lenient::string")]
    pub full_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub employee_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub dob: String,
    #[serde(deserialize_with = "lenient::string")]
    pub gender: String,
    #[serde(deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(deserialize_with = "lenient::string")]
    pub emergency_contact: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Qualifications {
    #[serde(deserialize_with = "lenient::string")]
    pub degrees: String,
    #[serde(deserialize_with = "lenient::string")]
    pub specialization: String,
    #[serde(deserialize_with = "lenient::string")]
    pub university: String,
    #[serde(deserialize_with = "lenient::string")]
    pub year_of_graduation: String,
    #[serde(deserialize_with = "lenient::string")]
    pub registration_number: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Employment {
    #[serde(deserialize_with = "lenient::string")]
    pub department: String,
    #[serde(deserialize_with = "lenient::string")]
    pub designation: String,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub employment_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub date_of_joining: String,
    #[serde(deserialize_with = "lenient::string")]
    pub experience: String,
    #[serde(deserialize_with = "lenient::string")]
    pub reporting_manager: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Employment {
    fn default() -> Self {
        Self {
            department: String::new(),
            designation: String::new(),
            employment_type: "Full-time".to_string(),
            date_of_joining: String::new(),
            experience: String::new(),
            reporting_manager: String::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Licensing {
    #[serde(deserialize_with = "lenient::string")]
    pub license_number: String,
    #[serde(deserialize_with = "lenient::string")]
    pub valid_until: String,
    #[serde(deserialize_with = "lenient::string")]
    pub certifications: String,
    #[serde(deserialize_with = "lenient::string")]
    pub malpractice_insurance: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// OPD and duty roster section, stored under `schedule`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DutySchedule {
    #[serde(deserialize_with = "lenient::string")]
    pub opd_timings: String,
    #[serde(deserialize_with = "lenient::string")]
    pub duty_shifts: String,
    #[serde(deserialize_with = "lenient::string")]
    pub leave_records: String,
    #[serde(deserialize_with = "lenient::string")]
    pub on_call: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DutySchedule {
    fn default() -> Self {
        Self {
            opd_timings: String::new(),
            duty_shifts: String::new(),
            leave_records: "0".to_string(),
            on_call: "No".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Clinical {
    #[serde(deserialize_with = "lenient::string")]
    pub areas_of_expertise: String,
    #[serde(deserialize_with = "lenient::string")]
    pub procedures: String,
    #[serde(deserialize_with = "lenient::count")]
    pub surgeries_conducted: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub consultation_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Patient rating aggregate plus free-text review fields.
///
/// `rating` is always `rating_total / rating_count` rounded to one decimal place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Performance {
    #[serde(deserialize_with = "lenient::float")]
    pub rating: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub rating_count: u64,
    #[serde(deserialize_with = "lenient::float")]
    pub rating_total: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub peer_reviews: String,
    #[serde(deserialize_with = "lenient::string")]
    pub training_participation: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Performance {
    /// Fold one more rating into the running average.
    pub fn record(&mut self, rating: f64) {
        self.rating_total += rating;
        self.rating_count += 1;
        let average = self.rating_total / self.rating_count as f64;
        // Round half up at the tenths digit.
        self.rating = (average * 10.0 + 0.5).floor() / 10.0;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Financial {
    #[serde(deserialize_with = "lenient::string")]
    pub salary_structure: String,
    #[serde(deserialize_with = "lenient::string")]
    pub bank_account: String,
    #[serde(deserialize_with = "lenient::string")]
    pub tax_info: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Digital {
    #[serde(deserialize_with = "lenient::string")]
    pub system_login: String,
    #[serde(deserialize_with = "lenient::string")]
    pub access_level: String,
    #[serde(deserialize_with = "lenient::values")]
    pub audit_logs: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Digital {
    fn default() -> Self {
        Self {
            system_login: String::new(),
            access_level: "Doctor".to_string(),
            audit_logs: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Legal {
    #[serde(deserialize_with = "lenient::string")]
    pub contracts: String,
    #[serde(deserialize_with = "lenient::string")]
    pub nda_status: String,
    #[serde(deserialize_with = "lenient::string")]
    pub disciplinary_actions: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Legal {
    fn default() -> Self {
        Self {
            contracts: "Signed".to_string(),
            nda_status: "Active".to_string(),
            disciplinary_actions: "None".to_string(),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Research {
    #[serde(deserialize_with = "lenient::string")]
    pub publications: String,
    #[serde(deserialize_with = "lenient::string")]
    pub clinical_trials: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DoctorDocument {
    /// Canonical empty profile with identity fields pre-filled.
    pub fn template(id: Option<i64>, full_name: &str, email: &str) -> Self {
        Self {
            id,
            personal: Personal {
                full_name: full_name.to_string(),
                email: email.to_string(),
                ..Personal::default()
            },
            ..Self::default()
        }
    }

    /// Replace the hospital context with a freshly resolved one.
    pub fn set_hospital(&mut self, hospital: Option<(i64, &str)>) {
        match hospital {
            Some((id, name)) => {
                self.hospital_id = Some(id);
                self.hospital_name = Some(name.to_string());
            }
            None => {
                self.hospital_id = None;
                self.hospital_name = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use serde_json::json;

    #[test]
    fn test_template_sections() {
        let doc = DoctorDocument::template(None, "", "");
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["hospitalId"], Value::Null);
        assert_eq!(value["hospitalName"], Value::Null);
        assert_eq!(value["employment"]["type"], "Full-time");
        assert_eq!(value["schedule"]["leaveRecords"], "0");
        assert_eq!(value["schedule"]["onCall"], "No");
        assert_eq!(value["digital"]["accessLevel"], "Doctor");
        assert_eq!(value["digital"]["auditLogs"], json!([]));
        assert_eq!(value["legal"]["ndaStatus"], "Active");
        assert_eq!(value["performance"]["ratingCount"], 0);

        for key in [
            "personal",
            "qualifications",
            "employment",
            "licensing",
            "schedule",
            "clinical",
            "performance",
            "financial",
            "digital",
            "legal",
            "research",
        ] {
            assert!(value[key].is_object(), "missing section {key}");
        }
    }

    #[test]
    fn test_rating_running_average() {
        let mut perf = Performance::default();
        perf.record(4.0);
        perf.record(5.0);
        assert_eq!(perf.rating_count, 2);
        assert_eq!(perf.rating_total, 9.0);
        assert_eq!(perf.rating, 4.5);

        perf.record(5.0);
        assert_eq!(perf.rating_count, 3);
        assert_eq!(perf.rating_total, 14.0);
        assert_eq!(perf.rating, 4.7);
    }

    #[test]
    fn test_rating_reads_string_counters() {
        let doc: DoctorDocument = document::from_value(json!({
            "performance": {"ratingTotal": "8", "ratingCount": "2", "rating": "4"}
        }));
        let mut perf = doc.performance;
        perf.record(1.0);
        assert_eq!(perf.rating_count, 3);
        assert_eq!(perf.rating, 3.0);
    }

    #[test]
    fn test_non_object_section_falls_back_to_template() {
        let doc: DoctorDocument = document::from_value(json!({
            "legal": "n/a",
            "personal": {"fullName": "Dr. Asha Menon"}
        }));
        assert_eq!(doc.legal, Legal::default());
        assert_eq!(doc.personal.full_name, "Dr. Asha Menon");
    }
}
