//! Wire types for the REST API.
//!
//! Request bodies default every missing field so that validation happens in one place, the core
//! services, and a missing field reads the same as a blank one.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use medtrack_core::model::{Delivery, Hospital, InventoryItem, MedicineMaster, UserProfile};
use medtrack_core::services::accounts::{AccountSummary, Registration};
use medtrack_core::services::directory::{HospitalRegistration, HospitalSummary};
use medtrack_core::services::patient_record::{AssignMedicine, DoctorRating, MedicineStatusUpdate};
use medtrack_core::services::pharmacy::{
    DeliveryInput, InventoryInput, PharmacyAvailability, PharmacyProfile, PharmacyProfileUpdate,
    PharmacyRegistration,
};
use medtrack_core::DoctorDocument;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

// Hospitals and accounts

#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct HospitalRegisterReq {
    pub hospital_name: String,
    pub admin_name: String,
    pub email: String,
    pub password: String,
}

impl From<HospitalRegisterReq> for HospitalRegistration {
    fn from(req: HospitalRegisterReq) -> Self {
        Self {
            hospital_name: req.hospital_name,
            admin_name: req.admin_name,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HospitalRes {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

impl From<Hospital> for HospitalRes {
    fn from(h: Hospital) -> Self {
        Self {
            id: h.id,
            name: h.name,
            active: h.active,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HospitalSummaryRes {
    pub id: i64,
    pub name: String,
}

impl From<HospitalSummary> for HospitalSummaryRes {
    fn from(h: HospitalSummary) -> Self {
        Self {
            id: h.id,
            name: h.name,
        }
    }
}

/// Patient self-registration, and doctor self-registration (which ignores the assigned doctor).
#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterReq {
    pub name: String,
    pub email: String,
    pub password: String,
    pub hospital_id: i64,
    pub doctor_assigned_id: Option<i64>,
}

impl From<RegisterReq> for Registration {
    fn from(req: RegisterReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            hospital_id: req.hospital_id,
            doctor_assigned_id: req.doctor_assigned_id,
        }
    }
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginRes {
    pub token: String,
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ForgotPasswordReq {
    pub email: String,
}

/// Redeems an emailed one-time token, for both password reset and doctor activation.
#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenPasswordReq {
    pub token: String,
    pub new_password: String,
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyResetCodeReq {
    pub email: String,
    pub code: String,
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordCodeReq {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserMeRes {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub hospital_id: i64,
    pub hospital_name: Option<String>,
}

impl From<AccountSummary> for UserMeRes {
    fn from(a: AccountSummary) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            role: a.role.to_string(),
            hospital_id: a.hospital_id,
            hospital_name: a.hospital_name,
        }
    }
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfileReq {
    pub patient_name: String,
    pub gender: String,
    pub age: u32,
    pub phone_number: String,
    pub blood_group: String,
    pub address: String,
}

impl From<UserProfileReq> for UserProfile {
    fn from(req: UserProfileReq) -> Self {
        Self {
            id: 0,
            user_id: 0,
            patient_name: req.patient_name,
            gender: req.gender,
            age: req.age,
            phone_number: req.phone_number,
            blood_group: req.blood_group,
            address: req.address,
        }
    }
}

// Patient records

#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AssignMedicineReq {
    pub name: String,
    pub dosage: Option<String>,
    #[serde(rename = "type")]
    pub medicine_type: Option<String>,
    pub instructions: Option<String>,
    pub inventory_item_id: Option<i64>,
    pub schedule_times: Vec<String>,
}

impl From<AssignMedicineReq> for AssignMedicine {
    fn from(req: AssignMedicineReq) -> Self {
        Self {
            name: req.name,
            dosage: req.dosage,
            medicine_type: req.medicine_type,
            instructions: req.instructions,
            schedule_times: req.schedule_times,
            inventory_item_id: req.inventory_item_id,
        }
    }
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct MedicineStatusReq {
    pub medicine_id: String,
    pub time: String,
    pub status: String,
    pub reason: Option<String>,
}

impl From<MedicineStatusReq> for MedicineStatusUpdate {
    fn from(req: MedicineStatusReq) -> Self {
        Self {
            medicine_id: req.medicine_id,
            time: req.time,
            status: req.status,
            reason: req.reason,
        }
    }
}

/// New status for a medicine delivery or a pharmacy delivery.
#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct StatusReq {
    pub status: String,
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DoctorRatingReq {
    pub doctor_id: Option<i64>,
    pub rating: f64,
}

impl From<DoctorRatingReq> for DoctorRating {
    fn from(req: DoctorRatingReq) -> Self {
        Self {
            doctor_id: req.doctor_id,
            rating: req.rating,
        }
    }
}

// Doctors

#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DoctorRegisterReq {
    pub name: String,
    pub email: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorRes {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub hospital_name: Option<String>,
    pub active: bool,
}

impl DoctorRes {
    /// Summary of a freshly onboarded doctor, who stays inactive until activation.
    pub fn onboarded(doc: DoctorDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.personal.full_name,
            email: doc.personal.email,
            hospital_name: doc.hospital_name,
            active: false,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRes {
    pub id: i64,
    pub name: String,
    pub strength: String,
    #[serde(rename = "type")]
    pub medicine_type: String,
    pub default_schedule: Vec<String>,
}

impl From<MedicineMaster> for MedicineRes {
    fn from(m: MedicineMaster) -> Self {
        Self {
            id: m.id,
            name: m.name,
            strength: m.strength,
            medicine_type: m.medicine_type,
            default_schedule: m.default_schedule,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// Medicine name, matched ignoring case.
    pub medicine_name: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRes {
    pub inventory_item_id: i64,
    pub medicine_name: String,
    pub dosage: Option<String>,
    pub quantity: u32,
    pub price: Option<f64>,
    pub pharmacy_id: i64,
    pub pharmacy_name: String,
    pub pharmacy_location: String,
}

impl From<PharmacyAvailability> for AvailabilityRes {
    fn from(a: PharmacyAvailability) -> Self {
        Self {
            inventory_item_id: a.inventory_item_id,
            medicine_name: a.medicine_name,
            dosage: a.dosage,
            quantity: a.quantity,
            price: a.price,
            pharmacy_id: a.pharmacy_id,
            pharmacy_name: a.pharmacy_name,
            pharmacy_location: a.pharmacy_location,
        }
    }
}

// Pharmacies

#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PharmacyRegisterReq {
    pub pharmacy_name: String,
    pub location: String,
    pub email: String,
    pub password: String,
}

impl From<PharmacyRegisterReq> for PharmacyRegistration {
    fn from(req: PharmacyRegisterReq) -> Self {
        Self {
            pharmacy_name: req.pharmacy_name,
            location: req.location,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PharmacyProfileUpdateReq {
    pub pharmacy_name: String,
    pub location: String,
    pub email: String,
}

impl From<PharmacyProfileUpdateReq> for PharmacyProfileUpdate {
    fn from(req: PharmacyProfileUpdateReq) -> Self {
        Self {
            pharmacy_name: req.pharmacy_name,
            location: req.location,
            email: req.email,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyProfileRes {
    pub id: i64,
    pub pharmacy_name: String,
    pub location: String,
    pub email: String,
}

impl From<PharmacyProfile> for PharmacyProfileRes {
    fn from(p: PharmacyProfile) -> Self {
        Self {
            id: p.id,
            pharmacy_name: p.pharmacy_name,
            location: p.location,
            email: p.email,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PharmacyAuthRes {
    pub token: String,
    pub pharmacy: PharmacyProfileRes,
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct InventoryItemReq {
    pub name: String,
    pub dosage: Option<String>,
    pub quantity: i64,
    pub price: Option<f64>,
    pub expiry: Option<NaiveDate>,
}

impl From<InventoryItemReq> for InventoryInput {
    fn from(req: InventoryItemReq) -> Self {
        Self {
            name: req.name,
            dosage: req.dosage,
            quantity: req.quantity,
            price: req.price,
            expiry: req.expiry,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemRes {
    pub id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub quantity: u32,
    pub price: Option<f64>,
    pub expiry: Option<NaiveDate>,
    pub low_stock: bool,
}

impl From<InventoryItem> for InventoryItemRes {
    fn from(i: InventoryItem) -> Self {
        Self {
            id: i.id,
            name: i.name,
            dosage: i.dosage,
            quantity: i.quantity,
            price: i.price,
            expiry: i.expiry,
            low_stock: i.low_stock,
        }
    }
}

/// A hand-entered delivery. `date` is a local timestamp without offset and is read as UTC.
#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DeliveryReq {
    pub patient: String,
    pub medicine: String,
    pub status: Option<String>,
    pub date: Option<NaiveDateTime>,
}

impl From<DeliveryReq> for DeliveryInput {
    fn from(req: DeliveryReq) -> Self {
        Self {
            patient: req.patient,
            medicine: req.medicine,
            status: req.status,
            date: req.date.map(|d| d.and_utc()),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DeliveryRes {
    pub id: i64,
    pub patient: String,
    pub medicine: String,
    pub status: String,
    pub date: DateTime<Utc>,
}

impl From<Delivery> for DeliveryRes {
    fn from(d: Delivery) -> Self {
        Self {
            id: d.id,
            patient: d.patient_name,
            medicine: d.medicine_name,
            status: d.status,
            date: d.prescribed_at,
        }
    }
}
