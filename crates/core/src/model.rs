//! Relational rows held by the record store.

use crate::constants::LOW_STOCK_THRESHOLD;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Patient => "PATIENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    Pending,
    Active,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub role: Role,
    pub name: String,
    /// Always stored lowercase.
    pub email: String,
    pub status: AccountStatus,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<DateTime<Utc>>,
    pub hospital_id: i64,
}

impl User {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub id: i64,
    pub pharmacy_name: String,
    pub location: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: i64,
    pub pharmacy_id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub quantity: u32,
    pub price: Option<f64>,
    pub expiry: Option<NaiveDate>,
    pub low_stock: bool,
}

impl InventoryItem {
    /// Set the quantity and recompute the low-stock flag.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.low_stock = is_low_stock(quantity);
    }
}

/// Quantities strictly below the threshold are low stock.
pub fn is_low_stock(quantity: u32) -> bool {
    quantity < LOW_STOCK_THRESHOLD
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: i64,
    pub pharmacy_id: i64,
    pub patient_name: String,
    pub medicine_name: String,
    pub status: String,
    pub prescribed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecordRow {
    pub id: i64,
    pub user_id: i64,
    pub assigned_doctor_id: Option<i64>,
    pub data_json: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfileRow {
    pub id: i64,
    pub user_id: i64,
    pub profile_json: String,
    pub updated_at: DateTime<Utc>,
}

/// Flat patient intake profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub patient_name: String,
    pub gender: String,
    pub age: u32,
    pub phone_number: String,
    pub blood_group: String,
    pub address: String,
}

/// Catalogue entry offered to doctors when prescribing.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineMaster {
    pub id: i64,
    pub name: String,
    pub strength: String,
    #[serde(rename = "type")]
    pub medicine_type: String,
    pub default_schedule: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_boundary() {
        assert!(is_low_stock(0));
        assert!(is_low_stock(49));
        assert!(!is_low_stock(50));
        assert!(!is_low_stock(51));
    }

    #[test]
    fn test_set_quantity_recomputes_flag() {
        let mut item = InventoryItem {
            id: 1,
            pharmacy_id: 1,
            name: "Metformin 500mg".into(),
            dosage: None,
            quantity: 60,
            price: None,
            expiry: None,
            low_stock: false,
        };
        item.set_quantity(10);
        assert!(item.low_stock);
        item.set_quantity(50);
        assert!(!item.low_stock);
    }

    #[test]
    fn test_role_wire_form() {
        assert_eq!(serde_json::to_string(&Role::Doctor).unwrap(), "\"DOCTOR\"");
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }
}
