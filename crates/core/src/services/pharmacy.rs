//! Pharmacy accounts, inventory and deliveries.
//!
//! Pharmacies have their own credential space, separate from hospital users, but share the
//! email namespace with them. Every inventory and delivery operation is scoped to the
//! pharmacy identified by the caller's login email.

use super::{check_password, email, ledger, non_blank, required};
use crate::auth::{CredentialService, TokenService};
use crate::constants::STATUS_PENDING;
use crate::model::{Delivery, InventoryItem, Pharmacy};
use crate::store::{Store, Tables};
use crate::{TrackerError, TrackerResult};
use chrono::{DateTime, NaiveDate, Utc};
use medtrack_types::eq_ignore_case;
use serde::Serialize;
use std::sync::Arc;

/// Role carried in pharmacy bearer tokens.
pub const PHARMACY_ROLE: &str = "PHARMACY";

#[derive(Clone, Debug)]
pub struct PharmacyRegistration {
    pub pharmacy_name: String,
    pub location: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct PharmacyProfileUpdate {
    pub pharmacy_name: String,
    pub location: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyProfile {
    pub id: i64,
    pub pharmacy_name: String,
    pub location: String,
    pub email: String,
}

impl From<&Pharmacy> for PharmacyProfile {
    fn from(p: &Pharmacy) -> Self {
        Self {
            id: p.id,
            pharmacy_name: p.pharmacy_name.clone(),
            location: p.location.clone(),
            email: p.email.clone(),
        }
    }
}

/// Create or replace the fields of an inventory item.
#[derive(Clone, Debug)]
pub struct InventoryInput {
    pub name: String,
    pub dosage: Option<String>,
    pub quantity: i64,
    pub price: Option<f64>,
    pub expiry: Option<NaiveDate>,
}

/// Stock of a named medicine at one pharmacy, as offered to prescribing doctors.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyAvailability {
    pub inventory_item_id: i64,
    pub medicine_name: String,
    pub dosage: Option<String>,
    pub quantity: u32,
    pub price: Option<f64>,
    pub pharmacy_id: i64,
    pub pharmacy_name: String,
    pub pharmacy_location: String,
}

#[derive(Clone, Debug)]
pub struct DeliveryInput {
    pub patient: String,
    pub medicine: String,
    pub status: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

pub struct PharmacyService {
    store: Arc<Store>,
    credentials: Arc<dyn CredentialService>,
    tokens: Arc<dyn TokenService>,
}

impl PharmacyService {
    pub fn new(
        store: Arc<Store>,
        credentials: Arc<dyn CredentialService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            store,
            credentials,
            tokens,
        }
    }

    /// Register a pharmacy.
    ///
    /// # Errors
    ///
    /// - [`TrackerError::BadRequest`] for missing fields, a malformed email or a short password.
    /// - [`TrackerError::Conflict`] if any user or pharmacy already uses the email.
    pub fn register(&self, request: &PharmacyRegistration) -> TrackerResult<PharmacyProfile> {
        let name = required("Pharmacy name", &request.pharmacy_name)?;
        let location = required("Location", &request.location)?;
        let email = email(&request.email)?;
        check_password(&request.password)?;
        let password_hash = self.credentials.hash(&request.password);

        let pharmacy = self.store.transaction(|t| {
            if t.email_registered(email.as_str()) {
                return Err(TrackerError::conflict("Email already registered"));
            }
            Ok(t.pharmacies.insert(Pharmacy {
                id: 0,
                pharmacy_name: name.into_inner(),
                location: location.into_inner(),
                email: email.into(),
                password_hash,
            }))
        })?;

        tracing::info!(pharmacy_id = pharmacy.id, "pharmacy registered");
        Ok(PharmacyProfile::from(&pharmacy))
    }

    /// Check credentials and issue a `PHARMACY` bearer token.
    pub fn login(&self, email: &str, password: &str) -> TrackerResult<(String, PharmacyProfile)> {
        let pharmacy = self
            .store
            .read(|t| t.pharmacy_by_email(email).cloned())?
            .ok_or_else(|| TrackerError::unauthorised("Invalid Credentials"))?;

        if !self.credentials.verify(password, &pharmacy.password_hash) {
            return Err(TrackerError::unauthorised("Invalid Credentials"));
        }

        let token = self.tokens.issue(&pharmacy.email, PHARMACY_ROLE)?;
        Ok((token, PharmacyProfile::from(&pharmacy)))
    }

    pub fn profile(&self, pharmacy_email: &str) -> TrackerResult<PharmacyProfile> {
        self.store
            .read(|t| by_email(t, pharmacy_email).map(PharmacyProfile::from))?
    }

    /// Update name, location and login email.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Conflict`] if the new email is used by any user or other pharmacy.
    pub fn update_profile(
        &self,
        pharmacy_email: &str,
        request: &PharmacyProfileUpdate,
    ) -> TrackerResult<PharmacyProfile> {
        let name = required("Pharmacy name", &request.pharmacy_name)?;
        let location = required("Location", &request.location)?;
        let new_email = email(&request.email)?;

        self.store.transaction(|t| {
            let mut pharmacy = by_email(t, pharmacy_email)?.clone();

            if !new_email.matches(&pharmacy.email) {
                if t.email_registered(new_email.as_str()) {
                    return Err(TrackerError::conflict("Email already registered"));
                }
                pharmacy.email = new_email.to_string();
            }
            pharmacy.pharmacy_name = name.into_inner();
            pharmacy.location = location.into_inner();

            t.pharmacies.save(pharmacy.clone());
            Ok(PharmacyProfile::from(&pharmacy))
        })
    }

    /// Inventory of the pharmacy, newest first.
    pub fn list_inventory(&self, pharmacy_email: &str) -> TrackerResult<Vec<InventoryItem>> {
        self.store.read(|t| {
            let pharmacy_id = by_email(t, pharmacy_email)?.id;
            Ok(t.inventory
                .iter()
                .rev()
                .filter(|item| item.pharmacy_id == pharmacy_id)
                .cloned()
                .collect())
        })?
    }

    pub fn create_item(
        &self,
        pharmacy_email: &str,
        request: &InventoryInput,
    ) -> TrackerResult<InventoryItem> {
        let validated = ValidatedInventory::try_from(request)?;
        self.store.transaction(|t| {
            let pharmacy_id = by_email(t, pharmacy_email)?.id;
            let mut item = InventoryItem {
                id: 0,
                pharmacy_id,
                name: String::new(),
                dosage: None,
                quantity: 0,
                price: None,
                expiry: None,
                low_stock: false,
            };
            validated.apply(&mut item);
            Ok(t.inventory.insert(item))
        })
    }

    /// Replace an item's fields.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if the item does not belong to this pharmacy.
    pub fn update_item(
        &self,
        pharmacy_email: &str,
        item_id: i64,
        request: &InventoryInput,
    ) -> TrackerResult<InventoryItem> {
        let validated = ValidatedInventory::try_from(request)?;
        self.store.transaction(|t| {
            let pharmacy_id = by_email(t, pharmacy_email)?.id;
            let item = owned_item(t, pharmacy_id, item_id)?;
            validated.apply(item);
            Ok(item.clone())
        })
    }

    pub fn delete_item(&self, pharmacy_email: &str, item_id: i64) -> TrackerResult<()> {
        self.store.transaction(|t| {
            let pharmacy_id = by_email(t, pharmacy_email)?.id;
            owned_item(t, pharmacy_id, item_id)?;
            t.inventory.remove(item_id);
            Ok(())
        })
    }

    /// In-stock items matching `medicine_name` (ignoring case) across all pharmacies.
    pub fn availability(&self, medicine_name: &str) -> TrackerResult<Vec<PharmacyAvailability>> {
        let Some(name) = non_blank(Some(medicine_name)) else {
            return Ok(Vec::new());
        };

        self.store.read(|t| {
            t.inventory
                .filter(|item| item.quantity > 0 && eq_ignore_case(&item.name, name))
                .filter_map(|item| {
                    let pharmacy = t.pharmacies.get(item.pharmacy_id)?;
                    Some(PharmacyAvailability {
                        inventory_item_id: item.id,
                        medicine_name: item.name.clone(),
                        dosage: item.dosage.clone(),
                        quantity: item.quantity,
                        price: item.price,
                        pharmacy_id: pharmacy.id,
                        pharmacy_name: pharmacy.pharmacy_name.clone(),
                        pharmacy_location: pharmacy.location.clone(),
                    })
                })
                .collect()
        })
    }

    /// Deliveries of the pharmacy, most recently prescribed first.
    pub fn list_deliveries(&self, pharmacy_email: &str) -> TrackerResult<Vec<Delivery>> {
        self.store.read(|t| {
            let pharmacy_id = by_email(t, pharmacy_email)?.id;
            let mut deliveries: Vec<Delivery> = t
                .deliveries
                .filter(|d| d.pharmacy_id == pharmacy_id)
                .cloned()
                .collect();
            deliveries.sort_by(|a, b| {
                b.prescribed_at
                    .cmp(&a.prescribed_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            Ok(deliveries)
        })?
    }

    /// Record a delivery by hand. Blank status means "pending"; no date means now.
    pub fn create_delivery(
        &self,
        pharmacy_email: &str,
        request: &DeliveryInput,
    ) -> TrackerResult<Delivery> {
        let patient = required("Patient", &request.patient)?;
        let medicine = required("Medicine", &request.medicine)?;
        let status = non_blank(request.status.as_deref()).unwrap_or(STATUS_PENDING);

        self.store.transaction(|t| {
            let pharmacy_id = by_email(t, pharmacy_email)?.id;
            Ok(ledger::record_delivery(
                t,
                pharmacy_id,
                patient.as_str(),
                medicine.as_str(),
                status,
                request.date,
            ))
        })
    }

    pub fn update_delivery_status(
        &self,
        pharmacy_email: &str,
        delivery_id: i64,
        status: &str,
    ) -> TrackerResult<Delivery> {
        let status = required("Status", status)?;
        self.store.transaction(|t| {
            let pharmacy_id = by_email(t, pharmacy_email)?.id;
            ledger::set_delivery_status(t, pharmacy_id, delivery_id, status.as_str())
        })
    }
}

fn by_email<'a>(tables: &'a Tables, email: &str) -> TrackerResult<&'a Pharmacy> {
    tables
        .pharmacy_by_email(email)
        .ok_or_else(|| TrackerError::not_found("Pharmacy not found"))
}

fn owned_item(
    tables: &mut Tables,
    pharmacy_id: i64,
    item_id: i64,
) -> TrackerResult<&mut InventoryItem> {
    tables
        .inventory
        .get_mut(item_id)
        .filter(|item| item.pharmacy_id == pharmacy_id)
        .ok_or_else(|| TrackerError::not_found("Item not found"))
}

struct ValidatedInventory {
    name: String,
    dosage: Option<String>,
    quantity: u32,
    price: Option<f64>,
    expiry: Option<NaiveDate>,
}

impl TryFrom<&InventoryInput> for ValidatedInventory {
    type Error = TrackerError;

    fn try_from(input: &InventoryInput) -> TrackerResult<Self> {
        let name = required("Medicine name", &input.name)?;
        if input.quantity < 0 {
            return Err(TrackerError::bad_request("Quantity cannot be negative"));
        }
        let quantity = u32::try_from(input.quantity).map_err(|_| {
            TrackerError::bad_request(format!("Quantity cannot exceed {}", u32::MAX))
        })?;
        if input.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
            return Err(TrackerError::bad_request("Price cannot be negative"));
        }

        Ok(Self {
            name: name.into_inner(),
            dosage: non_blank(input.dosage.as_deref()).map(str::to_string),
            quantity,
            price: input.price,
            expiry: input.expiry,
        })
    }
}

impl ValidatedInventory {
    fn apply(&self, item: &mut InventoryItem) {
        item.name = self.name.clone();
        item.dosage = self.dosage.clone();
        item.price = self.price;
        item.expiry = self.expiry;
        item.set_quantity(self.quantity);
    }
}
