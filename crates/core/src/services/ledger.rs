//! Inventory and delivery ledger.
//!
//! These run inside a caller's transaction. `take_one` re-checks the floor against the working
//! copy it is given, so two assignments racing for the last unit cannot both succeed.

use crate::model::{Delivery, InventoryItem};
use crate::store::Tables;
use crate::{TrackerError, TrackerResult};
use chrono::{DateTime, Utc};

pub use crate::model::is_low_stock;

/// Take one unit from an inventory item and recompute its low-stock flag.
///
/// # Errors
///
/// - [`TrackerError::NotFound`] if the item does not exist.
/// - [`TrackerError::BadRequest`] if the item is out of stock.
pub fn take_one(tables: &mut Tables, item_id: i64) -> TrackerResult<InventoryItem> {
    let item = tables
        .inventory
        .get_mut(item_id)
        .ok_or_else(|| TrackerError::not_found("Selected pharmacy item not found"))?;

    let remaining = item
        .quantity
        .checked_sub(1)
        .ok_or_else(|| TrackerError::bad_request("Selected pharmacy is out of stock"))?;
    item.set_quantity(remaining);

    Ok(item.clone())
}

/// Append a delivery to a pharmacy's ledger. `prescribed_at` defaults to now.
pub fn record_delivery(
    tables: &mut Tables,
    pharmacy_id: i64,
    patient_name: &str,
    medicine_name: &str,
    status: &str,
    prescribed_at: Option<DateTime<Utc>>,
) -> Delivery {
    let delivery = tables.deliveries.insert(Delivery {
        id: 0,
        pharmacy_id,
        patient_name: patient_name.to_string(),
        medicine_name: medicine_name.to_string(),
        status: status.to_string(),
        prescribed_at: prescribed_at.unwrap_or_else(Utc::now),
    });
    tracing::debug!(
        delivery_id = delivery.id,
        pharmacy_id,
        "delivery recorded"
    );
    delivery
}

/// Change the status of a delivery owned by `pharmacy_id`.
///
/// # Errors
///
/// Returns [`TrackerError::NotFound`] if the delivery does not exist or belongs to another
/// pharmacy.
pub fn set_delivery_status(
    tables: &mut Tables,
    pharmacy_id: i64,
    delivery_id: i64,
    status: &str,
) -> TrackerResult<Delivery> {
    let delivery = tables
        .deliveries
        .get_mut(delivery_id)
        .filter(|d| d.pharmacy_id == pharmacy_id)
        .ok_or_else(|| TrackerError::not_found("Delivery not found"))?;

    delivery.status = status.to_string();
    Ok(delivery.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InventoryItem;

    fn tables_with_item(quantity: u32) -> (Tables, i64) {
        let mut tables = Tables::default();
        let mut item = InventoryItem {
            id: 0,
            pharmacy_id: 1,
            name: "Amlodipine 5mg".into(),
            dosage: None,
            quantity: 0,
            price: None,
            expiry: None,
            low_stock: false,
        };
        item.set_quantity(quantity);
        let id = tables.inventory.insert(item).id;
        (tables, id)
    }

    #[test]
    fn test_take_one_boundaries() {
        let (mut tables, id) = tables_with_item(51);
        let item = take_one(&mut tables, id).unwrap();
        assert_eq!(item.quantity, 50);
        assert!(!item.low_stock);

        let item = take_one(&mut tables, id).unwrap();
        assert_eq!(item.quantity, 49);
        assert!(item.low_stock);

        let (mut tables, id) = tables_with_item(1);
        let item = take_one(&mut tables, id).unwrap();
        assert_eq!(item.quantity, 0);
        assert!(item.low_stock);
    }

    #[test]
    fn test_take_one_never_goes_negative() {
        let (mut tables, id) = tables_with_item(0);
        let err = take_one(&mut tables, id).unwrap_err();
        assert!(matches!(err, TrackerError::BadRequest(_)));
        assert_eq!(tables.inventory.get(id).unwrap().quantity, 0);

        assert!(matches!(
            take_one(&mut tables, 999),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_delivery_status_is_scoped_to_owner() {
        let mut tables = Tables::default();
        let delivery = record_delivery(&mut tables, 1, "Kiran Patel", "Amlodipine 5mg", "pending", None);

        let err = set_delivery_status(&mut tables, 2, delivery.id, "delivered").unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
        assert_eq!(tables.deliveries.get(delivery.id).unwrap().status, "pending");

        let updated = set_delivery_status(&mut tables, 1, delivery.id, "delivered").unwrap();
        assert_eq!(updated.status, "delivered");
    }
}
