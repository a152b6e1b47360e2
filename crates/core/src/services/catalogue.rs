//! Medicine master catalogue offered to prescribing doctors.

use crate::model::MedicineMaster;
use crate::store::Store;
use crate::TrackerResult;
use medtrack_types::eq_ignore_case;
use std::sync::Arc;

pub struct MedicineCatalogue {
    store: Arc<Store>,
}

impl MedicineCatalogue {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Every catalogue entry with its default schedule, by name.
    pub fn list(&self) -> TrackerResult<Vec<MedicineMaster>> {
        self.store.read(|t| {
            let mut medicines: Vec<MedicineMaster> = t.medicines.iter().cloned().collect();
            medicines.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.strength.cmp(&b.strength)));
            medicines
        })
    }

    /// Add an entry unless one with the same name and strength exists.
    pub fn add(
        &self,
        name: &str,
        strength: &str,
        medicine_type: &str,
        default_schedule: &[&str],
    ) -> TrackerResult<MedicineMaster> {
        self.store.transaction(|t| {
            if let Some(existing) = t.medicines.find(|m| {
                eq_ignore_case(&m.name, name) && eq_ignore_case(&m.strength, strength)
            }) {
                return Ok(existing.clone());
            }
            Ok(t.medicines.insert(MedicineMaster {
                id: 0,
                name: name.to_string(),
                strength: strength.to_string(),
                medicine_type: medicine_type.to_string(),
                default_schedule: default_schedule.iter().map(|s| s.to_string()).collect(),
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent_and_list_sorted() {
        let catalogue = MedicineCatalogue::new(Arc::new(Store::new()));
        catalogue.add("Metformin", "500mg", "Tablet", &["08:00", "20:00"]).unwrap();
        catalogue.add("Amlodipine", "5mg", "Tablet", &["09:00"]).unwrap();
        let again = catalogue.add("metformin", "500MG", "Tablet", &[]).unwrap();
        assert_eq!(again.default_schedule, vec!["08:00", "20:00"]);

        let names: Vec<String> = catalogue.list().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Amlodipine", "Metformin"]);
    }
}
