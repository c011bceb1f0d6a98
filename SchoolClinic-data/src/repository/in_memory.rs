use std::sync::{Arc, Mutex};
use std::collections::HashMap;

use crate::models::bp_form::{BpFormRecord, BpReadingRecord, MAX_READINGS_PER_FORM};
use crate::models::dental_record::DentalRecord;
use super::errors::RepositoryError;

/// In-memory storage used when the database is not available
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    /// BP forms keyed by id, each owning its readings
    forms: Arc<Mutex<HashMap<String, BpFormRecord>>>,

    /// Dental records keyed by id
    dental_records: Arc<Mutex<HashMap<String, DentalRecord>>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a form in memory, replacing any form with the same id
    pub async fn store_form(&self, form: &BpFormRecord) -> Result<BpFormRecord, RepositoryError> {
        let mut store = self.forms.lock()?;
        store.insert(form.id.clone(), form.clone());
        Ok(form.clone())
    }

    /// Get a form with its readings
    pub async fn get_form(&self, id: &str) -> Result<Option<BpFormRecord>, RepositoryError> {
        let store = self.forms.lock()?;
        Ok(store.get(id).cloned())
    }

    /// List the forms of one patient, oldest first
    pub async fn list_forms(&self, patient_id: &str) -> Result<Vec<BpFormRecord>, RepositoryError> {
        let store = self.forms.lock()?;
        let mut forms: Vec<BpFormRecord> = store
            .values()
            .filter(|form| form.patient_id == patient_id)
            .cloned()
            .collect();
        forms.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(forms)
    }

    /// Append a reading to a form and overwrite the form status.
    /// The cap is checked under the same lock as the append.
    pub async fn add_reading(
        &self,
        form_id: &str,
        reading: &BpReadingRecord,
        status: &str,
    ) -> Result<BpReadingRecord, RepositoryError> {
        let mut store = self.forms.lock()?;
        let form = store
            .get_mut(form_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("BP form {}", form_id)))?;

        if form.readings.len() >= MAX_READINGS_PER_FORM {
            return Err(RepositoryError::CapacityExceeded(format!(
                "BP form {} already holds {} readings",
                form_id, MAX_READINGS_PER_FORM
            )));
        }

        form.readings.push(reading.clone());
        form.readings.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
        form.status = status.to_string();

        Ok(reading.clone())
    }

    /// Remove a form together with its readings
    pub async fn delete_form(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut store = self.forms.lock()?;
        Ok(store.remove(id).is_some())
    }

    /// Store a dental record in memory
    pub async fn store_dental_record(&self, record: &DentalRecord) -> Result<DentalRecord, RepositoryError> {
        let mut store = self.dental_records.lock()?;
        store.insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    /// Get a dental record by id
    pub async fn get_dental_record(&self, id: &str) -> Result<Option<DentalRecord>, RepositoryError> {
        let store = self.dental_records.lock()?;
        Ok(store.get(id).cloned())
    }

    /// Replace the whole chart of a dental record
    pub async fn update_dental_chart(
        &self,
        id: &str,
        chart: &str,
        updated_at: &str,
    ) -> Result<Option<DentalRecord>, RepositoryError> {
        let mut store = self.dental_records.lock()?;
        Ok(store.get_mut(id).map(|record| {
            record.chart = chart.to_string();
            record.updated_at = updated_at.to_string();
            record.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(id: &str, patient_id: &str, created_at: &str) -> BpFormRecord {
        BpFormRecord {
            id: id.to_string(),
            patient_id: patient_id.to_string(),
            status: "Stable".to_string(),
            created_at: created_at.to_string(),
            readings: Vec::new(),
        }
    }

    fn reading(id: &str, date: &str, time: &str) -> BpReadingRecord {
        BpReadingRecord {
            id: id.to_string(),
            form_id: "form-1".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            blood_pressure: "120/75".to_string(),
            remarks: "Normal - BP within a healthy range".to_string(),
            has_signature: false,
        }
    }

    #[tokio::test]
    async fn test_readings_are_kept_in_date_time_order() {
        let storage = InMemoryStorage::new();
        storage.store_form(&form("form-1", "patient-1", "2024-01-01T00:00:00Z")).await.unwrap();

        storage.add_reading("form-1", &reading("b", "2024-03-02", "08:00:00"), "Stable").await.unwrap();
        storage.add_reading("form-1", &reading("a", "2024-03-01", "14:30:00"), "Stable").await.unwrap();
        storage.add_reading("form-1", &reading("c", "2024-03-02", "07:15:00"), "Elevated BP").await.unwrap();

        let stored = storage.get_form("form-1").await.unwrap().unwrap();
        let ids: Vec<&str> = stored.readings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(stored.status, "Elevated BP");
    }

    #[tokio::test]
    async fn test_add_reading_to_missing_form_fails() {
        let storage = InMemoryStorage::new();
        let result = storage.add_reading("missing", &reading("a", "2024-03-01", "08:00:00"), "Stable").await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_reading_past_the_cap_is_rejected() {
        let storage = InMemoryStorage::new();
        storage.store_form(&form("form-1", "patient-1", "2024-01-01T00:00:00Z")).await.unwrap();
        for day in 1..=MAX_READINGS_PER_FORM {
            let date = format!("2024-03-0{}", day);
            storage.add_reading("form-1", &reading(&date, &date, "08:00:00"), "Stable").await.unwrap();
        }

        let result = storage.add_reading("form-1", &reading("late", "2024-03-08", "08:00:00"), "Critical Condition").await;
        assert!(matches!(result, Err(RepositoryError::CapacityExceeded(_))));

        let stored = storage.get_form("form-1").await.unwrap().unwrap();
        assert_eq!(stored.readings.len(), MAX_READINGS_PER_FORM);
        assert_eq!(stored.status, "Stable");
    }

    #[tokio::test]
    async fn test_concurrent_appends_stop_at_the_cap() {
        let storage = InMemoryStorage::new();
        storage.store_form(&form("form-1", "patient-1", "2024-01-01T00:00:00Z")).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..12 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("r{}", n);
                storage.add_reading("form-1", &reading(&id, "2024-03-01", "08:00:00"), "Stable").await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, MAX_READINGS_PER_FORM);
        let stored = storage.get_form("form-1").await.unwrap().unwrap();
        assert_eq!(stored.readings.len(), MAX_READINGS_PER_FORM);
    }

    #[tokio::test]
    async fn test_delete_form_removes_readings() {
        let storage = InMemoryStorage::new();
        storage.store_form(&form("form-1", "patient-1", "2024-01-01T00:00:00Z")).await.unwrap();
        storage.add_reading("form-1", &reading("a", "2024-03-01", "08:00:00"), "Stable").await.unwrap();

        assert!(storage.delete_form("form-1").await.unwrap());
        assert!(storage.get_form("form-1").await.unwrap().is_none());
        assert!(!storage.delete_form("form-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_forms_filters_by_patient() {
        let storage = InMemoryStorage::new();
        storage.store_form(&form("f2", "patient-1", "2024-02-01T00:00:00Z")).await.unwrap();
        storage.store_form(&form("f1", "patient-1", "2024-01-01T00:00:00Z")).await.unwrap();
        storage.store_form(&form("f3", "patient-2", "2024-01-15T00:00:00Z")).await.unwrap();

        let forms = storage.list_forms("patient-1").await.unwrap();
        let ids: Vec<&str> = forms.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["f1", "f2"]);
    }
}
