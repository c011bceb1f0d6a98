use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::bp_form::{BpFormRecord, BpReadingRecord, CreateBpFormRequest, CreateBpReadingRequest};
use crate::database::{get_db_pool, DatabaseError, DatabasePool};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for BP forms
#[async_trait]
pub trait BpFormRepositoryTrait {
    /// Create a new, empty form
    async fn create_form(&self, request: CreateBpFormRequest) -> Result<BpFormRecord, RepositoryError>;

    /// Get a form with its readings
    async fn get_form(&self, id: Uuid) -> Result<Option<BpFormRecord>, RepositoryError>;

    /// List the forms recorded for one patient
    async fn list_forms(&self, patient_id: &str) -> Result<Vec<BpFormRecord>, RepositoryError>;

    /// Append a reading and store the recomputed form status
    async fn add_reading(
        &self,
        form_id: Uuid,
        request: CreateBpReadingRequest,
        status: String,
    ) -> Result<BpReadingRecord, RepositoryError>;

    /// Delete a form and its readings
    async fn delete_form(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Repository for BP forms.
/// Uses the SQLite pool when one is available, otherwise in-memory storage.
/// Errors from a live database are returned as they are.
#[derive(Debug, Clone, Default)]
pub struct BpFormRepository {
    /// Pool to use instead of the global one
    pool: Option<DatabasePool>,

    /// In-memory storage for when database is not available
    storage: InMemoryStorage,
}

impl BpFormRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self {
            pool: None,
            storage: InMemoryStorage::new(),
        }
    }

    /// Create a repository bound to a specific pool
    pub fn with_pool(pool: DatabasePool) -> Self {
        Self {
            pool: Some(pool),
            storage: InMemoryStorage::new(),
        }
    }

    fn pool(&self) -> Result<DatabasePool, DatabaseError> {
        match &self.pool {
            Some(pool) => Ok(pool.clone()),
            None => get_db_pool(),
        }
    }
}

#[async_trait]
impl BpFormRepositoryTrait for BpFormRepository {
    async fn create_form(&self, request: CreateBpFormRequest) -> Result<BpFormRecord, RepositoryError> {
        let form = BpFormRecord {
            id: Uuid::new_v4().to_string(),
            patient_id: request.patient_id,
            status: request.status,
            created_at: Utc::now().to_rfc3339(),
            readings: Vec::new(),
        };

        match self.pool() {
            Ok(pool) => {
                DatabaseStorage::store_form(&pool, &form).await.map_err(|e| {
                    error!("Failed to store BP form in database: {}", e);
                    e
                })?;
                Ok(form)
            }
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.store_form(&form).await
            }
        }
    }

    async fn get_form(&self, id: Uuid) -> Result<Option<BpFormRecord>, RepositoryError> {
        let id = id.to_string();
        match self.pool() {
            Ok(pool) => DatabaseStorage::get_form(&pool, &id).await.map_err(|e| {
                error!("Failed to get BP form from database: {}", e);
                e
            }),
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_form", e);
                self.storage.get_form(&id).await
            }
        }
    }

    async fn list_forms(&self, patient_id: &str) -> Result<Vec<BpFormRecord>, RepositoryError> {
        match self.pool() {
            Ok(pool) => DatabaseStorage::list_forms(&pool, patient_id).await.map_err(|e| {
                error!("Failed to list BP forms from database: {}", e);
                e
            }),
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for list_forms", e);
                self.storage.list_forms(patient_id).await
            }
        }
    }

    async fn add_reading(
        &self,
        form_id: Uuid,
        request: CreateBpReadingRequest,
        status: String,
    ) -> Result<BpReadingRecord, RepositoryError> {
        let reading = BpReadingRecord {
            id: Uuid::new_v4().to_string(),
            form_id: form_id.to_string(),
            date: request.date,
            time: request.time,
            blood_pressure: request.blood_pressure,
            remarks: request.remarks,
            has_signature: request.has_signature,
        };

        match self.pool() {
            Ok(pool) => match DatabaseStorage::add_reading(&pool, &reading, &status).await {
                Ok(_) => Ok(reading),
                Err(e @ (RepositoryError::NotFound(_) | RepositoryError::CapacityExceeded(_))) => Err(e),
                Err(e) => {
                    error!("Failed to store BP reading in database: {}", e);
                    Err(e)
                }
            },
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for add_reading", e);
                self.storage.add_reading(&reading.form_id, &reading, &status).await
            }
        }
    }

    async fn delete_form(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let id = id.to_string();
        match self.pool() {
            Ok(pool) => DatabaseStorage::delete_form(&pool, &id).await.map_err(|e| {
                error!("Failed to delete BP form from database: {}", e);
                e
            }),
            Err(_) => self.storage.delete_form(&id).await,
        }
    }
}

/// Mock BP form repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;

    /// Mock implementation of BpFormRepositoryTrait that never touches the database
    #[derive(Default)]
    pub struct MockBpFormRepository {
        storage: InMemoryStorage,
        fail_writes: bool,
    }

    impl MockBpFormRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository whose writes fail
        pub fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }
    }

    fn mock_write_failure() -> RepositoryError {
        RepositoryError::Sqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
            Some("mock write failure".to_string()),
        ))
    }

    #[async_trait]
    impl BpFormRepositoryTrait for MockBpFormRepository {
        async fn create_form(&self, request: CreateBpFormRequest) -> Result<BpFormRecord, RepositoryError> {
            if self.fail_writes {
                return Err(mock_write_failure());
            }

            let form = BpFormRecord {
                id: Uuid::new_v4().to_string(),
                patient_id: request.patient_id,
                status: request.status,
                created_at: Utc::now().to_rfc3339(),
                readings: Vec::new(),
            };
            self.storage.store_form(&form).await
        }

        async fn get_form(&self, id: Uuid) -> Result<Option<BpFormRecord>, RepositoryError> {
            self.storage.get_form(&id.to_string()).await
        }

        async fn list_forms(&self, patient_id: &str) -> Result<Vec<BpFormRecord>, RepositoryError> {
            self.storage.list_forms(patient_id).await
        }

        async fn add_reading(
            &self,
            form_id: Uuid,
            request: CreateBpReadingRequest,
            status: String,
        ) -> Result<BpReadingRecord, RepositoryError> {
            if self.fail_writes {
                return Err(mock_write_failure());
            }

            let reading = BpReadingRecord {
                id: Uuid::new_v4().to_string(),
                form_id: form_id.to_string(),
                date: request.date,
                time: request.time,
                blood_pressure: request.blood_pressure,
                remarks: request.remarks,
                has_signature: request.has_signature,
            };
            self.storage.add_reading(&reading.form_id, &reading, &status).await
        }

        async fn delete_form(&self, id: Uuid) -> Result<bool, RepositoryError> {
            self.storage.delete_form(&id.to_string()).await
        }
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;
    use crate::database::create_in_memory_pool;
    use crate::models::bp_form::MAX_READINGS_PER_FORM;

    fn reading_request(date: &str) -> CreateBpReadingRequest {
        CreateBpReadingRequest {
            date: date.to_string(),
            time: "10:00:00".to_string(),
            blood_pressure: "120/80".to_string(),
            remarks: "Normal - BP within a healthy range".to_string(),
            has_signature: true,
        }
    }

    #[tokio::test]
    async fn test_forms_are_stored_in_the_pool() {
        let repo = BpFormRepository::with_pool(create_in_memory_pool().unwrap());
        let form = repo
            .create_form(CreateBpFormRequest {
                patient_id: "patient-1".to_string(),
                status: "Stable".to_string(),
            })
            .await
            .unwrap();
        let id = Uuid::parse_str(&form.id).unwrap();

        repo.add_reading(id, reading_request("2024-05-01"), "Stable".to_string()).await.unwrap();

        let stored = repo.get_form(id).await.unwrap().unwrap();
        assert_eq!(stored.readings.len(), 1);
        assert!(repo.delete_form(id).await.unwrap());
        assert!(repo.get_form(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_database_failure_is_not_hidden_by_memory() {
        let pool = create_in_memory_pool().unwrap();
        let repo = BpFormRepository::with_pool(pool.clone());
        let form = repo
            .create_form(CreateBpFormRequest {
                patient_id: "patient-1".to_string(),
                status: "Stable".to_string(),
            })
            .await
            .unwrap();
        let id = Uuid::parse_str(&form.id).unwrap();

        {
            let DatabasePool::SQLite(inner) = &pool;
            inner.get().unwrap().execute_batch("DROP TABLE bp_readings;").unwrap();
        }

        let result = repo.add_reading(id, reading_request("2024-05-01"), "Stable".to_string()).await;
        assert!(matches!(result, Err(RepositoryError::Sqlite(_))));

        // Nothing was parked in memory, so reads keep failing instead of reporting a missing form
        let result = repo.get_form(id).await;
        assert!(matches!(result, Err(RepositoryError::Sqlite(_))));
    }

    #[tokio::test]
    async fn test_full_form_is_reported_as_capacity_exceeded() {
        let repo = BpFormRepository::with_pool(create_in_memory_pool().unwrap());
        let form = repo
            .create_form(CreateBpFormRequest {
                patient_id: "patient-2".to_string(),
                status: "Stable".to_string(),
            })
            .await
            .unwrap();
        let id = Uuid::parse_str(&form.id).unwrap();

        for day in 1..=MAX_READINGS_PER_FORM {
            let date = format!("2024-05-0{}", day);
            repo.add_reading(id, reading_request(&date), "Stable".to_string()).await.unwrap();
        }

        let result = repo.add_reading(id, reading_request("2024-05-08"), "Stable".to_string()).await;
        assert!(matches!(result, Err(RepositoryError::CapacityExceeded(_))));
    }
}
