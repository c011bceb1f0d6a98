use chrono::Utc;
use tracing::{debug, error};
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::dental_record::{CreateDentalRecordRequest, DentalRecord};
use crate::database::{get_db_pool, DatabaseError, DatabasePool};
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for dental records
#[async_trait]
pub trait DentalRecordRepositoryTrait {
    /// Create a new dental record
    async fn create(&self, request: CreateDentalRecordRequest) -> Result<DentalRecord, RepositoryError>;

    /// Get a dental record by ID
    async fn get_by_id(&self, id: Uuid) -> Result<Option<DentalRecord>, RepositoryError>;

    /// Replace the encoded chart of a record
    async fn update_chart(&self, id: Uuid, chart: String) -> Result<Option<DentalRecord>, RepositoryError>;
}

/// Repository for dental records.
/// Uses the SQLite pool when one is available, otherwise in-memory storage.
/// Errors from a live database are returned as they are.
#[derive(Debug, Clone, Default)]
pub struct DentalRecordRepository {
    pool: Option<DatabasePool>,
    storage: InMemoryStorage,
}

impl DentalRecordRepository {
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
impl DentalRecordRepositoryTrait for DentalRecordRepository {
    async fn create(&self, request: CreateDentalRecordRequest) -> Result<DentalRecord, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let record = DentalRecord {
            id: Uuid::new_v4().to_string(),
            patient_id: request.patient_id,
            chart: request.chart,
            remarks: request.remarks,
            created_at: now.clone(),
            updated_at: now,
        };

        match self.pool() {
            Ok(pool) => {
                DatabaseStorage::store_dental_record(&pool, &record).await.map_err(|e| {
                    error!("Failed to store dental record in database: {}", e);
                    e
                })?;
                Ok(record)
            }
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage", e);
                self.storage.store_dental_record(&record).await
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<DentalRecord>, RepositoryError> {
        let id = id.to_string();
        match self.pool() {
            Ok(pool) => DatabaseStorage::get_dental_record(&pool, &id).await.map_err(|e| {
                error!("Failed to get dental record from database: {}", e);
                e
            }),
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for get_by_id", e);
                self.storage.get_dental_record(&id).await
            }
        }
    }

    async fn update_chart(&self, id: Uuid, chart: String) -> Result<Option<DentalRecord>, RepositoryError> {
        let id = id.to_string();
        let updated_at = Utc::now().to_rfc3339();

        match self.pool() {
            Ok(pool) => DatabaseStorage::update_dental_chart(&pool, &id, &chart, &updated_at)
                .await
                .map_err(|e| {
                    error!("Failed to update dental chart in database: {}", e);
                    e
                }),
            Err(e) => {
                debug!("Database not available ({}), using in-memory storage for update_chart", e);
                self.storage.update_dental_chart(&id, &chart, &updated_at).await
            }
        }
    }
}

/// Mock dental record repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;

    /// Mock implementation of DentalRecordRepositoryTrait backed by memory only
    #[derive(Default)]
    pub struct MockDentalRecordRepository {
        storage: InMemoryStorage,
    }

    impl MockDentalRecordRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository holding a record with the given raw chart text
        pub async fn with_raw_chart(id: Uuid, chart: &str) -> Self {
            let repo = Self::new();
            let now = Utc::now().to_rfc3339();
            let record = DentalRecord {
                id: id.to_string(),
                patient_id: "patient-legacy".to_string(),
                chart: chart.to_string(),
                remarks: None,
                created_at: now.clone(),
                updated_at: now,
            };
            // In-memory store cannot fail outside of lock poisoning
            let _ = repo.storage.store_dental_record(&record).await;
            repo
        }
    }

    #[async_trait]
    impl DentalRecordRepositoryTrait for MockDentalRecordRepository {
        async fn create(&self, request: CreateDentalRecordRequest) -> Result<DentalRecord, RepositoryError> {
            let now = Utc::now().to_rfc3339();
            let record = DentalRecord {
                id: Uuid::new_v4().to_string(),
                patient_id: request.patient_id,
                chart: request.chart,
                remarks: request.remarks,
                created_at: now.clone(),
                updated_at: now,
            };
            self.storage.store_dental_record(&record).await
        }

        async fn get_by_id(&self, id: Uuid) -> Result<Option<DentalRecord>, RepositoryError> {
            self.storage.get_dental_record(&id.to_string()).await
        }

        async fn update_chart(&self, id: Uuid, chart: String) -> Result<Option<DentalRecord>, RepositoryError> {
            let updated_at = Utc::now().to_rfc3339();
            self.storage.update_dental_chart(&id.to_string(), &chart, &updated_at).await
        }
    }
}

#[cfg(test)]
mod pool_tests {
    use super::*;
    use crate::database::create_in_memory_pool;

    fn request() -> CreateDentalRecordRequest {
        CreateDentalRecordRequest {
            patient_id: "patient-1".to_string(),
            chart: "{}".to_string(),
            remarks: None,
        }
    }

    #[tokio::test]
    async fn test_chart_update_goes_to_the_pool() {
        let repo = DentalRecordRepository::with_pool(create_in_memory_pool().unwrap());
        let record = repo.create(request()).await.unwrap();
        let id = Uuid::parse_str(&record.id).unwrap();

        let updated = repo.update_chart(id, r#"{"11":{}}"#.to_string()).await.unwrap().unwrap();
        assert_eq!(updated.chart, r#"{"11":{}}"#);
        assert!(repo.update_chart(Uuid::new_v4(), "{}".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_database_failure_is_not_hidden_by_memory() {
        let pool = create_in_memory_pool().unwrap();
        let repo = DentalRecordRepository::with_pool(pool.clone());
        let record = repo.create(request()).await.unwrap();
        let id = Uuid::parse_str(&record.id).unwrap();

        {
            let DatabasePool::SQLite(inner) = &pool;
            inner.get().unwrap().execute_batch("DROP TABLE dental_records;").unwrap();
        }

        assert!(matches!(repo.update_chart(id, "{}".to_string()).await, Err(RepositoryError::Sqlite(_))));
        assert!(matches!(repo.get_by_id(id).await, Err(RepositoryError::Sqlite(_))));
    }
}
