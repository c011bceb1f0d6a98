//! Domain layer health check functionality.
//! Repositories fall back to memory when SQLite is unavailable, so a missing
//! database degrades the service instead of taking it down.

use std::collections::HashMap;

use async_trait::async_trait;
use school_clinic_data::database;

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Ok(true) if the database is fully operational, Ok(false) if degraded,
    /// Err if it is unavailable
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Check if the SQLite pool is available and answering
pub async fn check_database_status() -> Result<bool, String> {
    match database::get_connection_info() {
        Some(info) => Ok(info.contains("healthy")),
        None => match database::get_db_pool() {
            Ok(_) => Ok(true),
            Err(e) => Err(format!("Database connection error: {}", e)),
        },
    }
}

/// Derive system health from the database check
pub fn system_health_from(db_status: Result<bool, String>) -> SystemHealth {
    let (database, storage) = match db_status {
        Ok(true) => (
            HealthComponent {
                status: ComponentStatus::Healthy,
                details: database::get_connection_info(),
            },
            HealthComponent {
                status: ComponentStatus::Healthy,
                details: Some("Records are persisted to SQLite".to_string()),
            },
        ),
        Ok(false) => (
            HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Database is reachable but not answering queries".to_string()),
            },
            HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Failed writes fall back to in-memory storage".to_string()),
            },
        ),
        Err(e) => (
            HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e),
            },
            HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Using in-memory storage, records are lost on restart".to_string()),
            },
        ),
    };

    let status = if storage.status == ComponentStatus::Unhealthy {
        SystemStatus::Unhealthy
    } else if storage.status == ComponentStatus::Degraded {
        SystemStatus::Degraded
    } else {
        SystemStatus::Healthy
    };

    SystemHealth {
        status,
        components: vec![
            ("database".to_string(), database),
            ("storage".to_string(), storage),
        ]
        .into_iter()
        .collect(),
    }
}

/// Health service backed by the global database pool
#[derive(Debug, Default)]
pub struct DefaultHealthService;

#[async_trait]
impl HealthServiceTrait for DefaultHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        system_health_from(check_database_status().await)
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        check_database_status().await
    }
}

/// Create the health service used by the server
pub fn create_default_health_service() -> impl HealthServiceTrait {
    DefaultHealthService
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_system_health() {
        let health = DefaultHealthService.get_system_health().await;
        // Status depends on whether a pool was initialised in this process
        assert!(health.components.contains_key("database"));
        assert!(health.components.contains_key("storage"));
        assert_ne!(health.status, SystemStatus::Unhealthy);
    }

    #[test]
    fn test_missing_database_degrades_the_system() {
        let health = system_health_from(Err("Database pool not initialized".to_string()));
        assert_eq!(health.status, SystemStatus::Degraded);
        assert_eq!(health.components["database"].status, ComponentStatus::Unhealthy);
        assert_eq!(health.components["storage"].status, ComponentStatus::Degraded);
    }

    #[test]
    fn test_available_database_is_healthy() {
        let health = system_health_from(Ok(true));
        assert_eq!(health.status, SystemStatus::Healthy);
        assert_eq!(health.components["storage"].status, ComponentStatus::Healthy);
    }
}
