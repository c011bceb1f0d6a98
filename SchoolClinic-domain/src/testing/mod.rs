// Testing utilities and mock implementations for the domain layer.
// Only compiled for tests or when the "mock" feature is enabled.

use std::collections::HashMap;

use async_trait::async_trait;

pub use school_clinic_data::repository::tests::{MockBpFormRepository, MockDentalRecordRepository};

use crate::health::{system_health_from, ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth};
use crate::services::bp_form::BpFormService;
use crate::services::dental_chart::DentalChartService;

/// BP form service over an in-memory mock repository
pub fn create_mock_bp_form_service() -> BpFormService<MockBpFormRepository> {
    BpFormService::new(MockBpFormRepository::new())
}

/// BP form service whose repository writes always fail
pub fn create_failing_bp_form_service() -> BpFormService<MockBpFormRepository> {
    BpFormService::new(MockBpFormRepository::failing())
}

/// Dental chart service over an in-memory mock repository
pub fn create_mock_dental_chart_service() -> DentalChartService<MockDentalRecordRepository> {
    DentalChartService::new(MockDentalRecordRepository::new())
}

/// Mock health service with a configurable database state
#[derive(Debug)]
pub struct MockHealthService {
    database_status: ComponentStatus,
    components: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a mock health service with a healthy database
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
            components: HashMap::new(),
        }
    }

    /// Configure the mock with a database that answers slowly
    pub fn with_degraded_database(mut self) -> Self {
        self.database_status = ComponentStatus::Degraded;
        self
    }

    /// Configure the mock as if no database pool was initialised
    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }

    /// Add a custom component with a specific status
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        self.components.insert(name.to_string(), HealthComponent { status, details });
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut health = system_health_from(self.check_database_status().await);
        for (name, component) in &self.components {
            health.components.insert(name.clone(), component.clone());
        }
        health
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err("Database pool not initialized".to_string()),
        }
    }
}

/// Factory function to create a mock health service
pub fn create_mock_health_service() -> impl HealthServiceTrait {
    MockHealthService::new()
}
