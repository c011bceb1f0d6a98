use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Extension};
use school_clinic_domain::health::ComponentStatus;
use school_clinic_domain::testing::MockHealthService;

use super::body_json;
use crate::api::handlers::health::{health_check, initialize_server_start_time, HealthServiceRef};

async fn check(service: MockHealthService) -> (StatusCode, serde_json::Value) {
    let service: HealthServiceRef = Arc::new(service);
    let response = health_check(Extension(service)).await.into_response();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_health_check_healthy() {
    initialize_server_start_time();
    let (status, body) = check(MockHealthService::new()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["components"]["database"]["status"], "ok");
    assert_eq!(body["components"]["storage"]["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime"].is_u64());
    assert!(body["components"].get("additional").is_none());
}

#[tokio::test]
async fn test_health_check_degraded_database() {
    let (status, body) = check(MockHealthService::new().with_degraded_database()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["database"]["status"], "degraded");
}

#[tokio::test]
async fn test_health_check_without_database_falls_back_to_memory() {
    let (status, body) = check(MockHealthService::new().with_unhealthy_database()).await;

    // Records still land in memory, so the service stays up
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["database"]["status"], "error");
    assert_eq!(body["components"]["database"]["message"], "Database pool not initialized");
    assert_eq!(body["components"]["storage"]["status"], "degraded");
}

#[tokio::test]
async fn test_health_check_reports_additional_components() {
    let service = MockHealthService::new()
        .with_component("migrations", ComponentStatus::Healthy, Some("bp_forms, dental_records".to_string()))
        .with_component("backup", ComponentStatus::Degraded, None);
    let (status, body) = check(service).await;

    assert_eq!(status, StatusCode::OK);
    let additional = &body["components"]["additional"];
    assert_eq!(additional["migrations"]["status"], "ok");
    assert_eq!(additional["migrations"]["message"], "bp_forms, dental_records");
    assert_eq!(additional["backup"]["status"], "degraded");
    assert!(additional.get("database").is_none());
}
