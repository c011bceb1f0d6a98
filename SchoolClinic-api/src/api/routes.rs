use std::time::Duration;

use axum::{
    extract::FromRef,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::debug;

use crate::api::handlers::{bp_form, dental_chart, health, BpFormServiceRef, DentalChartServiceRef, HealthServiceRef};
use crate::openapi::configure_swagger_routes;

/// Services shared by the API handlers. Each handler extracts only the
/// service it needs through `FromRef`.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub bp_forms: BpFormServiceRef,
    pub dental: DentalChartServiceRef,
}

impl AppState {
    /// State backed by the SQLite repositories, or memory when no pool exists
    pub fn from_defaults() -> Self {
        Self {
            bp_forms: bp_form::create_service(),
            dental: dental_chart::create_service(),
        }
    }
}

/// Create the application router
pub async fn create_app() -> Router {
    debug!("Creating application router");
    create_app_with_state(AppState::from_defaults(), health::create_health_service())
}

/// Create the application router over the given services
pub fn create_app_with_state(state: AppState, health_service: HealthServiceRef) -> Router {
    let api_routes = Router::new()
        // Static paths before parametrized ones
        .route("/bp/classify", post(bp_form::classify_blood_pressure))
        .route("/bp-forms", get(bp_form::list_bp_forms).post(bp_form::create_bp_form))
        .route("/bp-forms/:id", get(bp_form::get_bp_form).delete(bp_form::delete_bp_form))
        .route("/bp-forms/:id/readings", post(bp_form::add_bp_reading))
        .route("/dental/layout", get(dental_chart::get_dental_layout))
        .route("/dental-records", post(dental_chart::create_dental_record))
        .route("/dental-records/:id", get(dental_chart::get_dental_record))
        .route("/dental-records/:id/teeth/:number", put(dental_chart::upsert_tooth))
        .route("/dental-records/:id/shapes", get(dental_chart::get_dental_shapes));

    debug!("API routes configured");

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .layer(Extension(health_service));

    let app = Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .with_state(state);

    let app = add_swagger_ui(app);
    debug!("Swagger UI merged");

    let app = configure_http_layers(app);

    // Initialize health check service startup time
    health::initialize_server_start_time();

    app
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    app.merge(configure_swagger_routes())
}

/// Request tracing, CORS for the clinic front end, and security headers
fn configure_http_layers(app: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    app.layer(security_headers)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Arc;

    use school_clinic_domain::testing::{
        create_mock_bp_form_service, create_mock_dental_chart_service, MockHealthService,
    };

    /// Application over mock repositories
    pub fn create_test_app() -> Router {
        let state = AppState {
            bp_forms: Arc::new(create_mock_bp_form_service()),
            dental: Arc::new(create_mock_dental_chart_service()),
        };
        create_app_with_state(state, Arc::new(MockHealthService::new()))
    }

    #[tokio::test]
    async fn test_security_headers_are_set() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let response = create_test_app()
            .oneshot(Request::builder().uri("/api/v1/dental/layout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["cache-control"], "no-store");
    }
}
