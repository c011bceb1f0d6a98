pub mod handlers;
pub mod routes;

use axum::Router;

pub use routes::{create_app, create_app_with_state, AppState};

/// Create the application router
pub async fn create_application() -> Router {
    routes::create_app().await
}
