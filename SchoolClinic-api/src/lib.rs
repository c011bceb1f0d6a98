// SchoolClinic-api lib.rs
//
// HTTP surface of the school clinic services: BP forms, dental records and health.

// Public modules
pub mod api;
pub mod entities;
pub mod openapi;

pub use api::{create_app_with_state, create_application, AppState};
