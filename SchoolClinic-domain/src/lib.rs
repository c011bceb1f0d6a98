// SchoolClinic Domain
// This crate contains the clinical rules and business logic for the school clinic

// Domain entities and value objects
pub mod entities;

// Services that implement business logic
pub mod services;

// Health checks and system status
pub mod health;

// Re-export the database module from the data crate for convenience
pub use school_clinic_data::database;

// Testing utilities - only available with mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
