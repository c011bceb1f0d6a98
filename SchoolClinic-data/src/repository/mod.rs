// Repository module structure
pub mod errors;
mod bp_form;
mod dental_record;
mod in_memory;
mod storage;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use bp_form::{BpFormRepository, BpFormRepositoryTrait};
pub use dental_record::{DentalRecordRepository, DentalRecordRepositoryTrait};

// Re-export mock repositories for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    pub use super::bp_form::tests::MockBpFormRepository;
    pub use super::dental_record::tests::MockDentalRecordRepository;
}
