use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use school_clinic_data::repository::{BpFormRepositoryTrait, RepositoryError};

use crate::entities::bp_form::{
    BloodPressure, BloodPressureParseError, BpForm, BpFormError, BpReading, Classification,
    CreateBpFormRequest, CreateBpReadingRequest,
};
use crate::entities::conversions;
use crate::services::triage::classify_reading;

/// BP form service errors
#[derive(Debug, Error)]
pub enum BpFormServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Not found error
    #[error("BP form not found: {0}")]
    NotFound(String),

    /// The form already holds the maximum number of readings
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<BpFormError> for BpFormServiceError {
    fn from(err: BpFormError) -> Self {
        BpFormServiceError::CapacityExceeded(err.to_string())
    }
}

/// Flatten validator errors into one "field: message" string
pub(crate) fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            format!("{}: {}", field, error_msgs.join(", "))
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Trait for BP form service operations
#[async_trait]
pub trait BpFormServiceTrait {
    /// Classify a raw "systolic/diastolic" string without storing anything
    fn classify(&self, blood_pressure: &str) -> Classification;

    /// Open a new, empty form for a patient
    async fn create_form(&self, request: CreateBpFormRequest) -> Result<BpForm, BpFormServiceError>;

    /// Get a form with its readings and status
    async fn get_form(&self, id: &str) -> Result<BpForm, BpFormServiceError>;

    /// List the forms of one patient
    async fn list_forms(&self, patient_id: &str) -> Result<Vec<BpForm>, BpFormServiceError>;

    /// Classify and append a reading, returning the updated form
    async fn add_reading(&self, form_id: &str, request: CreateBpReadingRequest) -> Result<BpForm, BpFormServiceError>;

    /// Delete a form together with its readings
    async fn delete_form(&self, id: &str) -> Result<(), BpFormServiceError>;
}

/// BP form service for domain logic
pub struct BpFormService<R: BpFormRepositoryTrait> {
    repository: R,
}

impl<R: BpFormRepositoryTrait> BpFormService<R> {
    /// Create a new BP form service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> BpFormServiceError {
        match err {
            RepositoryError::NotFound(msg) => BpFormServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => BpFormServiceError::ValidationError(msg),
            RepositoryError::CapacityExceeded(msg) => BpFormServiceError::CapacityExceeded(msg),
            _ => BpFormServiceError::RepositoryError(err.to_string()),
        }
    }

    fn validate_reading_request(&self, request: &CreateBpReadingRequest) -> Result<(), BpFormServiceError> {
        if let Err(errors) = request.validate() {
            return Err(BpFormServiceError::ValidationError(describe_validation_errors(&errors)));
        }

        // An empty value is an incomplete reading and is kept
        match request.blood_pressure.parse::<BloodPressure>() {
            Ok(_) | Err(BloodPressureParseError::Empty) => Ok(()),
            Err(e) => Err(BpFormServiceError::ValidationError(format!("blood_pressure: {}", e))),
        }
    }

    async fn load_form(&self, id: Uuid) -> Result<BpForm, BpFormServiceError> {
        let record = self
            .repository
            .get_form(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| BpFormServiceError::NotFound(format!("BP form with ID {} not found", id)))?;

        conversions::convert_to_domain_form(record).map_err(BpFormServiceError::RepositoryError)
    }
}

fn parse_id(id: &str) -> Result<Uuid, BpFormServiceError> {
    conversions::parse_string_to_uuid(id).map_err(BpFormServiceError::ValidationError)
}

#[async_trait]
impl<R: BpFormRepositoryTrait + Send + Sync> BpFormServiceTrait for BpFormService<R> {
    fn classify(&self, blood_pressure: &str) -> Classification {
        classify_reading(blood_pressure)
    }

    async fn create_form(&self, request: CreateBpFormRequest) -> Result<BpForm, BpFormServiceError> {
        if let Err(errors) = request.validate() {
            return Err(BpFormServiceError::ValidationError(describe_validation_errors(&errors)));
        }

        let data_request = conversions::convert_to_data_form_request(&request);
        let record = self
            .repository
            .create_form(data_request)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("Opened BP form {} for patient {}", record.id, record.patient_id);
        conversions::convert_to_domain_form(record).map_err(BpFormServiceError::RepositoryError)
    }

    async fn get_form(&self, id: &str) -> Result<BpForm, BpFormServiceError> {
        let id = parse_id(id)?;
        self.load_form(id).await
    }

    async fn list_forms(&self, patient_id: &str) -> Result<Vec<BpForm>, BpFormServiceError> {
        let records = self
            .repository
            .list_forms(patient_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        records
            .into_iter()
            .map(conversions::convert_to_domain_form)
            .collect::<Result<Vec<_>, _>>()
            .map_err(BpFormServiceError::RepositoryError)
    }

    async fn add_reading(&self, form_id: &str, request: CreateBpReadingRequest) -> Result<BpForm, BpFormServiceError> {
        let id = parse_id(form_id)?;
        self.validate_reading_request(&request)?;

        let mut form = self.load_form(id).await?;
        let classification = classify_reading(&request.blood_pressure);
        debug!("Classified reading for form {}: {:?}", id, classification.tier);

        // Storage enforces the cap again under its own lock
        if let Err(e) = form.add_reading(BpReading {
            id: String::new(),
            date: request.date,
            time: request.time,
            blood_pressure: request.blood_pressure.clone(),
            has_signature: request.has_signature,
            remarks: classification.remark.clone(),
        }) {
            warn!("Rejected reading for BP form {}: {}", id, e);
            return Err(e.into());
        }

        let data_request = conversions::convert_to_data_reading_request(&request, &classification.remark);
        self.repository
            .add_reading(id, data_request, form.status.to_string())
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("Added reading to BP form {}, status is now {}", id, form.status);
        self.load_form(id).await
    }

    async fn delete_form(&self, id: &str) -> Result<(), BpFormServiceError> {
        let uuid = parse_id(id)?;
        let deleted = self
            .repository
            .delete_form(uuid)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if deleted {
            info!("Deleted BP form {}", uuid);
            Ok(())
        } else {
            Err(BpFormServiceError::NotFound(format!("BP form with ID {} not found", id)))
        }
    }
}

/// Create a default BP form service using the repository from the data layer
pub fn create_default_bp_form_service() -> impl BpFormServiceTrait + Send + Sync {
    let repository = school_clinic_data::repository::BpFormRepository::new();
    BpFormService::new(repository)
}
