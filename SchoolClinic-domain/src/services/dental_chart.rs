use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use school_clinic_data::repository::{DentalRecordRepositoryTrait, RepositoryError};

use crate::entities::conversions;
use crate::entities::dental_chart::{AnnotationPatch, DentalChartError};
use crate::entities::dental_record::{CreateDentalRecordRequest, DentalRecord, ToothPatchRequest};
use crate::services::bp_form::describe_validation_errors;
use crate::services::tooth_geometry::{derive_primitives, ShapePlan};

/// Dental chart service errors
#[derive(Debug, Error)]
pub enum DentalChartServiceError {
    /// Validation error, including unknown tooth numbers and symbols
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Not found error
    #[error("Dental record not found: {0}")]
    NotFound(String),

    /// The stored chart does not decode and cannot be edited without losing it
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<DentalChartError> for DentalChartServiceError {
    fn from(err: DentalChartError) -> Self {
        match err {
            DentalChartError::Encode(msg) => DentalChartServiceError::RepositoryError(msg),
            other => DentalChartServiceError::ValidationError(other.to_string()),
        }
    }
}

/// Trait for dental chart service operations
#[async_trait]
pub trait DentalChartServiceTrait {
    /// Open a dental record with an empty chart
    async fn create_record(&self, request: CreateDentalRecordRequest) -> Result<DentalRecord, DentalChartServiceError>;

    /// Get a record with its decoded chart
    async fn get_record(&self, id: &str) -> Result<DentalRecord, DentalChartServiceError>;

    /// Apply a patch to one tooth and save the whole chart
    async fn upsert_tooth(
        &self,
        id: &str,
        tooth_number: u8,
        request: ToothPatchRequest,
    ) -> Result<DentalRecord, DentalChartServiceError>;

    /// Drawing primitives for every annotated tooth of a record, keyed by tooth number
    async fn shapes(&self, id: &str) -> Result<BTreeMap<u8, ShapePlan>, DentalChartServiceError>;
}

/// Dental chart service for domain logic
pub struct DentalChartService<R: DentalRecordRepositoryTrait> {
    repository: R,
}

impl<R: DentalRecordRepositoryTrait> DentalChartService<R> {
    /// Create a new dental chart service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> DentalChartServiceError {
        match err {
            RepositoryError::NotFound(msg) => DentalChartServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => DentalChartServiceError::ValidationError(msg),
            _ => DentalChartServiceError::RepositoryError(err.to_string()),
        }
    }

    fn not_found(id: Uuid) -> DentalChartServiceError {
        DentalChartServiceError::NotFound(format!("Dental record with ID {} not found", id))
    }
}

fn parse_id(id: &str) -> Result<Uuid, DentalChartServiceError> {
    conversions::parse_string_to_uuid(id).map_err(DentalChartServiceError::ValidationError)
}

#[async_trait]
impl<R: DentalRecordRepositoryTrait + Send + Sync> DentalChartServiceTrait for DentalChartService<R> {
    async fn create_record(&self, request: CreateDentalRecordRequest) -> Result<DentalRecord, DentalChartServiceError> {
        if let Err(errors) = request.validate() {
            return Err(DentalChartServiceError::ValidationError(describe_validation_errors(&errors)));
        }

        let data_request = conversions::convert_to_data_dental_record_request(&request)?;
        let record = self
            .repository
            .create(data_request)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        info!("Opened dental record {} for patient {}", record.id, record.patient_id);
        conversions::convert_to_domain_dental_record(record).map_err(DentalChartServiceError::RepositoryError)
    }

    async fn get_record(&self, id: &str) -> Result<DentalRecord, DentalChartServiceError> {
        let uuid = parse_id(id)?;
        let record = self
            .repository
            .get_by_id(uuid)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| Self::not_found(uuid))?;

        conversions::convert_to_domain_dental_record(record).map_err(DentalChartServiceError::RepositoryError)
    }

    async fn upsert_tooth(
        &self,
        id: &str,
        tooth_number: u8,
        request: ToothPatchRequest,
    ) -> Result<DentalRecord, DentalChartServiceError> {
        let uuid = parse_id(id)?;
        if let Err(errors) = request.validate() {
            return Err(DentalChartServiceError::ValidationError(describe_validation_errors(&errors)));
        }
        let patch = AnnotationPatch::try_from(request)?;

        let record = self.get_record(id).await?;
        if record.chart_raw.is_some() {
            warn!("Refusing to edit tooth {} on dental record {}: stored chart does not decode", tooth_number, uuid);
            return Err(DentalChartServiceError::Conflict(format!(
                "Dental record {} holds a chart that does not decode; it must be repaired before editing",
                uuid
            )));
        }
        let chart = record.chart.upsert_annotation(tooth_number, patch)?;

        let updated = self
            .repository
            .update_chart(uuid, chart.encode()?)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .ok_or_else(|| Self::not_found(uuid))?;

        info!("Updated tooth {} on dental record {}", tooth_number, uuid);
        conversions::convert_to_domain_dental_record(updated).map_err(DentalChartServiceError::RepositoryError)
    }

    async fn shapes(&self, id: &str) -> Result<BTreeMap<u8, ShapePlan>, DentalChartServiceError> {
        let record = self.get_record(id).await?;
        Ok(record
            .chart
            .annotations()
            .map(|annotation| (annotation.tooth.get(), derive_primitives(annotation)))
            .collect())
    }
}

/// Create a default dental chart service using the repository from the data layer
pub fn create_default_dental_chart_service() -> impl DentalChartServiceTrait + Send + Sync {
    let repository = school_clinic_data::repository::DentalRecordRepository::new();
    DentalChartService::new(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::dental_chart::{Design, Symbol, ToothNumber};
    use crate::services::tooth_geometry::ToothStyle;
    use school_clinic_data::repository::tests::MockDentalRecordRepository;

    async fn service_with_record() -> (DentalChartService<MockDentalRecordRepository>, String) {
        let service = DentalChartService::new(MockDentalRecordRepository::new());
        let record = service
            .create_record(CreateDentalRecordRequest {
                patient_id: "student-42".to_string(),
                remarks: None,
            })
            .await
            .unwrap();
        (service, record.id)
    }

    fn design_patch(design: Design) -> ToothPatchRequest {
        ToothPatchRequest {
            design: Some(design),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_new_record_has_empty_chart() {
        let (service, id) = service_with_record().await;
        let record = service.get_record(&id).await.unwrap();
        assert!(record.chart.is_empty());
        assert_eq!(record.patient_id, "student-42");
    }

    #[tokio::test]
    async fn test_upsert_tooth_keeps_other_fields() {
        let (service, id) = service_with_record().await;
        service.upsert_tooth(&id, 14, design_patch(Design::Filled)).await.unwrap();
        let record = service
            .upsert_tooth(
                &id,
                14,
                ToothPatchRequest {
                    symbol: Some("X".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let annotation = record.chart.get(ToothNumber::try_from(14).unwrap()).unwrap();
        assert_eq!(annotation.design, Design::Filled);
        assert_eq!(annotation.symbol, Some(Symbol::X));
    }

    #[tokio::test]
    async fn test_upsert_unknown_tooth_is_rejected() {
        let (service, id) = service_with_record().await;
        let result = service.upsert_tooth(&id, 19, design_patch(Design::Filled)).await;
        assert!(matches!(result, Err(DentalChartServiceError::ValidationError(msg)) if msg.contains("19")));
        assert!(service.get_record(&id).await.unwrap().chart.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_unknown_symbol_is_rejected() {
        let (service, id) = service_with_record().await;
        let request = ToothPatchRequest {
            symbol: Some("Crown".to_string()),
            ..Default::default()
        };
        let result = service.upsert_tooth(&id, 11, request).await;
        assert!(matches!(result, Err(DentalChartServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_unknown_record_is_not_found() {
        let service = DentalChartService::new(MockDentalRecordRepository::new());
        let missing = Uuid::new_v4().to_string();
        assert!(matches!(service.get_record(&missing).await, Err(DentalChartServiceError::NotFound(_))));
        assert!(matches!(
            service.upsert_tooth(&missing, 11, design_patch(Design::Filled)).await,
            Err(DentalChartServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_chart_reads_as_empty_and_can_be_edited() {
        let id = Uuid::new_v4();
        let service = DentalChartService::new(MockDentalRecordRepository::with_raw_chart(id, "").await);

        let record = service.get_record(&id.to_string()).await.unwrap();
        assert!(record.chart.is_empty());
        assert!(record.chart_raw.is_none());

        let record = service
            .upsert_tooth(&id.to_string(), 55, design_patch(Design::LeftDot))
            .await
            .unwrap();
        assert_eq!(record.chart.len(), 1);
    }

    #[tokio::test]
    async fn test_undecodable_chart_is_kept_and_not_overwritten() {
        // Tooth 11 is valid, tooth 14 carries a symbol outside the vocabulary
        let stored = r#"{"11":{"number":11,"type":"Permanent","design":"Filled","symbol":"X","remarks":"keep me"},"14":{"number":14,"type":"Permanent","design":"None","symbol":"Q","remarks":""}}"#;
        let id = Uuid::new_v4();
        let service = DentalChartService::new(MockDentalRecordRepository::with_raw_chart(id, stored).await);

        let record = service.get_record(&id.to_string()).await.unwrap();
        assert!(record.chart.is_empty());
        assert_eq!(record.chart_raw.as_deref(), Some(stored));

        let result = service
            .upsert_tooth(&id.to_string(), 21, design_patch(Design::LeftDot))
            .await;
        assert!(matches!(result, Err(DentalChartServiceError::Conflict(_))));

        // The stored text is untouched
        let record = service.get_record(&id.to_string()).await.unwrap();
        assert_eq!(record.chart_raw.as_deref(), Some(stored));
        assert!(service.shapes(&id.to_string()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shapes_cover_annotated_teeth() {
        let (service, id) = service_with_record().await;
        service.upsert_tooth(&id, 13, design_patch(Design::DiagonalBottom)).await.unwrap();
        service.upsert_tooth(&id, 12, design_patch(Design::None)).await.unwrap();

        let shapes = service.shapes(&id).await.unwrap();
        assert_eq!(shapes.keys().copied().collect::<Vec<_>>(), vec![12, 13]);
        assert_eq!(shapes[&13].style, ToothStyle::DualCircle);
        assert_eq!(shapes[&13].primitives.len(), 7);
        assert_eq!(shapes[&12].style, ToothStyle::Simple);
        assert_eq!(shapes[&12].primitives.len(), 3);
    }
}
