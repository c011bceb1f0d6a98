use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::dental_chart::{parse_symbol_field, AnnotationPatch, DentalChart, DentalChartError, Design};

/// A patient's dental record with its decoded chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DentalRecord {
    pub id: String,
    pub patient_id: String,
    pub chart: DentalChart,
    /// Stored chart text that did not decode. The chart is empty and
    /// read-only while this is set, so the stored text is never overwritten.
    pub chart_raw: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for opening a dental record
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateDentalRecordRequest {
    #[validate(length(min = 1, max = 64, message = "patient_id must be between 1 and 64 characters"))]
    pub patient_id: String,

    #[validate(length(max = 1000, message = "Remarks must be at most 1000 characters"))]
    pub remarks: Option<String>,
}

/// Request payload for annotating one tooth. Omitted fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ToothPatchRequest {
    pub design: Option<Design>,

    /// Symbol code, "" clears the symbol
    #[validate(length(max = 32, message = "Symbol must be at most 32 characters"))]
    pub symbol: Option<String>,

    #[validate(length(max = 1000, message = "Remarks must be at most 1000 characters"))]
    pub remarks: Option<String>,
}

impl TryFrom<ToothPatchRequest> for AnnotationPatch {
    type Error = DentalChartError;

    fn try_from(request: ToothPatchRequest) -> Result<Self, Self::Error> {
        let symbol = request.symbol.as_deref().map(parse_symbol_field).transpose()?;
        Ok(AnnotationPatch {
            design: request.design,
            symbol,
            remarks: request.remarks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::dental_chart::Symbol;

    #[test]
    fn test_patch_request_converts_symbol_codes() {
        let request = ToothPatchRequest {
            design: Some(Design::RightDot),
            symbol: Some("ZnO F".to_string()),
            remarks: None,
        };
        let patch = AnnotationPatch::try_from(request).unwrap();
        assert_eq!(patch, AnnotationPatch::design(Design::RightDot).with_symbol(Some(Symbol::ZnOF)));
    }

    #[test]
    fn test_patch_request_empty_symbol_clears() {
        let request = ToothPatchRequest {
            symbol: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(AnnotationPatch::try_from(request).unwrap(), AnnotationPatch::symbol(None));

        let untouched = AnnotationPatch::try_from(ToothPatchRequest::default()).unwrap();
        assert_eq!(untouched, AnnotationPatch::default());
    }

    #[test]
    fn test_patch_request_rejects_unknown_symbol() {
        let request = ToothPatchRequest {
            symbol: Some("Crown".to_string()),
            ..Default::default()
        };
        assert_eq!(
            AnnotationPatch::try_from(request),
            Err(DentalChartError::UnknownSymbol("Crown".to_string()))
        );
    }

    #[test]
    fn test_create_request_requires_patient() {
        let request = CreateDentalRecordRequest {
            patient_id: String::new(),
            remarks: None,
        };
        assert!(request.validate().is_err());
    }
}
