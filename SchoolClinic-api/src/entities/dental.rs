use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use school_clinic_domain::entities::dental_chart::{Dentition, Design, Symbol, SymbolGroup};
use school_clinic_domain::entities::dental_record as domain;
use school_clinic_domain::services::tooth_geometry::ShapePlan;

/// One tooth of a chart in its persisted shape
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToothAnnotationResponse {
    pub number: u8,

    #[serde(rename = "type")]
    pub dentition: Dentition,

    pub design: Design,

    /// Symbol code, "" when none
    pub symbol: String,

    pub remarks: String,
}

/// Public representation of a dental record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DentalRecordResponse {
    pub id: String,

    pub patient_id: String,

    /// Annotated teeth keyed by tooth number
    pub chart: BTreeMap<String, ToothAnnotationResponse>,

    /// Stored chart text that does not decode, returned unchanged.
    /// `chart` is empty and the record cannot be edited while this is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_raw: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Request payload for opening a dental record
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDentalRecordRequest {
    #[validate(length(min = 1, max = 64, message = "patient_id must be between 1 and 64 characters"))]
    pub patient_id: String,

    #[validate(length(max = 1000, message = "Remarks must be at most 1000 characters"))]
    pub remarks: Option<String>,
}

/// Request payload for annotating one tooth. Omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ToothPatchRequest {
    pub design: Option<Design>,

    /// Symbol code such as "X" or "Ag F", "" clears it
    #[schema(example = "X")]
    pub symbol: Option<String>,

    #[validate(length(max = 1000, message = "Remarks must be at most 1000 characters"))]
    pub remarks: Option<String>,
}

/// Drawing primitives of every annotated tooth
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShapesResponse {
    pub record_id: String,

    /// Shape plans keyed by tooth number
    pub teeth: BTreeMap<String, ShapePlan>,
}

/// Upper and lower rows of one dentition, in chart order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DentitionRows {
    pub upper: Vec<u8>,
    pub lower: Vec<u8>,
}

/// One entry of the symbol legend
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SymbolLegendEntry {
    pub code: String,
    pub group: SymbolGroup,
}

/// Fixed chart layout used to draw an empty chart
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DentalLayoutResponse {
    pub primary: DentitionRows,
    pub permanent: DentitionRows,

    /// Teeth drawn with the dual-circle outline
    pub dual_circle_teeth: Vec<u8>,

    pub symbols: Vec<SymbolLegendEntry>,
}

pub fn convert_to_public_record(record: domain::DentalRecord) -> DentalRecordResponse {
    let chart = record
        .chart
        .annotations()
        .map(|annotation| {
            (
                annotation.tooth.to_string(),
                ToothAnnotationResponse {
                    number: annotation.tooth.get(),
                    dentition: annotation.tooth.dentition(),
                    design: annotation.design,
                    symbol: annotation.symbol.map(|s| s.as_code().to_string()).unwrap_or_default(),
                    remarks: annotation.remarks.clone(),
                },
            )
        })
        .collect();

    DentalRecordResponse {
        id: record.id,
        patient_id: record.patient_id,
        chart,
        chart_raw: record.chart_raw,
        remarks: record.remarks,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

pub fn convert_to_domain_record_request(request: CreateDentalRecordRequest) -> domain::CreateDentalRecordRequest {
    domain::CreateDentalRecordRequest {
        patient_id: request.patient_id,
        remarks: request.remarks,
    }
}

pub fn convert_to_domain_patch_request(request: ToothPatchRequest) -> domain::ToothPatchRequest {
    domain::ToothPatchRequest {
        design: request.design,
        symbol: request.symbol,
        remarks: request.remarks,
    }
}

pub fn dental_layout() -> DentalLayoutResponse {
    let rows = |dentition: Dentition| DentitionRows {
        upper: dentition.upper_row().to_vec(),
        lower: dentition.lower_row().to_vec(),
    };

    DentalLayoutResponse {
        primary: rows(Dentition::Primary),
        permanent: rows(Dentition::Permanent),
        dual_circle_teeth: school_clinic_domain::entities::dental_chart::DUAL_CIRCLE_TEETH.to_vec(),
        symbols: Symbol::ALL
            .into_iter()
            .map(|symbol| SymbolLegendEntry {
                code: symbol.as_code().to_string(),
                group: symbol.group(),
            })
            .collect(),
    }
}
