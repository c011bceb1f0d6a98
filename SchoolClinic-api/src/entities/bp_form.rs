use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use school_clinic_domain::entities::bp_form as domain;

/// Public representation of one BP reading
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BpReadingResponse {
    /// Unique identifier for the reading
    pub id: String,

    /// Day the reading was taken
    pub date: NaiveDate,

    /// Time of day the reading was taken
    pub time: NaiveTime,

    /// "systolic/diastolic" as entered, empty for an incomplete reading
    pub blood_pressure: String,

    /// Attestation flag
    pub has_signature: bool,

    /// Remark recorded with the reading
    pub remarks: String,
}

/// Public representation of a BP form
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BpFormResponse {
    pub id: String,

    pub patient_id: String,

    /// Overall status, e.g. "Elevated BP"
    pub status: String,

    pub created_at: DateTime<Utc>,

    /// Readings ordered by date and time
    pub readings: Vec<BpReadingResponse>,

    /// Whether the form has reached its reading limit
    pub is_full: bool,
}

/// Request payload for classifying a BP string. Any string is accepted;
/// input that is not a reading classifies as "No BP recorded".
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassifyRequest {
    /// "systolic/diastolic", e.g. "120/80"
    #[schema(example = "120/80")]
    #[serde(default)]
    pub blood_pressure: String,
}

/// Classification of one BP string
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassificationResponse {
    /// Tier name, absent when the input is not a reading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<domain::Tier>,

    /// Advisory for the nurse, empty for normal readings
    pub advisory: String,

    /// Remark that would be stored with the reading
    pub remark: String,

    /// Ordinal severity, 0 (normal) to 4 (critical)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
}

/// Request payload for opening a BP form
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBpFormRequest {
    #[validate(length(min = 1, max = 64, message = "patient_id must be between 1 and 64 characters"))]
    pub patient_id: String,
}

/// Request payload for appending a reading
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateBpReadingRequest {
    #[schema(example = "2024-05-01")]
    pub date: NaiveDate,

    #[schema(example = "08:30:00")]
    pub time: NaiveTime,

    /// "systolic/diastolic", or empty to save an incomplete reading
    #[schema(example = "120/80")]
    #[validate(length(max = 7, message = "Blood pressure must be at most 7 characters"))]
    #[serde(default)]
    pub blood_pressure: String,

    #[serde(default)]
    pub has_signature: bool,
}

/// Query parameters for listing forms
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListFormsQuery {
    /// Patient whose forms are listed
    pub patient_id: String,
}

pub fn convert_to_public_form(form: domain::BpForm) -> BpFormResponse {
    let is_full = form.is_full();
    BpFormResponse {
        id: form.id,
        patient_id: form.patient_id,
        status: form.status.to_string(),
        created_at: form.created_at,
        readings: form
            .readings
            .into_iter()
            .map(|r| BpReadingResponse {
                id: r.id,
                date: r.date,
                time: r.time,
                blood_pressure: r.blood_pressure,
                has_signature: r.has_signature,
                remarks: r.remarks,
            })
            .collect(),
        is_full,
    }
}

pub fn convert_to_public_classification(classification: domain::Classification) -> ClassificationResponse {
    ClassificationResponse {
        tier: classification.tier,
        advisory: classification.advisory,
        remark: classification.remark,
        severity: classification.severity,
    }
}

pub fn convert_to_domain_form_request(request: CreateBpFormRequest) -> domain::CreateBpFormRequest {
    domain::CreateBpFormRequest {
        patient_id: request.patient_id,
    }
}

pub fn convert_to_domain_reading_request(request: CreateBpReadingRequest) -> domain::CreateBpReadingRequest {
    domain::CreateBpReadingRequest {
        date: request.date,
        time: request.time,
        blood_pressure: request.blood_pressure,
        has_signature: request.has_signature,
    }
}
