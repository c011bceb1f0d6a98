use serde::{Deserialize, Serialize};

/// Storage model for a dental record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DentalRecord {
    /// Unique identifier for the record
    pub id: String,

    /// Patient the record belongs to
    pub patient_id: String,

    /// Encoded dental chart. Legacy rows may hold an empty or non-JSON value.
    pub chart: String,

    /// Optional free-text remarks on the whole record
    pub remarks: Option<String>,

    /// RFC 3339 creation timestamp
    pub created_at: String,

    /// RFC 3339 timestamp of the last chart save
    pub updated_at: String,
}

/// Input data for creating a dental record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDentalRecordRequest {
    pub patient_id: String,
    pub chart: String,
    pub remarks: Option<String>,
}
