use serde::{Deserialize, Serialize};

/// Most readings a stored form may hold
pub const MAX_READINGS_PER_FORM: usize = 7;

/// Storage model for a single BP reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpReadingRecord {
    /// Unique identifier for the reading
    pub id: String,

    /// Owning form
    pub form_id: String,

    /// Calendar date, `YYYY-MM-DD`
    pub date: String,

    /// Time of day, `HH:MM:SS`
    pub time: String,

    /// Raw "systolic/diastolic" text as entered, may be empty
    pub blood_pressure: String,

    /// Remark produced by classification when the reading was recorded
    pub remarks: String,

    /// Attestation flag
    pub has_signature: bool,
}

/// Storage model for a BP form and its readings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BpFormRecord {
    /// Unique identifier for the form
    pub id: String,

    /// Patient the encounter belongs to
    pub patient_id: String,

    /// Rolled-up status text
    pub status: String,

    /// RFC 3339 creation timestamp
    pub created_at: String,

    /// Readings ordered by date and time
    pub readings: Vec<BpReadingRecord>,
}

/// Input data for creating a new BP form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBpFormRequest {
    /// Patient the encounter belongs to
    pub patient_id: String,

    /// Initial status text
    pub status: String,
}

/// Input data for appending a reading to a form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBpReadingRequest {
    pub date: String,
    pub time: String,
    pub blood_pressure: String,
    pub remarks: String,
    pub has_signature: bool,
}
