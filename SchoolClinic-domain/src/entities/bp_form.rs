use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use crate::services::triage::rollup;

/// Hard cap on readings held by one BP form
pub use school_clinic_data::models::bp_form::MAX_READINGS_PER_FORM;

/// A parsed "systolic/diastolic" pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct BloodPressure {
    /// Systolic blood pressure (the higher number)
    pub systolic: u16,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: u16,
}

/// Reasons a raw BP string does not describe a reading
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BloodPressureParseError {
    #[error("blood pressure is empty")]
    Empty,

    #[error("expected \"systolic/diastolic\" with 2 or 3 digits each, got {0:?}")]
    Malformed(String),

    #[error("{0} mmHg is outside the accepted range 1-399")]
    OutOfRange(u16),
}

impl FromStr for BloodPressure {
    type Err = BloodPressureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(BloodPressureParseError::Empty);
        }

        let malformed = || BloodPressureParseError::Malformed(s.to_string());
        let (systolic, diastolic) = s.split_once('/').ok_or_else(malformed)?;

        let parse_part = |part: &str| -> Result<u16, BloodPressureParseError> {
            if !(2..=3).contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            let value = part.parse::<u16>().map_err(|_| malformed())?;
            if value == 0 || value >= 400 {
                return Err(BloodPressureParseError::OutOfRange(value));
            }
            Ok(value)
        };

        Ok(BloodPressure {
            systolic: parse_part(systolic)?,
            diastolic: parse_part(diastolic)?,
        })
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

/// Severity tier of a single reading, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum Tier {
    Normal,
    Low,
    Stage1Hypertension,
    Stage2Hypertension,
    Critical,
}

impl Tier {
    /// Advisory shown to the nurse, empty for normal readings
    pub const fn advisory(self) -> &'static str {
        match self {
            Tier::Critical => "Hypertensive Crisis: Seek emergency care!",
            Tier::Stage2Hypertension => "Stage 2 Hypertension: Monitor closely.",
            Tier::Stage1Hypertension => "Stage 1 Hypertension: Lifestyle changes recommended.",
            Tier::Low => "Low Blood Pressure: Consider medical advice.",
            Tier::Normal => "",
        }
    }

    /// Remark stored with the reading. The form rollup matches on this text.
    pub const fn remark(self) -> &'static str {
        match self {
            Tier::Critical => "Critical - Immediate medical attention required",
            Tier::Stage2Hypertension => "High BP - Consider medication or lifestyle changes",
            Tier::Stage1Hypertension => "Elevated BP - Diet and exercise advised",
            Tier::Low => "Low BP - Monitor for dizziness or fatigue",
            Tier::Normal => "Normal - BP within a healthy range",
        }
    }

    /// Ordinal severity, 0 (normal) to 4 (critical)
    pub const fn severity(self) -> u8 {
        self as u8
    }
}

/// Outcome of classifying a raw BP string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Classification {
    /// Tier, absent when no valid reading was entered
    pub tier: Option<Tier>,

    /// Advisory text, empty for normal or unrecorded readings
    pub advisory: String,

    /// Remark text to store with the reading
    pub remark: String,

    /// Ordinal severity of the tier
    pub severity: Option<u8>,
}

/// Rolled-up status of a whole BP form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum OverallStatus {
    #[serde(rename = "Critical Condition")]
    CriticalCondition,
    #[serde(rename = "High Risk")]
    HighRisk,
    #[serde(rename = "Elevated BP")]
    ElevatedBp,
    #[serde(rename = "Low BP Warning")]
    LowBpWarning,
    #[serde(rename = "Stable")]
    Stable,
}

impl OverallStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OverallStatus::CriticalCondition => "Critical Condition",
            OverallStatus::HighRisk => "High Risk",
            OverallStatus::ElevatedBp => "Elevated BP",
            OverallStatus::LowBpWarning => "Low BP Warning",
            OverallStatus::Stable => "Stable",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverallStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Critical Condition" => Ok(OverallStatus::CriticalCondition),
            "High Risk" => Ok(OverallStatus::HighRisk),
            "Elevated BP" => Ok(OverallStatus::ElevatedBp),
            "Low BP Warning" => Ok(OverallStatus::LowBpWarning),
            "Stable" => Ok(OverallStatus::Stable),
            other => Err(format!("Invalid overall status: {}", other)),
        }
    }
}

/// One recorded measurement within a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct BpReading {
    /// Unique identifier for the reading
    pub id: String,

    /// Day the reading was taken
    pub date: NaiveDate,

    /// Time of day the reading was taken
    pub time: NaiveTime,

    /// Raw "systolic/diastolic" text, empty for an incomplete reading
    pub blood_pressure: String,

    /// Attestation flag
    pub has_signature: bool,

    /// Remark from classification at recording time
    pub remarks: String,
}

impl BpReading {
    /// Parsed pressure values, if the raw text is a valid reading
    pub fn pressure(&self) -> Option<BloodPressure> {
        self.blood_pressure.parse().ok()
    }
}

/// Error raised by the BP form aggregate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BpFormError {
    #[error("a BP form holds at most {max} readings")]
    CapacityExceeded { max: usize },
}

/// A patient encounter holding up to seven readings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct BpForm {
    /// Unique identifier for the form
    pub id: String,

    /// Patient the encounter belongs to
    pub patient_id: String,

    /// When the form was opened
    pub created_at: DateTime<Utc>,

    /// Readings ordered by date and time
    pub readings: Vec<BpReading>,

    /// Rollup of the stored remarks
    pub status: OverallStatus,
}

impl BpForm {
    /// Create an empty form
    pub fn new(id: String, patient_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            patient_id,
            created_at,
            readings: Vec::new(),
            status: OverallStatus::Stable,
        }
    }

    /// Whether another reading would exceed the cap
    pub fn is_full(&self) -> bool {
        self.readings.len() >= MAX_READINGS_PER_FORM
    }

    /// Add a reading in date/time order and recompute the status.
    /// A full form is left untouched.
    pub fn add_reading(&mut self, reading: BpReading) -> Result<(), BpFormError> {
        if self.is_full() {
            return Err(BpFormError::CapacityExceeded { max: MAX_READINGS_PER_FORM });
        }

        let position = self
            .readings
            .partition_point(|r| (r.date, r.time) <= (reading.date, reading.time));
        self.readings.insert(position, reading);
        self.refresh_status();
        Ok(())
    }

    /// Recompute the status from the stored remarks
    pub fn refresh_status(&mut self) {
        self.status = rollup(self.readings.iter().map(|r| r.remarks.as_str()));
    }
}

/// Request payload for opening a new BP form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateBpFormRequest {
    /// Patient the encounter belongs to
    #[validate(length(min = 1, max = 64, message = "patient_id must be between 1 and 64 characters"))]
    pub patient_id: String,
}

/// Request payload for appending a reading to a form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateBpReadingRequest {
    pub date: NaiveDate,

    pub time: NaiveTime,

    /// "systolic/diastolic", or empty while the reading is incomplete
    #[validate(length(max = 7, message = "Blood pressure must be at most 7 characters"))]
    pub blood_pressure: String,

    #[serde(default)]
    pub has_signature: bool,
}
