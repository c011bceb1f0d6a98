// Domain entities and value objects
pub mod bp_form;
pub mod dental_chart;
pub mod dental_record;
pub mod conversions;

// Re-export common types for easier imports
pub use bp_form::{
    BloodPressure, BloodPressureParseError, BpForm, BpFormError, BpReading, Classification, CreateBpFormRequest,
    CreateBpReadingRequest, OverallStatus, Tier, MAX_READINGS_PER_FORM,
};
pub use dental_chart::{
    AnnotationPatch, DecodedChart, DentalChart, DentalChartError, Dentition, Design, Symbol, SymbolGroup,
    ToothAnnotation, ToothNumber,
};
pub use dental_record::{CreateDentalRecordRequest, DentalRecord, ToothPatchRequest};
