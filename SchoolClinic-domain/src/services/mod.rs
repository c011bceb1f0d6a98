// Domain services: the pure rule engines and the services that persist their results
pub mod triage;
pub mod tooth_geometry;
pub mod bp_form;
pub mod dental_chart;

// Re-export service traits and factory functions
pub use bp_form::{create_default_bp_form_service, BpFormService, BpFormServiceError, BpFormServiceTrait};
pub use dental_chart::{
    create_default_dental_chart_service, DentalChartService, DentalChartServiceError, DentalChartServiceTrait,
};
pub use tooth_geometry::{derive_primitives, Primitive, ShapePlan, ToothStyle};
pub use triage::{classify, classify_reading, rollup, NO_BP_RECORDED};

// Re-export mock service factories when the mock feature is enabled
#[cfg(feature = "mock")]
pub use crate::testing::{create_mock_bp_form_service, create_mock_dental_chart_service};
