pub mod health;
pub mod bp_form;
pub mod dental_chart;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use bp_form::{
    add_bp_reading, classify_blood_pressure, create_bp_form, delete_bp_form, get_bp_form, list_bp_forms,
    BpFormServiceRef,
};
pub use dental_chart::{
    create_dental_record, get_dental_layout, get_dental_record, get_dental_shapes, upsert_tooth,
    DentalChartServiceRef,
};
pub use health::{health_check, HealthServiceRef};
