// Public entities for the SchoolClinic API
// These are the shapes exchanged across the HTTP boundary

// BP forms and classification
pub mod bp_form;

// Dental records, charts and layout
pub mod dental;

// Common entities for error handling
pub mod common;
