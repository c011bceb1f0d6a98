// Storage models
pub mod bp_form;
pub mod dental_record;
