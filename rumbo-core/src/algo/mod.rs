//! Offline analysis passes over venue data

mod validation;

pub use validation::{
    Finding, Severity, ValidationReport, check_connectivity, check_key_routes,
    check_silent_segments, validate_venue,
};
