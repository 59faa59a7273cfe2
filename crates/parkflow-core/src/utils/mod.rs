//! Utility functions for money formatting and input validation.

pub mod format;
pub mod validate;

pub use format::{format_minor, parse_major, truncate_string};
pub use validate::{is_valid_email, validate_password, validate_plate, MIN_PASSWORD_LEN};
