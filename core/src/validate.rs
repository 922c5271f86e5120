//! Pre-flight checks on form input.
//!
//! Both create and update run `validate_user` before a request is built, so
//! invalid input never costs a network round-trip.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Field, ValidationError};

/// Accepts one or more alphabetic characters and nothing else.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    /// Letters only, at least one.
    static REGEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\p{Alphabetic}+$").expect("valid regex"));

    if name.is_empty() {
        return Err(ValidationError {
            field: Field::Name,
            reason: "must not be empty",
        });
    }
    if !REGEX.is_match(name) {
        return Err(ValidationError {
            field: Field::Name,
            reason: "must contain letters only",
        });
    }
    Ok(())
}

/// Accepts `local@domain.tld` shaped addresses without whitespace.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    /// `<non-ws>+@<non-ws>+.<non-ws>+`, anchored.
    static REGEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid regex"));

    if email.is_empty() {
        return Err(ValidationError {
            field: Field::Email,
            reason: "must not be empty",
        });
    }
    if !REGEX.is_match(email) {
        return Err(ValidationError {
            field: Field::Email,
            reason: "must look like name@domain.tld with no spaces",
        });
    }
    Ok(())
}

/// Checks the name first, then the email.
pub fn validate_user(name: &str, email: &str) -> Result<(), ValidationError> {
    validate_name(name)?;
    validate_email(email)
}
