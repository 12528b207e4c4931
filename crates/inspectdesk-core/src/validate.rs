//! Submit-time field validation.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9+\-\s()]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("please fill in all required information (missing: {})", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{section} is marked present but no details were given")]
    EmptySection { section: &'static str },
    #[error("please enter a valid email address: {0}")]
    InvalidEmail(String),
    #[error("please enter a valid phone number: {0}")]
    InvalidPhone(String),
}

/// Fail with every `(name, value)` pair whose value is blank.
pub fn require(fields: &[(&'static str, &str)]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

/// An active conditional section must carry at least one detail value.
pub fn require_any(section: &'static str, values: &[&str]) -> Result<(), ValidationError> {
    if values.iter().any(|v| !v.trim().is_empty()) {
        Ok(())
    } else {
        Err(ValidationError::EmptySection { section })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}
