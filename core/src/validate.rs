//! Pre-flight checks run before any create or update request.
//!
//! Fail-fast: rules are checked in a fixed order and the first violation is
//! returned.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::types::{DepartmentInput, EmployeeInput};

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 500;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

pub fn validate_department(input: &DepartmentInput) -> Result<(), ValidationError> {
    let name = input.department_name.trim();
    if name.is_empty() {
        return Err(ValidationError::DepartmentNameRequired);
    }
    let name_len = name.chars().count();
    if name_len < NAME_MIN_CHARS {
        return Err(ValidationError::DepartmentNameTooShort);
    }
    if name_len > NAME_MAX_CHARS {
        return Err(ValidationError::DepartmentNameTooLong);
    }
    if let Some(description) = &input.department_description {
        if description.trim().chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(ValidationError::DepartmentDescriptionTooLong);
        }
    }
    Ok(())
}

pub fn validate_employee(input: &EmployeeInput) -> Result<(), ValidationError> {
    if input.first_name.trim().is_empty() {
        return Err(ValidationError::FirstNameRequired);
    }
    if input.last_name.trim().is_empty() {
        return Err(ValidationError::LastNameRequired);
    }
    if input.email.trim().is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    // Shape is checked on the raw value: surrounding whitespace is invalid.
    if !email_regex().is_match(&input.email) {
        return Err(ValidationError::InvalidEmail);
    }
    match input.department_id {
        Some(id) if id != 0 => Ok(()),
        _ => Err(ValidationError::DepartmentRequired),
    }
}
