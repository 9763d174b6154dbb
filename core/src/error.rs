//! Error types for the employee management client.
//!
//! # Design
//! The `Display` text of every variant is the message shown to the user, so
//! a store can record `err.to_string()` directly. Validation and missing-id
//! errors are raised locally and never pass through the normalizer; the
//! remaining variants are only ever produced by `normalize::normalize`.

use thiserror::Error;

use crate::resource::Resource;

/// A pre-flight validation rule that an input record failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Department name is required")]
    DepartmentNameRequired,

    #[error("Department name must be at least 2 characters long")]
    DepartmentNameTooShort,

    #[error("Department name cannot exceed 100 characters")]
    DepartmentNameTooLong,

    #[error("Department description cannot exceed 500 characters")]
    DepartmentDescriptionTooLong,

    #[error("First name is required")]
    FirstNameRequired,

    #[error("Last name is required")]
    LastNameRequired,

    #[error("Email is required")]
    EmailRequired,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Department is required")]
    DepartmentRequired,
}

/// Errors returned by services and stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The input record failed validation; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An operation that targets one record was called without an id.
    #[error("{0} ID is required")]
    MissingIdentifier(Resource),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request was sent but no response arrived.
    #[error("Network error. Please check your connection.")]
    Network,

    /// The request could not be built or sent.
    #[error("{0}")]
    Unknown(String),

    /// A 2xx response body did not match the expected schema.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status for server-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_user_facing_message() {
        assert_eq!(
            ApiError::from(ValidationError::DepartmentNameTooShort).to_string(),
            "Department name must be at least 2 characters long"
        );
        assert_eq!(
            ApiError::MissingIdentifier(Resource::Employee).to_string(),
            "Employee ID is required"
        );
        assert_eq!(
            ApiError::Network.to_string(),
            "Network error. Please check your connection."
        );
    }

    #[test]
    fn not_found_is_detected_by_status() {
        let err = ApiError::Http {
            status: 404,
            message: "Department not found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!ApiError::Network.is_not_found());
    }
}
