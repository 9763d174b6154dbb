//! Turns transport and HTTP failures into a single `ApiError`.
//!
//! Both services route every failed round-trip through [`normalize`]; the
//! only per-resource differences are the 404 and 409 fallback texts.

use crate::error::ApiError;
use crate::http::Failure;
use crate::resource::Resource;

/// Map a failed round-trip to the error surfaced to callers.
///
/// `operation` is a human label ("creating department") used for logging
/// only; it never appears in the returned message.
pub fn normalize(failure: Failure, resource: Resource, operation: &str) -> ApiError {
    tracing::error!(resource = resource.name(), ?failure, "Error {operation}");

    match failure {
        Failure::Response { status, body } => {
            let body_message = body_message(body.as_ref());
            let message = match status {
                400 => body_message.unwrap_or_else(|| "Invalid request data".to_string()),
                401 => "Unauthorized access".to_string(),
                403 => "Access forbidden".to_string(),
                404 => format!("{resource} not found"),
                409 => body_message.unwrap_or_else(|| resource.conflict_message().to_string()),
                500 => "Internal server error. Please try again later.".to_string(),
                _ => body_message.unwrap_or_else(|| format!("Server error: {status}")),
            };
            ApiError::Http { status, message }
        }
        Failure::Request(_) => ApiError::Network,
        Failure::Other(message) => ApiError::Unknown(
            message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "An unexpected error occurred".to_string()),
        ),
    }
}

/// A non-empty `message` string field of a JSON error body.
fn body_message(body: Option<&serde_json::Value>) -> Option<String> {
    body?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
