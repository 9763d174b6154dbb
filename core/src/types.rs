//! Request and response schemas for the departments and employees endpoints.
//!
//! # Design
//! Field names follow the backend's camelCase JSON. Input types are what a
//! caller hands to a service; payload types are what actually goes on the
//! wire after validation and cleanup. Records are what comes back.

use serde::{Deserialize, Serialize};

/// A record that carries a server-assigned numeric id.
pub trait Identified {
    fn id(&self) -> i64;
}

/// A department as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub department_name: String,
    #[serde(default)]
    pub department_description: String,
}

impl Identified for Department {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Caller input for creating or updating a department.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentInput {
    pub department_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_description: Option<String>,
}

/// Cleaned department body sent to the server: trimmed, description defaulted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPayload {
    pub department_name: String,
    pub department_description: String,
}

impl From<&DepartmentInput> for DepartmentPayload {
    fn from(input: &DepartmentInput) -> Self {
        Self {
            department_name: input.department_name.trim().to_string(),
            department_description: input
                .department_description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// An employee as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: i64,
}

impl Identified for Employee {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Caller input for creating or updating an employee.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub department_id: Option<i64>,
}

/// Cleaned employee body sent to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: i64,
}

impl EmployeePayload {
    /// Only meaningful after validation has confirmed `department_id` is set
    /// and the email carries no surrounding whitespace.
    pub(crate) fn from_validated(input: &EmployeeInput) -> Self {
        Self {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email: input.email.clone(),
            department_id: input.department_id.unwrap_or_default(),
        }
    }
}

/// A successful response: status, headers and the decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub data: T,
}
