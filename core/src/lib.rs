//! Client core for the employee management REST API.
//!
//! # Overview
//! Data access and cached state for two resources, departments and
//! employees. Services validate input, call the API and normalize failures
//! into one error type; stores wrap services and keep an observable
//! in-memory mirror of server state for UI code.
//!
//! # Design
//! - `HttpClient` builds plain-data `HttpRequest` values and hands them to a
//!   `Transport`; `UreqTransport` does the real I/O, tests script their own.
//! - Every failed round-trip passes through `normalize::normalize`, so all
//!   callers see the same messages for the same failures.
//! - Stores are explicit objects built around an injected service, not
//!   globals, and notify subscribers after each state change.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod config;
pub mod error;
pub mod http;
pub mod normalize;
pub mod resource;
pub mod service;
pub mod store;
pub mod transport;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ClientConfig;
pub use error::{ApiError, ValidationError};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use resource::{RecordKey, Resource};
pub use service::{DepartmentService, EmployeeService, ResourceService};
pub use store::{DepartmentStore, EmployeeStore, FailurePolicy, Store, StoreState, SubscriptionId};
pub use transport::UreqTransport;
pub use types::{
    ApiResponse, Department, DepartmentInput, DepartmentPayload, Employee, EmployeeInput,
    EmployeePayload, Identified,
};
