//! Resource services: validation, HTTP and error normalization per resource.
//!
//! # Design
//! A service is stateless apart from its `HttpClient`. Each operation checks
//! its input locally first (validation, identifier presence) and surfaces
//! those errors verbatim; only failed round-trips go through
//! [`normalize`](crate::normalize::normalize). Successful responses are
//! decoded into typed records at this boundary, so callers never see raw
//! JSON.
//!
//! Both services share one `Endpoint` that owns the request flow; they only
//! differ in their record types and input cleanup. Departments are updated
//! with PATCH, employees with PUT, see [`Resource::update_method`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{ApiError, ValidationError};
use crate::http::{HttpClient, HttpMethod, HttpResponse};
use crate::normalize::normalize;
use crate::resource::{RecordKey, Resource};
use crate::transport::UreqTransport;
use crate::types::{
    ApiResponse, Department, DepartmentInput, DepartmentPayload, Employee, EmployeeInput,
    EmployeePayload, Identified,
};
use crate::validate::{validate_department, validate_employee};

/// CRUD operations for one resource kind.
pub trait ResourceService: Send + Sync {
    type Record: Identified + Clone + Send + Sync + 'static;
    type Input;

    fn resource(&self) -> Resource;

    /// Every record. `data` is `None` when the server sent no body.
    fn list(&self) -> Result<ApiResponse<Option<Vec<Self::Record>>>, ApiError>;

    fn get(&self, id: &RecordKey) -> Result<ApiResponse<Self::Record>, ApiError>;

    fn create(&self, input: &Self::Input) -> Result<ApiResponse<Self::Record>, ApiError>;

    fn update(
        &self,
        id: &RecordKey,
        input: &Self::Input,
    ) -> Result<ApiResponse<Self::Record>, ApiError>;

    fn delete(&self, id: &RecordKey) -> Result<ApiResponse<()>, ApiError>;
}

fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<ApiResponse<T>, ApiError> {
    let data = serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(ApiResponse {
        status: response.status,
        headers: response.headers,
        data,
    })
}

/// Like `decode`, but an empty body reads as `None`.
fn decode_optional<T: DeserializeOwned>(
    response: HttpResponse,
) -> Result<ApiResponse<Option<T>>, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(ApiResponse {
            status: response.status,
            headers: response.headers,
            data: None,
        });
    }
    decode(response)
}

fn discard(response: HttpResponse) -> ApiResponse<()> {
    ApiResponse {
        status: response.status,
        headers: response.headers,
        data: (),
    }
}

fn default_client(config: &ClientConfig) -> HttpClient {
    HttpClient::new(config, Arc::new(UreqTransport::from_config(config)))
}

/// The request flow shared by every resource.
///
/// Local checks run before anything is sent. Success is logged only once the
/// body has decoded.
#[derive(Debug, Clone)]
struct Endpoint {
    http: HttpClient,
    resource: Resource,
}

impl Endpoint {
    fn new(http: HttpClient, resource: Resource) -> Self {
        Self { http, resource }
    }

    fn require_id(&self, id: &RecordKey) -> Result<(), ApiError> {
        if id.is_present() {
            Ok(())
        } else {
            Err(ApiError::MissingIdentifier(self.resource))
        }
    }

    /// One round-trip; failures are normalized and logged under `operation`.
    fn send<B: Serialize>(
        &self,
        operation: &str,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpResponse, ApiError> {
        self.http
            .request(method, path, body)
            .map_err(|failure| normalize(failure, self.resource, operation))
    }

    fn list<T: DeserializeOwned>(&self) -> Result<ApiResponse<Option<Vec<T>>>, ApiError> {
        let plural = self.resource.plural();
        tracing::info!("Fetching {plural}...");
        let response = self.send::<()>(
            &format!("fetching {plural}"),
            HttpMethod::Get,
            self.resource.list_path(),
            None,
        )?;
        let decoded = decode_optional(response)?;
        tracing::info!(resource = %self.resource, "{plural} fetched successfully");
        Ok(decoded)
    }

    fn get<T: DeserializeOwned>(&self, id: &RecordKey) -> Result<ApiResponse<T>, ApiError> {
        self.require_id(id)?;
        let singular = self.resource.singular();
        tracing::info!("Fetching {singular} {id}...");
        let response = self.send::<()>(
            &format!("fetching {singular}"),
            HttpMethod::Get,
            &self.resource.item_path(id),
            None,
        )?;
        let decoded = decode(response)?;
        tracing::info!(%id, "{} fetched successfully", self.resource);
        Ok(decoded)
    }

    fn create<P: Serialize, T: DeserializeOwned>(
        &self,
        prepare: impl FnOnce() -> Result<P, ValidationError>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let payload = prepare()?;
        let singular = self.resource.singular();
        tracing::info!("Creating {singular}...");
        let response = self.send(
            &format!("creating {singular}"),
            HttpMethod::Post,
            self.resource.collection_path(),
            Some(&payload),
        )?;
        let decoded = decode(response)?;
        tracing::info!("{} created successfully", self.resource);
        Ok(decoded)
    }

    /// The identifier is checked before the input is validated.
    fn update<P: Serialize, T: DeserializeOwned>(
        &self,
        id: &RecordKey,
        prepare: impl FnOnce() -> Result<P, ValidationError>,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.require_id(id)?;
        let payload = prepare()?;
        let singular = self.resource.singular();
        tracing::info!("Updating {singular} {id}...");
        let response = self.send(
            &format!("updating {singular}"),
            self.resource.update_method(),
            &self.resource.item_path(id),
            Some(&payload),
        )?;
        let decoded = decode(response)?;
        tracing::info!(%id, "{} updated successfully", self.resource);
        Ok(decoded)
    }

    fn delete(&self, id: &RecordKey) -> Result<ApiResponse<()>, ApiError> {
        self.require_id(id)?;
        let singular = self.resource.singular();
        tracing::info!("Deleting {singular} {id}...");
        let response = self.send::<()>(
            &format!("deleting {singular}"),
            HttpMethod::Delete,
            &self.resource.item_path(id),
            None,
        )?;
        tracing::info!(%id, "{} deleted successfully", self.resource);
        Ok(discard(response))
    }
}

fn department_payload(input: &DepartmentInput) -> Result<DepartmentPayload, ValidationError> {
    validate_department(input)?;
    Ok(DepartmentPayload::from(input))
}

fn employee_payload(input: &EmployeeInput) -> Result<EmployeePayload, ValidationError> {
    validate_employee(input)?;
    Ok(EmployeePayload::from_validated(input))
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DepartmentService {
    endpoint: Endpoint,
}

impl DepartmentService {
    pub fn new(http: HttpClient) -> Self {
        Self {
            endpoint: Endpoint::new(http, Resource::Department),
        }
    }

    /// Service talking to the configured API over the network.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(default_client(config))
    }
}

impl ResourceService for DepartmentService {
    type Record = Department;
    type Input = DepartmentInput;

    fn resource(&self) -> Resource {
        self.endpoint.resource
    }

    fn list(&self) -> Result<ApiResponse<Option<Vec<Department>>>, ApiError> {
        self.endpoint.list()
    }

    fn get(&self, id: &RecordKey) -> Result<ApiResponse<Department>, ApiError> {
        self.endpoint.get(id)
    }

    fn create(&self, input: &DepartmentInput) -> Result<ApiResponse<Department>, ApiError> {
        self.endpoint.create(|| department_payload(input))
    }

    fn update(
        &self,
        id: &RecordKey,
        input: &DepartmentInput,
    ) -> Result<ApiResponse<Department>, ApiError> {
        self.endpoint.update(id, || department_payload(input))
    }

    fn delete(&self, id: &RecordKey) -> Result<ApiResponse<()>, ApiError> {
        self.endpoint.delete(id)
    }
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EmployeeService {
    endpoint: Endpoint,
}

impl EmployeeService {
    pub fn new(http: HttpClient) -> Self {
        Self {
            endpoint: Endpoint::new(http, Resource::Employee),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(default_client(config))
    }
}

impl ResourceService for EmployeeService {
    type Record = Employee;
    type Input = EmployeeInput;

    fn resource(&self) -> Resource {
        self.endpoint.resource
    }

    fn list(&self) -> Result<ApiResponse<Option<Vec<Employee>>>, ApiError> {
        self.endpoint.list()
    }

    fn get(&self, id: &RecordKey) -> Result<ApiResponse<Employee>, ApiError> {
        self.endpoint.get(id)
    }

    fn create(&self, input: &EmployeeInput) -> Result<ApiResponse<Employee>, ApiError> {
        self.endpoint.create(|| employee_payload(input))
    }

    fn update(
        &self,
        id: &RecordKey,
        input: &EmployeeInput,
    ) -> Result<ApiResponse<Employee>, ApiError> {
        self.endpoint.update(id, || employee_payload(input))
    }

    fn delete(&self, id: &RecordKey) -> Result<ApiResponse<()>, ApiError> {
        self.endpoint.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::http::{HttpMethod, TransportError};
    use crate::test_support::{LogBuffer, ScriptedTransport};
    use serde_json::json;

    const BASE_URL: &str = "http://localhost:8080/api";

    fn http(transport: &Arc<ScriptedTransport>) -> HttpClient {
        HttpClient::new(&ClientConfig::new(BASE_URL), transport.clone())
    }

    fn departments(transport: &Arc<ScriptedTransport>) -> DepartmentService {
        DepartmentService::new(http(transport))
    }

    fn employees(transport: &Arc<ScriptedTransport>) -> EmployeeService {
        EmployeeService::new(http(transport))
    }

    fn sent_body(transport: &ScriptedTransport) -> serde_json::Value {
        let req = transport.last_request().unwrap();
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    fn valid_employee() -> EmployeeInput {
        EmployeeInput {
            first_name: "Alan".to_string(),
            last_name: "Turing".to_string(),
            email: "alan@bletchley.uk".to_string(),
            department_id: Some(2),
        }
    }

    #[test]
    fn create_department_sends_trimmed_payload() {
        let transport = ScriptedTransport::new();
        transport.respond_json(
            201,
            json!({ "id": 1, "departmentName": "HR", "departmentDescription": "" }),
        );
        let input = DepartmentInput {
            department_name: " HR ".to_string(),
            department_description: None,
        };

        let response = departments(&transport).create(&input).unwrap();

        let req = transport.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("{BASE_URL}/departments"));
        assert_eq!(
            sent_body(&transport),
            json!({ "departmentName": "HR", "departmentDescription": "" })
        );
        assert_eq!(response.status, 201);
        assert_eq!(response.data.id, 1);
        assert_eq!(response.data.department_name, "HR");
    }

    #[test]
    fn invalid_department_never_reaches_the_network() {
        let transport = ScriptedTransport::new();
        let input = DepartmentInput {
            department_name: "A".to_string(),
            department_description: None,
        };

        let err = departments(&transport).create(&input).unwrap_err();

        assert_eq!(err, ApiError::Validation(ValidationError::DepartmentNameTooShort));
        assert_eq!(err.to_string(), "Department name must be at least 2 characters long");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn department_update_uses_patch() {
        let transport = ScriptedTransport::new();
        transport.respond_json(
            200,
            json!({ "id": 4, "departmentName": "Legal", "departmentDescription": "Contracts" }),
        );
        let input = DepartmentInput {
            department_name: "Legal".to_string(),
            department_description: Some(" Contracts ".to_string()),
        };

        departments(&transport).update(&RecordKey::Number(4), &input).unwrap();

        let req = transport.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, format!("{BASE_URL}/departments/4"));
        assert_eq!(sent_body(&transport)["departmentDescription"], "Contracts");
    }

    #[test]
    fn missing_id_is_reported_before_validation() {
        let transport = ScriptedTransport::new();
        let err = departments(&transport)
            .update(&RecordKey::Number(0), &DepartmentInput::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Department ID is required");

        let err = employees(&transport).get(&"".into()).unwrap_err();
        assert_eq!(err, ApiError::MissingIdentifier(Resource::Employee));

        let err = employees(&transport).delete(&RecordKey::Number(0)).unwrap_err();
        assert_eq!(err.to_string(), "Employee ID is required");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn list_departments_with_empty_body_has_no_data() {
        let transport = ScriptedTransport::new();
        transport.respond(200, "");
        let response = departments(&transport).list().unwrap();
        assert_eq!(response.data, None);
    }

    #[test]
    fn employee_list_uses_nested_path() {
        let transport = ScriptedTransport::new();
        transport.respond_json(
            200,
            json!([{
                "id": 9, "firstName": "Alan", "lastName": "Turing",
                "email": "alan@bletchley.uk", "departmentId": 2
            }]),
        );

        let response = employees(&transport).list().unwrap();

        let req = transport.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, format!("{BASE_URL}/employees/departments"));
        assert_eq!(response.data.unwrap()[0].first_name, "Alan");
    }

    #[test]
    fn employee_update_uses_put_with_cleaned_payload() {
        let transport = ScriptedTransport::new();
        transport.respond_json(
            200,
            json!({
                "id": 5, "firstName": "Alan", "lastName": "Turing",
                "email": "alan@bletchley.uk", "departmentId": 2
            }),
        );

        let response = employees(&transport)
            .update(&"5".into(), &valid_employee())
            .unwrap();

        let req = transport.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, format!("{BASE_URL}/employees/5"));
        assert_eq!(
            sent_body(&transport),
            json!({
                "firstName": "Alan", "lastName": "Turing",
                "email": "alan@bletchley.uk", "departmentId": 2
            })
        );
        assert_eq!(response.data.id, 5);
    }

    #[test]
    fn invalid_employee_email_is_rejected_locally() {
        let transport = ScriptedTransport::new();
        let input = EmployeeInput {
            email: "alan.bletchley.uk".to_string(),
            ..valid_employee()
        };
        let err = employees(&transport).create(&input).unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn http_errors_are_normalized_per_resource() {
        let transport = ScriptedTransport::new();
        transport.respond(404, "");
        transport.respond(404, "");
        transport.respond_json(409, json!({}));

        let err = departments(&transport).get(&RecordKey::Number(1)).unwrap_err();
        assert_eq!(err.to_string(), "Department not found");
        let err = employees(&transport).delete(&RecordKey::Number(1)).unwrap_err();
        assert_eq!(err.to_string(), "Employee not found");
        let err = employees(&transport).create(&valid_employee()).unwrap_err();
        assert_eq!(err.to_string(), "Conflict occurred");
    }

    #[test]
    fn transport_failure_becomes_network_error() {
        let transport = ScriptedTransport::new();
        transport.fail(TransportError::NoResponse("timed out".to_string()));
        let err = departments(&transport).list().unwrap_err();
        assert_eq!(err, ApiError::Network);
    }

    #[test]
    fn delete_ignores_response_body() {
        let transport = ScriptedTransport::new();
        transport.respond(200, "Department deleted successfully!");
        let response = departments(&transport).delete(&"3".into()).unwrap();
        assert_eq!(response.status, 200);
        let req = transport.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.url, format!("{BASE_URL}/departments/3"));
    }

    #[test]
    fn unexpected_success_body_is_a_decode_error() {
        let transport = ScriptedTransport::new();
        transport.respond(200, r#"{"unexpected":true}"#);
        let err = departments(&transport).get(&RecordKey::Number(1)).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "{err:?}");
    }

    #[test]
    fn padded_email_is_rejected_before_sending() {
        let transport = ScriptedTransport::new();
        let input = EmployeeInput {
            email: " alan@bletchley.uk ".to_string(),
            ..valid_employee()
        };

        let err = employees(&transport).create(&input).unwrap_err();
        assert_eq!(err, ApiError::Validation(ValidationError::InvalidEmail));
        let err = employees(&transport)
            .update(&RecordKey::Number(5), &input)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn textual_key_is_escaped_in_the_url() {
        let transport = ScriptedTransport::new();
        transport.respond(404, "");
        transport.respond(204, "");

        let err = employees(&transport).get(&"a b?c".into()).unwrap_err();
        assert_eq!(err.to_string(), "Employee not found");
        assert_eq!(
            transport.last_request().unwrap().url,
            format!("{BASE_URL}/employees/a%20b%3Fc")
        );

        departments(&transport).delete(&"7/../1".into()).unwrap();
        assert_eq!(
            transport.last_request().unwrap().url,
            format!("{BASE_URL}/departments/7%2F..%2F1")
        );
    }

    #[test]
    fn success_is_logged_only_after_decoding() {
        let transport = ScriptedTransport::new();
        transport.respond(200, r#"{"unexpected":true}"#);
        let logs = LogBuffer::default();

        let err = logs
            .capture(|| departments(&transport).get(&RecordKey::Number(1)))
            .unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)), "{err:?}");
        let output = logs.contents();
        assert!(output.contains("Fetching department 1..."), "{output}");
        assert!(!output.contains("fetched successfully"), "{output}");
    }

    #[test]
    fn decoded_list_logs_success() {
        let transport = ScriptedTransport::new();
        transport.respond(200, "[]");
        transport.respond(200, "not json");
        let logs = LogBuffer::default();

        logs.capture(|| employees(&transport).list()).unwrap();
        assert!(logs.contents().contains("employees fetched successfully"));

        let failed = LogBuffer::default();
        let err = failed
            .capture(|| employees(&transport).list())
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "{err:?}");
        assert!(!failed.contents().contains("fetched successfully"));
    }
}
