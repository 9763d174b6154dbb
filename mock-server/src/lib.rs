use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub department_name: String,
    pub department_description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    pub department_name: String,
    #[serde(default)]
    pub department_description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDepartment {
    pub department_name: Option<String>,
    pub department_description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBody {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// An error response: status plus a `{"message": ...}` body when there is
/// something to say.
pub struct Rejection {
    status: StatusCode,
    message: Option<String>,
}

impl Rejection {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: None,
        }
    }

    fn with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self.message {
            Some(message) => (self.status, Json(ErrorBody { message })).into_response(),
            None => self.status.into_response(),
        }
    }
}

#[derive(Default)]
pub struct Directory {
    next_department_id: i64,
    departments: BTreeMap<i64, Department>,
    next_employee_id: i64,
    employees: BTreeMap<i64, Employee>,
}

impl Directory {
    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.departments
            .values()
            .any(|d| Some(d.id) != except && d.department_name.eq_ignore_ascii_case(name))
    }

    fn check_department_ref(&self, department_id: i64) -> Result<(), Rejection> {
        if self.departments.contains_key(&department_id) {
            Ok(())
        } else {
            Err(Rejection::with_message(
                StatusCode::BAD_REQUEST,
                format!("Department {department_id} does not exist"),
            ))
        }
    }
}

pub type Db = Arc<RwLock<Directory>>;

const DUPLICATE_NAME: &str = "Department name already exists";

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Directory::default()));
    let api = Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route(
            "/departments/{id}",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
        .route("/employees", post(create_employee))
        .route("/employees/departments", get(list_employees))
        .route(
            "/employees/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- departments ---

async fn list_departments(State(db): State<Db>) -> Json<Vec<Department>> {
    let db = db.read().await;
    Json(db.departments.values().cloned().collect())
}

async fn create_department(
    State(db): State<Db>,
    Json(input): Json<CreateDepartment>,
) -> Result<(StatusCode, Json<Department>), Rejection> {
    let name = input.department_name.trim();
    if name.is_empty() {
        return Err(Rejection::with_message(
            StatusCode::BAD_REQUEST,
            "Department name is required",
        ));
    }
    let mut db = db.write().await;
    if db.name_taken(name, None) {
        return Err(Rejection::with_message(StatusCode::CONFLICT, DUPLICATE_NAME));
    }
    db.next_department_id += 1;
    let department = Department {
        id: db.next_department_id,
        department_name: name.to_string(),
        department_description: input.department_description.trim().to_string(),
    };
    db.departments.insert(department.id, department.clone());
    tracing::info!(id = department.id, "created department");
    Ok((StatusCode::CREATED, Json(department)))
}

async fn get_department(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Department>, Rejection> {
    let db = db.read().await;
    db.departments
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(Rejection::not_found)
}

async fn update_department(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<PatchDepartment>,
) -> Result<Json<Department>, Rejection> {
    let mut db = db.write().await;
    if !db.departments.contains_key(&id) {
        return Err(Rejection::not_found());
    }
    if let Some(name) = &input.department_name {
        if db.name_taken(name.trim(), Some(id)) {
            return Err(Rejection::with_message(StatusCode::CONFLICT, DUPLICATE_NAME));
        }
    }
    let department = db.departments.get_mut(&id).ok_or_else(Rejection::not_found)?;
    if let Some(name) = input.department_name {
        department.department_name = name.trim().to_string();
    }
    if let Some(description) = input.department_description {
        department.department_description = description.trim().to_string();
    }
    Ok(Json(department.clone()))
}

async fn delete_department(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Rejection> {
    let mut db = db.write().await;
    db.departments
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(Rejection::not_found)
}

// --- employees ---

async fn list_employees(State(db): State<Db>) -> Json<Vec<Employee>> {
    let db = db.read().await;
    Json(db.employees.values().cloned().collect())
}

async fn create_employee(
    State(db): State<Db>,
    Json(input): Json<EmployeeBody>,
) -> Result<(StatusCode, Json<Employee>), Rejection> {
    let mut db = db.write().await;
    db.check_department_ref(input.department_id)?;
    db.next_employee_id += 1;
    let employee = Employee {
        id: db.next_employee_id,
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email,
        department_id: input.department_id,
    };
    db.employees.insert(employee.id, employee.clone());
    tracing::info!(id = employee.id, "created employee");
    Ok((StatusCode::CREATED, Json(employee)))
}

async fn get_employee(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Employee>, Rejection> {
    let db = db.read().await;
    db.employees
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(Rejection::not_found)
}

async fn update_employee(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<EmployeeBody>,
) -> Result<Json<Employee>, Rejection> {
    let mut db = db.write().await;
    if !db.employees.contains_key(&id) {
        return Err(Rejection::not_found());
    }
    db.check_department_ref(input.department_id)?;
    let employee = Employee {
        id,
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email,
        department_id: input.department_id,
    };
    db.employees.insert(id, employee.clone());
    Ok(Json(employee))
}

async fn delete_employee(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode, Rejection> {
    let mut db = db.write().await;
    db.employees
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(Rejection::not_found)
}
