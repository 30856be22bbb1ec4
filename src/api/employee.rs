use crate::{
    auth::auth::AuthUser,
    error::{ApiError, ApiResult, created, ok},
    model::employee::{BankDetails, Employee, EmploymentStatus, OfficialDetails, SalaryStructure},
    repo::{self, employee::EMPLOYEE_COLUMNS},
    utils::db_utils::{
        ColumnMap, SqlValue, bind_values, build_update_sql, contains_pattern, execute_update,
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::api::payroll::EmployeePath;

/// JSON keys accepted by the partial update, with their columns.
const UPDATABLE_COLUMNS: ColumnMap<'static> = &[
    ("employeeCode", "employee_code"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("email", "email"),
    ("phoneNumber", "phone_number"),
    ("department", "department"),
    ("designation", "designation"),
    ("employeeType", "employee_type"),
    ("joiningDate", "joining_date"),
    ("bankName", "bank_name"),
    ("branchName", "branch_name"),
    ("accountHolderName", "account_holder_name"),
    ("accountNumber", "account_number"),
    ("ifscCode", "ifsc_code"),
    ("accountType", "account_type"),
    ("basic", "basic"),
    ("hra", "hra"),
    ("medicalAllowance", "medical_allowance"),
    ("conveyanceAllowance", "conveyance_allowance"),
    ("otherAllowances", "other_allowances"),
    ("deductions", "deductions"),
    ("ctc", "ctc"),
    ("employmentStatus", "employment_status"),
];

/// Nested objects whose fields are updated in place.
const NESTED_SECTIONS: [&str; 3] = ["officialDetails", "bankDetails", "salary"];

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "EMP-001")]
    pub employee_code: Option<String>,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: Option<String>,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub official_details: OfficialDetails,
    #[serde(default)]
    pub bank_details: BankDetails,
    #[serde(default)]
    pub salary: SalaryStructure,
    pub employment_status: Option<EmploymentStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Page number
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
    /// Filter by department
    pub department: Option<String>,
    /// Filter by employment status
    pub status: Option<String>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 10)]
    pub total: i64,
}

/// Lifts `officialDetails`, `bankDetails` and `salary` fields to the top level.
fn flatten_update(body: &Value) -> ApiResult<Value> {
    let obj = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Payload must be a JSON object"))?;

    let mut flat = Map::new();
    for (key, value) in obj {
        if NESTED_SECTIONS.contains(&key.as_str()) {
            let section = value
                .as_object()
                .ok_or_else(|| ApiError::bad_request(format!("`{key}` must be an object")))?;
            flat.extend(section.iter().map(|(k, v)| (k.clone(), v.clone())));
        } else {
            flat.insert(key.clone(), value.clone());
        }
    }

    if let Some(status) = flat.get("employmentStatus") {
        let valid = status
            .as_str()
            .is_some_and(|s| s.parse::<EmploymentStatus>().is_ok());
        if !valid {
            return Err(ApiError::bad_request(format!("Invalid employment status {status}")));
        }
    }

    Ok(Value::Object(flat))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Employee),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Employee code or email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let o = &payload.official_details;
    let b = &payload.bank_details;
    let s = &payload.salary;
    let status = payload.employment_status.unwrap_or(EmploymentStatus::Active);

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, phone_number,
         department, designation, employee_type, joining_date,
         bank_name, branch_name, account_holder_name, account_number, ifsc_code, account_type,
         basic, hra, medical_allowance, conveyance_allowance, other_allowances, deductions, ctc,
         employment_status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.employee_code)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone_number)
    .bind(&o.department)
    .bind(&o.designation)
    .bind(&o.employee_type)
    .bind(o.joining_date)
    .bind(&b.bank_name)
    .bind(&b.branch_name)
    .bind(&b.account_holder_name)
    .bind(&b.account_number)
    .bind(&b.ifsc_code)
    .bind(&b.account_type)
    .bind(s.basic)
    .bind(s.hra)
    .bind(s.medical_allowance)
    .bind(s.conveyance_allowance)
    .bind(s.other_allowances)
    .bind(s.deductions)
    .bind(s.ctc)
    .bind(status.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        ApiError::on_unique_violation(e, || {
            ApiError::Conflict("Employee code or email already exists".into())
        })
    })?;

    let id = result.last_insert_id();
    info!(employee_id = id, by = %auth.username, "Employee created");

    let employee = repo::employee::find_employee(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(created(employee, "Employee created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings = Vec::new();

    if let Some(department) = &query.department {
        conditions.push("department = ?");
        bindings.push(SqlValue::String(department.clone()));
    }

    if let Some(status) = &query.status {
        conditions.push("employment_status = ?");
        bindings.push(SqlValue::String(status.clone()));
    }

    if let Some(search) = &query.search {
        conditions.push(
            r"(first_name LIKE ? ESCAPE '\\' OR last_name LIKE ? ESCAPE '\\' OR email LIKE ? ESCAPE '\\')",
        );
        let like = contains_pattern(search);
        bindings.push(SqlValue::String(like.clone()));
        bindings.push(SqlValue::String(like.clone()));
        bindings.push(SqlValue::String(like));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let (total,) = bind_values(sqlx::query_as::<_, (i64,)>(&count_sql), bindings.clone())
        .fetch_one(pool.get_ref())
        .await?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let employees = bind_values(sqlx::query_as::<_, Employee>(&data_sql), bindings)
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(ok(
        EmployeeListResponse {
            data: employees,
            page,
            per_page,
            total,
        },
        "Employees fetched successfully",
    ))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(EmployeePath),
    request_body(content = Object, description = "Any subset of the employee fields, flat or nested"),
    responses(
        (status = 200, description = "Employee updated successfully", body = Employee),
        (status = 400, description = "Unknown or invalid field"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<EmployeePath>,
    body: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let employee_id = path.employee_id;
    if repo::employee::find_employee(&pool, employee_id).await?.is_none() {
        return Err(ApiError::not_found("Employee not found"));
    }

    let flat = flatten_update(&body)?;
    let update = build_update_sql("employees", &flat, UPDATABLE_COLUMNS, "id", employee_id)?;
    execute_update(pool.get_ref(), update).await?;

    info!(employee_id, by = %auth.username, "Employee updated");

    let employee = repo::employee::find_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(ok(employee, "Employee updated successfully"))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(EmployeePath),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<EmployeePath>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let employee_id = path.employee_id;

    let result = sqlx::query("DELETE FROM employees WHERE id = ?")
        .bind(employee_id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Employee not found"));
    }

    info!(employee_id, by = %auth.username, "Employee deleted");

    Ok(ok(serde_json::json!({ "id": employee_id }), "Successfully deleted"))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(EmployeePath),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Not allowed to view another employee"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<EmployeePath>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let employee = repo::employee::find_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    Ok(ok(employee, "Employee fetched successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_sections_are_flattened() {
        let flat = flatten_update(&json!({
            "firstName": "Asha",
            "salary": {"ctc": 42000},
            "officialDetails": {"department": "Finance"}
        }))
        .unwrap();

        assert_eq!(flat["firstName"], "Asha");
        assert_eq!(flat["ctc"], 42000);
        assert_eq!(flat["department"], "Finance");
        assert!(flat.get("salary").is_none());

        let update = build_update_sql("employees", &flat, UPDATABLE_COLUMNS, "id", 7).unwrap();
        assert!(update.sql.contains("ctc = ?"));
        assert!(update.sql.contains("department = ?"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(flatten_update(&json!({"employmentStatus": "Retired"})).is_err());
        assert!(flatten_update(&json!({"employmentStatus": "On Leave"})).is_ok());
    }

    #[test]
    fn nested_section_must_be_an_object() {
        assert!(flatten_update(&json!({"salary": 5})).is_err());
    }

    #[test]
    fn create_body_defaults_nested_sections() {
        let body: CreateEmployee = serde_json::from_value(json!({
            "firstName": "Ravi",
            "email": "ravi@company.com"
        }))
        .unwrap();

        assert_eq!(body.salary.ctc, 0.0);
        assert!(body.official_details.department.is_none());
        assert!(body.employment_status.is_none());
    }
}
