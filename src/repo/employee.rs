use sqlx::MySqlPool;

use crate::model::employee::Employee;

pub(crate) const EMPLOYEE_COLUMNS: &str = r#"
    id, employee_code, first_name, last_name, email, phone_number,
    department, designation, employee_type, joining_date,
    bank_name, branch_name, account_holder_name, account_number, ifsc_code, account_type,
    basic, hra, medical_allowance, conveyance_allowance, other_allowances, deductions, ctc,
    employment_status
"#;

pub async fn find_employee(pool: &MySqlPool, employee_id: u64) -> Result<Option<Employee>, sqlx::Error> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");

    sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_all_employees(pool: &MySqlPool) -> Result<Vec<Employee>, sqlx::Error> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");

    sqlx::query_as::<_, Employee>(&sql).fetch_all(pool).await
}

/// How many of `employee_ids` belong to `department`.
pub async fn count_in_department(
    pool: &MySqlPool,
    department: &str,
    employee_ids: &[u64],
) -> Result<i64, sqlx::Error> {
    if employee_ids.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        "SELECT COUNT(*) FROM employees WHERE department = ? AND id IN ({})",
        placeholders(employee_ids.len())
    );

    let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(department);
    for id in employee_ids {
        query = query.bind(id);
    }

    query.fetch_one(pool).await
}

/// `?, ?, ?` for an `IN (...)` list.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
