use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::api::PeriodQuery;
use crate::auth::auth::AuthUser;
use crate::calc::compute_net_pay;
use crate::error::{ApiError, ApiResult, ok};
use crate::model::employee::Employee;
use crate::model::payroll::AttendancePayroll;
use crate::repo;
use crate::utils::period::{Clock, Period};

/// One exported payroll line.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollExportRow {
    pub employee_id: u64,
    pub employee_code: Option<String>,
    pub employee_name: String,
    pub department: String,
    pub designation: String,
    pub month: u32,
    pub year: i32,
    pub total_days: u32,
    pub present: f64,
    pub absent: f64,
    pub leaves: f64,
    pub leave_adjusted: f64,
    pub late_in: f64,
    pub late_adjusted: f64,
    pub salary: f64,
    pub basic_salary: f64,
    pub hra: f64,
    pub medical_allowance: f64,
    pub conveyance_allowance: f64,
    pub incentive: f64,
    pub team_incentive: f64,
    pub deductions: f64,
    pub reimbursement: f64,
    pub net_pay: f64,
    pub payable_days: f64,
    pub status: String,
}

impl PayrollExportRow {
    fn new(payroll: &AttendancePayroll, employee: Option<&Employee>, team_incentive: f64) -> Self {
        Self {
            employee_id: payroll.employee_id,
            employee_code: employee.and_then(|e| e.employee_code.clone()),
            employee_name: employee.map_or_else(String::new, |e| {
                format!(
                    "{} {}",
                    e.first_name.as_deref().unwrap_or(""),
                    e.last_name.as_deref().unwrap_or("")
                )
                .trim()
                .to_string()
            }),
            department: employee.map_or("", |e| e.department()).to_string(),
            designation: employee.map_or("", |e| e.designation()).to_string(),
            month: payroll.month,
            year: payroll.year,
            total_days: payroll.total_days,
            present: payroll.present,
            absent: payroll.absent,
            leaves: payroll.leaves,
            leave_adjusted: payroll.leave_adjusted,
            late_in: payroll.late_in,
            late_adjusted: payroll.late_adjusted,
            salary: payroll.salary,
            basic_salary: payroll.basic_salary,
            hra: payroll.hra,
            medical_allowance: payroll.medical_allowance,
            conveyance_allowance: payroll.conveyance_allowance,
            incentive: payroll.incentive,
            team_incentive,
            deductions: payroll.deductions,
            reimbursement: payroll.reimbursement,
            net_pay: compute_net_pay(&payroll.net_pay_input(team_incentive)),
            payable_days: payroll.payable_days,
            status: payroll.status.to_string(),
        }
    }
}

fn export_rows(
    payrolls: &[AttendancePayroll],
    employees: &HashMap<u64, Employee>,
    team_shares: &HashMap<u64, f64>,
) -> Vec<PayrollExportRow> {
    payrolls
        .iter()
        .map(|payroll| {
            PayrollExportRow::new(
                payroll,
                employees.get(&payroll.employee_id),
                team_shares.get(&payroll.employee_id).copied().unwrap_or(0.0),
            )
        })
        .collect()
}

/// Payroll rows for a month, with net pay
#[utoipa::path(
    get,
    path = "/api/export/payroll",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Payroll export rows", body = [PayrollExportRow]),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "No payroll data found")
    ),
    security(("bearer_auth" = [])),
    tag = "Export"
)]
pub async fn export_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let period: Period = query.resolve(clock.get_ref())?;

    let payrolls = repo::payroll::list_for_period(&pool, period).await?;
    if payrolls.is_empty() {
        return Err(ApiError::not_found("No payroll data found."));
    }

    let employees: HashMap<u64, Employee> = repo::employee::list_all_employees(&pool)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();
    let team_shares = repo::team_incentive::shares_for_period(&pool, period).await?;

    let rows = export_rows(&payrolls, &employees, &team_shares);

    info!(
        rows = rows.len(),
        month = period.month,
        year = period.year,
        by = %auth.username,
        "Payroll exported"
    );

    Ok(ok(rows, "Payroll export generated successfully"))
}
