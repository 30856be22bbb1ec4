use actix_web::{HttpResponse, web};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::api::{PeriodQuery, non_zero_or};
use crate::auth::auth::AuthUser;
use crate::calc::{
    AttendanceInput, Incentive, ValidationError, compute_incentive, compute_payroll,
};
use crate::error::{ApiError, ApiResult, ok};
use crate::model::employee::Employee;
use crate::model::payroll::{AttendancePayroll, NOT_PROCESSED, PayrollStatus};
use crate::repo;
use crate::repo::payroll::PayrollWrite;
use crate::utils::period::{Clock, Period, resolve_period};

/// Working days assumed when an employee has no payroll for the month yet.
const DEFAULT_TOTAL_DAYS: u32 = 30;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPayroll {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = 9)]
    pub month: Option<u32>,
    #[schema(example = 2025)]
    pub year: Option<i32>,

    /// Defaults to the employee's salary structure.
    pub basic_salary: Option<f64>,
    pub hra: Option<f64>,
    pub conveyance_allowance: Option<f64>,
    pub medical_allowance: Option<f64>,
    /// Monthly base salary; falls back to the employee's CTC.
    #[schema(example = 30000.0)]
    pub salary: Option<f64>,

    #[schema(example = 30)]
    pub total_days: Option<u32>,
    #[serde(default)]
    #[schema(example = 3.0)]
    pub leaves: f64,
    #[serde(default)]
    #[schema(example = 1.0)]
    pub leave_adjusted: f64,
    #[serde(default)]
    #[schema(example = 2.0)]
    pub absent: f64,
    #[serde(default)]
    #[schema(example = 4.0)]
    pub late_in: f64,
    #[serde(default)]
    #[schema(example = 2.0)]
    pub late_adjusted: f64,
    #[serde(default)]
    pub deductions: f64,
    #[serde(default)]
    pub reimbursement: f64,
    #[serde(default)]
    pub incentive: f64,
    pub status: Option<PayrollStatus>,
}

impl UpsertPayroll {
    /// Attendance counters and amounts are never negative.
    fn validate(&self) -> Result<(), ValidationError> {
        let given = [
            ("basicSalary", self.basic_salary),
            ("hra", self.hra),
            ("conveyanceAllowance", self.conveyance_allowance),
            ("medicalAllowance", self.medical_allowance),
            ("salary", self.salary),
        ];
        let counters = [
            ("leaves", self.leaves),
            ("leaveAdjusted", self.leave_adjusted),
            ("absent", self.absent),
            ("lateIn", self.late_in),
            ("lateAdjusted", self.late_adjusted),
            ("deductions", self.deductions),
            ("reimbursement", self.reimbursement),
            ("incentive", self.incentive),
        ];

        let values = given
            .into_iter()
            .filter_map(|(field, value)| value.map(|v| (field, v)))
            .chain(counters);
        for (field, value) in values {
            if !(value >= 0.0) {
                return Err(ValidationError::Negative { field, value });
            }
        }
        Ok(())
    }

    fn to_write(&self, employee: &Employee, period: Period) -> PayrollWrite {
        let structure = &employee.salary;
        let base_salary = self.salary.unwrap_or(structure.ctc);
        let total_days = self.total_days.unwrap_or(0);

        let computed = compute_payroll(&AttendanceInput {
            total_working_days: total_days,
            leaves: self.leaves,
            leave_adjusted: self.leave_adjusted,
            absent: self.absent,
            late_in: self.late_in,
            late_adjusted: self.late_adjusted,
            deductions: self.deductions,
            reimbursement: self.reimbursement,
            incentive: self.incentive,
            base_salary,
        });

        PayrollWrite {
            employee_id: employee.id,
            period,
            basic_salary: self.basic_salary.unwrap_or(structure.basic),
            hra: self.hra.unwrap_or(structure.hra),
            medical_allowance: self.medical_allowance.unwrap_or(structure.medical_allowance),
            conveyance_allowance: self
                .conveyance_allowance
                .unwrap_or(structure.conveyance_allowance),
            salary: base_salary,
            total_days,
            present: computed.present,
            leaves: self.leaves,
            leave_adjusted: computed.usable_leave_adjusted,
            absent: self.absent,
            late_in: self.late_in,
            late_adjusted: computed.usable_late_adjusted,
            deductions: self.deductions,
            payable_days: computed.payable_days,
            bank_name: employee.bank_details.bank_name.clone(),
            account_no: employee.bank_details.account_number.clone(),
            ifsc_code: employee.bank_details.ifsc_code.clone(),
            payable: computed.payable,
            reimbursement: self.reimbursement,
            incentive: self.incentive,
            total: computed.total,
            status: self.status.unwrap_or_default(),
        }
    }
}

/// One row of the monthly payroll sheet.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollListItem {
    pub employee_id: u64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: String,
    pub designation: String,
    pub basic_salary: f64,
    pub hra: f64,
    pub medical_allowance: f64,
    pub conveyance_allowance: f64,
    /// The employee's CTC.
    pub salary: f64,
    pub payable_days: f64,
    pub payable: f64,
    pub total: f64,
    pub total_days: u32,
    #[schema(example = "Not Processed")]
    pub status: String,
    pub month: u32,
    pub year: i32,
}

impl PayrollListItem {
    fn merge(employee: &Employee, payroll: Option<&AttendancePayroll>, period: Period) -> Self {
        let s = &employee.salary;
        Self {
            employee_id: employee.id,
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            department: employee.department().to_string(),
            designation: employee.designation().to_string(),
            basic_salary: s.basic,
            hra: s.hra,
            medical_allowance: s.medical_allowance,
            conveyance_allowance: s.conveyance_allowance,
            salary: s.ctc,
            payable_days: payroll.map_or(0.0, |p| p.payable_days),
            payable: payroll.map_or(0.0, |p| p.payable),
            total: payroll.map_or(0.0, |p| p.total),
            total_days: payroll.map_or(0, |p| p.total_days),
            status: payroll.map_or_else(|| NOT_PROCESSED.to_string(), |p| p.status.to_string()),
            month: period.month,
            year: period.year,
        }
    }
}

/// An employee merged with their payroll for one month.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayroll {
    /// `null` when no payroll was saved for the month.
    pub payroll_id: Option<u64>,
    pub employee_id: u64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: String,
    pub designation: String,
    pub basic_salary: f64,
    pub hra: f64,
    pub medical_allowance: f64,
    pub conveyance_allowance: f64,
    pub salary: f64,
    pub total_days: u32,
    pub leaves: f64,
    pub leave_adjusted: f64,
    pub absent: f64,
    pub late_in: f64,
    pub late_adjusted: f64,
    pub deductions: f64,
    pub reimbursement: f64,
    pub incentive: f64,
    pub payable_days: f64,
    pub payable: f64,
    pub total: f64,
    pub status: String,
    pub month: u32,
    pub year: i32,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub created_at: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<NaiveDateTime>,
}

impl EmployeePayroll {
    fn merge(employee: &Employee, payroll: Option<&AttendancePayroll>, period: Period) -> Self {
        let s = &employee.salary;
        let field = |get: fn(&AttendancePayroll) -> f64| payroll.map_or(0.0, get);

        Self {
            payroll_id: payroll.map(|p| p.id),
            employee_id: employee.id,
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            department: employee.department().to_string(),
            designation: employee.designation().to_string(),
            basic_salary: s.basic,
            hra: s.hra,
            medical_allowance: s.medical_allowance,
            conveyance_allowance: s.conveyance_allowance,
            salary: non_zero_or(field(|p| p.salary), s.ctc),
            total_days: payroll
                .map(|p| p.total_days)
                .filter(|days| *days > 0)
                .unwrap_or(DEFAULT_TOTAL_DAYS),
            leaves: field(|p| p.leaves),
            leave_adjusted: field(|p| p.leave_adjusted),
            absent: field(|p| p.absent),
            late_in: field(|p| p.late_in),
            late_adjusted: field(|p| p.late_adjusted),
            deductions: field(|p| p.deductions),
            reimbursement: field(|p| p.reimbursement),
            incentive: field(|p| p.incentive),
            payable_days: field(|p| p.payable_days),
            payable: field(|p| p.payable),
            total: field(|p| p.total),
            status: payroll.map_or_else(|| NOT_PROCESSED.to_string(), |p| p.status.to_string()),
            month: period.month,
            year: period.year,
            created_at: payroll.map(|p| p.created_at),
            updated_at: payroll.map(|p| p.updated_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveResponse {
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    #[schema(example = 4.7)]
    pub average_rating: f64,
    /// The employee's CTC, the base the percent applies to.
    #[schema(example = 30000.0)]
    pub total_salary: f64,
    #[schema(example = 10.0)]
    pub incentive_percent: f64,
    #[schema(example = 3000.0)]
    pub incentive_amount: f64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct EmployeePath {
    /// Employee ID
    pub employee_id: u64,
}

/// Save or replace an employee's payroll for a month
#[utoipa::path(
    post,
    path = "/api/payroll/upsert",
    request_body = UpsertPayroll,
    responses(
        (status = 200, description = "Payroll saved/updated", body = AttendancePayroll),
        (status = 400, description = "Invalid month or negative counter"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn upsert_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<UpsertPayroll>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    payload.validate()?;
    let period = resolve_period(payload.month, payload.year, clock.get_ref())?;

    let employee = repo::employee::find_employee(&pool, payload.employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found."))?;

    let write = payload.to_write(&employee, period);
    let payroll = repo::payroll::upsert_payroll(&pool, &write).await?;

    info!(
        employee_id = employee.id,
        month = period.month,
        year = period.year,
        total = payroll.total,
        by = %auth.username,
        "Payroll saved"
    );

    Ok(ok(payroll, "Payroll saved/updated successfully!"))
}

/// Every employee with their payroll for a month
#[utoipa::path(
    get,
    path = "/api/payroll/payroll-list",
    params(PeriodQuery),
    responses(
        (status = 200, description = "Employee payroll list", body = [PayrollListItem]),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let period = query.resolve(clock.get_ref())?;

    let employees = repo::employee::list_all_employees(&pool).await?;
    let payrolls = repo::payroll::list_for_period(&pool, period).await?;
    debug!(
        employees = employees.len(),
        payrolls = payrolls.len(),
        month = period.month,
        year = period.year,
        "Merging payroll list"
    );

    let data: Vec<PayrollListItem> = employees
        .iter()
        .map(|employee| {
            let payroll = payrolls.iter().find(|p| p.employee_id == employee.id);
            PayrollListItem::merge(employee, payroll, period)
        })
        .collect();

    Ok(ok(data, "Employee payroll list fetched successfully!"))
}

/// One employee's payroll for a month
#[utoipa::path(
    get,
    path = "/api/payroll/payroll/{employee_id}",
    params(EmployeePath, PeriodQuery),
    responses(
        (status = 200, description = "Employee payroll", body = EmployeePayroll),
        (status = 403, description = "Not allowed to view another employee"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_employee_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<EmployeePath>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let period = query.resolve(clock.get_ref())?;

    let employee = repo::employee::find_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    let payroll = repo::payroll::find_payroll(&pool, employee_id, period).await?;

    Ok(ok(
        EmployeePayroll::merge(&employee, payroll.as_ref(), period),
        "Employee payroll fetched successfully!",
    ))
}

/// Rating-driven incentive for a month
#[utoipa::path(
    get,
    path = "/api/payroll/incentive/{employee_id}",
    params(EmployeePath, PeriodQuery),
    responses(
        (status = 200, description = "Incentive calculated", body = IncentiveResponse),
        (status = 403, description = "Not allowed to view another employee"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn calculate_incentive(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<EmployeePath>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let period = query.resolve(clock.get_ref())?;

    let employee = repo::employee::find_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    let rating = repo::rating::find_rating(&pool, employee_id, period).await?;

    let response = incentive_response(
        employee_id,
        period,
        employee.salary.ctc,
        rating.map_or(0.0, |r| r.average_score),
    );

    Ok(ok(response, "Incentive calculated successfully"))
}

fn incentive_response(
    employee_id: u64,
    period: Period,
    total_salary: f64,
    average_rating: f64,
) -> IncentiveResponse {
    let Incentive { percent, amount } = compute_incentive(average_rating, total_salary);

    IncentiveResponse {
        employee_id,
        month: period.month,
        year: period.year,
        average_rating,
        total_salary,
        incentive_percent: percent,
        incentive_amount: amount,
    }
}
