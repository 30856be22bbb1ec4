use sqlx::MySqlPool;
use tracing::instrument;

use crate::model::payroll::{AttendancePayroll, PayrollStatus};
use crate::utils::period::Period;

const PAYROLL_COLUMNS: &str = r#"
    id, employee_id, month, year,
    basic_salary, hra, medical_allowance, conveyance_allowance, salary,
    total_days, present, leaves, leave_adjusted, absent, late_in, late_adjusted,
    deductions, payable_days, bank_name, account_no, ifsc_code,
    payable, reimbursement, incentive, total, status, created_at, updated_at
"#;

/// Everything written for one (employee, month, year).
#[derive(Debug, Clone)]
pub struct PayrollWrite {
    pub employee_id: u64,
    pub period: Period,
    pub basic_salary: f64,
    pub hra: f64,
    pub medical_allowance: f64,
    pub conveyance_allowance: f64,
    pub salary: f64,
    pub total_days: u32,
    pub present: f64,
    pub leaves: f64,
    pub leave_adjusted: f64,
    pub absent: f64,
    pub late_in: f64,
    pub late_adjusted: f64,
    pub deductions: f64,
    pub payable_days: f64,
    pub bank_name: Option<String>,
    pub account_no: Option<String>,
    pub ifsc_code: Option<String>,
    pub payable: f64,
    pub reimbursement: f64,
    pub incentive: f64,
    pub total: f64,
    pub status: PayrollStatus,
}

pub async fn find_payroll(
    pool: &MySqlPool,
    employee_id: u64,
    period: Period,
) -> Result<Option<AttendancePayroll>, sqlx::Error> {
    let sql = format!(
        "SELECT {PAYROLL_COLUMNS} FROM attendance_payrolls WHERE employee_id = ? AND month = ? AND year = ?"
    );

    sqlx::query_as::<_, AttendancePayroll>(&sql)
        .bind(employee_id)
        .bind(period.month)
        .bind(period.year)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_period(
    pool: &MySqlPool,
    period: Period,
) -> Result<Vec<AttendancePayroll>, sqlx::Error> {
    let sql = format!(
        "SELECT {PAYROLL_COLUMNS} FROM attendance_payrolls WHERE month = ? AND year = ? ORDER BY employee_id"
    );

    sqlx::query_as::<_, AttendancePayroll>(&sql)
        .bind(period.month)
        .bind(period.year)
        .fetch_all(pool)
        .await
}

/// Paid payrolls of one employee in `year`, January first.
pub async fn paid_for_year(
    pool: &MySqlPool,
    employee_id: u64,
    year: i32,
) -> Result<Vec<AttendancePayroll>, sqlx::Error> {
    let sql = format!(
        "SELECT {PAYROLL_COLUMNS} FROM attendance_payrolls
         WHERE employee_id = ? AND year = ? AND status = ?
         ORDER BY month"
    );

    sqlx::query_as::<_, AttendancePayroll>(&sql)
        .bind(employee_id)
        .bind(year)
        .bind(PayrollStatus::Paid.as_ref())
        .fetch_all(pool)
        .await
}

/// Inserts or replaces the payroll for the period and returns the stored row.
#[instrument(skip_all, fields(employee_id = write.employee_id, month = write.period.month, year = write.period.year))]
pub async fn upsert_payroll(
    pool: &MySqlPool,
    write: &PayrollWrite,
) -> Result<AttendancePayroll, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO attendance_payrolls
        (employee_id, month, year, basic_salary, hra, medical_allowance, conveyance_allowance,
         salary, total_days, present, leaves, leave_adjusted, absent, late_in, late_adjusted,
         deductions, payable_days, bank_name, account_no, ifsc_code,
         payable, reimbursement, incentive, total, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            basic_salary = VALUES(basic_salary),
            hra = VALUES(hra),
            medical_allowance = VALUES(medical_allowance),
            conveyance_allowance = VALUES(conveyance_allowance),
            salary = VALUES(salary),
            total_days = VALUES(total_days),
            present = VALUES(present),
            leaves = VALUES(leaves),
            leave_adjusted = VALUES(leave_adjusted),
            absent = VALUES(absent),
            late_in = VALUES(late_in),
            late_adjusted = VALUES(late_adjusted),
            deductions = VALUES(deductions),
            payable_days = VALUES(payable_days),
            bank_name = VALUES(bank_name),
            account_no = VALUES(account_no),
            ifsc_code = VALUES(ifsc_code),
            payable = VALUES(payable),
            reimbursement = VALUES(reimbursement),
            incentive = VALUES(incentive),
            total = VALUES(total),
            status = VALUES(status)
        "#,
    )
    .bind(write.employee_id)
    .bind(write.period.month)
    .bind(write.period.year)
    .bind(write.basic_salary)
    .bind(write.hra)
    .bind(write.medical_allowance)
    .bind(write.conveyance_allowance)
    .bind(write.salary)
    .bind(write.total_days)
    .bind(write.present)
    .bind(write.leaves)
    .bind(write.leave_adjusted)
    .bind(write.absent)
    .bind(write.late_in)
    .bind(write.late_adjusted)
    .bind(write.deductions)
    .bind(write.payable_days)
    .bind(&write.bank_name)
    .bind(&write.account_no)
    .bind(&write.ifsc_code)
    .bind(write.payable)
    .bind(write.reimbursement)
    .bind(write.incentive)
    .bind(write.total)
    .bind(write.status.as_ref())
    .execute(&mut *tx)
    .await?;

    let sql = format!(
        "SELECT {PAYROLL_COLUMNS} FROM attendance_payrolls WHERE employee_id = ? AND month = ? AND year = ?"
    );
    let stored = sqlx::query_as::<_, AttendancePayroll>(&sql)
        .bind(write.employee_id)
        .bind(write.period.month)
        .bind(write.period.year)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(stored)
}
