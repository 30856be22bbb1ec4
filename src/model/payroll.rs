use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::calc::NetPayInput;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum PayrollStatus {
    #[default]
    Pending,
    Processed,
    Paid,
}

impl TryFrom<String> for PayrollStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Status label shown for employees without a payroll in the period.
pub const NOT_PROCESSED: &str = "Not Processed";

/// One employee's payroll for one month. Unique on (employee_id, month, year).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePayroll {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = 9)]
    pub month: u32,
    #[schema(example = 2025)]
    pub year: i32,

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

    #[sqlx(try_from = "String")]
    pub status: PayrollStatus,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl AttendancePayroll {
    pub fn net_pay_input(&self, team_incentive: f64) -> NetPayInput {
        NetPayInput {
            total_days: self.total_days,
            salary: self.salary,
            leaves: self.leaves,
            leave_adjusted: self.leave_adjusted,
            absent: self.absent,
            late_in: self.late_in,
            late_adjusted: self.late_adjusted,
            deductions: self.deductions,
            incentive: self.incentive,
            team_incentive,
            reimbursement: self.reimbursement,
        }
    }
}

#[cfg(test)]
impl AttendancePayroll {
    /// The reference month: 30 days, 25 payable, 30 000 salary.
    pub fn sample(employee_id: u64, month: u32, year: i32) -> Self {
        let at = chrono::NaiveDate::from_ymd_opt(year, month, 28)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        AttendancePayroll {
            id: 1,
            employee_id,
            month,
            year,
            basic_salary: 15_000.0,
            hra: 7_500.0,
            medical_allowance: 1_250.0,
            conveyance_allowance: 1_600.0,
            salary: 30_000.0,
            total_days: 30,
            present: 24.0,
            leaves: 3.0,
            leave_adjusted: 1.0,
            absent: 2.0,
            late_in: 4.0,
            late_adjusted: 2.0,
            deductions: 0.0,
            payable_days: 25.0,
            bank_name: Some("HDFC Bank".into()),
            account_no: Some("001234567890".into()),
            ifsc_code: Some("HDFC0000123".into()),
            payable: 25_000.0,
            reimbursement: 0.0,
            incentive: 0.0,
            total: 25_000.0,
            status: PayrollStatus::Pending,
            created_at: at,
            updated_at: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_stored_values() {
        assert_eq!(PayrollStatus::try_from("Paid".to_string()), Ok(PayrollStatus::Paid));
        assert_eq!(PayrollStatus::Processed.as_ref(), "Processed");
        assert!(PayrollStatus::try_from("pending".to_string()).is_err());
    }

    #[test]
    fn net_pay_input_carries_stored_counters() {
        let payroll = AttendancePayroll::sample(7, 9, 2025);
        let input = payroll.net_pay_input(1_500.0);

        assert_eq!(input.total_days, 30);
        assert_eq!(input.salary, 30_000.0);
        assert_eq!(input.team_incentive, 1_500.0);
        // 2 leave + 1 late + 2 absent days at 1 000 a day
        assert_eq!(crate::calc::compute_net_pay(&input), 26_500.0);
    }

    #[test]
    fn status_serializes_as_stored() {
        assert_eq!(serde_json::to_value(PayrollStatus::Pending).unwrap(), "Pending");
        let parsed: PayrollStatus = serde_json::from_str("\"Paid\"").unwrap();
        assert_eq!(parsed, PayrollStatus::Paid);
    }
}
