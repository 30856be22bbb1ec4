use serde::Serialize;

use super::rounding::{non_negative, round_currency, round_half_day};

/// Each late arrival weighs half a day.
pub const LATE_IN_DAY_WEIGHT: f64 = 0.5;

/// Monthly attendance counters for one employee.
///
/// Counters are taken as given; inconsistent adjustments are clamped by
/// [`compute_payroll`] rather than rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttendanceInput {
    pub total_working_days: u32,
    pub leaves: f64,
    pub leave_adjusted: f64,
    pub absent: f64,
    pub late_in: f64,
    pub late_adjusted: f64,
    pub deductions: f64,
    pub reimbursement: f64,
    pub incentive: f64,
    pub base_salary: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollComputation {
    /// `leave_adjusted` clamped to `leaves`.
    pub usable_leave_adjusted: f64,
    /// `late_adjusted` clamped to `late_in`.
    pub usable_late_adjusted: f64,
    pub present: f64,
    pub payable_days: f64,
    pub per_day_salary: f64,
    pub payable: f64,
    pub total: f64,
}

/// Derives payable days and the payable amount from attendance counters.
///
/// Steps run in a fixed order, each consuming the previous one:
///
/// 1. leave adjustments reduce the leave count (never below zero),
/// 2. every late arrival counts as half an absent day,
/// 3. present days are what remains of the working days, floored at zero and
///    kept at half-day granularity,
/// 4. adjusted late arrivals restore half a day each on top of `present`,
/// 5. the per-day rate times payable days, minus deductions, gives `payable`,
/// 6. reimbursement and incentive are added to give `total`.
///
/// `payable` and `total` are rounded to 2 decimals and never negative. A month
/// with zero working days pays only reimbursement and incentive.
pub fn compute_payroll(input: &AttendanceInput) -> PayrollComputation {
    let usable_leave_adjusted = input.leave_adjusted.min(input.leaves);
    let remaining_leaves = non_negative(input.leaves - usable_leave_adjusted);

    let late_days = input.late_in * LATE_IN_DAY_WEIGHT;

    let total_working_days = f64::from(input.total_working_days);
    let raw_present =
        non_negative(total_working_days - (input.absent + remaining_leaves + late_days));
    let present = round_half_day(raw_present);

    let usable_late_adjusted = input.late_adjusted.min(input.late_in);
    let late_adjusted_days = usable_late_adjusted * LATE_IN_DAY_WEIGHT;

    let payable_days = round_half_day(non_negative(present + late_adjusted_days));

    let per_day_salary = if input.total_working_days > 0 {
        input.base_salary / total_working_days
    } else {
        0.0
    };

    let payable = non_negative(per_day_salary * payable_days - input.deductions);
    let total = non_negative(payable + input.reimbursement + input.incentive);

    PayrollComputation {
        usable_leave_adjusted,
        usable_late_adjusted,
        present,
        payable_days,
        per_day_salary,
        payable: round_currency(payable),
        total: round_currency(total),
    }
}
