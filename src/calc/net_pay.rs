use super::attendance::LATE_IN_DAY_WEIGHT;
use super::rounding::round_currency;

/// Stored payroll fields used by the export net-pay convention.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetPayInput {
    pub total_days: u32,
    pub salary: f64,
    pub leaves: f64,
    pub leave_adjusted: f64,
    pub absent: f64,
    pub late_in: f64,
    pub late_adjusted: f64,
    pub deductions: f64,
    pub incentive: f64,
    pub team_incentive: f64,
    pub reimbursement: f64,
}

/// Net pay as reported by the payroll export.
///
/// This is a different convention from [`compute_payroll`](super::compute_payroll):
/// unpaid days are priced and subtracted from the full salary plus every
/// addition, with no half-day rounding and no floor at zero. Exports keep
/// using this figure, so the two are not merged.
pub fn compute_net_pay(input: &NetPayInput) -> f64 {
    let leave_deduction = (input.leaves - input.leave_adjusted).max(0.0);
    let late_deduction = (input.late_in - input.late_adjusted).max(0.0) * LATE_IN_DAY_WEIGHT;
    let total_deduction_days = leave_deduction + late_deduction + input.absent;

    let gross = input.salary + input.incentive + input.team_incentive + input.reimbursement;

    let per_day_salary = if input.total_days > 0 {
        input.salary / f64::from(input.total_days)
    } else {
        0.0
    };

    round_currency(gross - input.deductions - per_day_salary * total_deduction_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::attendance::{AttendanceInput, compute_payroll};

    #[test]
    fn prices_unpaid_days_against_salary() {
        let input = NetPayInput {
            total_days: 30,
            salary: 30_000.0,
            leaves: 3.0,
            leave_adjusted: 1.0,
            absent: 2.0,
            late_in: 4.0,
            late_adjusted: 2.0,
            ..Default::default()
        };

        // 2 leave + 1 late + 2 absent days at 1000/day
        assert_eq!(compute_net_pay(&input), 25_000.0);
    }

    #[test]
    fn adds_every_component() {
        let input = NetPayInput {
            total_days: 30,
            salary: 30_000.0,
            incentive: 1_500.0,
            team_incentive: 2_000.0,
            reimbursement: 250.0,
            deductions: 750.0,
            ..Default::default()
        };

        assert_eq!(compute_net_pay(&input), 33_000.0);
    }

    #[test]
    fn zero_total_days_charges_nothing_for_absence() {
        let input = NetPayInput {
            total_days: 0,
            salary: 30_000.0,
            absent: 10.0,
            ..Default::default()
        };

        assert_eq!(compute_net_pay(&input), 30_000.0);
    }

    #[test]
    fn can_go_negative() {
        let input = NetPayInput {
            total_days: 30,
            salary: 30_000.0,
            absent: 30.0,
            deductions: 100.0,
            ..Default::default()
        };

        assert_eq!(compute_net_pay(&input), -100.0);
    }

    #[test]
    fn over_adjustment_is_not_credited() {
        let input = NetPayInput {
            total_days: 20,
            salary: 20_000.0,
            leaves: 1.0,
            leave_adjusted: 4.0,
            late_in: 1.0,
            late_adjusted: 3.0,
            ..Default::default()
        };

        assert_eq!(compute_net_pay(&input), 20_000.0);
    }

    // The export figure and the payroll total agree on a plain month but
    // drift apart once half-day rounding or a zero-working-day month is
    // involved. Both conventions are kept on purpose.
    #[test]
    fn diverges_from_payroll_total() {
        let attendance = AttendanceInput {
            total_working_days: 30,
            base_salary: 30_000.0,
            absent: 2.0,
            leaves: 3.0,
            leave_adjusted: 1.0,
            late_in: 4.0,
            late_adjusted: 2.0,
            ..Default::default()
        };
        let net = NetPayInput {
            total_days: 30,
            salary: 30_000.0,
            absent: 2.0,
            leaves: 3.0,
            leave_adjusted: 1.0,
            late_in: 4.0,
            late_adjusted: 2.0,
            ..Default::default()
        };
        assert_eq!(compute_payroll(&attendance).total, compute_net_pay(&net));

        let fractional_leave = AttendanceInput {
            leaves: 1.3,
            ..attendance
        };
        let fractional_net = NetPayInput { leaves: 1.3, ..net };
        // payroll rounds 25.7 present days to 25.5, export charges 3.3 days as-is
        assert_eq!(compute_payroll(&fractional_leave).total, 26_500.0);
        assert_eq!(compute_net_pay(&fractional_net), 26_700.0);

        let empty_month = AttendanceInput {
            total_working_days: 0,
            reimbursement: 100.0,
            ..attendance
        };
        let empty_net = NetPayInput {
            total_days: 0,
            reimbursement: 100.0,
            ..net
        };
        assert_eq!(compute_payroll(&empty_month).total, 100.0);
        assert_eq!(compute_net_pay(&empty_net), 30_100.0);
    }
}
