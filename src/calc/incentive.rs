use serde::Serialize;

use super::rounding::round_currency;

/// Average scores at or below this earn no incentive.
pub const INCENTIVE_THRESHOLD: f64 = 4.4;
/// Score at which the incentive reaches [`MAX_INCENTIVE_PERCENT`].
pub const TOP_SCORE: f64 = 5.0;
pub const MIN_INCENTIVE_PERCENT: f64 = 5.0;
pub const MAX_INCENTIVE_PERCENT: f64 = 15.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Incentive {
    pub percent: f64,
    pub amount: f64,
}

/// Rating-driven incentive for one month.
///
/// Scores above [`INCENTIVE_THRESHOLD`] are interpolated linearly from 5 % to
/// 15 % of `base_salary`. Scores above [`TOP_SCORE`] are clamped to it, so the
/// percent never exceeds 15. Both figures are rounded to 2 decimals only here,
/// after the amount was computed from the unrounded percent.
pub fn compute_incentive(average_score: f64, base_salary: f64) -> Incentive {
    let Incentive { percent, amount } = unrounded_incentive(average_score, base_salary);

    Incentive {
        percent: round_currency(percent),
        amount: round_currency(amount),
    }
}

/// [`compute_incentive`] before rounding, for totals that round once at the end.
pub fn unrounded_incentive(average_score: f64, base_salary: f64) -> Incentive {
    if !(average_score > INCENTIVE_THRESHOLD) {
        return Incentive::default();
    }

    let score = average_score.min(TOP_SCORE);
    let factor = (score - INCENTIVE_THRESHOLD) / (TOP_SCORE - INCENTIVE_THRESHOLD);
    let percent = MIN_INCENTIVE_PERCENT + factor * (MAX_INCENTIVE_PERCENT - MIN_INCENTIVE_PERCENT);

    Incentive {
        percent,
        amount: base_salary * percent / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_score_earns_nothing() {
        assert_eq!(compute_incentive(4.4, 50_000.0), Incentive::default());
        assert_eq!(compute_incentive(3.0, 50_000.0), Incentive::default());
        assert_eq!(compute_incentive(0.0, 50_000.0), Incentive::default());
    }

    #[test]
    fn top_score_earns_fifteen_percent() {
        let incentive = compute_incentive(5.0, 40_000.0);
        assert_eq!(incentive.percent, 15.0);
        assert_eq!(incentive.amount, 6_000.0);
    }

    #[test]
    fn midpoint_earns_ten_percent() {
        let incentive = compute_incentive(4.7, 30_000.0);
        assert_eq!(incentive.percent, 10.0);
        assert_eq!(incentive.amount, 3_000.0);
    }

    #[test]
    fn just_above_threshold_starts_at_five_percent() {
        let incentive = compute_incentive(4.41, 10_000.0);
        // 5 + (0.01 / 0.6) * 10 = 5.1666...
        assert_eq!(incentive.percent, 5.17);
        assert_eq!(incentive.amount, 516.67);
    }

    #[test]
    fn amount_uses_unrounded_percent() {
        let incentive = compute_incentive(4.57, 123_456.0);
        // percent = 7.8333..., amount = 9670.72
        assert_eq!(incentive.percent, 7.83);
        assert_eq!(incentive.amount, 9_670.72);
    }

    #[test]
    fn scores_above_top_are_clamped() {
        assert_eq!(compute_incentive(5.6, 10_000.0), compute_incentive(5.0, 10_000.0));
    }

    #[test]
    fn zero_salary_has_percent_but_no_amount() {
        let incentive = compute_incentive(4.7, 0.0);
        assert_eq!(incentive.percent, 10.0);
        assert_eq!(incentive.amount, 0.0);
    }

    #[test]
    fn unrounded_keeps_fractions() {
        let raw = unrounded_incentive(4.41, 10_000.0);
        assert!((raw.amount - 516.666_666).abs() < 1e-3);
        assert_eq!(round_currency(raw.amount), compute_incentive(4.41, 10_000.0).amount);
        assert_eq!(unrounded_incentive(4.4, 10_000.0), Incentive::default());
    }

    #[test]
    fn nan_score_earns_nothing() {
        assert_eq!(compute_incentive(f64::NAN, 10_000.0), Incentive::default());
    }
}
