/// Rounds to the nearest half day (0.5 granularity), halves away from zero.
pub fn round_half_day(days: f64) -> f64 {
    (days * 2.0).round() / 2.0
}

/// Rounds a currency amount to 2 decimal places, halves away from zero.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Floors negative values at zero.
#[inline]
pub fn non_negative(value: f64) -> f64 {
    if value < 0.0 { 0.0 } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_day_rounding() {
        assert_eq!(round_half_day(24.0), 24.0);
        assert_eq!(round_half_day(24.2), 24.0);
        assert_eq!(round_half_day(24.25), 24.5);
        assert_eq!(round_half_day(24.74), 24.5);
        assert_eq!(round_half_day(24.75), 25.0);
        assert_eq!(round_half_day(0.0), 0.0);
    }

    #[test]
    fn currency_rounding() {
        assert_eq!(round_currency(1234.567), 1234.57);
        assert_eq!(round_currency(1234.561), 1234.56);
        assert_eq!(round_currency(0.125), 0.13);
        assert_eq!(round_currency(1000.0 / 3.0), 333.33);
    }

    #[test]
    fn floors_negatives() {
        assert_eq!(non_negative(-0.5), 0.0);
        assert_eq!(non_negative(0.0), 0.0);
        assert_eq!(non_negative(3.5), 3.5);
    }
}
