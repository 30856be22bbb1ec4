use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::calc::ValidationError;

/// Source of "today" for handlers that default to the current month.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in the server's local timezone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock stuck on one date.
#[cfg(test)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// A payroll month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Period {
    #[schema(example = 9)]
    pub month: u32,
    #[schema(example = 2025)]
    pub year: i32,
}

impl Period {
    pub fn current(clock: &dyn Clock) -> Self {
        let today = clock.today();
        Self {
            month: today.month(),
            year: today.year(),
        }
    }
}

/// Fills a missing month or year from the clock.
///
/// A month or year of `0` counts as missing.
pub fn resolve_period(
    month: Option<u32>,
    year: Option<i32>,
    clock: &dyn Clock,
) -> Result<Period, ValidationError> {
    let current = Period::current(clock);

    let month = match month {
        None | Some(0) => current.month,
        Some(m) if m <= 12 => m,
        Some(m) => return Err(ValidationError::InvalidMonth(m)),
    };

    let year = match year {
        None | Some(0) => current.year,
        Some(y) => y,
    };

    Ok(Period { month, year })
}

/// Resolves a year only, for yearly reports.
pub fn resolve_year(year: Option<i32>, clock: &dyn Clock) -> i32 {
    match year {
        None | Some(0) => clock.today().year(),
        Some(y) => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> FixedClock {
        FixedClock(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap())
    }

    #[test]
    fn defaults_to_current_month() {
        assert_eq!(
            resolve_period(None, None, &clock()),
            Ok(Period { month: 9, year: 2025 })
        );
    }

    #[test]
    fn keeps_explicit_values() {
        assert_eq!(
            resolve_period(Some(2), Some(2024), &clock()),
            Ok(Period { month: 2, year: 2024 })
        );
    }

    #[test]
    fn fills_only_missing_parts() {
        assert_eq!(
            resolve_period(Some(12), None, &clock()),
            Ok(Period { month: 12, year: 2025 })
        );
        assert_eq!(
            resolve_period(None, Some(2023), &clock()),
            Ok(Period { month: 9, year: 2023 })
        );
    }

    #[test]
    fn zero_means_missing() {
        assert_eq!(
            resolve_period(Some(0), Some(0), &clock()),
            Ok(Period { month: 9, year: 2025 })
        );
        assert_eq!(resolve_year(Some(0), &clock()), 2025);
    }

    #[test]
    fn rejects_month_out_of_range() {
        assert_eq!(
            resolve_period(Some(13), None, &clock()),
            Err(ValidationError::InvalidMonth(13))
        );
    }
}
