pub mod employee;
pub mod export;
pub mod payroll;
pub mod rating;
pub mod salary;
pub mod team_incentive;

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::calc::ValidationError;
use crate::utils::period::{Clock, Period, resolve_period};

/// `?month=&year=`; either may be left out and defaults to today.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    #[param(example = 9)]
    pub month: Option<u32>,
    #[param(example = 2025)]
    pub year: Option<i32>,
}

impl PeriodQuery {
    pub fn resolve(&self, clock: &dyn Clock) -> Result<Period, ValidationError> {
        resolve_period(self.month, self.year, clock)
    }
}

/// `value` unless it is zero.
pub(crate) fn non_zero_or(value: f64, fallback: f64) -> f64 {
    if value != 0.0 { value } else { fallback }
}
