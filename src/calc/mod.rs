//! Payroll arithmetic.
//!
//! Every salary figure the API returns is derived here. Handlers fetch the
//! records, call into this module and persist or render the result; nothing in
//! this module touches the database or the clock.

pub mod attendance;
pub mod incentive;
pub mod net_pay;
pub mod rating;
pub mod rounding;

pub use attendance::{AttendanceInput, compute_payroll};
pub use incentive::{Incentive, compute_incentive, unrounded_incentive};
pub use net_pay::{NetPayInput, compute_net_pay};
pub use rating::{
    RatingCategories, RatingCategoriesInput, ValidationError, compute_average_score,
    validate_categories,
};
pub use rounding::round_currency;
