//! Database access. Lookups of a single row return `Option` and leave the
//! fallback to the caller.

pub mod employee;
pub mod payroll;
pub mod rating;
pub mod team_incentive;
