pub mod employee;
pub mod payroll;
pub mod rating;
pub mod role;
pub mod team_incentive;
