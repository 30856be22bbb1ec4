use crate::api::PeriodQuery;
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::export::PayrollExportRow;
use crate::api::payroll::{EmployeePayroll, IncentiveResponse, PayrollListItem, UpsertPayroll};
use crate::api::rating::UpsertRating;
use crate::api::salary::{RatingSummary, SalaryBreakdown, SalaryDetails, SalaryMonth, YearlySalary};
use crate::api::team_incentive::{CreateTeamIncentive, MemberIncentive, UpdateTeamIncentive};
use crate::calc::{RatingCategories, RatingCategoriesInput};
use crate::model::employee::{BankDetails, Employee, EmploymentStatus, OfficialDetails, SalaryStructure};
use crate::model::payroll::{AttendancePayroll, PayrollStatus};
use crate::model::rating::{DefaultRating, Rating, RatingWithEmployee};
use crate::model::team_incentive::{TeamIncentive, TeamIncentiveMember, TeamIncentiveWithMembers};
use crate::utils::period::Period;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Payroll API",
        version = "1.0.0",
        description = r#"
## HRM Payroll

Payroll, performance rating and incentive backend for an HR management system.

### 🔹 Key Features
- **Payroll**
  - Derive payable days and salary from monthly attendance counters
- **Ratings**
  - Monthly seven-category reviews with a rating-driven incentive
- **Salary Reports**
  - Yearly salary sheets and monthly salary details
- **Team Incentives**
  - Department incentive pools split evenly across members
- **Export**
  - Payroll rows with net pay for a month

### 🔐 Security
Every endpoint under `/api` expects a **JWT Bearer** access token.
Writes, lists and exports are limited to **Admin** and **HR**; employees may read their own records.

### 📦 Response Format
`{ success, successCode, message, data }` on success and `{ success, statusCode, message }` on error.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::payroll::upsert_payroll,
        crate::api::payroll::list_payroll,
        crate::api::payroll::get_employee_payroll,
        crate::api::payroll::calculate_incentive,

        crate::api::rating::upsert_rating,
        crate::api::rating::get_current_rating,
        crate::api::rating::get_rating_history,
        crate::api::rating::list_ratings,
        crate::api::rating::get_monthly_rating,

        crate::api::salary::get_yearly_salary,
        crate::api::salary::get_salary_details,

        crate::api::team_incentive::create_incentive,
        crate::api::team_incentive::list_incentives,
        crate::api::team_incentive::get_incentive,
        crate::api::team_incentive::update_incentive,
        crate::api::team_incentive::delete_incentive,
        crate::api::team_incentive::get_member_incentive,

        crate::api::export::export_payroll
    ),
    components(
        schemas(
            Period,
            PeriodQuery,
            Employee,
            EmploymentStatus,
            OfficialDetails,
            BankDetails,
            SalaryStructure,
            CreateEmployee,
            EmployeeListResponse,
            AttendancePayroll,
            PayrollStatus,
            UpsertPayroll,
            PayrollListItem,
            EmployeePayroll,
            IncentiveResponse,
            RatingCategories,
            RatingCategoriesInput,
            Rating,
            DefaultRating,
            RatingWithEmployee,
            UpsertRating,
            SalaryMonth,
            YearlySalary,
            SalaryBreakdown,
            RatingSummary,
            SalaryDetails,
            TeamIncentive,
            TeamIncentiveMember,
            TeamIncentiveWithMembers,
            CreateTeamIncentive,
            UpdateTeamIncentive,
            MemberIncentive,
            PayrollExportRow
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Payroll", description = "Attendance-driven payroll APIs"),
        (name = "Rating", description = "Monthly performance rating APIs"),
        (name = "Salary", description = "Salary report APIs"),
        (name = "Team Incentive", description = "Team incentive pool APIs"),
        (name = "Export", description = "Payroll export APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
