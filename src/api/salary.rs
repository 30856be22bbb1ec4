use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::payroll::EmployeePath;
use crate::api::{PeriodQuery, non_zero_or};
use crate::auth::auth::AuthUser;
use crate::calc::incentive::INCENTIVE_THRESHOLD;
use crate::calc::{
    Incentive, RatingCategories, compute_incentive, round_currency, unrounded_incentive,
};
use crate::error::{ApiError, ApiResult, ok};
use crate::model::employee::{BankDetails, Employee};
use crate::model::payroll::AttendancePayroll;
use crate::model::rating::Rating;
use crate::repo;
use crate::utils::period::{Clock, Period, resolve_year};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    #[param(example = 2025)]
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryMonth {
    pub month: u32,
    pub year: i32,
    pub base_salary: f64,
    pub average_rating: f64,
    pub incentive_percent: f64,
    pub incentive_amount: f64,
    pub net_pay: f64,
    #[schema(example = "Paid")]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearlySalary {
    pub employee_id: u64,
    #[schema(example = "Asha Rao")]
    pub name: String,
    pub department: String,
    pub designation: String,
    #[serde(rename = "totalCTC")]
    pub total_ctc: f64,
    pub total_incentive: f64,
    pub total_net_pay: f64,
    pub months: Vec<SalaryMonth>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBreakdown {
    pub month: u32,
    pub year: i32,
    pub base_salary: f64,
    pub total_days: u32,
    pub leaves: f64,
    pub leave_adjusted: f64,
    pub absent: f64,
    pub late_in: f64,
    pub late_adjusted: f64,
    pub deductions: f64,
    pub reimbursement: f64,
    pub incentive_percent: f64,
    pub incentive_amount: f64,
    pub net_pay: f64,
    pub payable_days: f64,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_score: f64,
    pub categories: RatingCategories,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryDetails {
    pub employee_id: u64,
    pub name: String,
    pub department: String,
    pub designation: String,
    #[schema(value_type = Option<String>, format = "date")]
    pub joining_date: Option<NaiveDate>,
    pub bank_details: BankDetails,
    pub salary_details: SalaryBreakdown,
    pub rating: RatingSummary,
}

fn or_na(value: &str) -> String {
    if value.is_empty() { "N/A".to_string() } else { value.to_string() }
}

/// Month-by-month pay for the Paid payrolls of one year.
///
/// Months show rounded figures; the totals add the unrounded ones and round once.
fn yearly_salary(
    employee: &Employee,
    paid: &[AttendancePayroll],
    ratings: &HashMap<u32, f64>,
) -> YearlySalary {
    let base_salary = employee.salary.ctc;
    let mut total_incentive = 0.0;
    let mut total_net_pay = 0.0;

    let months: Vec<SalaryMonth> = paid
        .iter()
        .map(|payroll| {
            let average_rating = ratings.get(&payroll.month).copied().unwrap_or(0.0);
            let Incentive { percent, amount } = unrounded_incentive(average_rating, base_salary);
            let net_pay = non_zero_or(payroll.total, base_salary + amount);

            total_incentive += amount;
            total_net_pay += net_pay;

            SalaryMonth {
                month: payroll.month,
                year: payroll.year,
                base_salary,
                average_rating,
                incentive_percent: round_currency(percent),
                incentive_amount: round_currency(amount),
                net_pay: round_currency(net_pay),
                status: payroll.status.to_string(),
            }
        })
        .collect();

    YearlySalary {
        employee_id: employee.id,
        name: employee.display_name(),
        department: or_na(employee.department()),
        designation: or_na(employee.designation()),
        total_ctc: round_currency(base_salary * months.len() as f64),
        total_incentive: round_currency(total_incentive),
        total_net_pay: round_currency(total_net_pay),
        months,
    }
}

/// Salary details of one month.
///
/// The incentive is rating-driven when the average clears the threshold;
/// otherwise the incentive stored on the payroll is reported.
fn salary_details(
    employee: &Employee,
    payroll: &AttendancePayroll,
    rating: Option<&Rating>,
    period: Period,
) -> SalaryDetails {
    let base_salary = non_zero_or(payroll.salary, employee.salary.ctc);
    let average_score = rating.map_or(0.0, |r| r.average_score);

    let incentive = if average_score > INCENTIVE_THRESHOLD {
        compute_incentive(average_score, base_salary)
    } else {
        Incentive {
            percent: 0.0,
            amount: payroll.incentive,
        }
    };

    SalaryDetails {
        employee_id: employee.id,
        name: employee.display_name(),
        department: or_na(employee.department()),
        designation: or_na(employee.designation()),
        joining_date: employee.official_details.joining_date,
        bank_details: employee.bank_details.clone(),
        salary_details: SalaryBreakdown {
            month: period.month,
            year: period.year,
            base_salary,
            total_days: payroll.total_days,
            leaves: payroll.leaves,
            leave_adjusted: payroll.leave_adjusted,
            absent: payroll.absent,
            late_in: payroll.late_in,
            late_adjusted: payroll.late_adjusted,
            deductions: payroll.deductions,
            reimbursement: payroll.reimbursement,
            incentive_percent: incentive.percent,
            incentive_amount: round_currency(incentive.amount),
            net_pay: round_currency(non_zero_or(payroll.total, base_salary + incentive.amount)),
            payable_days: payroll.payable_days,
            status: payroll.status.to_string(),
        },
        rating: RatingSummary {
            average_score,
            categories: rating.map(|r| r.categories).unwrap_or_default(),
        },
    }
}

/// Paid salary for each month of a year
#[utoipa::path(
    get,
    path = "/api/salary/{employee_id}",
    params(EmployeePath, YearQuery),
    responses(
        (status = 200, description = "Yearly salary", body = YearlySalary),
        (status = 403, description = "Not allowed to view another employee"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn get_yearly_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<EmployeePath>,
    query: web::Query<YearQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let year = resolve_year(query.year, clock.get_ref());

    let employee = repo::employee::find_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;

    let paid = repo::payroll::paid_for_year(&pool, employee_id, year).await?;
    let ratings: HashMap<u32, f64> = repo::rating::ratings_for_year(&pool, employee_id, year)
        .await?
        .into_iter()
        .map(|r| (r.month, r.average_score))
        .collect();

    Ok(ok(
        yearly_salary(&employee, &paid, &ratings),
        "Employee salary data fetched successfully!",
    ))
}

/// Salary details of one month
#[utoipa::path(
    get,
    path = "/api/salary/details/{employee_id}",
    params(EmployeePath, PeriodQuery),
    responses(
        (status = 200, description = "Salary details", body = SalaryDetails),
        (status = 403, description = "Not allowed to view another employee"),
        (status = 404, description = "Employee or payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Salary"
)]
pub async fn get_salary_details(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<EmployeePath>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let period = query.resolve(clock.get_ref())?;

    let employee = repo::employee::find_employee(&pool, employee_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))?;
    let payroll = repo::payroll::find_payroll(&pool, employee_id, period)
        .await?
        .ok_or_else(|| ApiError::not_found("Payroll not found for this month/year"))?;
    let rating = repo::rating::find_rating(&pool, employee_id, period).await?;

    Ok(ok(
        salary_details(&employee, &payroll, rating.as_ref(), period),
        "Salary details fetched successfully!",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payroll::PayrollStatus;

    const SEPTEMBER: Period = Period { month: 9, year: 2025 };

    fn paid(month: u32, total: f64) -> AttendancePayroll {
        AttendancePayroll {
            total,
            status: PayrollStatus::Paid,
            ..AttendancePayroll::sample(7, month, 2025)
        }
    }

    fn rating(average_score: f64) -> Rating {
        let at = chrono::NaiveDate::from_ymd_opt(2025, 9, 30)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        Rating {
            id: 1,
            employee_id: 7,
            reviewer_id: None,
            month: 9,
            year: 2025,
            categories: RatingCategories {
                ethics: 5.0,
                ..Default::default()
            },
            average_score,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn yearly_salary_adds_rating_incentive() {
        let employee = Employee::sample(7);
        let ratings = HashMap::from([(3, 5.0)]);

        let yearly = yearly_salary(&employee, &[paid(3, 25_000.0), paid(4, 0.0)], &ratings);

        assert_eq!(yearly.months.len(), 2);
        assert_eq!(yearly.months[0].incentive_percent, 15.0);
        assert_eq!(yearly.months[0].incentive_amount, 4_500.0);
        assert_eq!(yearly.months[0].net_pay, 25_000.0);
        // no total stored, so base plus incentive
        assert_eq!(yearly.months[1].average_rating, 0.0);
        assert_eq!(yearly.months[1].net_pay, 30_000.0);

        assert_eq!(yearly.total_ctc, 60_000.0);
        assert_eq!(yearly.total_incentive, 4_500.0);
        assert_eq!(yearly.total_net_pay, 55_000.0);
    }

    #[test]
    fn yearly_totals_round_once() {
        let mut employee = Employee::sample(7);
        employee.salary.ctc = 10_000.0;
        let ratings = HashMap::from([(1, 4.41), (2, 4.41), (3, 4.41)]);

        let yearly = yearly_salary(
            &employee,
            &[paid(1, 0.0), paid(2, 0.0), paid(3, 0.0)],
            &ratings,
        );

        // each month shows 516.67, but three of them add up to 1550.00
        assert_eq!(yearly.months[0].incentive_amount, 516.67);
        assert_eq!(yearly.months[0].net_pay, 10_516.67);
        assert_eq!(yearly.total_incentive, 1_550.0);
        assert_eq!(yearly.total_net_pay, 31_550.0);
    }

    #[test]
    fn yearly_salary_serializes_total_ctc() {
        let yearly = yearly_salary(&Employee::sample(7), &[], &HashMap::new());
        let json = serde_json::to_value(&yearly).unwrap();

        assert_eq!(json["totalCTC"], 0.0);
        assert_eq!(json["name"], "Asha Rao");
        assert!(json["months"].as_array().unwrap().is_empty());
    }

    #[test]
    fn details_use_rating_incentive_above_threshold() {
        let details = salary_details(
            &Employee::sample(7),
            &paid(9, 0.0),
            Some(&rating(4.7)),
            SEPTEMBER,
        );

        assert_eq!(details.salary_details.base_salary, 30_000.0);
        assert_eq!(details.salary_details.incentive_percent, 10.0);
        assert_eq!(details.salary_details.incentive_amount, 3_000.0);
        assert_eq!(details.salary_details.net_pay, 33_000.0);
        assert_eq!(details.rating.categories.ethics, 5.0);
    }

    #[test]
    fn details_fall_back_to_stored_incentive() {
        let mut payroll = paid(9, 26_000.0);
        payroll.incentive = 1_000.0;

        let details = salary_details(&Employee::sample(7), &payroll, Some(&rating(4.2)), SEPTEMBER);

        assert_eq!(details.salary_details.incentive_percent, 0.0);
        assert_eq!(details.salary_details.incentive_amount, 1_000.0);
        assert_eq!(details.salary_details.net_pay, 26_000.0);
    }

    #[test]
    fn details_without_rating_report_zero_scores() {
        let details = salary_details(&Employee::sample(7), &paid(9, 25_000.0), None, SEPTEMBER);

        assert_eq!(details.rating.average_score, 0.0);
        assert_eq!(details.rating.categories, RatingCategories::default());
        assert_eq!(details.bank_details.bank_name.as_deref(), Some("HDFC Bank"));
    }
}
