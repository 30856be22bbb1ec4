use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::api::PeriodQuery;
use crate::api::payroll::EmployeePath;
use crate::auth::auth::AuthUser;
use crate::calc::{
    RatingCategoriesInput, ValidationError, compute_average_score, validate_categories,
};
use crate::error::{ApiError, ApiResult, ok};
use crate::model::rating::{DefaultRating, Rating, RatingWithEmployee};
use crate::repo;
use crate::repo::rating::{RatingSearch, RatingWrite};
use crate::utils::period::{Clock, Period, resolve_period};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRating {
    #[schema(example = 1)]
    pub employee_id: u64,
    /// Defaults to the caller's employee record.
    pub reviewer_id: Option<u64>,
    #[schema(example = 9)]
    pub month: Option<u32>,
    #[schema(example = 2025)]
    pub year: Option<i32>,
    pub categories: Option<RatingCategoriesInput>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RatingFilter {
    /// Case-insensitive match on first or last name
    pub name: Option<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// A stored rating, or zeroed scores when the month has none.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MonthlyRating {
    Rated(Rating),
    Unrated(DefaultRating),
}

impl MonthlyRating {
    fn for_period(rating: Option<Rating>, employee_id: u64, period: Period) -> (Self, &'static str) {
        match rating {
            Some(rating) => (MonthlyRating::Rated(rating), "Rating fetched successfully!"),
            None => (
                MonthlyRating::Unrated(DefaultRating::zeroed(employee_id, period)),
                "No rating found for this month. Returning default values.",
            ),
        }
    }
}

/// Save or replace a monthly rating
#[utoipa::path(
    post,
    path = "/api/rating",
    request_body = UpsertRating,
    responses(
        (status = 200, description = "Rating saved/updated", body = Rating),
        (status = 400, description = "Missing or out-of-range categories"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Rating"
)]
pub async fn upsert_rating(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<UpsertRating>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let categories = validate_categories(payload.categories.as_ref())?;
    let period = resolve_period(payload.month, payload.year, clock.get_ref())?;

    if repo::employee::find_employee(&pool, payload.employee_id)
        .await?
        .is_none()
    {
        return Err(ApiError::not_found("Employee not found"));
    }

    let write = RatingWrite {
        employee_id: payload.employee_id,
        reviewer_id: payload.reviewer_id.or(auth.employee_id),
        period,
        categories,
        average_score: compute_average_score(&categories),
    };
    let rating = repo::rating::upsert_rating(&pool, &write).await?;

    info!(
        employee_id = rating.employee_id,
        month = period.month,
        year = period.year,
        average_score = rating.average_score,
        by = %auth.username,
        "Rating saved"
    );

    Ok(ok(rating, "Monthly rating saved/updated successfully!"))
}

/// Current month's rating
#[utoipa::path(
    get,
    path = "/api/rating/current/{employee_id}",
    params(EmployeePath),
    responses(
        (status = 200, description = "Rating or zeroed default", body = Rating),
        (status = 403, description = "Not allowed to view another employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Rating"
)]
pub async fn get_current_rating(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<EmployeePath>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let period = Period::current(clock.get_ref());
    let rating = repo::rating::find_rating(&pool, employee_id, period).await?;

    let (data, message) = MonthlyRating::for_period(rating, employee_id, period);
    Ok(ok(data, message))
}

/// Every rating of an employee, newest first
#[utoipa::path(
    get,
    path = "/api/rating/history/{employee_id}",
    params(EmployeePath),
    responses(
        (status = 200, description = "Rating history", body = [Rating]),
        (status = 403, description = "Not allowed to view another employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Rating"
)]
pub async fn get_rating_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<EmployeePath>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let ratings = repo::rating::rating_history(&pool, employee_id).await?;

    Ok(ok(ratings, "Rating history fetched successfully!"))
}

/// Search ratings by employee name and period
#[utoipa::path(
    get,
    path = "/api/rating",
    params(RatingFilter),
    responses(
        (status = 200, description = "Ratings with employee details", body = [RatingWithEmployee]),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Rating"
)]
pub async fn list_ratings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<RatingFilter>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    if let Some(month) = query.month.filter(|m| *m > 12) {
        return Err(ValidationError::InvalidMonth(month).into());
    }

    let search = RatingSearch {
        name: query.name.as_deref(),
        month: query.month,
        year: query.year,
    };
    let ratings = repo::rating::search_ratings(&pool, &search).await?;

    Ok(ok(ratings, "Employee ratings fetched successfully!"))
}

/// One month's rating
#[utoipa::path(
    get,
    path = "/api/rating/{employee_id}",
    params(EmployeePath, PeriodQuery),
    responses(
        (status = 200, description = "Rating or zeroed default", body = Rating),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Not allowed to view another employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Rating"
)]
pub async fn get_monthly_rating(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<EmployeePath>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let period = query.resolve(clock.get_ref())?;
    let rating = repo::rating::find_rating(&pool, employee_id, period).await?;

    let (data, message) = MonthlyRating::for_period(rating, employee_id, period);
    Ok(ok(data, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rating_becomes_zeroed_default() {
        let period = Period { month: 2, year: 2025 };
        let (data, message) = MonthlyRating::for_period(None, 7, period);

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["employeeId"], 7);
        assert_eq!(json["month"], 2);
        assert_eq!(json["averageScore"], 0.0);
        assert_eq!(json["categories"]["ethics"], 0.0);
        assert!(json.get("id").is_none());
        assert!(message.starts_with("No rating found"));
    }

    #[test]
    fn upsert_body_accepts_partial_period() {
        let body: UpsertRating = serde_json::from_value(serde_json::json!({
            "employeeId": 3,
            "categories": {"ethics": 5, "discipline": 5, "workEthics": 5, "output": 5,
                           "teamPlay": 5, "leadership": 5, "extraMile": 5}
        }))
        .unwrap();

        assert_eq!(body.month, None);
        let categories = validate_categories(body.categories.as_ref()).unwrap();
        assert_eq!(compute_average_score(&categories), 5.0);
    }
}
