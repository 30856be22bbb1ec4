use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::api::PeriodQuery;
use crate::api::payroll::EmployeePath;
use crate::auth::auth::AuthUser;
use crate::calc::ValidationError;
use crate::error::{ApiError, ApiResult, created, ok};
use crate::model::team_incentive::{TeamIncentive, TeamIncentiveWithMembers};
use crate::repo;
use crate::repo::team_incentive::{TeamIncentiveFilter, TeamIncentivePatch, TeamIncentiveWrite};
use crate::utils::period::{Clock, Period, resolve_period};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamIncentive {
    /// Department name
    #[schema(example = "Engineering")]
    pub team: String,
    #[schema(example = json!([1, 2, 3]))]
    pub member_ids: Vec<u64>,
    #[schema(example = 30000.0)]
    pub total_amount: f64,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamIncentive {
    pub team: Option<String>,
    pub member_ids: Option<Vec<u64>>,
    pub total_amount: Option<f64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveFilter {
    pub team: Option<String>,
    pub created_by: Option<u64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct IncentivePath {
    /// Team incentive ID
    pub incentive_id: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberIncentive {
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
}

fn validate_members(team: &str, member_ids: &[u64]) -> ApiResult<()> {
    if team.trim().is_empty() || member_ids.is_empty() {
        return Err(ApiError::bad_request("Team and members are required"));
    }
    Ok(())
}

fn validate_amount(total_amount: f64) -> ApiResult<()> {
    if !(total_amount > 0.0) {
        return Err(ApiError::bad_request("Total amount must be greater than 0"));
    }
    Ok(())
}

/// Every member must exist and belong to `team`.
async fn ensure_members_in_team(pool: &MySqlPool, team: &str, member_ids: &[u64]) -> ApiResult<()> {
    let mut unique = member_ids.to_vec();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() != member_ids.len() {
        return Err(ApiError::bad_request("Members must not repeat"));
    }

    let found = repo::employee::count_in_department(pool, team, member_ids).await?;
    if found != member_ids.len() as i64 {
        warn!(team, found, requested = member_ids.len(), "Team members not found");
        return Err(ApiError::not_found("Some employees not found in the given team"));
    }
    Ok(())
}

fn period_taken(team: &str, period: Period) -> ApiError {
    ApiError::bad_request(format!(
        "An incentive for {} for {}/{} already exists.",
        team, period.month, period.year
    ))
}

/// Fast path for the duplicate check; the unique key still decides under a race.
async fn ensure_period_free(
    pool: &MySqlPool,
    team: &str,
    period: Period,
    current_id: Option<u64>,
) -> ApiResult<()> {
    if let Some(existing) = repo::team_incentive::find_for_team(pool, team, period).await? {
        if Some(existing.id) != current_id {
            return Err(period_taken(team, period));
        }
    }
    Ok(())
}

async fn load_with_members(pool: &MySqlPool, incentive: TeamIncentive) -> ApiResult<TeamIncentiveWithMembers> {
    let mut loaded = repo::team_incentive::with_members(pool, vec![incentive]).await?;
    loaded
        .pop()
        .ok_or_else(|| ApiError::not_found("Team Incentive not found"))
}

/// Split an incentive pool across a team
#[utoipa::path(
    post,
    path = "/api/team-incentive",
    request_body = CreateTeamIncentive,
    responses(
        (status = 201, description = "Incentive distributed", body = TeamIncentiveWithMembers),
        (status = 400, description = "Invalid input or incentive already exists for the month"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Some employees not found in the given team")
    ),
    security(("bearer_auth" = [])),
    tag = "Team Incentive"
)]
pub async fn create_incentive(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<CreateTeamIncentive>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    validate_members(&payload.team, &payload.member_ids)?;
    validate_amount(payload.total_amount)?;
    let period = resolve_period(payload.month, payload.year, clock.get_ref())?;

    ensure_period_free(&pool, &payload.team, period, None).await?;
    ensure_members_in_team(&pool, &payload.team, &payload.member_ids).await?;

    let write = TeamIncentiveWrite {
        team: &payload.team,
        total_amount: payload.total_amount,
        period,
        created_by: auth.user_id,
        member_ids: &payload.member_ids,
    };
    let id = repo::team_incentive::insert_incentive(&pool, &write)
        .await
        .map_err(|e| ApiError::on_unique_violation(e, || period_taken(&payload.team, period)))?;

    info!(
        id,
        team = %payload.team,
        members = payload.member_ids.len(),
        total_amount = payload.total_amount,
        by = %auth.username,
        "Team incentive created"
    );

    let incentive = repo::team_incentive::find_incentive(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team Incentive not found"))?;

    Ok(created(
        load_with_members(&pool, incentive).await?,
        "Incentive distributed successfully!",
    ))
}

/// List team incentives; defaults to the current month
#[utoipa::path(
    get,
    path = "/api/team-incentive",
    params(IncentiveFilter),
    responses(
        (status = 200, description = "Team incentives", body = [TeamIncentiveWithMembers]),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Team Incentive"
)]
pub async fn list_incentives(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    query: web::Query<IncentiveFilter>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    // a lone month or year is ignored
    let period = match (query.month, query.year) {
        (Some(month), Some(year)) => resolve_period(Some(month), Some(year), clock.get_ref())?,
        _ => Period::current(clock.get_ref()),
    };

    let filter = TeamIncentiveFilter {
        team: query.team.as_deref(),
        created_by: query.created_by,
        period,
    };
    let incentives = repo::team_incentive::list_incentives(&pool, &filter).await?;
    let data = repo::team_incentive::with_members(&pool, incentives).await?;

    Ok(ok(data, "Incentives fetched successfully"))
}

/// Get one team incentive
#[utoipa::path(
    get,
    path = "/api/team-incentive/{incentive_id}",
    params(IncentivePath),
    responses(
        (status = 200, description = "Team incentive", body = TeamIncentiveWithMembers),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Team Incentive not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Team Incentive"
)]
pub async fn get_incentive(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<IncentivePath>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let incentive = repo::team_incentive::find_incentive(&pool, path.incentive_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team Incentive not found"))?;

    Ok(ok(
        load_with_members(&pool, incentive).await?,
        "Team Incentive fetched successfully",
    ))
}

/// Update a team incentive
#[utoipa::path(
    put,
    path = "/api/team-incentive/{incentive_id}",
    params(IncentivePath),
    request_body = UpdateTeamIncentive,
    responses(
        (status = 200, description = "Incentive updated", body = TeamIncentiveWithMembers),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Incentive not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Team Incentive"
)]
pub async fn update_incentive(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<IncentivePath>,
    payload: web::Json<UpdateTeamIncentive>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let id = path.incentive_id;
    let current = repo::team_incentive::find_incentive(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Incentive not found"))?;

    if let Some(total_amount) = payload.total_amount {
        validate_amount(total_amount)?;
    }

    let team = payload.team.as_deref().unwrap_or(&current.team);
    let period = Period {
        month: payload.month.unwrap_or(current.month),
        year: payload.year.unwrap_or(current.year),
    };
    if !(1..=12).contains(&period.month) {
        return Err(ValidationError::InvalidMonth(period.month).into());
    }

    ensure_period_free(&pool, team, period, Some(id)).await?;

    match &payload.member_ids {
        Some(member_ids) => {
            validate_members(team, member_ids)?;
            ensure_members_in_team(&pool, team, member_ids).await?;
        }
        None if payload.team.is_some() => {
            let members: Vec<u64> = repo::team_incentive::load_members(&pool, &[id])
                .await?
                .iter()
                .map(|m| m.employee_id)
                .collect();
            ensure_members_in_team(&pool, team, &members).await?;
        }
        None => {}
    }

    let patch = TeamIncentivePatch {
        team: payload.team.as_deref(),
        total_amount: payload.total_amount,
        month: payload.month,
        year: payload.year,
        member_ids: payload.member_ids.as_deref(),
    };
    repo::team_incentive::update_incentive(&pool, id, &patch)
        .await
        .map_err(|e| ApiError::on_unique_violation(e, || period_taken(team, period)))?;

    info!(id, by = %auth.username, "Team incentive updated");

    let updated = repo::team_incentive::find_incentive(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Incentive not found"))?;

    Ok(ok(
        load_with_members(&pool, updated).await?,
        "Incentive updated successfully",
    ))
}

/// Delete a team incentive
#[utoipa::path(
    delete,
    path = "/api/team-incentive/{incentive_id}",
    params(IncentivePath),
    responses(
        (status = 200, description = "Deleted incentive", body = TeamIncentiveWithMembers),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Incentive not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Team Incentive"
)]
pub async fn delete_incentive(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<IncentivePath>,
) -> ApiResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let id = path.incentive_id;
    let incentive = repo::team_incentive::find_incentive(&pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Incentive not found"))?;
    let deleted = load_with_members(&pool, incentive).await?;

    if repo::team_incentive::delete_incentive(&pool, id).await? == 0 {
        return Err(ApiError::not_found("Incentive not found"));
    }

    info!(id, team = %deleted.incentive.team, by = %auth.username, "Team incentive deleted");

    Ok(ok(deleted, "Incentive deleted successfully"))
}

/// One member's team incentive for a month
#[utoipa::path(
    get,
    path = "/api/team-incentive/member/{employee_id}",
    params(EmployeePath, PeriodQuery),
    responses(
        (status = 200, description = "Member share, 0 when none", body = MemberIncentive),
        (status = 403, description = "Not allowed to view another employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Team Incentive"
)]
pub async fn get_member_incentive(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    clock: web::Data<dyn Clock>,
    path: web::Path<EmployeePath>,
    query: web::Query<PeriodQuery>,
) -> ApiResult<HttpResponse> {
    let employee_id = path.employee_id;
    auth.require_self_or_hr(employee_id)?;

    let period = query.resolve(clock.get_ref())?;
    let share = repo::team_incentive::member_share(&pool, employee_id, period).await?;

    let message = if share.is_some() {
        "Member incentive fetched successfully"
    } else {
        "No incentive found for this member, returning 0"
    };

    Ok(ok(
        MemberIncentive {
            employee_id,
            month: period.month,
            year: period.year,
            amount: share.unwrap_or(0.0),
        },
        message,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_team_or_members_are_rejected() {
        assert!(matches!(validate_members("", &[1]), Err(ApiError::BadRequest(_))));
        assert!(matches!(validate_members("Engineering", &[]), Err(ApiError::BadRequest(_))));
        assert!(validate_members("Engineering", &[1, 2]).is_ok());
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-10.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(0.01).is_ok());
    }

    #[test]
    fn racing_duplicate_is_a_bad_request() {
        use crate::error::test_db_error::unique_violation;

        let period = Period { month: 9, year: 2025 };
        let err = ApiError::on_unique_violation(unique_violation(), || {
            period_taken("Engineering", period)
        });

        assert!(matches!(&err, ApiError::BadRequest(_)));
        assert_eq!(err.to_string(), "An incentive for Engineering for 9/2025 already exists.");
    }

    #[test]
    fn create_body_uses_camel_case() {
        let body: CreateTeamIncentive = serde_json::from_value(serde_json::json!({
            "team": "Engineering",
            "memberIds": [4, 5],
            "totalAmount": 1000
        }))
        .unwrap();

        assert_eq!(body.member_ids, vec![4, 5]);
        assert_eq!(body.total_amount, 1000.0);
        assert_eq!(body.month, None);
    }
}
