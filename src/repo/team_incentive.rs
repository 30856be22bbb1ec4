use std::collections::HashMap;

use sqlx::{MySqlConnection, MySqlPool};
use tracing::{debug, instrument};

use crate::model::team_incentive::{
    TeamIncentive, TeamIncentiveMember, TeamIncentiveWithMembers, per_member_amount,
};
use crate::repo::employee::placeholders;
use crate::utils::db_utils::{SqlValue, bind_values};
use crate::utils::period::Period;

const INCENTIVE_COLUMNS: &str =
    "id, team, total_amount, month, year, created_by, created_at, updated_at";

pub struct TeamIncentiveWrite<'a> {
    pub team: &'a str,
    pub total_amount: f64,
    pub period: Period,
    pub created_by: u64,
    pub member_ids: &'a [u64],
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug)]
pub struct TeamIncentivePatch<'a> {
    pub team: Option<&'a str>,
    pub total_amount: Option<f64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub member_ids: Option<&'a [u64]>,
}

#[derive(Debug)]
pub struct TeamIncentiveFilter<'a> {
    pub team: Option<&'a str>,
    pub created_by: Option<u64>,
    pub period: Period,
}

pub async fn find_incentive(pool: &MySqlPool, id: u64) -> Result<Option<TeamIncentive>, sqlx::Error> {
    let sql = format!("SELECT {INCENTIVE_COLUMNS} FROM team_incentives WHERE id = ?");

    sqlx::query_as::<_, TeamIncentive>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_for_team(
    pool: &MySqlPool,
    team: &str,
    period: Period,
) -> Result<Option<TeamIncentive>, sqlx::Error> {
    let sql = format!(
        "SELECT {INCENTIVE_COLUMNS} FROM team_incentives WHERE team = ? AND month = ? AND year = ?"
    );

    sqlx::query_as::<_, TeamIncentive>(&sql)
        .bind(team)
        .bind(period.month)
        .bind(period.year)
        .fetch_optional(pool)
        .await
}

pub async fn list_incentives(
    pool: &MySqlPool,
    filter: &TeamIncentiveFilter<'_>,
) -> Result<Vec<TeamIncentive>, sqlx::Error> {
    let mut conditions = vec!["month = ?", "year = ?"];
    let mut bindings = vec![
        SqlValue::U64(filter.period.month.into()),
        SqlValue::I64(filter.period.year.into()),
    ];

    if let Some(team) = filter.team {
        conditions.push("team = ?");
        bindings.push(SqlValue::String(team.to_string()));
    }

    if let Some(created_by) = filter.created_by {
        conditions.push("created_by = ?");
        bindings.push(SqlValue::U64(created_by));
    }

    let sql = format!(
        "SELECT {INCENTIVE_COLUMNS} FROM team_incentives WHERE {} ORDER BY id DESC",
        conditions.join(" AND ")
    );
    debug!(sql = %sql, bindings = ?bindings, "Listing team incentives");

    bind_values(sqlx::query_as::<_, TeamIncentive>(&sql), bindings)
        .fetch_all(pool)
        .await
}

/// Members of the given incentives, names joined from `employees`.
pub async fn load_members(
    pool: &MySqlPool,
    incentive_ids: &[u64],
) -> Result<Vec<TeamIncentiveMember>, sqlx::Error> {
    if incentive_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT m.incentive_id, m.employee_id, e.first_name, e.last_name, e.email, m.amount
         FROM team_incentive_members m
         JOIN employees e ON e.id = m.employee_id
         WHERE m.incentive_id IN ({})
         ORDER BY m.incentive_id, m.employee_id",
        placeholders(incentive_ids.len())
    );

    let values = incentive_ids.iter().copied().map(SqlValue::U64).collect();
    bind_values(sqlx::query_as::<_, TeamIncentiveMember>(&sql), values)
        .fetch_all(pool)
        .await
}

/// Attaches members to each incentive, keeping the incentive order.
pub async fn with_members(
    pool: &MySqlPool,
    incentives: Vec<TeamIncentive>,
) -> Result<Vec<TeamIncentiveWithMembers>, sqlx::Error> {
    let ids: Vec<u64> = incentives.iter().map(|i| i.id).collect();
    let members = load_members(pool, &ids).await?;

    Ok(attach_members(incentives, members))
}

fn attach_members(
    incentives: Vec<TeamIncentive>,
    members: Vec<TeamIncentiveMember>,
) -> Vec<TeamIncentiveWithMembers> {
    let mut by_incentive: HashMap<u64, Vec<TeamIncentiveMember>> = HashMap::new();
    for member in members {
        by_incentive.entry(member.incentive_id).or_default().push(member);
    }

    incentives
        .into_iter()
        .map(|incentive| TeamIncentiveWithMembers {
            members: by_incentive.remove(&incentive.id).unwrap_or_default(),
            incentive,
        })
        .collect()
}

#[instrument(skip_all, fields(team = write.team, month = write.period.month, year = write.period.year))]
pub async fn insert_incentive(
    pool: &MySqlPool,
    write: &TeamIncentiveWrite<'_>,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let id = sqlx::query(
        r#"
        INSERT INTO team_incentives (team, total_amount, month, year, created_by)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(write.team)
    .bind(write.total_amount)
    .bind(write.period.month)
    .bind(write.period.year)
    .bind(write.created_by)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    insert_members(&mut tx, id, write.member_ids, write.total_amount).await?;

    tx.commit().await?;
    Ok(id)
}

/// Applies the patch. The even split is recomputed whenever the total or the
/// member list changes.
pub async fn update_incentive(
    pool: &MySqlPool,
    id: u64,
    patch: &TeamIncentivePatch<'_>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE team_incentives
        SET team = COALESCE(?, team),
            total_amount = COALESCE(?, total_amount),
            month = COALESCE(?, month),
            year = COALESCE(?, year)
        WHERE id = ?
        "#,
    )
    .bind(patch.team)
    .bind(patch.total_amount)
    .bind(patch.month)
    .bind(patch.year)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let total_amount: f64 =
        sqlx::query_scalar("SELECT total_amount FROM team_incentives WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

    match patch.member_ids {
        Some(member_ids) => {
            sqlx::query("DELETE FROM team_incentive_members WHERE incentive_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_members(&mut tx, id, member_ids, total_amount).await?;
        }
        None if patch.total_amount.is_some() => {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM team_incentive_members WHERE incentive_id = ?",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("UPDATE team_incentive_members SET amount = ? WHERE incentive_id = ?")
                .bind(per_member_amount(total_amount, count as usize))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        None => {}
    }

    tx.commit().await?;
    Ok(())
}

async fn insert_members(
    conn: &mut MySqlConnection,
    incentive_id: u64,
    member_ids: &[u64],
    total_amount: f64,
) -> Result<(), sqlx::Error> {
    let amount = per_member_amount(total_amount, member_ids.len());

    for employee_id in member_ids {
        sqlx::query(
            "INSERT INTO team_incentive_members (incentive_id, employee_id, amount) VALUES (?, ?, ?)",
        )
        .bind(incentive_id)
        .bind(employee_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn delete_incentive(pool: &MySqlPool, id: u64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM team_incentives WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// The employee's team incentive for the period, if any.
pub async fn member_share(
    pool: &MySqlPool,
    employee_id: u64,
    period: Period,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        r#"
        SELECT SUM(m.amount)
        FROM team_incentive_members m
        JOIN team_incentives t ON t.id = m.incentive_id
        WHERE m.employee_id = ? AND t.month = ? AND t.year = ?
        HAVING COUNT(*) > 0
        "#,
    )
    .bind(employee_id)
    .bind(period.month)
    .bind(period.year)
    .fetch_optional(pool)
    .await
}

/// Team incentive per employee for the period.
pub async fn shares_for_period(
    pool: &MySqlPool,
    period: Period,
) -> Result<HashMap<u64, f64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (u64, f64)>(
        r#"
        SELECT m.employee_id, SUM(m.amount)
        FROM team_incentive_members m
        JOIN team_incentives t ON t.id = m.incentive_id
        WHERE t.month = ? AND t.year = ?
        GROUP BY m.employee_id
        "#,
    )
    .bind(period.month)
    .bind(period.year)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}
