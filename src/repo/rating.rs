use sqlx::MySqlPool;
use tracing::{debug, instrument, warn};

use crate::calc::{RatingCategories, compute_average_score};
use crate::model::rating::{Rating, RatingWithEmployee};
use crate::utils::db_utils::{SqlValue, bind_values, contains_pattern};
use crate::utils::period::Period;

const RATING_COLUMNS: &str = r#"
    r.id, r.employee_id, r.reviewer_id, r.month, r.year,
    r.ethics, r.discipline, r.work_ethics, r.output, r.team_play, r.leadership, r.extra_mile,
    r.average_score, r.created_at, r.updated_at
"#;

pub struct RatingWrite {
    pub employee_id: u64,
    pub reviewer_id: Option<u64>,
    pub period: Period,
    pub categories: RatingCategories,
    pub average_score: f64,
}

#[derive(Debug, Default)]
pub struct RatingSearch<'a> {
    pub name: Option<&'a str>,
    pub month: Option<u32>,
    pub year: Option<i32>,
}

pub async fn find_rating(
    pool: &MySqlPool,
    employee_id: u64,
    period: Period,
) -> Result<Option<Rating>, sqlx::Error> {
    let sql = format!(
        "SELECT {RATING_COLUMNS} FROM ratings r WHERE r.employee_id = ? AND r.month = ? AND r.year = ?"
    );

    let rating = sqlx::query_as::<_, Rating>(&sql)
        .bind(employee_id)
        .bind(period.month)
        .bind(period.year)
        .fetch_optional(pool)
        .await?;

    flag_stale(rating.iter());
    Ok(rating)
}

/// All ratings of one employee, newest month first.
pub async fn rating_history(pool: &MySqlPool, employee_id: u64) -> Result<Vec<Rating>, sqlx::Error> {
    let sql = format!(
        "SELECT {RATING_COLUMNS} FROM ratings r WHERE r.employee_id = ? ORDER BY r.year DESC, r.month DESC"
    );

    let ratings = sqlx::query_as::<_, Rating>(&sql)
        .bind(employee_id)
        .fetch_all(pool)
        .await?;

    flag_stale(ratings.iter());
    Ok(ratings)
}

pub async fn ratings_for_year(
    pool: &MySqlPool,
    employee_id: u64,
    year: i32,
) -> Result<Vec<Rating>, sqlx::Error> {
    let sql = format!(
        "SELECT {RATING_COLUMNS} FROM ratings r WHERE r.employee_id = ? AND r.year = ? ORDER BY r.month"
    );

    let ratings = sqlx::query_as::<_, Rating>(&sql)
        .bind(employee_id)
        .bind(year)
        .fetch_all(pool)
        .await?;

    flag_stale(ratings.iter());
    Ok(ratings)
}

pub async fn search_ratings(
    pool: &MySqlPool,
    search: &RatingSearch<'_>,
) -> Result<Vec<RatingWithEmployee>, sqlx::Error> {
    let mut conditions = Vec::new();
    let mut bindings = Vec::new();

    if let Some(name) = search.name.map(str::trim).filter(|n| !n.is_empty()) {
        conditions.push(r"(LOWER(e.first_name) LIKE ? ESCAPE '\\' OR LOWER(e.last_name) LIKE ? ESCAPE '\\')");
        let like = contains_pattern(&name.to_lowercase());
        bindings.push(SqlValue::String(like.clone()));
        bindings.push(SqlValue::String(like));
    }

    if let Some(month) = search.month.filter(|m| *m != 0) {
        conditions.push("r.month = ?");
        bindings.push(SqlValue::U64(month.into()));
    }

    if let Some(year) = search.year.filter(|y| *y != 0) {
        conditions.push("r.year = ?");
        bindings.push(SqlValue::I64(year.into()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT {RATING_COLUMNS}, e.first_name, e.last_name, e.email
         FROM ratings r
         JOIN employees e ON e.id = r.employee_id
         {where_clause}
         ORDER BY r.year DESC, r.month DESC"
    );
    debug!(sql = %sql, bindings = ?bindings, "Searching ratings");

    let ratings = bind_values(sqlx::query_as::<_, RatingWithEmployee>(&sql), bindings)
        .fetch_all(pool)
        .await?;

    flag_stale(ratings.iter().map(|r| &r.rating));
    Ok(ratings)
}

/// Inserts or replaces the rating for the period and returns the stored row.
#[instrument(skip_all, fields(employee_id = write.employee_id, month = write.period.month, year = write.period.year))]
pub async fn upsert_rating(pool: &MySqlPool, write: &RatingWrite) -> Result<Rating, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let c = &write.categories;

    sqlx::query(
        r#"
        INSERT INTO ratings
        (employee_id, reviewer_id, month, year,
         ethics, discipline, work_ethics, output, team_play, leadership, extra_mile, average_score)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            reviewer_id = VALUES(reviewer_id),
            ethics = VALUES(ethics),
            discipline = VALUES(discipline),
            work_ethics = VALUES(work_ethics),
            output = VALUES(output),
            team_play = VALUES(team_play),
            leadership = VALUES(leadership),
            extra_mile = VALUES(extra_mile),
            average_score = VALUES(average_score)
        "#,
    )
    .bind(write.employee_id)
    .bind(write.reviewer_id)
    .bind(write.period.month)
    .bind(write.period.year)
    .bind(c.ethics)
    .bind(c.discipline)
    .bind(c.work_ethics)
    .bind(c.output)
    .bind(c.team_play)
    .bind(c.leadership)
    .bind(c.extra_mile)
    .bind(write.average_score)
    .execute(&mut *tx)
    .await?;

    let sql = format!(
        "SELECT {RATING_COLUMNS} FROM ratings r WHERE r.employee_id = ? AND r.month = ? AND r.year = ?"
    );
    let stored = sqlx::query_as::<_, Rating>(&sql)
        .bind(write.employee_id)
        .bind(write.period.month)
        .bind(write.period.year)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(stored)
}

/// Logs ratings whose stored average no longer matches their categories.
fn flag_stale<'a>(ratings: impl IntoIterator<Item = &'a Rating>) -> usize {
    let mut stale = 0;
    for rating in ratings {
        if !rating.is_consistent() {
            warn!(
                rating_id = rating.id,
                employee_id = rating.employee_id,
                stored = rating.average_score,
                recomputed = compute_average_score(&rating.categories),
                "Stored average score is stale"
            );
            stale += 1;
        }
    }
    stale
}
