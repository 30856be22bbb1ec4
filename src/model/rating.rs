use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::calc::{RatingCategories, compute_average_score};
use crate::utils::period::Period;

/// Monthly performance rating. Unique on (employee_id, month, year).
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: u64,
    pub employee_id: u64,
    pub reviewer_id: Option<u64>,
    pub month: u32,
    pub year: i32,
    #[sqlx(flatten)]
    pub categories: RatingCategories,
    #[schema(example = 4.57)]
    pub average_score: f64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl Rating {
    /// Whether the stored average still matches the stored categories.
    pub fn is_consistent(&self) -> bool {
        compute_average_score(&self.categories) == self.average_score
    }
}

/// A rating joined with the rated employee's name and email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingWithEmployee {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub rating: Rating,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// What the API returns when an employee has no rating for a month.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DefaultRating {
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub categories: RatingCategories,
    pub average_score: f64,
}

impl DefaultRating {
    pub fn zeroed(employee_id: u64, period: Period) -> Self {
        Self {
            employee_id,
            month: period.month,
            year: period.year,
            categories: RatingCategories::default(),
            average_score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rating(categories: RatingCategories, average_score: f64) -> Rating {
        let at = NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Rating {
            id: 1,
            employee_id: 7,
            reviewer_id: Some(2),
            month: 9,
            year: 2025,
            categories,
            average_score,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn detects_stale_average() {
        let categories = RatingCategories {
            ethics: 5.0,
            discipline: 5.0,
            work_ethics: 5.0,
            output: 5.0,
            team_play: 5.0,
            leadership: 5.0,
            extra_mile: 5.0,
        };

        assert!(rating(categories, 5.0).is_consistent());
        assert!(!rating(categories, 4.2).is_consistent());
    }

    #[test]
    fn default_rating_is_zeroed() {
        let default = DefaultRating::zeroed(7, Period { month: 3, year: 2025 });
        let json = serde_json::to_value(&default).unwrap();

        assert_eq!(json["employeeId"], 7);
        assert_eq!(json["averageScore"], 0.0);
        assert_eq!(json["categories"]["extraMile"], 0.0);
    }
}
