use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::rounding::round_currency;

pub const MIN_CATEGORY_SCORE: f64 = 1.0;
pub const MAX_CATEGORY_SCORE: f64 = 5.0;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("rating categories are required")]
    MissingCategories,
    #[error("rating category `{0}` is required")]
    MissingCategory(&'static str),
    #[error("rating category `{category}` must be between 1 and 5, got {value}")]
    ScoreOutOfRange { category: &'static str, value: f64 },
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// Category scores as submitted; any of them may be missing.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingCategoriesInput {
    #[schema(example = 5)]
    pub ethics: Option<f64>,
    #[schema(example = 4)]
    pub discipline: Option<f64>,
    #[schema(example = 5)]
    pub work_ethics: Option<f64>,
    #[schema(example = 4)]
    pub output: Option<f64>,
    #[schema(example = 5)]
    pub team_play: Option<f64>,
    #[schema(example = 4)]
    pub leadership: Option<f64>,
    #[schema(example = 5)]
    pub extra_mile: Option<f64>,
}

/// A complete set of the seven category scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingCategories {
    pub ethics: f64,
    pub discipline: f64,
    pub work_ethics: f64,
    pub output: f64,
    pub team_play: f64,
    pub leadership: f64,
    pub extra_mile: f64,
}

impl RatingCategories {
    pub fn scores(&self) -> [f64; 7] {
        [
            self.ethics,
            self.discipline,
            self.work_ethics,
            self.output,
            self.team_play,
            self.leadership,
            self.extra_mile,
        ]
    }
}

impl TryFrom<&RatingCategoriesInput> for RatingCategories {
    type Error = ValidationError;

    fn try_from(input: &RatingCategoriesInput) -> Result<Self, Self::Error> {
        fn score(category: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
            let value = value.ok_or(ValidationError::MissingCategory(category))?;
            if !(MIN_CATEGORY_SCORE..=MAX_CATEGORY_SCORE).contains(&value) {
                return Err(ValidationError::ScoreOutOfRange { category, value });
            }
            Ok(value)
        }

        Ok(Self {
            ethics: score("ethics", input.ethics)?,
            discipline: score("discipline", input.discipline)?,
            work_ethics: score("workEthics", input.work_ethics)?,
            output: score("output", input.output)?,
            team_play: score("teamPlay", input.team_play)?,
            leadership: score("leadership", input.leadership)?,
            extra_mile: score("extraMile", input.extra_mile)?,
        })
    }
}

/// Validates submitted categories; an absent object is rejected.
pub fn validate_categories(
    input: Option<&RatingCategoriesInput>,
) -> Result<RatingCategories, ValidationError> {
    input
        .ok_or(ValidationError::MissingCategories)
        .and_then(RatingCategories::try_from)
}

/// Mean of the seven category scores, rounded to 2 decimals.
pub fn compute_average_score(categories: &RatingCategories) -> f64 {
    let scores = categories.scores();
    round_currency(scores.iter().sum::<f64>() / scores.len() as f64)
}
