use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

/// A department-wide incentive pool for one month.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamIncentive {
    pub id: u64,
    #[schema(example = "Engineering")]
    pub team: String,
    #[schema(example = 30000.0)]
    pub total_amount: f64,
    pub month: u32,
    pub year: i32,
    pub created_by: u64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

/// A member's share, joined with the member's name and email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamIncentiveMember {
    #[serde(skip)]
    pub incentive_id: u64,
    pub employee_id: u64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamIncentiveWithMembers {
    #[serde(flatten)]
    pub incentive: TeamIncentive,
    pub members: Vec<TeamIncentiveMember>,
}

/// Splits a pool evenly across its members.
pub fn per_member_amount(total_amount: f64, member_count: usize) -> f64 {
    if member_count == 0 {
        0.0
    } else {
        total_amount / member_count as f64
    }
}
