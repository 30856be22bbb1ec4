use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum EmploymentStatus {
    Active,
    Resigned,
    Terminated,
    #[serde(rename = "On Leave")]
    #[strum(serialize = "On Leave")]
    OnLeave,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfficialDetails {
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "Backend Developer")]
    pub designation: Option<String>,
    #[schema(example = "Full Time")]
    pub employee_type: Option<String>,
    #[schema(example = "2024-01-01", value_type = Option<String>, format = "date")]
    pub joining_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    #[schema(example = "HDFC Bank")]
    pub bank_name: Option<String>,
    pub branch_name: Option<String>,
    pub account_holder_name: Option<String>,
    #[schema(example = "001234567890")]
    pub account_number: Option<String>,
    #[schema(example = "HDFC0000123")]
    pub ifsc_code: Option<String>,
    #[schema(example = "Savings")]
    pub account_type: Option<String>,
}

/// Monthly salary structure. `ctc` is the figure payroll falls back to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalaryStructure {
    #[schema(example = 25000.0)]
    pub basic: f64,
    #[schema(example = 10000.0)]
    pub hra: f64,
    #[schema(example = 1250.0)]
    pub medical_allowance: f64,
    #[schema(example = 1600.0)]
    pub conveyance_allowance: f64,
    #[schema(example = 2150.0)]
    pub other_allowances: f64,
    #[schema(example = 0.0)]
    pub deductions: f64,
    #[schema(example = 40000.0)]
    pub ctc: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: Option<String>,

    #[schema(example = "John")]
    pub first_name: Option<String>,

    #[schema(example = "Doe")]
    pub last_name: Option<String>,

    #[schema(example = "john.doe@company.com")]
    pub email: Option<String>,

    #[schema(example = "9876543210")]
    pub phone_number: Option<String>,

    #[sqlx(flatten)]
    pub official_details: OfficialDetails,

    #[sqlx(flatten)]
    pub bank_details: BankDetails,

    #[sqlx(flatten)]
    pub salary: SalaryStructure,

    #[schema(example = "Active")]
    pub employment_status: String,
}

impl Employee {
    /// "First Last" with `N/A` standing in for a missing first name.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or("N/A"),
            self.last_name.as_deref().unwrap_or("")
        )
    }

    pub fn department(&self) -> &str {
        self.official_details.department.as_deref().unwrap_or("")
    }

    pub fn designation(&self) -> &str {
        self.official_details.designation.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
impl Employee {
    /// An active engineer on a 30 000 CTC.
    pub fn sample(id: u64) -> Self {
        Employee {
            id,
            employee_code: Some(format!("EMP-{id:03}")),
            first_name: Some("Asha".into()),
            last_name: Some("Rao".into()),
            email: Some("asha.rao@company.com".into()),
            phone_number: None,
            official_details: OfficialDetails {
                department: Some("Engineering".into()),
                designation: Some("Backend Developer".into()),
                employee_type: Some("Full Time".into()),
                joining_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            },
            bank_details: BankDetails {
                bank_name: Some("HDFC Bank".into()),
                account_number: Some("001234567890".into()),
                ifsc_code: Some("HDFC0000123".into()),
                ..Default::default()
            },
            salary: SalaryStructure {
                basic: 15_000.0,
                hra: 7_500.0,
                medical_allowance: 1_250.0,
                conveyance_allowance: 1_600.0,
                other_allowances: 4_650.0,
                deductions: 0.0,
                ctc: 30_000.0,
            },
            employment_status: EmploymentStatus::Active.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(first: Option<&str>, last: Option<&str>) -> Employee {
        Employee {
            id: 1,
            employee_code: None,
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            email: None,
            phone_number: None,
            official_details: OfficialDetails::default(),
            bank_details: BankDetails::default(),
            salary: SalaryStructure::default(),
            employment_status: EmploymentStatus::Active.to_string(),
        }
    }

    #[test]
    fn display_name_fills_gaps() {
        assert_eq!(employee(Some("Asha"), Some("Rao")).display_name(), "Asha Rao");
        assert_eq!(employee(None, None).display_name(), "N/A ");
    }

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(EmploymentStatus::OnLeave.to_string(), "On Leave");
        assert_eq!("On Leave".parse::<EmploymentStatus>(), Ok(EmploymentStatus::OnLeave));
        assert!("Retired".parse::<EmploymentStatus>().is_err());
    }
}
