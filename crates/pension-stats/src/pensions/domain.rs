use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundType {
    State,
    County,
    Chicago,
    Downstate,
}

impl FundType {
    pub const fn ordered() -> [Self; 4] {
        [Self::State, Self::County, Self::Chicago, Self::Downstate]
    }

    /// Stored code, as written by the import jobs.
    pub const fn code(self) -> &'static str {
        match self {
            Self::State => "STATE",
            Self::County => "COUNTY",
            Self::Chicago => "CHICAGO",
            Self::Downstate => "DOWNSTATE",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::State => "State",
            Self::County => "County",
            Self::Chicago => "Chicago Municipal",
            Self::Downstate => "Downstate",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|fund_type| fund_type.code().eq_ignore_ascii_case(raw.trim()))
    }

    /// DOM id of the system-wide pie chart for this fund type.
    pub fn container(self) -> String {
        format!("{}-container", self.code().to_ascii_lowercase())
    }
}

impl fmt::Display for FundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PensionFund {
    pub id: i64,
    pub name: String,
    pub fund_type: FundType,
}

/// One fund's actuarial filing for a data year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualReport {
    pub fund_id: i64,
    pub data_year: i32,
    pub assets: f64,
    pub total_liability: f64,
    pub employer_normal_cost: f64,
    pub amortization_cost: f64,
    pub employer_contribution: f64,
}

impl AnnualReport {
    /// Assets over total liability; zero when no liability was reported.
    pub fn funded_ratio(&self) -> f64 {
        if self.total_liability == 0.0 {
            0.0
        } else {
            self.assets / self.total_liability
        }
    }

    pub fn unfunded_liability(&self) -> f64 {
        self.total_liability - self.assets
    }

    /// Funded ratio as a whole percentage.
    pub fn funding_level(&self) -> i64 {
        (self.funded_ratio() * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: i64,
    pub fund_id: i64,
    pub data_year: i32,
    pub first_name: String,
    pub last_name: String,
    pub amount: f64,
    pub years_of_service: Option<i32>,
    pub final_salary: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub status: String,
}
