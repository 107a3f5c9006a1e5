use super::super::domain::FundType;
use serde::Serialize;
use std::collections::BTreeMap;

pub const FUND_CONTAINER: &str = "fund-container";
pub const AMORTIZATION_CONTAINER: &str = "amortization-cost";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: &'static str,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSeries {
    #[serde(rename = "Name")]
    pub name: &'static str,
    pub data: Vec<PieSlice>,
}

/// Funded vs. unfunded liability pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub container: String,
    pub label_format: &'static str,
    pub total_liability: String,
    pub series_data: PieSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: &'static str,
    pub data: Vec<f64>,
    pub color: &'static str,
    #[serde(rename = "legendIndex")]
    pub legend_index: u8,
}

/// Stacked amortization cost vs. employer normal cost bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub container: String,
    pub pretty_amortization_cost: String,
    pub pretty_employer_normal_cost: String,
    pub x_axis_categories: Vec<&'static str>,
    pub axis_label: &'static str,
    pub funded: BarSeries,
    pub unfunded: BarSeries,
    pub stacked: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    /// Number of benefits in the bin.
    pub y: i64,
    pub lower_edge: String,
    pub upper_edge: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BenefitAggregate {
    pub median: f64,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundYearSummary {
    pub aggregate_funding: PieChart,
    pub amortization_cost: BarChart,
    pub total_liability: String,
    pub employer_contribution: String,
    pub funding_level: i64,
    pub binned_benefit_data: Vec<HistogramBin>,
    pub median_benefit: f64,
    pub total_benefits: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub aggregate_funding: Vec<PieChart>,
    pub data_by_fund: BTreeMap<String, FundYearSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundListing {
    pub name: String,
    pub fund_type: FundType,
    pub fund_type_label: &'static str,
}

/// Everything the landing page needs to draw its charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandingContext {
    pub data_years: Vec<i32>,
    pub pension_funds: Vec<FundListing>,
    pub data_by_year: BTreeMap<i32, YearSummary>,
}

pub type AggregateFunding = BTreeMap<i32, Vec<PieChart>>;
pub type BenefitAggregates = BTreeMap<i32, BTreeMap<String, BenefitAggregate>>;
pub type BinnedBenefitData = BTreeMap<i32, BTreeMap<String, Vec<HistogramBin>>>;
