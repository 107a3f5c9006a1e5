use super::benefits::BenefitTableQuery;
use super::domain::{AnnualReport, Benefit, FundType, PensionFund};

/// System-wide funded/unfunded totals for one fund type in one year.
#[derive(Debug, Clone, PartialEq)]
pub struct FundTypeFunding {
    pub data_year: i32,
    pub fund_type: FundType,
    pub funded_liability: f64,
    pub unfunded_liability: f64,
}

/// Median and count of benefit amounts for a fund in a year.
#[derive(Debug, Clone, PartialEq)]
pub struct BenefitSummaryRow {
    pub data_year: i32,
    pub fund_name: String,
    pub median: f64,
    pub count: i64,
}

/// One populated histogram bucket. Buckets are 1-based; the bucket past the
/// last regular bin collects everything at or above the distribution max.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramRow {
    pub data_year: i32,
    pub fund_name: String,
    pub bucket_index: i64,
    pub max_value: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSpec {
    pub bins: i64,
    pub max: f64,
}

impl BinSpec {
    pub const BENEFIT_DISTRIBUTION: Self = Self {
        bins: 10,
        max: 250_000.0,
    };

    pub fn width(&self) -> f64 {
        self.max / self.bins as f64
    }
}

/// A page of benefit rows plus the counts a paginated table needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BenefitPage {
    pub total: i64,
    pub filtered: i64,
    pub rows: Vec<Benefit>,
}

/// Read-only query surface over the pension tables.
pub trait PensionStore: Send + Sync {
    fn funds(&self) -> Result<Vec<PensionFund>, StoreError>;
    fn annual_reports(&self) -> Result<Vec<AnnualReport>, StoreError>;
    fn funding_by_fund_type(&self) -> Result<Vec<FundTypeFunding>, StoreError>;
    fn benefit_summaries(&self) -> Result<Vec<BenefitSummaryRow>, StoreError>;
    fn benefit_histogram(&self, spec: BinSpec) -> Result<Vec<HistogramRow>, StoreError>;
    fn benefit_page(&self, query: &BenefitTableQuery) -> Result<BenefitPage, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported database url '{0}': expected sqlite://<path>, a file path, or :memory:")]
    UnsupportedUrl(String),
    #[error("unknown fund type '{0}'")]
    UnknownFundType(String),
    #[error("database connection unavailable: lock poisoned")]
    Poisoned,
}
