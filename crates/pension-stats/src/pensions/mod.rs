//! Pension fund solvency reporting: the read-only store over fund, annual
//! report and benefit tables, the cached aggregates built from it, and the
//! routes that serve them.

pub mod benefits;
pub mod domain;
mod page;
pub mod report;
pub mod router;
pub mod service;
pub mod sqlite;
pub mod store;

#[cfg(test)]
mod tests;

pub use benefits::{
    BenefitColumn, BenefitRow, BenefitTableQuery, BenefitTableResponse, ColumnOrder,
    SortDirection, TableRequestError, DEFAULT_DISPLAY_LENGTH, MAX_DISPLAY_LENGTH,
};
pub use domain::{AnnualReport, Benefit, FundType, PensionFund};
pub use page::render_landing_page;
pub use report::views::{
    BarChart, BenefitAggregate, FundYearSummary, HistogramBin, LandingContext, PieChart,
    YearSummary,
};
pub use router::pension_router;
pub use service::PensionReportService;
pub use sqlite::SqliteStore;
pub use store::{
    BenefitPage, BenefitSummaryRow, BinSpec, FundTypeFunding, HistogramRow, PensionStore,
    StoreError,
};
