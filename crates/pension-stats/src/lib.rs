//! Pension fund solvency statistics: cached aggregate queries over fund,
//! annual report and benefit tables, shaped into chart-ready JSON, plus a
//! paginated benefit drill-down.

pub mod cache;
pub mod config;
pub mod error;
pub mod humanize;
pub mod pensions;
pub mod site;
pub mod telemetry;
