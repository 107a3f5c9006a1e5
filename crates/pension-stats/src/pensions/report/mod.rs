mod summary;
pub mod views;

pub use summary::{
    aggregate_funding_by_year, benefit_aggregates_by_year, binned_benefits_by_year, data_by_year,
};
