use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::debug;

use super::benefits::{BenefitTableQuery, BenefitTableResponse};
use super::domain::PensionFund;
use super::report::views::{
    AggregateFunding, BenefitAggregates, BinnedBenefitData, FundListing, LandingContext,
    YearSummary,
};
use super::report::{
    aggregate_funding_by_year, benefit_aggregates_by_year, binned_benefits_by_year, data_by_year,
};
use super::store::{BinSpec, PensionStore, StoreError};
use crate::cache::ResultCache;
use std::collections::BTreeMap;

pub const AGGREGATE_FUNDING_KEY: &str = "aggregate_funding";
pub const BENEFIT_AGGREGATES_KEY: &str = "benefit_aggregates";
pub const BINNED_BENEFIT_DATA_KEY: &str = "binned_benefit_data";

/// Read-side service behind the landing page and the benefit table.
pub struct PensionReportService<S> {
    store: Arc<S>,
    cache: Arc<ResultCache>,
    years: RangeInclusive<i32>,
}

impl<S> PensionReportService<S>
where
    S: PensionStore + 'static,
{
    pub fn new(store: Arc<S>, cache: Arc<ResultCache>, years: RangeInclusive<i32>) -> Self {
        Self {
            store,
            cache,
            years,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn data_years(&self) -> Vec<i32> {
        self.years.clone().collect()
    }

    pub fn pension_funds(&self) -> Result<Vec<PensionFund>, StoreError> {
        self.store.funds()
    }

    /// Funded/unfunded pies per fund type, keyed by year.
    pub fn aggregate_funding(&self) -> Result<AggregateFunding, StoreError> {
        self.cache
            .get_or_try_insert_with(AGGREGATE_FUNDING_KEY, || {
                let rows = self.store.funding_by_fund_type()?;
                Ok(aggregate_funding_by_year(&self.data_years(), &rows))
            })
    }

    /// Median benefit and benefit count per fund, keyed by year.
    pub fn benefit_aggregates(&self) -> Result<BenefitAggregates, StoreError> {
        self.cache
            .get_or_try_insert_with(BENEFIT_AGGREGATES_KEY, || {
                let rows = self.store.benefit_summaries()?;
                Ok(benefit_aggregates_by_year(&self.data_years(), &rows))
            })
    }

    pub fn binned_benefit_data(
        &self,
        funds: &[PensionFund],
    ) -> Result<BinnedBenefitData, StoreError> {
        self.cache
            .get_or_try_insert_with(BINNED_BENEFIT_DATA_KEY, || {
                let spec = BinSpec::BENEFIT_DISTRIBUTION;
                let rows = self.store.benefit_histogram(spec)?;
                Ok(binned_benefits_by_year(&self.data_years(), funds, &rows, spec))
            })
    }

    pub fn data_by_year(&self) -> Result<BTreeMap<i32, YearSummary>, StoreError> {
        let funds = self.pension_funds()?;
        self.data_by_year_for(&funds)
    }

    fn data_by_year_for(
        &self,
        funds: &[PensionFund],
    ) -> Result<BTreeMap<i32, YearSummary>, StoreError> {
        let binned = self.binned_benefit_data(funds)?;
        let aggregates = self.benefit_aggregates()?;
        let aggregate_funding = self.aggregate_funding()?;
        let reports = self.store.annual_reports()?;

        Ok(data_by_year(
            &self.data_years(),
            funds,
            &reports,
            &aggregate_funding,
            &aggregates,
            &binned,
        ))
    }

    pub fn landing_context(&self) -> Result<LandingContext, StoreError> {
        let funds = self.pension_funds()?;
        let data_by_year = self.data_by_year_for(&funds)?;

        let pension_funds = funds
            .into_iter()
            .map(|fund| FundListing {
                fund_type_label: fund.fund_type.label(),
                fund_type: fund.fund_type,
                name: fund.name,
            })
            .collect();

        Ok(LandingContext {
            data_years: self.data_years(),
            pension_funds,
            data_by_year,
        })
    }

    pub fn benefit_table(
        &self,
        query: &BenefitTableQuery,
    ) -> Result<BenefitTableResponse, StoreError> {
        let page = self.store.benefit_page(query)?;
        debug!(
            fund = %query.fund,
            data_year = query.data_year,
            records_filtered = page.filtered,
            "benefit table served"
        );
        Ok(BenefitTableResponse::from_page(query, page))
    }
}
