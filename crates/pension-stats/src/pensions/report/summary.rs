use super::super::domain::{AnnualReport, PensionFund};
use super::super::store::{BenefitSummaryRow, BinSpec, FundTypeFunding, HistogramRow};
use super::views::{
    AggregateFunding, BarChart, BarSeries, BenefitAggregate, BenefitAggregates,
    BinnedBenefitData, FundYearSummary, HistogramBin, PieChart, PieSeries, PieSlice,
    YearSummary, AMORTIZATION_CONTAINER, FUND_CONTAINER,
};
use crate::humanize::{intword, intword_f64};
use std::collections::{BTreeMap, HashMap};

impl PieChart {
    pub fn funding(container: impl Into<String>, funded: f64, unfunded: f64) -> Self {
        Self {
            container: container.into(),
            label_format: "${point.label}",
            total_liability: intword_f64(funded + unfunded),
            series_data: PieSeries {
                name: "Data",
                data: vec![
                    PieSlice {
                        name: "Funded",
                        y: funded,
                        label: intword_f64(funded),
                    },
                    PieSlice {
                        name: "Unfunded",
                        y: unfunded,
                        label: intword_f64(unfunded),
                    },
                ],
            },
        }
    }
}

impl BarChart {
    pub fn costs(container: impl Into<String>, normal_cost: f64, amortization_cost: f64) -> Self {
        Self {
            container: container.into(),
            pretty_amortization_cost: intword_f64(amortization_cost),
            pretty_employer_normal_cost: intword_f64(normal_cost),
            x_axis_categories: vec![""],
            axis_label: "Dollars",
            funded: BarSeries {
                name: "<strong>Amortization Cost:</strong> Present cost of paying down past debt",
                data: vec![amortization_cost],
                color: "#dc3545",
                legend_index: 1,
            },
            unfunded: BarSeries {
                name: "<strong>Employer Normal Cost:</strong> Projected cost to cover future benefits for current employees",
                data: vec![normal_cost],
                color: "#01406c",
                legend_index: 0,
            },
            stacked: "true",
        }
    }
}

impl FundYearSummary {
    pub fn from_report(report: &AnnualReport) -> Self {
        Self {
            aggregate_funding: PieChart::funding(
                FUND_CONTAINER,
                report.assets,
                report.unfunded_liability(),
            ),
            amortization_cost: BarChart::costs(
                AMORTIZATION_CONTAINER,
                report.employer_normal_cost,
                report.amortization_cost,
            ),
            total_liability: intword_f64(report.total_liability),
            employer_contribution: intword_f64(report.employer_contribution),
            funding_level: report.funding_level(),
            binned_benefit_data: Vec::new(),
            median_benefit: 0.0,
            total_benefits: 0,
        }
    }

    /// Zeroed summary for a fund with no report in a year.
    pub fn empty() -> Self {
        Self {
            aggregate_funding: PieChart::funding(FUND_CONTAINER, 0.0, 0.0),
            amortization_cost: BarChart::costs(AMORTIZATION_CONTAINER, 0.0, 0.0),
            total_liability: intword(0),
            employer_contribution: intword(0),
            funding_level: 0,
            binned_benefit_data: Vec::new(),
            median_benefit: 0.0,
            total_benefits: 0,
        }
    }
}

fn year_map<T: Default>(years: &[i32]) -> BTreeMap<i32, T> {
    years.iter().map(|year| (*year, T::default())).collect()
}

/// System-wide pies per year, one per fund type with reports.
pub fn aggregate_funding_by_year(years: &[i32], rows: &[FundTypeFunding]) -> AggregateFunding {
    let mut data: AggregateFunding = year_map(years);

    for row in rows {
        if let Some(charts) = data.get_mut(&row.data_year) {
            charts.push(PieChart::funding(
                row.fund_type.container(),
                row.funded_liability,
                row.unfunded_liability,
            ));
        }
    }

    data
}

pub fn benefit_aggregates_by_year(years: &[i32], rows: &[BenefitSummaryRow]) -> BenefitAggregates {
    let mut data: BenefitAggregates = year_map(years);

    for row in rows {
        if let Some(funds) = data.get_mut(&row.data_year) {
            funds.insert(
                row.fund_name.clone(),
                BenefitAggregate {
                    median: row.median,
                    count: row.count,
                },
            );
        }
    }

    data
}

/// Builds `spec.bins + 1` bins for every fund and year, filling gaps with
/// zero counts. The final bin's upper edge stretches to the largest amount
/// seen when that exceeds the distribution max.
pub fn binned_benefits_by_year(
    years: &[i32],
    funds: &[PensionFund],
    rows: &[HistogramRow],
    spec: BinSpec,
) -> BinnedBenefitData {
    let populated: HashMap<(i32, &str, i64), (i64, f64)> = rows
        .iter()
        .map(|row| {
            (
                (row.data_year, row.fund_name.as_str(), row.bucket_index),
                (row.count, row.max_value),
            )
        })
        .collect();

    let width = spec.width();

    years
        .iter()
        .map(|&year| {
            let by_fund = funds
                .iter()
                .map(|fund| {
                    let bins = (0..=spec.bins)
                        .map(|index| {
                            let (count, max_value) = populated
                                .get(&(year, fund.name.as_str(), index + 1))
                                .copied()
                                .unwrap_or((0, 0.0));

                            let lower = (index as f64 * width) as i64;
                            let mut upper = (lower as f64 + width) as i64;
                            if index == spec.bins && max_value > upper as f64 {
                                upper = max_value.trunc() as i64;
                            }

                            HistogramBin {
                                y: count,
                                lower_edge: intword(lower),
                                upper_edge: intword(upper),
                            }
                        })
                        .collect();
                    (fund.name.clone(), bins)
                })
                .collect();
            (year, by_fund)
        })
        .collect()
}

/// Merges report-derived charts with benefit aggregates into one entry per
/// year, with an entry for every fund in every year.
pub fn data_by_year(
    years: &[i32],
    funds: &[PensionFund],
    reports: &[AnnualReport],
    aggregate_funding: &AggregateFunding,
    benefit_aggregates: &BenefitAggregates,
    binned: &BinnedBenefitData,
) -> BTreeMap<i32, YearSummary> {
    let reports_by_key: HashMap<(i64, i32), &AnnualReport> = reports
        .iter()
        .map(|report| ((report.fund_id, report.data_year), report))
        .collect();

    years
        .iter()
        .map(|&year| {
            let data_by_fund = funds
                .iter()
                .map(|fund| {
                    let mut summary = reports_by_key
                        .get(&(fund.id, year))
                        .map(|report| FundYearSummary::from_report(report))
                        .unwrap_or_else(FundYearSummary::empty);

                    if let Some(bins) = binned.get(&year).and_then(|funds| funds.get(&fund.name)) {
                        summary.binned_benefit_data = bins.clone();
                    }

                    let aggregate = benefit_aggregates
                        .get(&year)
                        .and_then(|funds| funds.get(&fund.name))
                        .copied()
                        .unwrap_or(BenefitAggregate {
                            median: 0.0,
                            count: 0,
                        });
                    summary.median_benefit = aggregate.median;
                    summary.total_benefits = aggregate.count;

                    (fund.name.clone(), summary)
                })
                .collect();

            let summary = YearSummary {
                aggregate_funding: aggregate_funding.get(&year).cloned().unwrap_or_default(),
                data_by_fund,
            };
            (year, summary)
        })
        .collect()
}
