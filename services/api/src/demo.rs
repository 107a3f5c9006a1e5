use crate::infra::{open_store, report_service};
use chrono::NaiveDate;
use clap::Args;
use pension_stats::config::AppConfig;
use pension_stats::error::AppError;
use pension_stats::humanize::intword_f64;
use pension_stats::pensions::{
    AnnualReport, Benefit, BenefitColumn, BenefitTableQuery, ColumnOrder, FundType,
    PensionReportService, PensionStore, SortDirection, SqliteStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Data year to summarize
    #[arg(long)]
    pub(crate) year: i32,
    /// Restrict the output to one fund (exact name)
    #[arg(long)]
    pub(crate) fund: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// SQLite file to seed. Defaults to an in-memory database.
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

const DEMO_FUNDS: [(&str, FundType, f64, f64); 4] = [
    ("Teachers' Retirement System", FundType::State, 120_000_000_000.0, 0.41),
    ("Cook County Employees", FundType::County, 16_000_000_000.0, 0.62),
    ("Chicago Police", FundType::Chicago, 12_000_000_000.0, 0.27),
    ("Peoria Firefighters", FundType::Downstate, 310_000_000.0, 0.55),
];

const FIRST_NAMES: [&str; 8] = [
    "Maria", "James", "Patricia", "Robert", "Linda", "Michael", "Barbara", "David",
];
const LAST_NAMES: [&str; 6] = ["Kowalski", "Johnson", "Nguyen", "Smith", "Garcia", "Okafor"];
const BENEFITS_PER_FUND_YEAR: usize = 24;

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = open_store(&config)?;
    let service = report_service(&config, store);

    print_report(&service, args.year, args.fund.as_deref())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let target = args
        .database
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());
    let store = SqliteStore::open(&target)?;
    store.bootstrap_schema()?;

    println!("Pension stats demo ({target})");
    if store.funds()?.is_empty() {
        let years = config.reporting.years();
        let inserted = seed_demo_data(&store, years.clone().collect::<Vec<_>>().as_slice())?;
        println!(
            "- Seeded {} funds with {} benefits across {}-{}",
            DEMO_FUNDS.len(),
            inserted,
            years.start(),
            years.end()
        );
    } else {
        println!("- Database already populated; skipping seed");
    }

    let service = report_service(&config, Arc::new(store));
    let year = config.reporting.last_year;
    print_report(&service, year, None)?;

    let Some(fund) = service.pension_funds()?.into_iter().next() else {
        return Ok(());
    };
    let mut query = BenefitTableQuery::new(fund.name.clone(), year);
    query.length = 5;
    query.ordering = vec![ColumnOrder {
        column: BenefitColumn::Amount,
        direction: SortDirection::Desc,
    }];
    let table = service.benefit_table(&query)?;
    println!(
        "\nLargest benefits, {} {} ({} of {} rows)",
        fund.name,
        year,
        table.data.len(),
        table.records_filtered
    );
    for row in &table.data {
        println!("  - {} {}: ${}", row.0, row.1, intword_f64(row.2));
    }

    Ok(())
}

/// Deterministic synthetic funds, reports and benefits for every year given.
fn seed_demo_data(store: &SqliteStore, years: &[i32]) -> Result<usize, AppError> {
    let mut inserted = 0;
    for (fund_index, (name, fund_type, base_liability, base_ratio)) in
        DEMO_FUNDS.iter().enumerate()
    {
        let fund_id = store.insert_fund(name, *fund_type)?;

        for (year_index, &data_year) in years.iter().enumerate() {
            let drift = year_index as f64;
            let total_liability = base_liability * (1.0 + 0.04 * drift);
            let employer_normal_cost = total_liability * 0.015;
            let amortization_cost = total_liability * 0.02;
            store.insert_annual_report(&AnnualReport {
                fund_id,
                data_year,
                assets: total_liability * (base_ratio - 0.01 * drift),
                total_liability,
                employer_normal_cost,
                amortization_cost,
                employer_contribution: employer_normal_cost + amortization_cost * 0.8,
            })?;

            let benefits: Vec<Benefit> = (0..BENEFITS_PER_FUND_YEAR)
                .map(|index| demo_benefit(fund_id, data_year, fund_index, year_index, index))
                .collect();
            inserted += store.insert_benefits(&benefits)?;
        }
    }
    Ok(inserted)
}

fn demo_benefit(
    fund_id: i64,
    data_year: i32,
    fund_index: usize,
    year_index: usize,
    index: usize,
) -> Benefit {
    let step = (index * 37 + fund_index * 11 + year_index * 5) % 40;
    let amount = 12_000.0 + step as f64 * 6_500.0;
    let years_of_service = 10 + (index % 25) as i32;

    Benefit {
        id: 0,
        fund_id,
        data_year,
        first_name: FIRST_NAMES[index % FIRST_NAMES.len()].to_string(),
        last_name: LAST_NAMES[(index / FIRST_NAMES.len() + fund_index) % LAST_NAMES.len()]
            .to_string(),
        amount,
        years_of_service: Some(years_of_service),
        final_salary: Some(amount * 1.6),
        start_date: NaiveDate::from_ymd_opt(1975 + (index % 25) as i32, 1 + (index % 12) as u32, 1),
        status: if index % 7 == 0 { "Survivor" } else { "Retired" }.to_string(),
    }
}

fn print_report<S>(
    service: &PensionReportService<S>,
    year: i32,
    fund: Option<&str>,
) -> Result<(), AppError>
where
    S: PensionStore + 'static,
{
    let mut data_by_year = service.data_by_year()?;
    let Some(summary) = data_by_year.remove(&year) else {
        let years = service.data_years();
        println!(
            "No data for {year}; reporting covers {}-{}",
            years.first().copied().unwrap_or_default(),
            years.last().copied().unwrap_or_default()
        );
        return Ok(());
    };

    println!("\nPension funding report for {year}");
    if fund.is_none() {
        println!("System-wide funding by fund type:");
        for chart in &summary.aggregate_funding {
            let funded = &chart.series_data.data[0];
            let unfunded = &chart.series_data.data[1];
            println!(
                "  - {}: ${} liability | ${} funded | ${} unfunded",
                chart.container, chart.total_liability, funded.label, unfunded.label
            );
        }
    }

    let mut printed = 0;
    for (name, fund_summary) in &summary.data_by_fund {
        if fund.is_some_and(|wanted| wanted != name.as_str()) {
            continue;
        }
        printed += 1;
        println!(
            "- {name}: {}% funded | ${} liability | ${} employer contribution",
            fund_summary.funding_level,
            fund_summary.total_liability,
            fund_summary.employer_contribution
        );
        println!(
            "  {} benefits | median ${}",
            fund_summary.total_benefits,
            intword_f64(fund_summary.median_benefit)
        );
        let histogram: Vec<String> = fund_summary
            .binned_benefit_data
            .iter()
            .filter(|bin| bin.y > 0)
            .map(|bin| format!("{}-{}: {}", bin.lower_edge, bin.upper_edge, bin.y))
            .collect();
        if !histogram.is_empty() {
            println!("  distribution: {}", histogram.join(", "));
        }
    }

    if let Some(wanted) = fund {
        if printed == 0 {
            println!("Unknown fund: {wanted}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_seed_fills_every_fund_and_year() {
        let store = SqliteStore::in_memory().expect("in-memory database");
        store.bootstrap_schema().expect("schema created");

        let years: Vec<i32> = (2012..=2019).collect();
        let inserted = seed_demo_data(&store, &years).expect("seed succeeds");

        assert_eq!(inserted, DEMO_FUNDS.len() * years.len() * BENEFITS_PER_FUND_YEAR);
        assert_eq!(store.funds().expect("funds").len(), DEMO_FUNDS.len());
        assert_eq!(
            store.annual_reports().expect("reports").len(),
            DEMO_FUNDS.len() * years.len()
        );
    }

    #[test]
    fn demo_data_spills_into_the_overflow_bucket() {
        let store = SqliteStore::in_memory().expect("in-memory database");
        store.bootstrap_schema().expect("schema created");
        seed_demo_data(&store, &[2019]).expect("seed succeeds");

        let service = PensionReportService::new(
            Arc::new(store),
            Arc::new(pension_stats::cache::ResultCache::disabled()),
            2019..=2019,
        );
        let data = service.data_by_year().expect("data builds");
        let police = &data[&2019].data_by_fund["Chicago Police"];

        assert_eq!(police.funding_level, 27);
        assert_eq!(police.total_benefits, BENEFITS_PER_FUND_YEAR as i64);
        assert!(police.binned_benefit_data[10].y > 0);
    }
}
