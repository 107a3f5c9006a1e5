use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::cache::ResultCache;
use crate::pensions::domain::{AnnualReport, Benefit, FundType};
use crate::pensions::service::PensionReportService;
use crate::pensions::sqlite::SqliteStore;

pub(super) const EXAMPLE_FUND: &str = "Example Fund";
pub(super) const CHICAGO_FUND: &str = "Chicago Police";
pub(super) const COUNTY_FUND: &str = "Cook County Employees";
pub(super) const DOWNSTATE_FUND: &str = "Downstate Fire";

pub(super) struct Fixture {
    pub(super) store: Arc<SqliteStore>,
    pub(super) example_id: i64,
    pub(super) chicago_id: i64,
    pub(super) county_id: i64,
}

pub(super) fn report(fund_id: i64, data_year: i32, assets: f64, total_liability: f64) -> AnnualReport {
    AnnualReport {
        fund_id,
        data_year,
        assets,
        total_liability,
        employer_normal_cost: 30_000.0,
        amortization_cost: 50_000.0,
        employer_contribution: 70_000.0,
    }
}

pub(super) fn benefit(
    fund_id: i64,
    data_year: i32,
    first_name: &str,
    last_name: &str,
    amount: f64,
) -> Benefit {
    Benefit {
        id: 0,
        fund_id,
        data_year,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        amount,
        years_of_service: Some(20),
        final_salary: Some(amount * 1.5),
        start_date: NaiveDate::from_ymd_opt(1995, 7, 1),
        status: "Active".to_string(),
    }
}

/// Four funds, one per type. Downstate Fire has no reports or benefits.
pub(super) fn fixture() -> Fixture {
    let store = SqliteStore::in_memory().expect("in-memory database");
    store.bootstrap_schema().expect("schema created");

    let example_id = store
        .insert_fund(EXAMPLE_FUND, FundType::State)
        .expect("fund inserted");
    let chicago_id = store
        .insert_fund(CHICAGO_FUND, FundType::Chicago)
        .expect("fund inserted");
    let county_id = store
        .insert_fund(COUNTY_FUND, FundType::County)
        .expect("fund inserted");
    store
        .insert_fund(DOWNSTATE_FUND, FundType::Downstate)
        .expect("fund inserted");

    for annual in [
        report(example_id, 2015, 800_000.0, 1_000_000.0),
        report(chicago_id, 2015, 2_500_000_000.0, 10_000_000_000.0),
        report(county_id, 2016, 600_000.0, 900_000.0),
    ] {
        store.insert_annual_report(&annual).expect("report inserted");
    }

    store
        .insert_benefits(&[
            benefit(example_id, 2015, "Ada", "Smith", 1_200.0),
            benefit(example_id, 2015, "Sam", "Blacksmith", 30_000.0),
            benefit(example_id, 2015, "smitty", "Jones", 26_000.0),
            benefit(example_id, 2015, "Grace", "Hopper", 250_000.0),
            benefit(example_id, 2015, "Alan", "Turing", 310_000.0),
            benefit(example_id, 2015, "Linus", "Zero", 0.0),
            benefit(example_id, 2015, "Neg", "Adjustment", -50.0),
            benefit(chicago_id, 2015, "Pat", "Murphy", 40_000.0),
            benefit(chicago_id, 2015, "Lee", "Nowak", 60_000.0),
            benefit(chicago_id, 2015, "Kim", "Garcia", 80_000.0),
            benefit(chicago_id, 2015, "Ray", "O'Brien", 100_000.0),
            benefit(example_id, 2016, "Ada", "Smith", 1_300.0),
        ])
        .expect("benefits inserted");

    Fixture {
        store: Arc::new(store),
        example_id,
        chicago_id,
        county_id,
    }
}

pub(super) fn service(
    store: Arc<SqliteStore>,
    cache: ResultCache,
) -> Arc<PensionReportService<SqliteStore>> {
    Arc::new(PensionReportService::new(
        store,
        Arc::new(cache),
        2012..=2019,
    ))
}

pub(super) async fn json_body(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024)
        .await
        .expect("read body");
    let payload = serde_json::from_slice(&body).expect("json body");
    (status, payload)
}

pub(super) async fn text_body(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024)
        .await
        .expect("read body");
    (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
}
