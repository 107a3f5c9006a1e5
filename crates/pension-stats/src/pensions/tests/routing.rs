use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use crate::cache::ResultCache;
use crate::pensions::domain::FundType;
use crate::pensions::router::pension_router;
use crate::site::with_allowed_hosts;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::HOST, "pensions.example.org")
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn landing_page_embeds_chart_data() {
    let fixture = fixture();
    let router = pension_router(service(fixture.store, ResultCache::default()));

    let response = router.oneshot(get("/")).await.expect("router dispatch");
    let (status, html) = text_body(response).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"<script id="data-by-year" type="application/json">"#));
    assert!(html.contains(EXAMPLE_FUND));
    assert!(html.contains(r#""funding_level":80"#));
    assert!(html.contains(r#"<option value="2019" selected>2019</option>"#));
}

#[tokio::test]
async fn benefit_table_filters_by_fund_year_and_name_prefix() {
    let fixture = fixture();
    let router = pension_router(service(fixture.store, ResultCache::default()));

    let response = router
        .oneshot(get(
            "/benefits.json?fund=Example%20Fund&data_year=2015&search%5Bvalue%5D=SM&draw=3&order%5B0%5D%5Bcolumn%5D=1&order%5B0%5D%5Bdir%5D=asc",
        ))
        .await
        .expect("router dispatch");
    let (status, payload) = json_body(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["draw"], 3);
    assert_eq!(payload["recordsTotal"], 12);
    assert_eq!(payload["recordsFiltered"], 2);
    assert_eq!(payload["result"], "ok");

    let rows = payload["data"].as_array().expect("rows array");
    let names: Vec<(&str, &str)> = rows
        .iter()
        .map(|row| {
            (
                row[0].as_str().expect("first name"),
                row[1].as_str().expect("last name"),
            )
        })
        .collect();
    assert_eq!(names, vec![("smitty", "Jones"), ("Ada", "Smith")]);

    let first = rows[0].as_array().expect("row array");
    assert_eq!(first.len(), 7);
    assert_eq!(first[2], 26_000.0);
    assert_eq!(first[3], 20);
    assert_eq!(first[5], "1995-07-01");
    assert_eq!(first[6], "Active");
}

#[tokio::test]
async fn benefit_table_pages_through_results() {
    let fixture = fixture();
    let router = pension_router(service(fixture.store, ResultCache::default()));

    let response = router
        .oneshot(get(
            "/benefits.json?fund=Example%20Fund&data_year=2015&start=2&length=2&order%5B0%5D%5Bcolumn%5D=2&order%5B0%5D%5Bdir%5D=desc",
        ))
        .await
        .expect("router dispatch");
    let (status, payload) = json_body(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["recordsFiltered"], 7);
    let amounts: Vec<f64> = payload["data"]
        .as_array()
        .expect("rows")
        .iter()
        .map(|row| row[2].as_f64().expect("amount"))
        .collect();
    assert_eq!(amounts, vec![30_000.0, 26_000.0]);
}

#[tokio::test]
async fn benefit_table_rejects_missing_parameters() {
    let fixture = fixture();
    let router = pension_router(service(fixture.store, ResultCache::default()));

    let response = router
        .clone()
        .oneshot(get("/benefits.json?fund=Example%20Fund"))
        .await
        .expect("router dispatch");
    let (status, payload) = json_body(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("data_year"));

    let response = router
        .oneshot(get("/benefits.json?fund=Example%20Fund&data_year=twenty"))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn benefit_table_never_returns_more_than_five_hundred_rows() {
    let fixture = fixture();
    let bulk_id = fixture
        .store
        .insert_fund("Bulk Fund", FundType::Downstate)
        .expect("fund inserted");
    let benefits: Vec<_> = (0..600)
        .map(|index| benefit(bulk_id, 2017, "Retiree", &format!("Number{index:03}"), 1_000.0))
        .collect();
    fixture.store.insert_benefits(&benefits).expect("benefits inserted");

    let router = pension_router(service(fixture.store, ResultCache::default()));

    for length in ["1000", "-1", "500"] {
        let response = router
            .clone()
            .oneshot(get(&format!(
                "/benefits.json?fund=Bulk%20Fund&data_year=2017&length={length}"
            )))
            .await
            .expect("router dispatch");
        let (status, payload) = json_body(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["recordsFiltered"], 600);
        assert_eq!(
            payload["data"].as_array().expect("rows").len(),
            500,
            "length {length}"
        );
    }
}

#[tokio::test]
async fn disallowed_hosts_are_rejected() {
    let fixture = fixture();
    let router = with_allowed_hosts(
        pension_router(service(fixture.store, ResultCache::default())),
        vec!["pensions.example.org".to_string()],
    );

    let allowed = router
        .clone()
        .oneshot(get("/benefits.json?fund=Example%20Fund&data_year=2015"))
        .await
        .expect("router dispatch");
    assert_eq!(allowed.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/")
        .header(header::HOST, "evil.example.com")
        .body(Body::empty())
        .expect("request");
    let rejected = router.oneshot(request).await.expect("router dispatch");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
}
