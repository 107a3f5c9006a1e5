use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use pension_stats::pensions::{pension_router, PensionReportService, PensionStore};
use pension_stats::site::{site_router, with_allowed_hosts, SiteState};
use serde_json::json;
use std::sync::Arc;

/// Report pages, site glue, and the operational endpoints behind one host check.
pub(crate) fn with_application_routes<S>(
    service: Arc<PensionReportService<S>>,
    site: SiteState,
    allowed_hosts: Vec<String>,
) -> Router
where
    S: PensionStore + 'static,
{
    let app = pension_router(service)
        .merge(site_router(site))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint));

    with_allowed_hosts(app, allowed_hosts)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use pension_stats::cache::ResultCache;
    use pension_stats::config::IdentityProviderConfig;
    use pension_stats::pensions::SqliteStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(readiness: Arc<AtomicBool>) -> Router {
        let store = SqliteStore::in_memory().expect("in-memory database");
        store.bootstrap_schema().expect("schema created");
        let service = Arc::new(PensionReportService::new(
            Arc::new(store),
            Arc::new(ResultCache::disabled()),
            2012..=2019,
        ));
        let site = SiteState {
            identity: IdentityProviderConfig::default(),
            deployment_id_file: std::env::temp_dir().join("pension-stats-routes-missing.txt"),
        };
        let state = AppState {
            readiness,
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        with_application_routes(service, site, vec!["pensions.example.org".to_string()])
            .layer(Extension(state))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::HOST, "pensions.example.org")
            .body(Body::empty())
            .expect("request")
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(Arc::new(AtomicBool::new(false)))
            .oneshot(get_request("/health"))
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let readiness = Arc::new(AtomicBool::new(false));
        let router = app(readiness.clone());

        let response = router
            .clone()
            .oneshot(get_request("/ready"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json(response).await["status"], "initializing");

        readiness.store(true, Ordering::Release);
        let response = router
            .oneshot(get_request("/ready"))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn landing_page_and_site_routes_share_the_app() {
        let router = app(Arc::new(AtomicBool::new(true)));

        let landing = router
            .clone()
            .oneshot(get_request("/"))
            .await
            .expect("router dispatch");
        assert_eq!(landing.status(), StatusCode::OK);

        let pong = router
            .clone()
            .oneshot(get_request("/pong/"))
            .await
            .expect("router dispatch");
        assert_eq!(pong.status(), StatusCode::UNAUTHORIZED);

        let foreign = Request::builder()
            .uri("/health")
            .header(header::HOST, "attacker.example.net")
            .body(Body::empty())
            .expect("request");
        let rejected = router.oneshot(foreign).await.expect("router dispatch");
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }
}
