use crate::cli::ServeArgs;
use crate::infra::{open_store, report_service, AppState};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use pension_stats::config::{AppConfig, AppEnvironment};
use pension_stats::error::AppError;
use pension_stats::site::SiteState;
use pension_stats::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.environment == AppEnvironment::Production && config.uses_default_secret() {
        warn!("SECRET_KEY is unset; using the development default in production");
    }
    if !config.identity.is_configured() {
        warn!("identity provider not configured; login and logout stay local");
    }
    if config.mailing_list.is_configured() {
        info!("mailing list credentials loaded");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = open_store(&config)?;
    let service = report_service(&config, store);
    let site = SiteState::from_config(&config);

    let app = with_application_routes(service, site, config.site.allowed_hosts.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.database.url,
        debug = config.debug,
        "pension stats service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
