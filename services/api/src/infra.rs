use metrics_exporter_prometheus::PrometheusHandle;
use pension_stats::cache::ResultCache;
use pension_stats::config::AppConfig;
use pension_stats::error::AppError;
use pension_stats::pensions::{PensionReportService, SqliteStore};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the configured database, creating the tables when they are missing.
pub(crate) fn open_store(config: &AppConfig) -> Result<Arc<SqliteStore>, AppError> {
    let store = SqliteStore::open(&config.database.url)?;
    store.bootstrap_schema()?;
    Ok(Arc::new(store))
}

/// Debug mode never caches so edits to the data show up on the next request.
pub(crate) fn report_cache(config: &AppConfig) -> ResultCache {
    if config.debug {
        info!("debug mode: aggregate caching disabled");
        ResultCache::disabled()
    } else {
        ResultCache::new(config.reporting.cache_timeout)
    }
}

pub(crate) fn report_service(
    config: &AppConfig,
    store: Arc<SqliteStore>,
) -> Arc<PensionReportService<SqliteStore>> {
    Arc::new(PensionReportService::new(
        store,
        Arc::new(report_cache(config)),
        config.reporting.years(),
    ))
}
