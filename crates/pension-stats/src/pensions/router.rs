use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Json, Router,
};

use super::benefits::{BenefitTableQuery, BenefitTableResponse};
use super::page::render_landing_page;
use super::service::PensionReportService;
use super::store::PensionStore;
use crate::error::AppError;

/// Routes for the landing page and the benefit table feed.
pub fn pension_router<S>(service: Arc<PensionReportService<S>>) -> Router
where
    S: PensionStore + 'static,
{
    Router::new()
        .route("/", get(index_handler::<S>))
        .route("/benefits.json", get(benefit_table_handler::<S>))
        .with_state(service)
}

pub(crate) async fn index_handler<S>(
    State(service): State<Arc<PensionReportService<S>>>,
) -> Result<Html<String>, AppError>
where
    S: PensionStore + 'static,
{
    let context = tokio::task::spawn_blocking(move || service.landing_context()).await??;
    let page = render_landing_page(&context)?;
    Ok(Html(page))
}

pub(crate) async fn benefit_table_handler<S>(
    State(service): State<Arc<PensionReportService<S>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<BenefitTableResponse>, AppError>
where
    S: PensionStore + 'static,
{
    let query = BenefitTableQuery::from_pairs(&pairs)?;
    let response = tokio::task::spawn_blocking(move || service.benefit_table(&query)).await??;
    Ok(Json(response))
}
