use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::SiteState;

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },
    #[error("{0} holds no deployment identifier")]
    Empty(String),
}

/// Reads the identifier the deploy step writes next to the release.
pub async fn read_deployment_id(path: &Path) -> Result<String, DeploymentError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DeploymentError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;

    let id = raw.trim();
    if id.is_empty() {
        return Err(DeploymentError::Empty(path.display().to_string()));
    }
    Ok(id.to_string())
}

pub(crate) async fn pong_handler(State(state): State<Arc<SiteState>>) -> Response {
    match read_deployment_id(&state.deployment_id_file).await {
        Ok(id) => (StatusCode::OK, id).into_response(),
        Err(err) => {
            warn!(error = %err, "deployment identifier unavailable");
            (StatusCode::UNAUTHORIZED, format!("Bad deployment: {err}")).into_response()
        }
    }
}
