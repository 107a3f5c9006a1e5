//! Site-level glue around the reports: identity provider redirects, the
//! deployment health check, and host validation.

pub mod auth;
pub mod health;
pub mod hosts;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};

use crate::config::{AppConfig, IdentityProviderConfig};

pub use hosts::{host_allowed, with_allowed_hosts};

#[derive(Debug, Clone)]
pub struct SiteState {
    pub identity: IdentityProviderConfig,
    pub deployment_id_file: PathBuf,
}

impl SiteState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            identity: config.identity.clone(),
            deployment_id_file: config.site.deployment_id_file.clone(),
        }
    }
}

pub fn site_router(state: SiteState) -> Router {
    Router::new()
        .route("/login/", get(auth::login_handler))
        .route("/logout/", get(auth::logout_handler))
        .route("/pong/", get(health::pong_handler))
        .with_state(Arc::new(state))
}
