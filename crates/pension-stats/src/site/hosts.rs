use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tracing::warn;

use crate::error::AppError;

/// Host part of a `Host` header, lowercased and without the port.
fn host_without_port(raw: &str) -> String {
    let raw = raw.trim();
    let host = if raw.starts_with('[') {
        raw.split_inclusive(']').next().unwrap_or(raw)
    } else {
        raw.split(':').next().unwrap_or(raw)
    };
    host.to_ascii_lowercase()
}

/// Matches a host against patterns: `*` accepts anything, `.example.org`
/// accepts the domain and its subdomains, anything else must match exactly.
/// An empty pattern list accepts every host.
pub fn host_allowed(raw_host: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }

    let host = host_without_port(raw_host);
    if host.is_empty() {
        return false;
    }

    allowed.iter().any(|pattern| {
        if pattern == "*" {
            true
        } else if let Some(domain) = pattern.strip_prefix('.') {
            host == domain || host.ends_with(pattern.as_str())
        } else {
            host == *pattern
        }
    })
}

async fn enforce_allowed_hosts(
    State(allowed): State<Arc<Vec<String>>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if host_allowed(&host, &allowed) {
        next.run(request).await
    } else {
        warn!(%host, "rejected request for disallowed host");
        AppError::DisallowedHost(host).into_response()
    }
}

/// Wraps `router` so requests for hosts outside `allowed` get a 400.
pub fn with_allowed_hosts(router: Router, allowed: Vec<String>) -> Router {
    router.layer(middleware::from_fn_with_state(
        Arc::new(allowed),
        enforce_allowed_hosts,
    ))
}
