use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use super::SiteState;
use crate::config::IdentityProviderConfig;

pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_CALLBACK_PATH: &str = "/complete/auth0/";

/// Absolute URL for `path` on the host the request came in on.
pub fn absolute_uri(headers: &HeaderMap, path: &str) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .filter(|proto| proto.trim().eq_ignore_ascii_case("https"))
        .map(|_| "https")
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .unwrap_or("localhost");

    format!("{scheme}://{host}{path}")
}

pub fn logout_url(identity: &IdentityProviderConfig, return_to: &str) -> String {
    format!(
        "https://{}/v2/logout?client_id={}&returnTo={}",
        identity.domain.trim(),
        urlencoding::encode(identity.client_id.trim()),
        urlencoding::encode(return_to),
    )
}

pub fn authorize_url(identity: &IdentityProviderConfig, redirect_uri: &str) -> String {
    format!(
        "https://{}/authorize?client_id={}&response_type=code&scope={}&redirect_uri={}",
        identity.domain.trim(),
        urlencoding::encode(identity.client_id.trim()),
        urlencoding::encode("openid profile email"),
        urlencoding::encode(redirect_uri),
    )
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax")
}

fn redirect(location: String, clear_session: bool) -> Response {
    if clear_session {
        (
            StatusCode::FOUND,
            [
                (header::LOCATION, location),
                (header::SET_COOKIE, expired_session_cookie()),
            ],
        )
            .into_response()
    } else {
        (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
    }
}

/// Drops the local session and hands off to the identity provider's logout.
pub(crate) async fn logout_handler(
    State(state): State<Arc<SiteState>>,
    headers: HeaderMap,
) -> Response {
    let return_to = absolute_uri(&headers, "/");
    if !state.identity.is_configured() {
        warn!("identity provider not configured; logging out locally");
        return redirect("/".to_string(), true);
    }

    info!(%return_to, "session cleared; redirecting to identity provider logout");
    redirect(logout_url(&state.identity, &return_to), true)
}

pub(crate) async fn login_handler(
    State(state): State<Arc<SiteState>>,
    headers: HeaderMap,
) -> Response {
    if !state.identity.is_configured() {
        warn!("identity provider not configured; login unavailable");
        return redirect("/".to_string(), false);
    }

    let callback = absolute_uri(&headers, LOGIN_CALLBACK_PATH);
    redirect(authorize_url(&state.identity, &callback), false)
}
