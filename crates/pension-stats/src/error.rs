use crate::config::ConfigError;
use crate::pensions::{StoreError, TableRequestError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Store(StoreError),
    Render(serde_json::Error),
    Task(tokio::task::JoinError),
    BadRequest(TableRequestError),
    DisallowedHost(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Store(err) => write!(f, "store error: {}", err),
            AppError::Render(err) => write!(f, "render error: {}", err),
            AppError::Task(err) => write!(f, "background task failed: {}", err),
            AppError::BadRequest(err) => write!(f, "bad request: {}", err),
            AppError::DisallowedHost(host) => write!(f, "invalid host header: '{}'", host),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Render(err) => Some(err),
            AppError::Task(err) => Some(err),
            AppError::BadRequest(err) => Some(err),
            AppError::DisallowedHost(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest(_) | AppError::DisallowedHost(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Store(_)
            | AppError::Render(_)
            | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Render(value)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value)
    }
}

impl From<TableRequestError> for AppError {
    fn from(value: TableRequestError) -> Self {
        Self::BadRequest(value)
    }
}
