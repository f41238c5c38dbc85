use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::visa::{ComplianceServiceError, NormalizeError, RepositoryError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Normalize(NormalizeError),
    Service(ComplianceServiceError),
    Export(csv::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Normalize(err) => write!(f, "normalization error: {}", err),
            AppError::Service(err) => write!(f, "compliance service error: {}", err),
            AppError::Export(err) => write!(f, "reminder export error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Normalize(err) => Some(err),
            AppError::Service(err) => Some(err),
            AppError::Export(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Normalize(NormalizeError::NoRequirementsFound { .. })
            | AppError::Service(ComplianceServiceError::Normalize(
                NormalizeError::NoRequirementsFound { .. },
            )) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Normalize(NormalizeError::InvalidJson(_)) => StatusCode::BAD_REQUEST,
            AppError::Service(ComplianceServiceError::Repository(RepositoryError::NotFound)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Normalize(NormalizeError::Canonicalization(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Service(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Normalize(err @ NormalizeError::NoRequirementsFound { .. })
            | AppError::Service(ComplianceServiceError::Normalize(
                err @ NormalizeError::NoRequirementsFound { .. },
            )) => err.user_message().to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));
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

impl From<NormalizeError> for AppError {
    fn from(value: NormalizeError) -> Self {
        Self::Normalize(value)
    }
}

impl From<ComplianceServiceError> for AppError {
    fn from(value: ComplianceServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Export(value)
    }
}
