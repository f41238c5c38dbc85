use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::RuleKey;
use super::normalizer::NormalizeError;
use super::repository::{ReminderPublisher, RepositoryError, RuleRepository, TripId, TripRepository};
use super::service::{ComplianceServiceError, TripComplianceService, TripDraft};

#[derive(Debug, Deserialize)]
pub(crate) struct IngestRuleRequest {
    pub(crate) citizenship: String,
    pub(crate) destination: String,
    pub(crate) payload: Value,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CheckTripRequest {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

/// Router builder exposing rule ingestion and trip compliance endpoints.
pub fn compliance_router<R, T, P>(service: Arc<TripComplianceService<R, T, P>>) -> Router
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    Router::new()
        .route("/api/v1/visa/rules", post(ingest_rule_handler::<R, T, P>))
        .route(
            "/api/v1/visa/rules/:citizenship/:destination",
            get(rule_handler::<R, T, P>),
        )
        .route("/api/v1/trips", post(register_trip_handler::<R, T, P>))
        .route(
            "/api/v1/trips/:trip_id",
            get(trip_handler::<R, T, P>).delete(delete_trip_handler::<R, T, P>),
        )
        .route(
            "/api/v1/trips/:trip_id/check",
            post(check_trip_handler::<R, T, P>),
        )
        .with_state(service)
}

pub(crate) async fn ingest_rule_handler<R, T, P>(
    State(service): State<Arc<TripComplianceService<R, T, P>>>,
    Json(request): Json<IngestRuleRequest>,
) -> Response
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    match service.ingest_rule(&request.payload, &request.citizenship, &request.destination) {
        Ok(ingestion) => (StatusCode::CREATED, Json(ingestion)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rule_handler<R, T, P>(
    State(service): State<Arc<TripComplianceService<R, T, P>>>,
    Path((citizenship, destination)): Path<(String, String)>,
) -> Response
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    let key = RuleKey::new(citizenship.as_str(), destination.as_str());
    match service.rule(&key) {
        Ok(rule) => (StatusCode::OK, Json(rule)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_trip_handler<R, T, P>(
    State(service): State<Arc<TripComplianceService<R, T, P>>>,
    Json(draft): Json<TripDraft>,
) -> Response
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    match service.register_trip(draft) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn trip_handler<R, T, P>(
    State(service): State<Arc<TripComplianceService<R, T, P>>>,
    Path(trip_id): Path<String>,
) -> Response
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    match service.trip(&TripId(trip_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_trip_handler<R, T, P>(
    State(service): State<Arc<TripComplianceService<R, T, P>>>,
    Path(trip_id): Path<String>,
) -> Response
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    match service.delete_trip(&TripId(trip_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn check_trip_handler<R, T, P>(
    State(service): State<Arc<TripComplianceService<R, T, P>>>,
    Path(trip_id): Path<String>,
    Json(request): Json<CheckTripRequest>,
) -> Response
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    let today = request.today.unwrap_or_else(|| Local::now().date_naive());
    match service.check_trip(&TripId(trip_id), today) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ComplianceServiceError) -> Response {
    let (status, payload) = match &error {
        ComplianceServiceError::Normalize(normalize @ NormalizeError::NoRequirementsFound { .. }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": normalize.user_message(),
                "detail": normalize.to_string(),
            }),
        ),
        ComplianceServiceError::Normalize(NormalizeError::InvalidJson(_)) => (
            StatusCode::BAD_REQUEST,
            json!({ "error": error.to_string() }),
        ),
        ComplianceServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": error.to_string() }),
        ),
        ComplianceServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string() }),
        ),
        ComplianceServiceError::Normalize(NormalizeError::Canonicalization(_))
        | ComplianceServiceError::Repository(RepositoryError::Unavailable(_))
        | ComplianceServiceError::Publish(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": error.to_string() }),
        ),
    };

    (status, Json(payload)).into_response()
}
