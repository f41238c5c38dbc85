use crate::infra::{deserialize_optional_date, AppState, EngineState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use visa_compliance::workflows::visa::{
    compliance_router, ComplianceResult, ReminderPublisher, ReminderSchedule, RuleRepository,
    Trip, TripComplianceService, TripRepository, VisaRule,
};

#[derive(Debug, Deserialize)]
pub(crate) struct EvaluateRequest {
    pub(crate) trip: Trip,
    pub(crate) rule: VisaRule,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EvaluateResponse {
    pub(crate) today: NaiveDate,
    pub(crate) result: ComplianceResult,
    pub(crate) reminders: ReminderSchedule,
}

pub(crate) fn with_compliance_routes<R, T, P>(
    service: Arc<TripComplianceService<R, T, P>>,
) -> axum::Router
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    compliance_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/visa/evaluate",
            axum::routing::post(evaluate_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Evaluate a caller-supplied trip and rule without touching storage.
pub(crate) async fn evaluate_endpoint(
    Extension(engine): Extension<EngineState>,
    Json(payload): Json<EvaluateRequest>,
) -> Json<EvaluateResponse> {
    let EvaluateRequest { trip, rule, today } = payload;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let result = engine.evaluator.evaluate(&trip, &rule, today);
    let reminders = engine.scheduler.schedule(&trip, &rule, today);

    Json(EvaluateResponse {
        today,
        result,
        reminders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        InMemoryRuleRepository, InMemoryTripRepository, LoggingReminderPublisher,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Duration;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;
    use visa_compliance::workflows::visa::{
        ComplianceConfig, ComplianceStatus, ReminderKind, RuleNormalizer, TripId,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 24).expect("valid date")
    }

    fn embassy_rule() -> VisaRule {
        RuleNormalizer::default()
            .normalize(
                &json!({
                    "requirements": [{
                        "type": "Embassy visa",
                        "processing_time": {"min_days": 10, "max_days": 20},
                        "passport_requirements": {"validity_months": 6}
                    }]
                }),
                "IN",
                "GB",
            )
            .expect("rule normalizes")
    }

    fn trip_in(days: i64) -> Trip {
        let start_date = today() + Duration::days(days);
        Trip {
            citizenship_code: "IN".into(),
            destination_code: "GB".into(),
            start_date,
            end_date: start_date + Duration::days(10),
            passport_expiry_date: Some(today() + Duration::days(3650)),
            rule_reference: None,
        }
    }

    fn app(ready: bool) -> (axum::Router, LoggingReminderPublisher) {
        let publisher = LoggingReminderPublisher::default();
        let service = Arc::new(TripComplianceService::new(
            Arc::new(InMemoryRuleRepository::default()),
            Arc::new(InMemoryTripRepository::default()),
            Arc::new(publisher.clone()),
            RuleNormalizer::default(),
            ComplianceConfig::default(),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_compliance_routes(service)
            .layer(Extension(EngineState::default()))
            .layer(Extension(state));
        (router, publisher)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn evaluate_endpoint_returns_result_and_sorted_reminders() {
        let request = EvaluateRequest {
            trip: trip_in(40),
            rule: embassy_rule(),
            today: Some(today()),
        };

        let Json(body) = evaluate_endpoint(Extension(EngineState::default()), Json(request)).await;

        assert_eq!(body.today, today());
        assert_eq!(body.result.apply_by_date, Some(today() + Duration::days(13)));
        assert_eq!(body.result.time_to_apply_days, Some(13));
        assert!(body.result.passport_valid);

        let dates: Vec<NaiveDate> = body.reminders.iter().map(|reminder| reminder.date).collect();
        assert_eq!(
            dates,
            vec![
                today() + Duration::days(6),
                today() + Duration::days(10),
                today() + Duration::days(12),
                today() + Duration::days(37),
            ]
        );
        assert_eq!(body.reminders.reminders()[3].kind, ReminderKind::FinalCheck);
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_flagged() {
        let (router, _) = app(false);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn trips_flow_through_the_assembled_router() {
        let (router, publisher) = app(true);

        let ingest = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/visa/rules",
                json!({
                    "citizenship": "in",
                    "destination": "gb",
                    "payload": {"requirements": [{"type": "Embassy visa", "processing_time": {"max_days": 20}}]}
                }),
            ))
            .await
            .expect("router responds");
        assert_eq!(ingest.status(), StatusCode::CREATED);

        let start = today() + Duration::days(40);
        let created = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/trips",
                json!({
                    "citizenship_code": "in",
                    "destination_code": "gb",
                    "start_date": start,
                    "end_date": start + Duration::days(10),
                    "passport_expiry_date": today() + Duration::days(3650)
                }),
            ))
            .await
            .expect("router responds");
        assert_eq!(created.status(), StatusCode::CREATED);
        let record = read_json(created).await;
        let trip_id = record["id"].as_str().expect("trip id").to_string();
        assert_eq!(record["status"], "unknown");

        let checked = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/trips/{trip_id}/check"),
                json!({ "today": today() }),
            ))
            .await
            .expect("router responds");
        assert_eq!(checked.status(), StatusCode::OK);
        let report = read_json(checked).await;
        assert_ne!(
            report["result"]["status"],
            serde_json::to_value(ComplianceStatus::Unknown).expect("status encodes")
        );
        assert_eq!(report["reminders"].as_array().map(Vec::len), Some(4));
        assert_eq!(publisher.scheduled(&TripId(trip_id.clone())).len(), 4);

        let deleted = router
            .oneshot(
                Request::delete(format!("/api/v1/trips/{trip_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        assert!(publisher.scheduled(&TripId(trip_id)).is_empty());
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let (router, _) = app(true);
        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
