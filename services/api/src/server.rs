use crate::cli::ServeArgs;
use crate::infra::{
    AppState, EngineState, InMemoryRuleRepository, InMemoryTripRepository,
    LoggingReminderPublisher,
};
use crate::routes::with_compliance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use visa_compliance::config::AppConfig;
use visa_compliance::error::AppError;
use visa_compliance::telemetry;
use visa_compliance::workflows::visa::{RuleNormalizer, TripComplianceService};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };
    let engine_state = EngineState::new(config.engine.compliance.clone());

    let compliance_service = Arc::new(TripComplianceService::new(
        Arc::new(InMemoryRuleRepository::default()),
        Arc::new(InMemoryTripRepository::default()),
        Arc::new(LoggingReminderPublisher::default()),
        RuleNormalizer::new(config.engine.source_version.clone()),
        config.engine.compliance.clone(),
    ));

    let app = with_compliance_routes(compliance_service)
        .layer(Extension(engine_state))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        buffer_days = config.engine.compliance.buffer_days,
        "visa compliance service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
