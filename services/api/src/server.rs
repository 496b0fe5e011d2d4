use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAttachmentStore, InMemorySessionRepository, LoggingBackend};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rental_intake::config::AppConfig;
use rental_intake::error::AppError;
use rental_intake::telemetry;
use rental_intake::workflows::intake::IntakeService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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
        default_locale: config.intake.default_locale,
    };

    let intake_service = Arc::new(IntakeService::new(
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(InMemoryAttachmentStore::default()),
        Arc::new(LoggingBackend::default()),
        config.intake.default_locale,
        config.intake.operations_mailbox.clone(),
    ));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        locale = config.intake.default_locale.code(),
        "rental intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
