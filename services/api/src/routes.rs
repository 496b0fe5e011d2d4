use crate::infra::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use rental_intake::workflows::intake::{
    agent_directory, instructions, intake_router, ApplicationBackend, AttachmentStore,
    IntakeService, Locale, SessionRepository,
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

pub(crate) fn with_intake_routes<R, S, B>(service: Arc<IntakeService<R, S, B>>) -> axum::Router
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    intake_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/intake/agents", axum::routing::get(agents_endpoint))
        .route(
            "/api/v1/intake/instructions",
            axum::routing::get(instructions_endpoint),
        )
}

/// First supported language in `Accept-Language`, by quality.
pub(crate) struct RequestLocale(pub(crate) Option<Locale>);

impl RequestLocale {
    fn or(self, fallback: Locale) -> Locale {
        self.0.unwrap_or(fallback)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestLocale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| {
                accept_language::parse(raw)
                    .iter()
                    .find_map(|tag| Locale::parse(tag))
            });
        Ok(RequestLocale(locale))
    }
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

pub(crate) async fn agents_endpoint(
    Extension(state): Extension<AppState>,
    requested: RequestLocale,
) -> impl IntoResponse {
    let locale = requested.or(state.default_locale);
    Json(json!({
        "locale": locale,
        "agents": agent_directory(locale),
    }))
}

pub(crate) async fn instructions_endpoint(
    Extension(state): Extension<AppState>,
    requested: RequestLocale,
) -> impl IntoResponse {
    Json(instructions(requested.or(state.default_locale)))
}
