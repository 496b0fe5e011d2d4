use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::documents::DocumentUpload;
use super::domain::{ApplicantRole, DocumentSlot};
use super::export::ExportError;
use super::handoff::{ApplicationBackend, HandoffError};
use super::locale::Locale;
use super::repository::{AttachmentStore, RepositoryError, SessionId, SessionRepository};
use super::service::{IntakeService, IntakeServiceError};
use super::wizard::{WizardError, WizardEvent};

type SharedService<R, S, B> = Arc<IntakeService<R, S, B>>;

/// Router builder exposing the wizard session endpoints.
pub fn intake_router<R, S, B>(service: SharedService<R, S, B>) -> Router
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    Router::new()
        .route("/api/v1/intake/sessions", post(start_handler::<R, S, B>))
        .route(
            "/api/v1/intake/sessions/:session_id",
            get(session_handler::<R, S, B>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/events",
            post(event_handler::<R, S, B>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/documents/:role/:index/:slot",
            put(upload_handler::<R, S, B>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/review",
            get(review_handler::<R, S, B>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/export",
            get(export_handler::<R, S, B>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/submit",
            post(submit_handler::<R, S, B>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartRequest {
    #[serde(default)]
    pub(crate) locale: Option<Locale>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadParams {
    pub(crate) file_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DateParams {
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

impl DateParams {
    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

pub(crate) async fn start_handler<R, S, B>(
    State(service): State<SharedService<R, S, B>>,
    body: Bytes,
) -> Response
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    let request = if body.is_empty() {
        StartRequest::default()
    } else {
        match serde_json::from_slice::<StartRequest>(&body) {
            Ok(request) => request,
            Err(err) => {
                let payload = json!({ "error": format!("invalid request body: {err}") });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        }
    };

    match service.start(request.locale) {
        Ok(session) => (StatusCode::CREATED, axum::Json(session.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn session_handler<R, S, B>(
    State(service): State<SharedService<R, S, B>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(session) => (StatusCode::OK, axum::Json(session.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn event_handler<R, S, B>(
    State(service): State<SharedService<R, S, B>>,
    Path(session_id): Path<String>,
    axum::Json(event): axum::Json<WizardEvent>,
) -> Response
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    match service.apply(&SessionId(session_id), event) {
        Ok(session) => (StatusCode::OK, axum::Json(session.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn upload_handler<R, S, B>(
    State(service): State<SharedService<R, S, B>>,
    Path((session_id, role, index, slot)): Path<(String, String, usize, String)>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    let Some(role) = ApplicantRole::parse(&role) else {
        let payload = json!({ "error": format!("unknown applicant role `{role}`") });
        return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
    };
    let Some(slot) = DocumentSlot::parse(&slot) else {
        let payload = json!({ "error": format!("unknown document slot `{slot}`") });
        return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let upload = DocumentUpload::new(params.file_name, content_type, body.to_vec());

    match service.upload(&SessionId(session_id), role, index, slot, upload) {
        Ok((session, receipt)) => {
            let payload = json!({
                "attachment": receipt.attachment,
                "recommendedType": receipt.recommended_type,
                "session": session.view(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn review_handler<R, S, B>(
    State(service): State<SharedService<R, S, B>>,
    Path(session_id): Path<String>,
    Query(params): Query<DateParams>,
) -> Response
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    match service.review(&SessionId(session_id), params.today()) {
        Ok(document) => (StatusCode::OK, axum::Json(document)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn export_handler<R, S, B>(
    State(service): State<SharedService<R, S, B>>,
    Path(session_id): Path<String>,
    Query(params): Query<DateParams>,
) -> Response
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    match service.export(&SessionId(session_id), params.today()) {
        Ok(exported) => {
            let disposition = format!("attachment; filename=\"{}\"", exported.file_name);
            (
                StatusCode::OK,
                [(header::CONTENT_DISPOSITION, disposition)],
                axum::Json(exported),
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<R, S, B>(
    State(service): State<SharedService<R, S, B>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    match service.submit(&SessionId(session_id)) {
        Ok(success) => {
            let payload = json!({
                "success": true,
                "message": success.message,
                "reference": success.receipt.reference,
                "data": success.data,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Status and body for every intake failure surfaced over HTTP.
pub(crate) fn error_response(err: IntakeServiceError) -> Response {
    let (status, payload) = match err {
        IntakeServiceError::Wizard(WizardError::Validation(errors)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": errors.to_string(), "issues": errors }),
        ),
        IntakeServiceError::Wizard(
            err @ (WizardError::InvalidTransition { .. } | WizardError::AgentAlreadyChosen),
        ) => (StatusCode::CONFLICT, json!({ "error": err.to_string() })),
        IntakeServiceError::Wizard(other) => {
            (StatusCode::BAD_REQUEST, json!({ "error": other.to_string() }))
        }
        IntakeServiceError::Submission { locale, source } => {
            let message = source.user_message(locale.messages());
            match source {
                HandoffError::Invalid { issues, .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "error": message, "issues": issues }),
                ),
                HandoffError::Incomplete { missing } => (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": message, "missing": missing }),
                ),
                HandoffError::Backend(_) => {
                    (StatusCode::BAD_GATEWAY, json!({ "error": message }))
                }
            }
        }
        IntakeServiceError::Export(err @ ExportError::RenderTargetMissing) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        IntakeServiceError::Export(other) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": other.to_string() }),
        ),
        IntakeServiceError::Repository(RepositoryError::NotFound) => (
            StatusCode::NOT_FOUND,
            json!({ "error": "intake session not found" }),
        ),
        IntakeServiceError::Repository(RepositoryError::Conflict) => (
            StatusCode::CONFLICT,
            json!({ "error": "intake session already exists" }),
        ),
        IntakeServiceError::Repository(other) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": other.to_string() }),
        ),
    };
    (status, axum::Json(payload)).into_response()
}
