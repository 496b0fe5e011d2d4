use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::intake::domain::{ApplicantDraft, TenantCount};
use crate::workflows::intake::locale::Locale;
use crate::workflows::intake::repository::SessionId;
use crate::workflows::intake::router::{self, intake_router};
use crate::workflows::intake::service::IntakeService;
use crate::workflows::intake::wizard::{WizardEvent, WizardStage};

fn review_events() -> Vec<WizardEvent> {
    events_to_review(
        vec![
            ApplicantDraft::Individual(homeowner("Ana Pérez")),
            ApplicantDraft::Individual(homeowner("Pedro Pérez")),
        ],
        ApplicantDraft::Company(company("Inversiones Caribe")),
    )
}

fn session_in_review(service: &MemoryService) -> SessionId {
    let session = service.start(None).expect("start");
    for event in review_events() {
        service.apply(&session.id, event).expect("event");
    }
    session.id
}

fn session_in_tenant_form(service: &MemoryService) -> SessionId {
    let session = service.start(Some(Locale::En)).expect("start");
    for event in [
        WizardEvent::Proceed,
        WizardEvent::ChooseAgent {
            email: AGENT_EMAIL.to_string(),
        },
        WizardEvent::ChooseTenantKind {
            kind: crate::workflows::intake::domain::ClientKind::Individual,
        },
        WizardEvent::ChooseTenantCount {
            count: TenantCount::One,
        },
    ] {
        service.apply(&session.id, event).expect("event");
    }
    session.id
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn start_route_creates_session_in_requested_locale() {
    let (service, _, _, _) = build_service();
    let router = intake_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/intake/sessions",
            json!({ "locale": "en" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["stage"], "instructions");
    assert_eq!(body["locale"], "en");
    assert!(body["sessionId"]
        .as_str()
        .is_some_and(|id| id.starts_with("intake-")));
}

#[tokio::test]
async fn start_handler_defaults_locale_without_body() {
    let (service, _, _, _) = build_service();
    let response = router::start_handler::<MemoryRepository, MemoryAttachments, MemoryBackend>(
        State(Arc::new(service)),
        Bytes::new(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["locale"], "es");
}

#[tokio::test]
async fn start_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(IntakeService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryAttachments::default()),
        Arc::new(MemoryBackend::default()),
        Locale::Es,
        OPERATIONS_MAILBOX,
    ));

    let response = router::start_handler::<UnavailableRepository, MemoryAttachments, MemoryBackend>(
        State(service),
        Bytes::new(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn event_route_advances_and_rejects_out_of_stage_events() {
    let (service, _, _, _) = build_service();
    let session = service.start(None).expect("start");
    let router = intake_router(Arc::new(service));
    let uri = format!("/api/v1/intake/sessions/{}/events", session.id);

    let response = router
        .clone()
        .oneshot(json_request("POST", &uri, json!({ "type": "proceed" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["stage"], "agent_select");

    let response = router
        .oneshot(json_request("POST", &uri, json!({ "type": "edit_tenants" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn finishing_a_blank_form_is_unprocessable() {
    let (service, _, _, _) = build_service();
    let id = session_in_tenant_form(&service);
    let router = intake_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/intake/sessions/{id}/events"),
            json!({ "type": "finish_form" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    let issues = body["issues"].as_array().expect("issues");
    assert!(issues
        .iter()
        .any(|issue| issue["path"] == "tenants.0.fullName"
            && issue["message"] == "Full name is required."));
}

#[tokio::test]
async fn session_route_returns_not_found_for_unknown_id() {
    let (service, _, _, _) = build_service();
    let router = intake_router(Arc::new(service));

    let response = router
        .oneshot(empty_request("GET", "/api/v1/intake/sessions/intake-999999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_route_reports_open_step() {
    let (service, _, _, _) = build_service();
    let id = session_in_tenant_form(&service);
    let router = intake_router(Arc::new(service));

    let response = router
        .oneshot(empty_request("GET", &format!("/api/v1/intake/sessions/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["stage"], "tenant_form");
    assert_eq!(body["tenantCount"], 1);
    assert_eq!(body["step"]["key"], "personal");
    assert_eq!(body["step"]["total"], 4);
    assert_eq!(body["step"]["fields"][0], "fullName");
}

#[tokio::test]
async fn upload_route_attaches_and_guesses_type() {
    let (service, _, attachments, _) = build_service();
    let id = session_in_tenant_form(&service);
    let router = intake_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!(
                    "/api/v1/intake/sessions/{id}/documents/tenant/0/identityCard?file_name=cedula.jpg"
                ))
                .body(Body::from(vec![0xff_u8; 512]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["attachment"]["contentType"], "image/jpeg");
    assert_eq!(body["attachment"]["sizeBytes"], 512);
    assert_eq!(body["recommendedType"], true);
    assert_eq!(
        body["session"]["application"]["tenants"][0]["identityCard"]["fileName"],
        "cedula.jpg"
    );
    let first_key = body["attachment"]["storageKey"].as_str().unwrap().to_string();
    assert_eq!(attachments.keys(), vec![first_key.clone()]);

    let response = router
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!(
                    "/api/v1/intake/sessions/{id}/documents/tenant/0/identityCard?file_name=notas.txt"
                ))
                .body(Body::from("hola"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["attachment"]["contentType"], "text/plain");
    assert_eq!(body["recommendedType"], false);

    let keys = attachments.keys();
    assert_eq!(keys.len(), 1, "replaced blob is released");
    assert_ne!(keys[0], first_key);
}

#[tokio::test]
async fn upload_route_rejects_unknown_slot_and_wrong_kind() {
    let (service, _, attachments, _) = build_service();
    let id = session_in_tenant_form(&service);
    let router = intake_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(empty_request(
            "PUT",
            &format!("/api/v1/intake/sessions/{id}/documents/tenant/0/passport?file_name=p.pdf"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = router
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!(
                    "/api/v1/intake/sessions/{id}/documents/tenant/0/assemblyAct?file_name=acta.pdf"
                ))
                .body(Body::from("acta"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(attachments.keys().is_empty(), "rejected upload is released");
}

#[tokio::test]
async fn review_route_requires_a_complete_aggregate() {
    let (service, _, _, _) = build_service();
    let id = session_in_tenant_form(&service);
    let router = intake_router(Arc::new(service));

    let response = router
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/intake/sessions/{id}/review?today=2026-10-19"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn review_and_export_routes_render_the_application() {
    let (service, _, _, _) = build_service();
    let id = session_in_review(&service);
    let router = intake_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/intake/sessions/{id}/review?today=2026-10-19"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["date"], "Fecha: 19 de octubre de 2026");
    assert_eq!(body["tenants"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["signatures"].as_array().map(Vec::len), Some(3));

    let response = router
        .oneshot(empty_request(
            "GET",
            &format!("/api/v1/intake/sessions/{id}/export?today=2026-10-19"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    assert_eq!(
        disposition.as_deref(),
        Some("attachment; filename=\"rental-application.pdf\"")
    );
    let body = read_json_body(response).await;
    assert_eq!(body["fileName"], "rental-application.pdf");
    assert!(!body["pages"].as_array().expect("pages").is_empty());
}

#[tokio::test]
async fn submit_route_hands_off_and_records_reference() {
    let (service, _, _, backend) = build_service();
    let id = session_in_review(&service);
    let router = intake_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(empty_request(
            "POST",
            &format!("/api/v1/intake/sessions/{id}/submit"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "¡Solicitud completa enviada con éxito!");
    assert_eq!(body["data"]["tenants"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["guarantor"]["clientType"], "company");
    assert_eq!(backend.received().len(), 1);

    let response = router
        .oneshot(empty_request("GET", &format!("/api/v1/intake/sessions/{id}")))
        .await
        .unwrap();
    let session = read_json_body(response).await;
    assert_eq!(session["stage"], "submitted");
    assert_eq!(session["reference"], body["reference"]);
}

#[tokio::test]
async fn submit_handler_maps_backend_rejection_to_bad_gateway() {
    let repository = Arc::new(MemoryRepository::default());
    let service = Arc::new(IntakeService::new(
        repository.clone(),
        Arc::new(MemoryAttachments::default()),
        Arc::new(RejectingBackend {
            message: Some("Documentos ilegibles".to_string()),
        }),
        Locale::Es,
        OPERATIONS_MAILBOX,
    ));
    let session = service.start(None).expect("start");
    for event in review_events() {
        service.apply(&session.id, event).expect("event");
    }

    let response = router::submit_handler::<MemoryRepository, MemoryAttachments, RejectingBackend>(
        State(service.clone()),
        Path(session.id.0.clone()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "Documentos ilegibles");
    assert_eq!(
        service.get(&session.id).expect("session").wizard.stage(),
        WizardStage::Review
    );
}

#[tokio::test]
async fn submit_outside_review_is_a_conflict() {
    let (service, _, _, backend) = build_service();
    let id = session_in_tenant_form(&service);

    let response = router::submit_handler::<MemoryRepository, MemoryAttachments, MemoryBackend>(
        State(Arc::new(service)),
        Path(id.0),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(backend.received().is_empty());
}

#[tokio::test]
async fn service_errors_map_to_one_status_table() {
    use crate::workflows::intake::domain::ApplicantRole;
    use crate::workflows::intake::export::ExportError;
    use crate::workflows::intake::handoff::{BackendError, HandoffError, MissingPart};
    use crate::workflows::intake::repository::RepositoryError;
    use crate::workflows::intake::schema::ValidationErrors;
    use crate::workflows::intake::service::IntakeServiceError;
    use crate::workflows::intake::wizard::WizardError;

    let invalid = IntakeServiceError::Submission {
        locale: Locale::En,
        source: HandoffError::Invalid {
            role: ApplicantRole::Guarantor,
            issues: ValidationErrors::single("guarantor.companyName", "Company name is required."),
        },
    };
    let response = router::error_response(invalid);
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["issues"][0]["path"], "guarantor.companyName");

    let incomplete = IntakeServiceError::Submission {
        locale: Locale::En,
        source: HandoffError::Incomplete {
            missing: MissingPart::Guarantor,
        },
    };
    let response = router::error_response(incomplete);
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "The application is incomplete.");
    assert_eq!(body["missing"], "guarantor");

    let rejected = IntakeServiceError::Submission {
        locale: Locale::Es,
        source: HandoffError::Backend(BackendError::Rejected { message: None }),
    };
    assert_eq!(
        router::error_response(rejected).status(),
        StatusCode::BAD_GATEWAY
    );

    let cases = [
        (
            IntakeServiceError::Wizard(WizardError::AgentAlreadyChosen),
            StatusCode::CONFLICT,
        ),
        (
            IntakeServiceError::Export(ExportError::RenderTargetMissing),
            StatusCode::CONFLICT,
        ),
        (
            IntakeServiceError::Export(ExportError::InvalidLayout {
                width: 612.0,
                height: 40.0,
                margin: 20.0,
            }),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            IntakeServiceError::Repository(RepositoryError::NotFound),
            StatusCode::NOT_FOUND,
        ),
        (
            IntakeServiceError::Repository(RepositoryError::Conflict),
            StatusCode::CONFLICT,
        ),
    ];
    for (err, status) in cases {
        assert_eq!(router::error_response(err).status(), status);
    }
}
