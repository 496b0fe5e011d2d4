use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::intake::documents::DocumentUpload;
use crate::workflows::intake::domain::{
    ApplicantDraft, ClientKind, CompanyDraft, FileAttachment, IndividualDraft, TenantCount,
};
use crate::workflows::intake::handoff::{
    ApplicationBackend, BackendError, BackendReceipt, SubmissionPayload,
};
use crate::workflows::intake::locale::Locale;
use crate::workflows::intake::repository::{
    AttachmentStore, IntakeSession, RepositoryError, SessionId, SessionRepository,
};
use crate::workflows::intake::service::IntakeService;
use crate::workflows::intake::wizard::{IntakeWizard, WizardEvent, WizardStage};

pub(super) const AGENT_EMAIL: &str = "maria.fernandez@alquiler.example";
pub(super) const OPERATIONS_MAILBOX: &str = "operaciones@alquiler.example";

pub(super) fn attachment(name: &str) -> FileAttachment {
    FileAttachment {
        file_name: name.to_string(),
        content_type: "application/pdf".to_string(),
        size_bytes: 2048,
        storage_key: format!("memory://{name}"),
    }
}

pub(super) fn homeowner(full_name: &str) -> IndividualDraft {
    IndividualDraft {
        full_name: full_name.to_string(),
        email: "ana.perez@correo.example".to_string(),
        phone: "809-555-0101".to_string(),
        dob: "1990-04-12".to_string(),
        current_address: "Calle El Conde 23, Santo Domingo".to_string(),
        housing_type: "own".to_string(),
        employment_status: "employed".to_string(),
        employer: "Banco Popular".to_string(),
        job_title: "Analista".to_string(),
        monthly_income: "45000".to_string(),
        work_letter: Some(attachment("carta-trabajo.pdf")),
        bank_statements: Some(attachment("estados.pdf")),
        identity_card: Some(attachment("cedula.jpg")),
        credit_report: Some(attachment("buro.pdf")),
        ..IndividualDraft::default()
    }
}

pub(super) fn renter(full_name: &str) -> IndividualDraft {
    IndividualDraft {
        housing_type: "rented".to_string(),
        previous_address: "Av. Independencia 101".to_string(),
        landlord_name: "Luis Gómez".to_string(),
        landlord_phone: "809-555-0199".to_string(),
        reason_for_leaving: "Más cerca del trabajo".to_string(),
        ..homeowner(full_name)
    }
}

pub(super) fn company(name: &str) -> CompanyDraft {
    CompanyDraft {
        company_name: name.to_string(),
        company_tax_id: "1-01-12345-6".to_string(),
        company_address: "Av. Winston Churchill 55".to_string(),
        company_activity: "Importación".to_string(),
        company_phone_office: "809-555-0300".to_string(),
        company_phone_cell: "829-555-0301".to_string(),
        signer_name: "Carmen Díaz".to_string(),
        signer_role: "Gerente General".to_string(),
        signer_id: "001-1234567-8".to_string(),
        mercantile_registry: Some(attachment("registro.pdf")),
        representative_id: Some(attachment("cedula-rep.pdf")),
        assembly_act: Some(attachment("acta.pdf")),
        bank_statements: Some(attachment("estados-empresa.pdf")),
        credit_report: Some(attachment("buro-empresa.pdf")),
    }
}

/// Drives a fresh wizard through every stage up to `Review`.
pub(super) fn drive_to_review(
    locale: Locale,
    tenants: Vec<ApplicantDraft>,
    guarantor: ApplicantDraft,
) -> IntakeWizard {
    let mut wizard = IntakeWizard::new(locale);
    for event in events_to_review(tenants, guarantor) {
        let label = event.label();
        wizard
            .apply(event)
            .unwrap_or_else(|err| panic!("{label} failed: {err}"));
    }
    assert_eq!(wizard.stage(), WizardStage::Review);
    wizard
}

pub(super) fn events_to_review(
    tenants: Vec<ApplicantDraft>,
    guarantor: ApplicantDraft,
) -> Vec<WizardEvent> {
    let kind = tenants
        .first()
        .map(ApplicantDraft::kind)
        .unwrap_or(ClientKind::Individual);

    let mut events = vec![
        WizardEvent::Proceed,
        WizardEvent::ChooseAgent {
            email: AGENT_EMAIL.to_string(),
        },
        WizardEvent::ChooseTenantKind { kind },
    ];
    if kind == ClientKind::Individual {
        let count = TenantCount::try_from(tenants.len() as u8).expect("one or two tenants");
        events.push(WizardEvent::ChooseTenantCount { count });
    }
    events.extend(
        tenants
            .into_iter()
            .enumerate()
            .map(|(index, draft)| WizardEvent::UpdateTenant { index, draft }),
    );
    events.push(WizardEvent::FinishForm);
    events.push(WizardEvent::ChooseGuarantorKind {
        kind: guarantor.kind(),
    });
    events.push(WizardEvent::UpdateGuarantor { draft: guarantor });
    events.push(WizardEvent::FinishForm);
    events
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, IntakeSession>>>,
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: IntakeSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: IntakeSession) -> Result<IntakeSession, RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }

    fn update(&self, _session: IntakeSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<IntakeSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("session store offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAttachments {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryAttachments {
    pub(super) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .blobs
            .lock()
            .expect("attachment mutex poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl AttachmentStore for MemoryAttachments {
    fn store(&self, session: &SessionId, upload: &DocumentUpload) -> Result<String, RepositoryError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let key = format!("memory://{session}/{id}/{}", upload.file_name);
        let mut guard = self.blobs.lock().expect("attachment mutex poisoned");
        guard.insert(key.clone(), upload.bytes.clone());
        Ok(key)
    }

    fn remove(&self, storage_key: &str) -> Result<(), RepositoryError> {
        let mut guard = self.blobs.lock().expect("attachment mutex poisoned");
        guard
            .remove(storage_key)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryBackend {
    received: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl MemoryBackend {
    pub(super) fn received(&self) -> Vec<SubmissionPayload> {
        self.received.lock().expect("backend mutex poisoned").clone()
    }
}

impl ApplicationBackend for MemoryBackend {
    fn accept(&self, payload: &SubmissionPayload) -> Result<BackendReceipt, BackendError> {
        let mut guard = self.received.lock().expect("backend mutex poisoned");
        guard.push(payload.clone());
        Ok(BackendReceipt {
            reference: format!("SOL-{:04}", guard.len()),
        })
    }
}

pub(super) struct RejectingBackend {
    pub(super) message: Option<String>,
}

impl ApplicationBackend for RejectingBackend {
    fn accept(&self, _payload: &SubmissionPayload) -> Result<BackendReceipt, BackendError> {
        Err(BackendError::Rejected {
            message: self.message.clone(),
        })
    }
}

pub(super) type MemoryService = IntakeService<MemoryRepository, MemoryAttachments, MemoryBackend>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryRepository>,
    Arc<MemoryAttachments>,
    Arc<MemoryBackend>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let attachments = Arc::new(MemoryAttachments::default());
    let backend = Arc::new(MemoryBackend::default());
    let service = IntakeService::new(
        repository.clone(),
        attachments.clone(),
        backend.clone(),
        Locale::Es,
        OPERATIONS_MAILBOX,
    );
    (service, repository, attachments, backend)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
