use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::documents::{is_recommended_type, DocumentUpload, UploadReceipt};
use super::domain::{Agent, ApplicantRole, ClientKind, DocumentSlot};
use super::export::{export_review, ExportError, ExportedDocument, PageRasterizer, TextRasterizer};
use super::handoff::{ApplicationBackend, HandoffError, HandoffSuccess, SubmissionHandoff};
use super::locale::Locale;
use super::repository::{
    AttachmentStore, IntakeSession, RepositoryError, SessionId, SessionRepository,
};
use super::review::{document_label, ReviewDocument};
use super::wizard::{IntakeWizard, WizardError, WizardEvent, WizardStage};

/// Service tying wizard sessions to storage, attachments, and the backend.
pub struct IntakeService<R, S, B> {
    repository: Arc<R>,
    attachments: Arc<S>,
    handoff: SubmissionHandoff<B>,
    default_locale: Locale,
    rasterizer: TextRasterizer,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("intake-{id:06}"))
}

impl<R, S, B> IntakeService<R, S, B>
where
    R: SessionRepository + 'static,
    S: AttachmentStore + 'static,
    B: ApplicationBackend + 'static,
{
    pub fn new(
        repository: Arc<R>,
        attachments: Arc<S>,
        backend: Arc<B>,
        default_locale: Locale,
        operations_mailbox: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            attachments,
            handoff: SubmissionHandoff::new(backend, operations_mailbox),
            default_locale,
            rasterizer: TextRasterizer::default(),
        }
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    /// Open a fresh session in `Instructions`.
    pub fn start(&self, locale: Option<Locale>) -> Result<IntakeSession, IntakeServiceError> {
        let session = IntakeSession {
            id: next_session_id(),
            wizard: IntakeWizard::new(locale.unwrap_or(self.default_locale)),
            submission: None,
        };
        let stored = self.repository.insert(session)?;
        info!(session = %stored.id, locale = stored.wizard.locale().code(), "intake session started");
        Ok(stored)
    }

    pub fn get(&self, id: &SessionId) -> Result<IntakeSession, IntakeServiceError> {
        let session = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(session)
    }

    /// Apply one wizard event. Blobs no longer referenced by the aggregate
    /// afterwards (detached, or dropped with a replaced draft) are released,
    /// unless the application was already handed off.
    pub fn apply(
        &self,
        id: &SessionId,
        event: WizardEvent,
    ) -> Result<IntakeSession, IntakeServiceError> {
        let mut session = self.get(id)?;
        let handed_off = session.wizard.stage() == WizardStage::Submitted;
        let before = session.wizard.application().storage_keys();

        session.wizard.apply(event)?;
        if session.wizard.stage() == WizardStage::Instructions {
            session.submission = None;
        }
        self.repository.update(session.clone())?;

        if !handed_off {
            let after: HashSet<String> =
                session.wizard.application().storage_keys().into_iter().collect();
            for key in before.iter().filter(|key| !after.contains(*key)) {
                self.release(key);
            }
        }
        Ok(session)
    }

    /// Store an uploaded file and attach it to the open form.
    pub fn upload(
        &self,
        id: &SessionId,
        role: ApplicantRole,
        index: usize,
        slot: DocumentSlot,
        upload: DocumentUpload,
    ) -> Result<(IntakeSession, UploadReceipt), IntakeServiceError> {
        let mut session = self.get(id)?;
        let replaced = stored_key(&session.wizard, role, index, slot);

        let storage_key = self.attachments.store(id, &upload)?;
        let recommended_type = is_recommended_type(&upload.resolved_content_type());
        let attachment = upload.into_attachment(storage_key.clone());
        if !recommended_type {
            warn!(
                session = %id,
                content_type = %attachment.content_type,
                "uploaded document type is outside the recommended list"
            );
        }

        let event = WizardEvent::AttachDocument {
            role,
            index,
            slot,
            file: attachment.clone(),
        };
        if let Err(err) = session.wizard.apply(event) {
            self.release(&storage_key);
            return Err(err.into());
        }
        self.repository.update(session.clone())?;

        if let Some(key) = replaced {
            self.release(&key);
        }

        Ok((
            session,
            UploadReceipt {
                attachment,
                recommended_type,
            },
        ))
    }

    pub fn review(
        &self,
        id: &SessionId,
        today: NaiveDate,
    ) -> Result<ReviewDocument, IntakeServiceError> {
        let session = self.get(id)?;
        ReviewDocument::project(session.wizard.application(), session.wizard.locale(), today)
            .ok_or(IntakeServiceError::Export(ExportError::RenderTargetMissing))
    }

    pub fn export(
        &self,
        id: &SessionId,
        today: NaiveDate,
    ) -> Result<ExportedDocument, IntakeServiceError> {
        let session = self.get(id)?;
        let document =
            ReviewDocument::project(session.wizard.application(), session.wizard.locale(), today);
        let rasterizer: &dyn PageRasterizer = &self.rasterizer;
        let exported = export_review(document.as_ref(), rasterizer)?;
        Ok(exported)
    }

    /// Hand the application off. The session is saved whatever the outcome,
    /// since an incomplete application moves the wizard to a recovery stage.
    pub fn submit(&self, id: &SessionId) -> Result<HandoffSuccess, IntakeServiceError> {
        let mut session = self.get(id)?;
        let locale = session.wizard.locale();

        let outcome = session.wizard.submit(&self.handoff);
        if let Ok(success) = &outcome {
            session.submission = Some(success.clone());
        }
        self.repository.update(session)?;

        outcome.map_err(|err| match err {
            WizardError::Handoff(source) => IntakeServiceError::Submission { locale, source },
            other => IntakeServiceError::Wizard(other),
        })
    }

    fn release(&self, storage_key: &str) {
        if let Err(err) = self.attachments.remove(storage_key) {
            warn!(storage_key, error = %err, "failed to release stored document");
        }
    }
}

fn stored_key(
    wizard: &IntakeWizard,
    role: ApplicantRole,
    index: usize,
    slot: DocumentSlot,
) -> Option<String> {
    let application = wizard.application();
    let draft = match role {
        ApplicantRole::Tenant => application.tenants.get(index),
        ApplicantRole::Guarantor => application.guarantor.as_ref(),
    }?;
    draft
        .attachment(slot)
        .map(|attachment| attachment.storage_key.clone())
}

/// Agent directory for a locale.
pub fn agent_directory(locale: Locale) -> Vec<Agent> {
    locale.messages().agent_directory()
}

/// Pre-start checklist: required documents per client kind plus upload tips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionsView {
    pub locale: Locale,
    pub title: &'static str,
    pub description: &'static str,
    pub individual_documents_title: &'static str,
    pub individual_documents: Vec<&'static str>,
    pub company_documents_title: &'static str,
    pub company_documents: Vec<&'static str>,
    pub recommendations: Vec<&'static str>,
}

pub fn instructions(locale: Locale) -> InstructionsView {
    let bundle = locale.messages();
    let text = &bundle.instructions;
    let documents = |kind: ClientKind| -> Vec<&'static str> {
        DocumentSlot::for_kind(kind)
            .iter()
            .map(|slot| document_label(*slot, &bundle.labels))
            .collect()
    };

    InstructionsView {
        locale,
        title: text.title,
        description: text.description,
        individual_documents_title: text.individual_documents_title,
        individual_documents: documents(ClientKind::Individual),
        company_documents_title: text.company_documents_title,
        company_documents: documents(ClientKind::Company),
        recommendations: text.recommendations.to_vec(),
    }
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("{source}")]
    Submission { locale: Locale, source: HandoffError },
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
