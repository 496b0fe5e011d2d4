use std::fmt;

use serde::{Deserialize, Serialize};

use super::documents::DocumentUpload;
use super::domain::{ApplicantRole, FullApplication, TenantCount};
use super::handoff::HandoffSuccess;
use super::locale::Locale;
use super::wizard::{IntakeWizard, WizardStage};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One applicant's wizard run, as held by the repository.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    pub id: SessionId,
    pub wizard: IntakeWizard,
    pub submission: Option<HandoffSuccess>,
}

impl IntakeSession {
    pub fn view(&self) -> SessionView {
        let form = self.wizard.form().map(|form| {
            let step = form.step();
            StepView {
                role: form.scope().role(),
                index: form.current_step(),
                total: form.steps().len(),
                key: step.key,
                fields: step.fields.iter().map(|field| field.name()).collect(),
            }
        });

        SessionView {
            session_id: self.id.clone(),
            stage: self.wizard.stage(),
            locale: self.wizard.locale(),
            tenant_count: self.wizard.tenant_count(),
            step: form,
            application: self.wizard.application().clone(),
            reference: self
                .submission
                .as_ref()
                .map(|success| success.receipt.reference.clone()),
        }
    }
}

/// Storage abstraction for wizard sessions.
///
/// The service reads a session, mutates a copy, then writes it back; there is
/// no per-session locking. Each session is driven by one applicant making
/// sequential requests, and concurrent requests against the same session may
/// lose an update (and with it, an attachment release).
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: IntakeSession) -> Result<IntakeSession, RepositoryError>;
    fn update(&self, session: IntakeSession) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<IntakeSession>, RepositoryError>;
}

/// Blob storage for uploaded documents. Keys are opaque to the wizard.
pub trait AttachmentStore: Send + Sync {
    fn store(&self, session: &SessionId, upload: &DocumentUpload) -> Result<String, RepositoryError>;
    fn remove(&self, storage_key: &str) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub role: ApplicantRole,
    pub index: usize,
    pub total: usize,
    pub key: &'static str,
    pub fields: Vec<&'static str>,
}

/// Client-facing snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: SessionId,
    pub stage: WizardStage,
    pub locale: Locale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_count: Option<TenantCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<StepView>,
    pub application: FullApplication,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}
