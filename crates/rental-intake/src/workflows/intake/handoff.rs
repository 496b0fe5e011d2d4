use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{Agent, ApplicantRecord, ApplicantRole, FullApplication, TenantCount};
use super::locale::{Locale, MessageBundle};
use super::schema::{ValidationErrors, Validator};

/// Normalized application handed to the backend. Every field is typed:
/// dates are calendar dates, income is numeric, files are references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub locale: Locale,
    pub agent: Agent,
    pub tenants: Vec<ApplicantRecord>,
    pub guarantor: ApplicantRecord,
    /// Agent first, then the operations mailbox.
    pub notify: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendReceipt {
    pub reference: String,
}

/// Persists the payload, stores its files, and notifies the recipients.
pub trait ApplicationBackend: Send + Sync {
    fn accept(&self, payload: &SubmissionPayload) -> Result<BackendReceipt, BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend rejected the application")]
    Rejected { message: Option<String> },
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Aggregate part whose absence blocks submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPart {
    Agent,
    Tenants,
    Guarantor,
}

impl fmt::Display for MissingPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingPart::Agent => "an agent",
            MissingPart::Tenants => "tenants",
            MissingPart::Guarantor => "a guarantor",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("application is missing {missing}")]
    Incomplete { missing: MissingPart },
    #[error("{role} records failed validation")]
    Invalid {
        role: ApplicantRole,
        issues: ValidationErrors,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl HandoffError {
    /// Text for the notice shown to the applicant. Backend messages are
    /// passed through; anything else falls back to the bundle.
    pub fn user_message(&self, messages: &MessageBundle) -> String {
        match self {
            HandoffError::Incomplete { .. } => messages.incomplete_application.to_string(),
            HandoffError::Backend(BackendError::Rejected {
                message: Some(message),
            }) if !message.trim().is_empty() => message.clone(),
            _ => messages.submit_error.to_string(),
        }
    }

    pub fn issues(&self) -> Option<&ValidationErrors> {
        match self {
            HandoffError::Invalid { issues, .. } => Some(issues),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandoffSuccess {
    pub message: String,
    pub receipt: BackendReceipt,
    pub data: SubmissionPayload,
}

pub struct SubmissionHandoff<B> {
    backend: Arc<B>,
    operations_mailbox: String,
}

impl<B> SubmissionHandoff<B>
where
    B: ApplicationBackend,
{
    pub fn new(backend: Arc<B>, operations_mailbox: impl Into<String>) -> Self {
        Self {
            backend,
            operations_mailbox: operations_mailbox.into(),
        }
    }

    pub fn operations_mailbox(&self) -> &str {
        &self.operations_mailbox
    }

    /// Re-validates every tenant, then the guarantor, and normalizes the
    /// aggregate. The first failing record's issues are returned.
    pub fn prepare(
        &self,
        application: &FullApplication,
        locale: Locale,
    ) -> Result<SubmissionPayload, HandoffError> {
        let agent = application.agent.clone().ok_or(HandoffError::Incomplete {
            missing: MissingPart::Agent,
        })?;
        if application.tenants.is_empty() {
            return Err(HandoffError::Incomplete {
                missing: MissingPart::Tenants,
            });
        }
        let guarantor = application.guarantor.as_ref().ok_or(HandoffError::Incomplete {
            missing: MissingPart::Guarantor,
        })?;

        let messages = locale.messages();
        let count = u8::try_from(application.tenants.len())
            .ok()
            .and_then(|len| TenantCount::try_from(len).ok());
        if count.is_none() {
            return Err(HandoffError::Invalid {
                role: ApplicantRole::Tenant,
                issues: ValidationErrors::single(
                    "tenants",
                    messages.tenant_count_message(TenantCount::Two.get()),
                ),
            });
        }

        let mut tenants = Vec::with_capacity(application.tenants.len());
        for (index, draft) in application.tenants.iter().enumerate() {
            let validator = Validator::for_kind(messages, draft.kind());
            let record = validator
                .normalize(draft, &format!("tenants.{index}"))
                .map_err(|issues| HandoffError::Invalid {
                    role: ApplicantRole::Tenant,
                    issues,
                })?;
            tenants.push(record);
        }

        let guarantor = Validator::for_kind(messages, guarantor.kind())
            .normalize(guarantor, "guarantor")
            .map_err(|issues| HandoffError::Invalid {
                role: ApplicantRole::Guarantor,
                issues,
            })?;

        let mut notify = vec![agent.email.clone()];
        if !agent.email.eq_ignore_ascii_case(&self.operations_mailbox) {
            notify.push(self.operations_mailbox.clone());
        }

        Ok(SubmissionPayload {
            locale,
            agent,
            tenants,
            guarantor,
            notify,
        })
    }

    pub fn submit(
        &self,
        application: &FullApplication,
        locale: Locale,
    ) -> Result<HandoffSuccess, HandoffError> {
        let payload = match self.prepare(application, locale) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "submission blocked before handoff");
                return Err(err);
            }
        };

        match self.backend.accept(&payload) {
            Ok(receipt) => {
                info!(
                    reference = %receipt.reference,
                    tenants = payload.tenants.len(),
                    agent = %payload.agent.email,
                    "application handed off"
                );
                Ok(HandoffSuccess {
                    message: locale.messages().submit_success.to_string(),
                    receipt,
                    data: payload,
                })
            }
            Err(err) => {
                warn!(error = %err, "backend refused application");
                Err(err.into())
            }
        }
    }
}
