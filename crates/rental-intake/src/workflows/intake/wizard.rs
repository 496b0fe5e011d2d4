//! Wizard state machine owning one application aggregate.
//!
//! Every event is applied to a scratch copy of the wizard and committed only
//! when it succeeds, so a rejected event never leaves a half-applied change.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{
    ApplicantDraft, ApplicantRole, ClientKind, DocumentSlot, FileAttachment, FullApplication,
    TenantCount,
};
use super::handoff::{
    ApplicationBackend, HandoffError, HandoffSuccess, MissingPart, SubmissionHandoff,
};
use super::locale::Locale;
use super::schema::ValidationErrors;
use super::steps::{FormScope, StepError, StepForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    Instructions,
    AgentSelect,
    TenantSelect,
    TenantCountSelect,
    TenantForm,
    GuarantorSelect,
    GuarantorForm,
    Review,
    Submitted,
}

impl WizardStage {
    pub const fn label(self) -> &'static str {
        match self {
            WizardStage::Instructions => "instructions",
            WizardStage::AgentSelect => "agent_select",
            WizardStage::TenantSelect => "tenant_select",
            WizardStage::TenantCountSelect => "tenant_count_select",
            WizardStage::TenantForm => "tenant_form",
            WizardStage::GuarantorSelect => "guarantor_select",
            WizardStage::GuarantorForm => "guarantor_form",
            WizardStage::Review => "review",
            WizardStage::Submitted => "submitted",
        }
    }
}

impl std::fmt::Display for WizardStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// User intents accepted by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    Proceed,
    ChooseAgent {
        email: String,
    },
    ChooseTenantKind {
        kind: ClientKind,
    },
    ChooseTenantCount {
        count: TenantCount,
    },
    /// Replaces the text fields of one tenant draft. Attachments missing from
    /// the incoming draft are kept; use `DetachDocument` to clear one.
    UpdateTenant {
        index: usize,
        draft: ApplicantDraft,
    },
    UpdateGuarantor {
        draft: ApplicantDraft,
    },
    AttachDocument {
        role: ApplicantRole,
        #[serde(default)]
        index: usize,
        slot: DocumentSlot,
        file: FileAttachment,
    },
    DetachDocument {
        role: ApplicantRole,
        #[serde(default)]
        index: usize,
        slot: DocumentSlot,
    },
    NextStep,
    PreviousStep,
    FinishForm,
    ChooseGuarantorKind {
        kind: ClientKind,
    },
    EditTenants,
    EditGuarantor,
    SetLocale {
        locale: Locale,
    },
    Restart,
}

impl WizardEvent {
    pub const fn label(&self) -> &'static str {
        match self {
            WizardEvent::Proceed => "proceed",
            WizardEvent::ChooseAgent { .. } => "choose_agent",
            WizardEvent::ChooseTenantKind { .. } => "choose_tenant_kind",
            WizardEvent::ChooseTenantCount { .. } => "choose_tenant_count",
            WizardEvent::UpdateTenant { .. } => "update_tenant",
            WizardEvent::UpdateGuarantor { .. } => "update_guarantor",
            WizardEvent::AttachDocument { .. } => "attach_document",
            WizardEvent::DetachDocument { .. } => "detach_document",
            WizardEvent::NextStep => "next_step",
            WizardEvent::PreviousStep => "previous_step",
            WizardEvent::FinishForm => "finish_form",
            WizardEvent::ChooseGuarantorKind { .. } => "choose_guarantor_kind",
            WizardEvent::EditTenants => "edit_tenants",
            WizardEvent::EditGuarantor => "edit_guarantor",
            WizardEvent::SetLocale { .. } => "set_locale",
            WizardEvent::Restart => "restart",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("`{event}` is not accepted in stage {stage}")]
    InvalidTransition {
        stage: WizardStage,
        event: &'static str,
    },
    #[error("no agent with email `{0}` in the directory")]
    UnknownAgent(String),
    #[error("an agent was already chosen for this application")]
    AgentAlreadyChosen,
    #[error("no {role} record at index {index}")]
    NoSuchRecord { role: ApplicantRole, index: usize },
    #[error("expected a {expected} record, received {found}")]
    KindMismatch {
        expected: ClientKind,
        found: ClientKind,
    },
    #[error("document slot {slot:?} does not apply to {kind} records")]
    SlotUnavailable { slot: DocumentSlot, kind: ClientKind },
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("step {index} is the last step; finish the form instead")]
    LastStep { index: usize },
    #[error(transparent)]
    Handoff(#[from] HandoffError),
}

impl From<StepError> for WizardError {
    fn from(value: StepError) -> Self {
        match value {
            StepError::Validation(errors) => WizardError::Validation(errors),
            StepError::LastStep { index } => WizardError::LastStep { index },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeWizard {
    stage: WizardStage,
    locale: Locale,
    application: FullApplication,
    tenant_count: Option<TenantCount>,
    form: Option<StepForm>,
    return_to_review: bool,
}

impl Default for IntakeWizard {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl IntakeWizard {
    pub fn new(locale: Locale) -> Self {
        Self {
            stage: WizardStage::Instructions,
            locale,
            application: FullApplication::default(),
            tenant_count: None,
            form: None,
            return_to_review: false,
        }
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn application(&self) -> &FullApplication {
        &self.application
    }

    pub fn tenant_count(&self) -> Option<TenantCount> {
        self.tenant_count
    }

    /// The open step form, present only in `TenantForm` and `GuarantorForm`.
    pub fn form(&self) -> Option<&StepForm> {
        self.form.as_ref()
    }

    /// Applies one event. On error the wizard is exactly as it was.
    pub fn apply(&mut self, event: WizardEvent) -> Result<WizardStage, WizardError> {
        let label = event.label();
        let from = self.stage;
        let mut next = self.clone();

        match next.transition(event) {
            Ok(()) => {
                *self = next;
                if from != self.stage {
                    info!(event = label, %from, to = %self.stage, "wizard transition");
                } else {
                    debug!(event = label, stage = %from, "wizard event applied");
                }
                Ok(self.stage)
            }
            Err(err) => {
                match &err {
                    WizardError::Validation(errors) => {
                        warn!(event = label, stage = %from, paths = ?errors.paths(), "step validation failed");
                    }
                    other => warn!(event = label, stage = %from, error = %other, "wizard event rejected"),
                }
                Err(err)
            }
        }
    }

    /// Hands the aggregate to the backend from `Review`. A missing part sends
    /// the wizard back to the stage that supplies it; a rejection keeps it in
    /// `Review` with all values intact.
    pub fn submit<B>(
        &mut self,
        handoff: &SubmissionHandoff<B>,
    ) -> Result<HandoffSuccess, WizardError>
    where
        B: ApplicationBackend,
    {
        if self.stage != WizardStage::Review {
            return Err(self.rejected("submit"));
        }

        match handoff.submit(&self.application, self.locale) {
            Ok(success) => {
                info!(from = %self.stage, to = %WizardStage::Submitted, "wizard transition");
                self.stage = WizardStage::Submitted;
                Ok(success)
            }
            Err(HandoffError::Incomplete { missing }) => {
                let recovery = match missing {
                    MissingPart::Agent => WizardStage::AgentSelect,
                    MissingPart::Tenants => WizardStage::TenantSelect,
                    MissingPart::Guarantor => WizardStage::GuarantorSelect,
                };
                warn!(%missing, to = %recovery, "incomplete application sent back for completion");
                self.stage = recovery;
                self.form = None;
                self.return_to_review = false;
                Err(HandoffError::Incomplete { missing }.into())
            }
            Err(other) => Err(other.into()),
        }
    }

    fn rejected(&self, event: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            stage: self.stage,
            event,
        }
    }

    fn transition(&mut self, event: WizardEvent) -> Result<(), WizardError> {
        let label = event.label();
        let stage = self.stage;
        let rejected = || WizardError::InvalidTransition {
            stage,
            event: label,
        };
        let messages = self.locale.messages();

        match (self.stage, event) {
            (_, WizardEvent::SetLocale { locale }) => {
                self.locale = locale;
            }
            (_, WizardEvent::Restart) => {
                *self = Self::new(self.locale);
            }
            (WizardStage::Instructions, WizardEvent::Proceed) => {
                self.stage = WizardStage::AgentSelect;
            }
            (WizardStage::AgentSelect, WizardEvent::ChooseAgent { email }) => {
                if self.application.agent.is_some() {
                    return Err(WizardError::AgentAlreadyChosen);
                }
                let agent = messages
                    .agent_by_email(&email)
                    .ok_or(WizardError::UnknownAgent(email))?;
                self.application.agent = Some(agent);
                self.stage = WizardStage::TenantSelect;
            }
            (WizardStage::TenantSelect, WizardEvent::ChooseTenantKind { kind }) => match kind {
                ClientKind::Individual => {
                    self.application.tenants.clear();
                    self.tenant_count = None;
                    self.stage = WizardStage::TenantCountSelect;
                }
                ClientKind::Company => {
                    self.open_tenant_form(ClientKind::Company, TenantCount::One);
                }
            },
            (WizardStage::TenantCountSelect, WizardEvent::ChooseTenantCount { count }) => {
                self.open_tenant_form(ClientKind::Individual, count);
            }
            (WizardStage::TenantForm, WizardEvent::UpdateTenant { index, draft }) => {
                let kind = self.open_form_kind()?;
                let slot = self
                    .application
                    .tenants
                    .get_mut(index)
                    .ok_or(WizardError::NoSuchRecord {
                        role: ApplicantRole::Tenant,
                        index,
                    })?;
                *slot = merge_draft(kind, slot, draft)?;
            }
            (WizardStage::GuarantorForm, WizardEvent::UpdateGuarantor { draft }) => {
                let kind = self.open_form_kind()?;
                let slot = self
                    .application
                    .guarantor
                    .as_mut()
                    .ok_or(WizardError::NoSuchRecord {
                        role: ApplicantRole::Guarantor,
                        index: 0,
                    })?;
                *slot = merge_draft(kind, slot, draft)?;
            }
            (
                stage @ (WizardStage::TenantForm | WizardStage::GuarantorForm),
                WizardEvent::AttachDocument {
                    role,
                    index,
                    slot,
                    file,
                },
            ) => {
                self.set_document(stage, role, index, slot, Some(file))?;
            }
            (
                stage @ (WizardStage::TenantForm | WizardStage::GuarantorForm),
                WizardEvent::DetachDocument { role, index, slot },
            ) => {
                self.set_document(stage, role, index, slot, None)?;
            }
            (WizardStage::TenantForm | WizardStage::GuarantorForm, WizardEvent::NextStep) => {
                let Some(form) = self.form.as_mut() else {
                    return Err(rejected());
                };
                let records = match form.scope() {
                    FormScope::Tenants { .. } => self.application.tenants.as_slice(),
                    FormScope::Guarantor => self.application.guarantor.as_slice(),
                };
                form.advance(messages, records)?;
            }
            (WizardStage::TenantForm | WizardStage::GuarantorForm, WizardEvent::PreviousStep) => {
                let Some(form) = self.form.as_mut() else {
                    return Err(rejected());
                };
                if form.retreat().is_none() {
                    self.stage = match (form.scope(), form.kind()) {
                        _ if self.return_to_review => WizardStage::Review,
                        (FormScope::Tenants { .. }, ClientKind::Individual) => {
                            WizardStage::TenantCountSelect
                        }
                        (FormScope::Tenants { .. }, ClientKind::Company) => {
                            WizardStage::TenantSelect
                        }
                        (FormScope::Guarantor, _) => WizardStage::GuarantorSelect,
                    };
                    self.form = None;
                    self.return_to_review = false;
                }
            }
            (WizardStage::TenantForm | WizardStage::GuarantorForm, WizardEvent::FinishForm) => {
                let Some(form) = self.form.take() else {
                    return Err(rejected());
                };
                match form.scope() {
                    FormScope::Tenants { .. } => {
                        let submitted = form.finish(messages, &self.application.tenants, |records| {
                            records.to_vec()
                        })?;
                        self.application.tenants = submitted;
                        self.stage = if self.return_to_review && self.application.guarantor.is_some()
                        {
                            WizardStage::Review
                        } else {
                            WizardStage::GuarantorSelect
                        };
                    }
                    FormScope::Guarantor => {
                        let submitted = form.finish(
                            messages,
                            self.application.guarantor.as_slice(),
                            |records| records.first().cloned(),
                        )?;
                        self.application.guarantor = submitted;
                        self.stage = WizardStage::Review;
                    }
                }
                self.return_to_review = false;
            }
            (WizardStage::GuarantorSelect, WizardEvent::ChooseGuarantorKind { kind }) => {
                self.application.guarantor = Some(ApplicantDraft::blank(kind));
                self.form = Some(StepForm::new(kind, FormScope::Guarantor));
                self.stage = WizardStage::GuarantorForm;
            }
            (WizardStage::Review, WizardEvent::EditTenants) => {
                let (Some(kind), Some(count)) =
                    (self.application.tenant_kind(), self.tenant_count)
                else {
                    return Err(rejected());
                };
                self.form = Some(StepForm::new(kind, FormScope::Tenants { count }));
                self.return_to_review = true;
                self.stage = WizardStage::TenantForm;
            }
            (WizardStage::Review, WizardEvent::EditGuarantor) => {
                let Some(kind) = self.application.guarantor.as_ref().map(ApplicantDraft::kind)
                else {
                    return Err(rejected());
                };
                self.form = Some(StepForm::new(kind, FormScope::Guarantor));
                self.return_to_review = true;
                self.stage = WizardStage::GuarantorForm;
            }
            (_, _) => return Err(rejected()),
        }

        Ok(())
    }

    /// Allocates `count` blank records of `kind`, replacing any previous
    /// allocation, and opens the tenant form at its first step.
    fn open_tenant_form(&mut self, kind: ClientKind, count: TenantCount) {
        self.application.tenants = (0..count.get()).map(|_| ApplicantDraft::blank(kind)).collect();
        self.tenant_count = Some(count);
        self.form = Some(StepForm::new(kind, FormScope::Tenants { count }));
        self.stage = WizardStage::TenantForm;
    }

    fn open_form_kind(&self) -> Result<ClientKind, WizardError> {
        self.form
            .as_ref()
            .map(StepForm::kind)
            .ok_or_else(|| self.rejected("form_edit"))
    }

    fn set_document(
        &mut self,
        stage: WizardStage,
        role: ApplicantRole,
        index: usize,
        slot: DocumentSlot,
        file: Option<FileAttachment>,
    ) -> Result<(), WizardError> {
        let open_role = match stage {
            WizardStage::TenantForm => ApplicantRole::Tenant,
            _ => ApplicantRole::Guarantor,
        };
        let missing = WizardError::NoSuchRecord { role, index };
        if role != open_role {
            return Err(missing);
        }

        let draft = match role {
            ApplicantRole::Tenant => self.application.tenants.get_mut(index),
            ApplicantRole::Guarantor if index == 0 => self.application.guarantor.as_mut(),
            ApplicantRole::Guarantor => None,
        }
        .ok_or(missing)?;

        let kind = draft.kind();
        if draft.set_attachment(slot, file) {
            Ok(())
        } else {
            Err(WizardError::SlotUnavailable { slot, kind })
        }
    }
}

/// Takes `incoming`'s text fields, keeping attachments it leaves empty.
fn merge_draft(
    kind: ClientKind,
    current: &ApplicantDraft,
    mut incoming: ApplicantDraft,
) -> Result<ApplicantDraft, WizardError> {
    if incoming.kind() != kind {
        return Err(WizardError::KindMismatch {
            expected: kind,
            found: incoming.kind(),
        });
    }
    for slot in DocumentSlot::for_kind(kind) {
        if incoming.attachment(*slot).is_none() {
            incoming.set_attachment(*slot, current.attachment(*slot).cloned());
        }
    }
    Ok(incoming)
}
