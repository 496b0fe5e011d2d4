//! Rental application intake.
//!
//! A wizard walks one applicant session from the instructions screen through
//! agent, tenant and guarantor capture to a printable review and a validated
//! handoff. Validation is generated per locale and client kind; step forms
//! validate only their own fields until the whole record set is finished.

pub mod documents;
pub mod domain;
pub mod export;
pub mod handoff;
pub mod locale;
pub mod repository;
pub mod review;
pub mod router;
pub mod schema;
pub mod service;
pub mod steps;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use documents::{is_recommended_type, DocumentUpload, UploadReceipt};
pub use domain::{
    Agent, ApplicantDraft, ApplicantRecord, ApplicantRole, ClientKind, CompanyApplicant,
    CompanyDraft, DocumentReference, DocumentSlot, EmploymentStatus, Field, FileAttachment,
    FullApplication, HousingType, IndividualApplicant, IndividualDraft, InvalidTenantCount,
    TenantCount,
};
pub use export::{
    export_review, ExportError, ExportedDocument, PageLayout, PageRasterizer, TextRasterizer,
    EXPORT_FILE_NAME,
};
pub use handoff::{
    ApplicationBackend, BackendError, BackendReceipt, HandoffError, HandoffSuccess, MissingPart,
    SubmissionHandoff, SubmissionPayload,
};
pub use locale::{Locale, MessageBundle};
pub use repository::{
    AttachmentStore, IntakeSession, RepositoryError, SessionId, SessionRepository, SessionView,
};
pub use review::ReviewDocument;
pub use router::intake_router;
pub use schema::{FieldIssue, TenantSetValidator, ValidationErrors, Validator};
pub use service::{agent_directory, instructions, InstructionsView, IntakeService, IntakeServiceError};
pub use steps::{FormScope, FormStep, StepError, StepForm};
pub use wizard::{IntakeWizard, WizardError, WizardEvent, WizardStage};
