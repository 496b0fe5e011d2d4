use serde::Serialize;

use super::domain::{ApplicantDraft, ApplicantRole, ClientKind, Field, TenantCount};
use super::locale::MessageBundle;
use super::schema::{TenantSetValidator, ValidationErrors, Validator};

/// A named subset of an applicant's fields validated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormStep {
    pub key: &'static str,
    #[serde(serialize_with = "serialize_fields")]
    pub fields: &'static [Field],
}

fn serialize_fields<S>(fields: &&'static [Field], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(fields.iter().map(|field| field.name()))
}

pub const INDIVIDUAL_STEPS: &[FormStep] = &[
    FormStep {
        key: "personal",
        fields: &[Field::FullName, Field::Email, Field::Phone, Field::Dob],
    },
    FormStep {
        key: "rental_history",
        fields: &[
            Field::CurrentAddress,
            Field::HousingType,
            Field::PreviousAddress,
            Field::LandlordName,
            Field::LandlordPhone,
            Field::ReasonForLeaving,
        ],
    },
    FormStep {
        key: "employment",
        fields: &[
            Field::EmploymentStatus,
            Field::Employer,
            Field::JobTitle,
            Field::MonthlyIncome,
        ],
    },
    FormStep {
        key: "documents",
        fields: &[
            Field::WorkLetter,
            Field::BankStatements,
            Field::IdentityCard,
            Field::CreditReport,
        ],
    },
];

pub const COMPANY_STEPS: &[FormStep] = &[
    FormStep {
        key: "company",
        fields: &[
            Field::CompanyName,
            Field::CompanyTaxId,
            Field::CompanyAddress,
            Field::CompanyActivity,
            Field::CompanyPhoneOffice,
            Field::CompanyPhoneCell,
            Field::SignerName,
            Field::SignerRole,
            Field::SignerId,
        ],
    },
    FormStep {
        key: "documents",
        fields: &[
            Field::MercantileRegistry,
            Field::RepresentativeId,
            Field::AssemblyAct,
            Field::BankStatements,
            Field::CreditReport,
        ],
    },
];

pub fn steps_for(kind: ClientKind) -> &'static [FormStep] {
    match kind {
        ClientKind::Individual => INDIVIDUAL_STEPS,
        ClientKind::Company => COMPANY_STEPS,
    }
}

/// Which records a form governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum FormScope {
    Tenants { count: TenantCount },
    Guarantor,
}

impl FormScope {
    pub fn role(self) -> ApplicantRole {
        match self {
            FormScope::Tenants { .. } => ApplicantRole::Tenant,
            FormScope::Guarantor => ApplicantRole::Guarantor,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("step {index} is the last step; finish the form instead")]
    LastStep { index: usize },
}

/// Cursor over the steps of one tenant or guarantor form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepForm {
    kind: ClientKind,
    scope: FormScope,
    current: usize,
}

impl StepForm {
    pub fn new(kind: ClientKind, scope: FormScope) -> Self {
        Self {
            kind,
            scope,
            current: 0,
        }
    }

    pub fn kind(&self) -> ClientKind {
        self.kind
    }

    pub fn scope(&self) -> FormScope {
        self.scope
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn steps(&self) -> &'static [FormStep] {
        steps_for(self.kind)
    }

    pub fn step(&self) -> &'static FormStep {
        &self.steps()[self.current]
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 == self.steps().len()
    }

    /// Validates only the current step's fields, for every record in scope.
    pub fn advance(
        &mut self,
        messages: &MessageBundle,
        records: &[ApplicantDraft],
    ) -> Result<usize, StepError> {
        if self.is_last_step() {
            return Err(StepError::LastStep {
                index: self.current,
            });
        }

        let fields = self.step().fields;
        let issues = match self.scope {
            FormScope::Tenants { count } => {
                TenantSetValidator::new(messages, self.kind, count).issues(records, Some(fields))
            }
            FormScope::Guarantor => {
                let validator = Validator::for_kind(messages, self.kind);
                records
                    .iter()
                    .flat_map(|record| validator.issues(record, "guarantor", Some(fields)))
                    .collect()
            }
        };
        ValidationErrors::from_issues(issues)?;

        self.current += 1;
        Ok(self.current)
    }

    /// Steps back without validating. `None` when already on the first step.
    pub fn retreat(&mut self) -> Option<usize> {
        if self.current == 0 {
            return None;
        }
        self.current -= 1;
        Some(self.current)
    }

    /// Validates the whole record set, every step included, and only then
    /// hands the records to `on_submit`.
    pub fn finish<F, T>(
        &self,
        messages: &MessageBundle,
        records: &[ApplicantDraft],
        on_submit: F,
    ) -> Result<T, StepError>
    where
        F: FnOnce(&[ApplicantDraft]) -> T,
    {
        match self.scope {
            FormScope::Tenants { count } => {
                TenantSetValidator::new(messages, self.kind, count).validate(records)?;
            }
            FormScope::Guarantor => {
                let validator = Validator::for_kind(messages, self.kind);
                let mut issues: Vec<_> = records
                    .iter()
                    .flat_map(|record| validator.issues(record, "guarantor", None))
                    .collect();
                if records.len() != 1 {
                    issues.push(super::schema::FieldIssue {
                        path: "guarantor".to_string(),
                        message: messages.validation.client_type.to_string(),
                    });
                }
                ValidationErrors::from_issues(issues)?;
            }
        }

        Ok(on_submit(records))
    }
}
