//! Per-locale validation schemas for applicant drafts.
//!
//! A [`Validator`] is built from a [`MessageBundle`] and a [`ClientKind`]. Each
//! field owns an ordered chain of predicates; the first failing link reports
//! its localized message. Cross-field rules run after the field chains and may
//! report issues against any field of the record.

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    ApplicantDraft, ApplicantRecord, ClientKind, CompanyApplicant, CompanySigner,
    DocumentReference, DocumentSlot, EmploymentStatus, Field, FieldValue, HousingType,
    IndividualApplicant, PriorResidence, TenantCount,
};
use super::locale::MessageBundle;

/// One failed check, addressed by a dotted path such as `tenants.1.email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub message: String,
}

/// Non-empty set of field issues returned by a failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{} field(s) failed validation", .issues.len())]
#[serde(transparent)]
pub struct ValidationErrors {
    issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    pub(crate) fn from_issues(issues: Vec<FieldIssue>) -> Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self { issues })
        }
    }

    pub(crate) fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                path: path.into(),
                message: message.into(),
            }],
        }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<FieldIssue> {
        self.issues
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }

    pub fn message_for(&self, path: &str) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.path == path)
            .map(|issue| issue.message.as_str())
    }

    pub fn paths(&self) -> Vec<&str> {
        self.issues.iter().map(|issue| issue.path.as_str()).collect()
    }
}

pub(crate) fn field_path(prefix: &str, field: Field) -> String {
    if prefix.is_empty() {
        field.name().to_string()
    } else {
        format!("{prefix}.{}", field.name())
    }
}

type Predicate = Box<dyn Fn(FieldValue<'_>) -> bool + Send + Sync>;
type CrossRule = Box<dyn Fn(&ApplicantDraft) -> Vec<(Field, String)> + Send + Sync>;

struct Link {
    predicate: Predicate,
    message: String,
}

/// Ordered predicate chain for one field.
pub struct FieldChain {
    field: Field,
    links: Vec<Link>,
}

impl FieldChain {
    pub fn new(field: Field) -> Self {
        Self {
            field,
            links: Vec::new(),
        }
    }

    pub fn must<P>(mut self, predicate: P, message: &str) -> Self
    where
        P: Fn(FieldValue<'_>) -> bool + Send + Sync + 'static,
    {
        self.links.push(Link {
            predicate: Box::new(predicate),
            message: message.to_string(),
        });
        self
    }

    pub fn field(&self) -> Field {
        self.field
    }

    fn check(&self, draft: &ApplicantDraft) -> Option<&str> {
        let value = draft.value(self.field)?;
        self.links
            .iter()
            .find(|link| !(link.predicate)(value))
            .map(|link| link.message.as_str())
    }
}

fn text(value: FieldValue<'_>) -> Option<&str> {
    match value {
        FieldValue::Text(text) => Some(text),
        FieldValue::Attachment(_) => None,
    }
}

pub fn non_blank(value: FieldValue<'_>) -> bool {
    text(value).is_some_and(|text| !text.trim().is_empty())
}

pub fn email_address(value: FieldValue<'_>) -> bool {
    let Some(raw) = text(value) else {
        return false;
    };
    let candidate = raw.trim();
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Accepts `YYYY-MM-DD` or an ISO timestamp whose date part is valid.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = match trimmed.split_once('T') {
        Some((date, _)) => date,
        None => trimmed,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn calendar_date(value: FieldValue<'_>) -> bool {
    text(value).and_then(parse_calendar_date).is_some()
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    let amount = raw.trim().replace(',', "").parse::<f64>().ok()?;
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

pub fn non_negative_amount(value: FieldValue<'_>) -> bool {
    text(value).and_then(parse_amount).is_some()
}

pub fn one_of(allowed: &'static [&'static str]) -> impl Fn(FieldValue<'_>) -> bool + Send + Sync {
    move |value| text(value).is_some_and(|text| allowed.contains(&text.trim()))
}

pub fn attached(value: FieldValue<'_>) -> bool {
    matches!(value, FieldValue::Attachment(Some(file)) if !file.is_empty())
}

/// Structural validator for one applicant record of a fixed kind.
pub struct Validator {
    kind: ClientKind,
    chains: Vec<FieldChain>,
    cross_rules: Vec<CrossRule>,
    kind_mismatch: String,
}

impl Validator {
    pub fn for_kind(messages: &MessageBundle, kind: ClientKind) -> Self {
        match kind {
            ClientKind::Individual => Self::individual(messages),
            ClientKind::Company => Self::company(messages),
        }
    }

    fn individual(messages: &MessageBundle) -> Self {
        let m = &messages.validation;
        let mut chains = vec![
            FieldChain::new(Field::FullName).must(non_blank, m.full_name),
            FieldChain::new(Field::Email).must(email_address, m.email),
            FieldChain::new(Field::Phone).must(non_blank, m.phone),
            FieldChain::new(Field::Dob)
                .must(non_blank, m.dob_required)
                .must(calendar_date, m.dob_invalid),
            FieldChain::new(Field::CurrentAddress).must(non_blank, m.current_address),
            FieldChain::new(Field::HousingType).must(one_of(HousingType::ALLOWED), m.housing_type),
            FieldChain::new(Field::EmploymentStatus)
                .must(one_of(EmploymentStatus::ALLOWED), m.employment_status),
            FieldChain::new(Field::Employer).must(non_blank, m.employer),
            FieldChain::new(Field::JobTitle).must(non_blank, m.job_title),
            FieldChain::new(Field::MonthlyIncome).must(non_negative_amount, m.monthly_income),
        ];
        chains.extend(document_chains(ClientKind::Individual, m.file_required));

        let prior_messages = [
            (Field::PreviousAddress, m.previous_address.to_string()),
            (Field::LandlordName, m.landlord_name.to_string()),
            (Field::LandlordPhone, m.landlord_phone.to_string()),
            (Field::ReasonForLeaving, m.reason_for_leaving.to_string()),
        ];
        let renting_requires_prior_residence: CrossRule = Box::new(move |draft| {
            let renting = matches!(
                draft.value(Field::HousingType).and_then(text),
                Some(value) if HousingType::parse(value) == Some(HousingType::Rented)
            );
            if !renting {
                return Vec::new();
            }
            prior_messages
                .iter()
                .filter(|(field, _)| !draft.value(*field).is_some_and(non_blank))
                .map(|(field, message)| (*field, message.clone()))
                .collect()
        });

        Self {
            kind: ClientKind::Individual,
            chains,
            cross_rules: vec![renting_requires_prior_residence],
            kind_mismatch: m.client_type.to_string(),
        }
    }

    fn company(messages: &MessageBundle) -> Self {
        let m = &messages.validation;
        let mut chains = vec![
            FieldChain::new(Field::CompanyName).must(non_blank, m.company_name),
            FieldChain::new(Field::CompanyTaxId).must(non_blank, m.company_tax_id),
            FieldChain::new(Field::CompanyAddress).must(non_blank, m.company_address),
            FieldChain::new(Field::CompanyActivity).must(non_blank, m.company_activity),
            FieldChain::new(Field::CompanyPhoneOffice).must(non_blank, m.phone),
            FieldChain::new(Field::CompanyPhoneCell).must(non_blank, m.phone),
            FieldChain::new(Field::SignerName).must(non_blank, m.full_name),
            FieldChain::new(Field::SignerRole).must(non_blank, m.signer_role),
            FieldChain::new(Field::SignerId).must(non_blank, m.signer_id),
        ];
        chains.extend(document_chains(ClientKind::Company, m.file_required));

        Self {
            kind: ClientKind::Company,
            chains,
            cross_rules: Vec::new(),
            kind_mismatch: m.client_type.to_string(),
        }
    }

    pub fn kind(&self) -> ClientKind {
        self.kind
    }

    /// Validates a lone record; issue paths are bare field names.
    pub fn validate(&self, draft: &ApplicantDraft) -> Result<(), ValidationErrors> {
        ValidationErrors::from_issues(self.issues(draft, "", None))
    }

    /// Collects issues under `prefix`, optionally restricted to `only` fields.
    pub fn issues(
        &self,
        draft: &ApplicantDraft,
        prefix: &str,
        only: Option<&[Field]>,
    ) -> Vec<FieldIssue> {
        if draft.kind() != self.kind {
            let path = if prefix.is_empty() {
                "clientType".to_string()
            } else {
                format!("{prefix}.clientType")
            };
            return vec![FieldIssue {
                path,
                message: self.kind_mismatch.clone(),
            }];
        }

        let selected = |field: Field| only.map_or(true, |fields| fields.contains(&field));
        let mut issues: Vec<FieldIssue> = self
            .chains
            .iter()
            .filter(|chain| selected(chain.field()))
            .filter_map(|chain| {
                chain.check(draft).map(|message| FieldIssue {
                    path: field_path(prefix, chain.field()),
                    message: message.to_string(),
                })
            })
            .collect();

        for rule in &self.cross_rules {
            issues.extend(
                rule(draft)
                    .into_iter()
                    .filter(|(field, _)| selected(*field))
                    .map(|(field, message)| FieldIssue {
                        path: field_path(prefix, field),
                        message,
                    }),
            );
        }

        issues
    }

    /// Validates and converts the draft into its normalized record. Issue
    /// paths carry `prefix`.
    pub fn normalize(
        &self,
        draft: &ApplicantDraft,
        prefix: &str,
    ) -> Result<ApplicantRecord, ValidationErrors> {
        ValidationErrors::from_issues(self.issues(draft, prefix, None))?;

        let documents = DocumentSlot::for_kind(self.kind)
            .iter()
            .filter_map(|slot| {
                draft.attachment(*slot).map(|file| DocumentReference {
                    slot: *slot,
                    file_name: file.file_name.clone(),
                    content_type: file.content_type.clone(),
                    size_bytes: file.size_bytes,
                    storage_key: file.storage_key.clone(),
                })
            })
            .collect();

        // The chains above guarantee every parse below succeeds; a miss here
        // is reported as an issue rather than a panic.
        let unparseable =
            |field: Field, message: &str| ValidationErrors::single(field_path(prefix, field), message);

        let record = match draft {
            ApplicantDraft::Individual(d) => {
                let date_of_birth = parse_calendar_date(&d.dob)
                    .ok_or_else(|| unparseable(Field::Dob, "invalid date"))?;
                let housing_type = HousingType::parse(&d.housing_type)
                    .ok_or_else(|| unparseable(Field::HousingType, "invalid housing type"))?;
                let employment_status = EmploymentStatus::parse(&d.employment_status)
                    .ok_or_else(|| unparseable(Field::EmploymentStatus, "invalid status"))?;
                let monthly_income = parse_amount(&d.monthly_income)
                    .ok_or_else(|| unparseable(Field::MonthlyIncome, "invalid amount"))?;

                let prior = PriorResidence {
                    previous_address: d.previous_address.trim().to_string(),
                    landlord_name: d.landlord_name.trim().to_string(),
                    landlord_phone: d.landlord_phone.trim().to_string(),
                    reason_for_leaving: d.reason_for_leaving.trim().to_string(),
                };
                let prior_supplied = [
                    &prior.previous_address,
                    &prior.landlord_name,
                    &prior.landlord_phone,
                    &prior.reason_for_leaving,
                ]
                .iter()
                .any(|value| !value.is_empty());

                ApplicantRecord::Individual(IndividualApplicant {
                    full_name: d.full_name.trim().to_string(),
                    email: d.email.trim().to_string(),
                    phone: d.phone.trim().to_string(),
                    date_of_birth,
                    current_address: d.current_address.trim().to_string(),
                    housing_type,
                    prior_residence: prior_supplied.then_some(prior),
                    employment_status,
                    employer: d.employer.trim().to_string(),
                    job_title: d.job_title.trim().to_string(),
                    monthly_income,
                    documents,
                })
            }
            ApplicantDraft::Company(d) => ApplicantRecord::Company(CompanyApplicant {
                company_name: d.company_name.trim().to_string(),
                tax_id: d.company_tax_id.trim().to_string(),
                address: d.company_address.trim().to_string(),
                activity: d.company_activity.trim().to_string(),
                phone_office: d.company_phone_office.trim().to_string(),
                phone_cell: d.company_phone_cell.trim().to_string(),
                signer: CompanySigner {
                    name: d.signer_name.trim().to_string(),
                    role: d.signer_role.trim().to_string(),
                    id: d.signer_id.trim().to_string(),
                },
                documents,
            }),
        };

        Ok(record)
    }
}

fn document_chains(kind: ClientKind, message: &str) -> Vec<FieldChain> {
    DocumentSlot::for_kind(kind)
        .iter()
        .map(|slot| FieldChain::new(slot.field()).must(attached, message))
        .collect()
}

/// Fixed-length collection validator used for the tenant stage.
pub struct TenantSetValidator {
    validator: Validator,
    count: TenantCount,
    count_message: String,
}

impl TenantSetValidator {
    pub fn new(messages: &MessageBundle, kind: ClientKind, count: TenantCount) -> Self {
        Self {
            validator: Validator::for_kind(messages, kind),
            count,
            count_message: messages.tenant_count_message(count.get()),
        }
    }

    pub fn count(&self) -> TenantCount {
        self.count
    }

    pub fn record_validator(&self) -> &Validator {
        &self.validator
    }

    pub fn validate(&self, tenants: &[ApplicantDraft]) -> Result<(), ValidationErrors> {
        ValidationErrors::from_issues(self.issues(tenants, None))
    }

    /// Issues for every tenant under `tenants.<i>`, plus the length rule when
    /// validating the whole record set.
    pub fn issues(&self, tenants: &[ApplicantDraft], only: Option<&[Field]>) -> Vec<FieldIssue> {
        let mut issues = Vec::new();
        if only.is_none() && tenants.len() != self.count.get() {
            issues.push(FieldIssue {
                path: "tenants".to_string(),
                message: self.count_message.clone(),
            });
        }
        for (index, tenant) in tenants.iter().enumerate() {
            let prefix = format!("tenants.{index}");
            issues.extend(self.validator.issues(tenant, &prefix, only));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::intake::domain::{FileAttachment, IndividualDraft};
    use crate::workflows::intake::locale::Locale;

    fn file() -> FileAttachment {
        FileAttachment {
            file_name: "doc.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size_bytes: 2048,
            storage_key: "memory://doc.pdf".to_string(),
        }
    }

    #[test]
    fn email_predicate_rejects_malformed_addresses() {
        let check = |raw: &str| email_address(FieldValue::Text(raw));
        assert!(check("ana@example.com"));
        assert!(check(" ana.perez@mail.example.do "));
        assert!(!check("ana@example"));
        assert!(!check("ana example@x.com"));
        assert!(!check("@example.com"));
        assert!(!check("ana@@example.com"));
        assert!(!check(""));
    }

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        assert_eq!(
            parse_calendar_date("1990-04-12"),
            NaiveDate::from_ymd_opt(1990, 4, 12)
        );
        assert_eq!(
            parse_calendar_date("1990-04-12T00:00:00.000Z"),
            NaiveDate::from_ymd_opt(1990, 4, 12)
        );
        assert!(parse_calendar_date("1990-02-30").is_none());
        assert!(parse_calendar_date("12/04/1990").is_none());
    }

    #[test]
    fn amounts_must_be_non_negative_numbers() {
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount("45,000.50"), Some(45000.5));
        assert!(parse_amount("-1").is_none());
        assert!(parse_amount("abc").is_none());
        assert!(parse_amount("").is_none());
        assert!(parse_amount("NaN").is_none());
    }

    #[test]
    fn dob_chain_reports_first_failing_link() {
        let messages = Locale::En.messages();
        let validator = Validator::for_kind(messages, ClientKind::Individual);

        let blank = ApplicantDraft::Individual(IndividualDraft::default());
        let errors = validator.validate(&blank).expect_err("blank draft fails");
        assert_eq!(
            errors.message_for("dob"),
            Some(messages.validation.dob_required)
        );

        let garbled = ApplicantDraft::Individual(IndividualDraft {
            dob: "yesterday".to_string(),
            ..IndividualDraft::default()
        });
        let errors = validator.validate(&garbled).expect_err("bad date fails");
        assert_eq!(
            errors.message_for("dob"),
            Some(messages.validation.dob_invalid)
        );
    }

    #[test]
    fn zero_length_files_are_rejected() {
        let validator = Validator::for_kind(Locale::Es.messages(), ClientKind::Individual);
        let mut empty = file();
        empty.size_bytes = 0;
        let draft = ApplicantDraft::Individual(IndividualDraft {
            work_letter: Some(empty),
            bank_statements: Some(file()),
            ..IndividualDraft::default()
        });

        let issues = validator.issues(
            &draft,
            "",
            Some(&[Field::WorkLetter, Field::BankStatements, Field::IdentityCard]),
        );
        let paths: Vec<&str> = issues.iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(paths, vec!["workLetter", "identityCard"]);
    }

    #[test]
    fn wrong_kind_is_reported_on_client_type() {
        let validator = Validator::for_kind(Locale::Es.messages(), ClientKind::Company);
        let issues = validator.issues(
            &ApplicantDraft::blank(ClientKind::Individual),
            "guarantor",
            None,
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "guarantor.clientType");
    }
}
