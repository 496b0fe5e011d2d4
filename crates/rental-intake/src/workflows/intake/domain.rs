use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Whether an applicant is a person or a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    Individual,
    Company,
}

impl ClientKind {
    pub const fn label(self) -> &'static str {
        match self {
            ClientKind::Individual => "individual",
            ClientKind::Company => "company",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The part an applicant record plays in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantRole {
    Tenant,
    Guarantor,
}

impl ApplicantRole {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicantRole::Tenant => "tenant",
            ApplicantRole::Guarantor => "guarantor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tenant" | "tenants" => Some(ApplicantRole::Tenant),
            "guarantor" => Some(ApplicantRole::Guarantor),
            _ => None,
        }
    }
}

impl fmt::Display for ApplicantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of tenants on one application. Only one or two are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TenantCount {
    One,
    Two,
}

impl TenantCount {
    pub const fn get(self) -> usize {
        match self {
            TenantCount::One => 1,
            TenantCount::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tenant count must be 1 or 2 (found {0})")]
pub struct InvalidTenantCount(pub u8);

impl TryFrom<u8> for TenantCount {
    type Error = InvalidTenantCount;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TenantCount::One),
            2 => Ok(TenantCount::Two),
            other => Err(InvalidTenantCount(other)),
        }
    }
}

impl From<TenantCount> for u8 {
    fn from(value: TenantCount) -> Self {
        value.get() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HousingType {
    Rented,
    Own,
}

impl HousingType {
    pub const ALLOWED: &'static [&'static str] = &["rented", "own"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "rented" => Some(HousingType::Rented),
            "own" => Some(HousingType::Own),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    Unemployed,
    Student,
}

impl EmploymentStatus {
    pub const ALLOWED: &'static [&'static str] = &["employed", "unemployed", "student"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "employed" => Some(EmploymentStatus::Employed),
            "unemployed" => Some(EmploymentStatus::Unemployed),
            "student" => Some(EmploymentStatus::Student),
            _ => None,
        }
    }
}

/// Listing agent the application is routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub email: String,
}

/// Reference to an uploaded blob held by the attachment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub storage_key: String,
}

impl FileAttachment {
    pub fn is_empty(&self) -> bool {
        self.size_bytes == 0
    }
}

/// Document slots across both client kinds. Bank statements and the credit
/// bureau report are requested from individuals and companies alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSlot {
    WorkLetter,
    BankStatements,
    IdentityCard,
    CreditReport,
    MercantileRegistry,
    RepresentativeId,
    AssemblyAct,
}

impl DocumentSlot {
    pub const INDIVIDUAL: &'static [DocumentSlot] = &[
        DocumentSlot::WorkLetter,
        DocumentSlot::BankStatements,
        DocumentSlot::IdentityCard,
        DocumentSlot::CreditReport,
    ];

    pub const COMPANY: &'static [DocumentSlot] = &[
        DocumentSlot::MercantileRegistry,
        DocumentSlot::RepresentativeId,
        DocumentSlot::AssemblyAct,
        DocumentSlot::BankStatements,
        DocumentSlot::CreditReport,
    ];

    pub fn for_kind(kind: ClientKind) -> &'static [DocumentSlot] {
        match kind {
            ClientKind::Individual => Self::INDIVIDUAL,
            ClientKind::Company => Self::COMPANY,
        }
    }

    pub const fn field(self) -> Field {
        match self {
            DocumentSlot::WorkLetter => Field::WorkLetter,
            DocumentSlot::BankStatements => Field::BankStatements,
            DocumentSlot::IdentityCard => Field::IdentityCard,
            DocumentSlot::CreditReport => Field::CreditReport,
            DocumentSlot::MercantileRegistry => Field::MercantileRegistry,
            DocumentSlot::RepresentativeId => Field::RepresentativeId,
            DocumentSlot::AssemblyAct => Field::AssemblyAct,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::INDIVIDUAL
            .iter()
            .chain(Self::COMPANY)
            .copied()
            .find(|slot| slot.field().name() == value.trim())
    }
}

/// Every addressable form field. `name()` is the wire name used in issue paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FullName,
    Email,
    Phone,
    Dob,
    CurrentAddress,
    HousingType,
    PreviousAddress,
    LandlordName,
    LandlordPhone,
    ReasonForLeaving,
    EmploymentStatus,
    Employer,
    JobTitle,
    MonthlyIncome,
    WorkLetter,
    BankStatements,
    IdentityCard,
    CreditReport,
    CompanyName,
    CompanyTaxId,
    CompanyAddress,
    CompanyActivity,
    CompanyPhoneOffice,
    CompanyPhoneCell,
    SignerName,
    SignerRole,
    SignerId,
    MercantileRegistry,
    RepresentativeId,
    AssemblyAct,
}

impl Field {
    pub const PRIOR_RESIDENCE: [Field; 4] = [
        Field::PreviousAddress,
        Field::LandlordName,
        Field::LandlordPhone,
        Field::ReasonForLeaving,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Field::FullName => "fullName",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Dob => "dob",
            Field::CurrentAddress => "currentAddress",
            Field::HousingType => "housingType",
            Field::PreviousAddress => "previousAddress",
            Field::LandlordName => "landlordName",
            Field::LandlordPhone => "landlordPhone",
            Field::ReasonForLeaving => "reasonForLeaving",
            Field::EmploymentStatus => "employmentStatus",
            Field::Employer => "employer",
            Field::JobTitle => "jobTitle",
            Field::MonthlyIncome => "monthlyIncome",
            Field::WorkLetter => "workLetter",
            Field::BankStatements => "bankStatements",
            Field::IdentityCard => "identityCard",
            Field::CreditReport => "creditReport",
            Field::CompanyName => "companyName",
            Field::CompanyTaxId => "companyTaxId",
            Field::CompanyAddress => "companyAddress",
            Field::CompanyActivity => "companyActivity",
            Field::CompanyPhoneOffice => "companyPhoneOffice",
            Field::CompanyPhoneCell => "companyPhoneCell",
            Field::SignerName => "signerName",
            Field::SignerRole => "signerRole",
            Field::SignerId => "signerId",
            Field::MercantileRegistry => "mercantileRegistry",
            Field::RepresentativeId => "representativeId",
            Field::AssemblyAct => "assemblyAct",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Borrowed view of one field's raw form value.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Attachment(Option<&'a FileAttachment>),
}

/// Raw form state for a person. Dates, numbers and enum choices stay as the
/// strings the form produced until validation normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndividualDraft {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
    pub current_address: String,
    pub housing_type: String,
    pub previous_address: String,
    pub landlord_name: String,
    pub landlord_phone: String,
    pub reason_for_leaving: String,
    pub employment_status: String,
    pub employer: String,
    pub job_title: String,
    #[serde(deserialize_with = "string_or_number")]
    pub monthly_income: String,
    pub work_letter: Option<FileAttachment>,
    pub bank_statements: Option<FileAttachment>,
    pub identity_card: Option<FileAttachment>,
    pub credit_report: Option<FileAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyDraft {
    pub company_name: String,
    pub company_tax_id: String,
    pub company_address: String,
    pub company_activity: String,
    pub company_phone_office: String,
    pub company_phone_cell: String,
    pub signer_name: String,
    pub signer_role: String,
    pub signer_id: String,
    pub mercantile_registry: Option<FileAttachment>,
    pub representative_id: Option<FileAttachment>,
    pub assembly_act: Option<FileAttachment>,
    pub bank_statements: Option<FileAttachment>,
    pub credit_report: Option<FileAttachment>,
}

/// Form state for one applicant, tagged by client kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "clientType", rename_all = "snake_case")]
pub enum ApplicantDraft {
    Individual(IndividualDraft),
    Company(CompanyDraft),
}

impl ApplicantDraft {
    pub fn blank(kind: ClientKind) -> Self {
        match kind {
            ClientKind::Individual => ApplicantDraft::Individual(IndividualDraft::default()),
            ClientKind::Company => ApplicantDraft::Company(CompanyDraft::default()),
        }
    }

    pub fn kind(&self) -> ClientKind {
        match self {
            ApplicantDraft::Individual(_) => ClientKind::Individual,
            ApplicantDraft::Company(_) => ClientKind::Company,
        }
    }

    /// Name shown on signature lines: the person, or the company.
    pub fn display_name(&self) -> &str {
        match self {
            ApplicantDraft::Individual(draft) => draft.full_name.trim(),
            ApplicantDraft::Company(draft) => draft.company_name.trim(),
        }
    }

    /// `None` when the field belongs to the other client kind.
    pub fn value(&self, field: Field) -> Option<FieldValue<'_>> {
        use FieldValue::{Attachment, Text};
        match self {
            ApplicantDraft::Individual(d) => Some(match field {
                Field::FullName => Text(&d.full_name),
                Field::Email => Text(&d.email),
                Field::Phone => Text(&d.phone),
                Field::Dob => Text(&d.dob),
                Field::CurrentAddress => Text(&d.current_address),
                Field::HousingType => Text(&d.housing_type),
                Field::PreviousAddress => Text(&d.previous_address),
                Field::LandlordName => Text(&d.landlord_name),
                Field::LandlordPhone => Text(&d.landlord_phone),
                Field::ReasonForLeaving => Text(&d.reason_for_leaving),
                Field::EmploymentStatus => Text(&d.employment_status),
                Field::Employer => Text(&d.employer),
                Field::JobTitle => Text(&d.job_title),
                Field::MonthlyIncome => Text(&d.monthly_income),
                Field::WorkLetter => Attachment(d.work_letter.as_ref()),
                Field::BankStatements => Attachment(d.bank_statements.as_ref()),
                Field::IdentityCard => Attachment(d.identity_card.as_ref()),
                Field::CreditReport => Attachment(d.credit_report.as_ref()),
                _ => return None,
            }),
            ApplicantDraft::Company(d) => Some(match field {
                Field::CompanyName => Text(&d.company_name),
                Field::CompanyTaxId => Text(&d.company_tax_id),
                Field::CompanyAddress => Text(&d.company_address),
                Field::CompanyActivity => Text(&d.company_activity),
                Field::CompanyPhoneOffice => Text(&d.company_phone_office),
                Field::CompanyPhoneCell => Text(&d.company_phone_cell),
                Field::SignerName => Text(&d.signer_name),
                Field::SignerRole => Text(&d.signer_role),
                Field::SignerId => Text(&d.signer_id),
                Field::MercantileRegistry => Attachment(d.mercantile_registry.as_ref()),
                Field::RepresentativeId => Attachment(d.representative_id.as_ref()),
                Field::AssemblyAct => Attachment(d.assembly_act.as_ref()),
                Field::BankStatements => Attachment(d.bank_statements.as_ref()),
                Field::CreditReport => Attachment(d.credit_report.as_ref()),
                _ => return None,
            }),
        }
    }

    pub fn attachment(&self, slot: DocumentSlot) -> Option<&FileAttachment> {
        match self.value(slot.field()) {
            Some(FieldValue::Attachment(attachment)) => attachment,
            _ => None,
        }
    }

    /// Places (or clears, with `None`) a document. Returns `false` when the
    /// slot does not exist for this client kind.
    pub fn set_attachment(&mut self, slot: DocumentSlot, attachment: Option<FileAttachment>) -> bool {
        let target = match (self, slot) {
            (ApplicantDraft::Individual(d), DocumentSlot::WorkLetter) => &mut d.work_letter,
            (ApplicantDraft::Individual(d), DocumentSlot::BankStatements) => &mut d.bank_statements,
            (ApplicantDraft::Individual(d), DocumentSlot::IdentityCard) => &mut d.identity_card,
            (ApplicantDraft::Individual(d), DocumentSlot::CreditReport) => &mut d.credit_report,
            (ApplicantDraft::Company(d), DocumentSlot::MercantileRegistry) => {
                &mut d.mercantile_registry
            }
            (ApplicantDraft::Company(d), DocumentSlot::RepresentativeId) => &mut d.representative_id,
            (ApplicantDraft::Company(d), DocumentSlot::AssemblyAct) => &mut d.assembly_act,
            (ApplicantDraft::Company(d), DocumentSlot::BankStatements) => &mut d.bank_statements,
            (ApplicantDraft::Company(d), DocumentSlot::CreditReport) => &mut d.credit_report,
            _ => return false,
        };
        *target = attachment;
        true
    }
}

/// Application aggregate owned by one wizard session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullApplication {
    pub agent: Option<Agent>,
    pub tenants: Vec<ApplicantDraft>,
    pub guarantor: Option<ApplicantDraft>,
}

impl FullApplication {
    pub fn is_complete(&self) -> bool {
        self.agent.is_some() && !self.tenants.is_empty() && self.guarantor.is_some()
    }

    pub fn tenant_kind(&self) -> Option<ClientKind> {
        self.tenants.first().map(ApplicantDraft::kind)
    }

    /// Storage keys of every document attached anywhere in the aggregate.
    pub fn storage_keys(&self) -> Vec<String> {
        self.tenants
            .iter()
            .chain(self.guarantor.as_ref())
            .flat_map(|draft| {
                DocumentSlot::for_kind(draft.kind())
                    .iter()
                    .filter_map(move |slot| draft.attachment(*slot))
            })
            .map(|attachment| attachment.storage_key.clone())
            .collect()
    }
}

/// Normalized document reference carried in the handoff payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    pub slot: DocumentSlot,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorResidence {
    pub previous_address: String,
    pub landlord_name: String,
    pub landlord_phone: String,
    pub reason_for_leaving: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualApplicant {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub current_address: String,
    pub housing_type: HousingType,
    /// Present whenever any prior-residence field was supplied; always
    /// present for renters.
    pub prior_residence: Option<PriorResidence>,
    pub employment_status: EmploymentStatus,
    pub employer: String,
    pub job_title: String,
    pub monthly_income: f64,
    pub documents: Vec<DocumentReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySigner {
    pub name: String,
    pub role: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyApplicant {
    pub company_name: String,
    pub tax_id: String,
    pub address: String,
    pub activity: String,
    pub phone_office: String,
    pub phone_cell: String,
    pub signer: CompanySigner,
    pub documents: Vec<DocumentReference>,
}

/// Validated, normalized applicant ready for backend consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "clientType", rename_all = "snake_case")]
pub enum ApplicantRecord {
    Individual(IndividualApplicant),
    Company(CompanyApplicant),
}

impl ApplicantRecord {
    pub fn kind(&self) -> ClientKind {
        match self {
            ApplicantRecord::Individual(_) => ClientKind::Individual,
            ApplicantRecord::Company(_) => ClientKind::Company,
        }
    }

    pub fn documents(&self) -> &[DocumentReference] {
        match self {
            ApplicantRecord::Individual(record) => &record.documents,
            ApplicantRecord::Company(record) => &record.documents,
        }
    }
}

/// Income arrives from forms as either a JSON number or a string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
        Raw::Null(()) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drafts_are_tagged_by_client_type() {
        let draft: ApplicantDraft = serde_json::from_value(json!({
            "clientType": "individual",
            "fullName": "Ana Pérez",
            "monthlyIncome": 45000,
        }))
        .expect("draft deserializes");

        match &draft {
            ApplicantDraft::Individual(individual) => {
                assert_eq!(individual.full_name, "Ana Pérez");
                assert_eq!(individual.monthly_income, "45000");
                assert!(individual.work_letter.is_none());
            }
            other => panic!("expected individual draft, got {other:?}"),
        }

        let value = serde_json::to_value(ApplicantDraft::blank(ClientKind::Company))
            .expect("serializes");
        assert_eq!(value["clientType"], "company");
        assert!(value.get("fullName").is_none(), "inactive variant fields are absent");
    }

    #[test]
    fn null_income_reads_as_blank() {
        let draft: IndividualDraft =
            serde_json::from_value(json!({ "monthlyIncome": null })).expect("deserializes");
        assert_eq!(draft.monthly_income, "");
    }

    #[test]
    fn tenant_count_only_admits_one_or_two() {
        assert_eq!(TenantCount::try_from(2).expect("valid"), TenantCount::Two);
        assert_eq!(TenantCount::try_from(3), Err(InvalidTenantCount(3)));
        assert!(serde_json::from_value::<TenantCount>(json!(0)).is_err());
    }

    #[test]
    fn attachments_respect_client_kind() {
        let mut company = ApplicantDraft::blank(ClientKind::Company);
        let file = FileAttachment {
            file_name: "acta.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            size_bytes: 10,
            storage_key: "k".to_string(),
        };
        assert!(!company.set_attachment(DocumentSlot::WorkLetter, Some(file.clone())));
        assert!(company.set_attachment(DocumentSlot::AssemblyAct, Some(file.clone())));
        assert_eq!(company.attachment(DocumentSlot::AssemblyAct), Some(&file));
        assert_eq!(DocumentSlot::parse("assemblyAct"), Some(DocumentSlot::AssemblyAct));
        assert_eq!(DocumentSlot::parse("nope"), None);
    }
}
