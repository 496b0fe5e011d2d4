//! Read-only projection of the application into a printable review.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::domain::{
    ApplicantDraft, ClientKind, CompanyDraft, DocumentSlot, EmploymentStatus, FullApplication,
    HousingType, IndividualDraft,
};
use super::locale::{Locale, ReviewLabels};
use super::schema::{parse_amount, parse_calendar_date};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSection {
    pub title: String,
    pub items: Vec<ReviewItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantReview {
    /// `Inquilino #2` style caption, only when more than one tenant exists.
    pub caption: Option<String>,
    pub client_type: ClientKind,
    pub sections: Vec<ReviewSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureLine {
    pub name: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDocument {
    pub locale: Locale,
    pub title: String,
    pub date: String,
    pub tenant_heading: String,
    pub tenants: Vec<ApplicantReview>,
    pub guarantor_heading: String,
    pub guarantor: ApplicantReview,
    pub signatures: Vec<SignatureLine>,
}

/// One printable row of the review, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewLine {
    Title(String),
    Heading(String),
    Caption(String),
    Section(String),
    Item { label: String, value: String },
    Separator,
    Signature { name: String, caption: String },
}

impl ReviewDocument {
    /// `None` unless the application has at least one tenant and a guarantor.
    pub fn project(application: &FullApplication, locale: Locale, today: NaiveDate) -> Option<Self> {
        let guarantor = application.guarantor.as_ref()?;
        if application.tenants.is_empty() {
            return None;
        }

        let bundle = locale.messages();
        let labels = &bundle.labels;
        let numbered = application.tenants.len() > 1;

        let tenants = application
            .tenants
            .iter()
            .enumerate()
            .map(|(index, draft)| ApplicantReview {
                caption: numbered.then(|| format!("{} #{}", labels.tenant, index + 1)),
                client_type: draft.kind(),
                sections: sections_for(draft, locale, labels),
            })
            .collect();

        let mut signatures: Vec<SignatureLine> = application
            .tenants
            .iter()
            .enumerate()
            .map(|(index, draft)| SignatureLine {
                name: draft.display_name().to_string(),
                caption: format!("{} #{}", labels.tenant, index + 1),
            })
            .collect();
        signatures.push(SignatureLine {
            name: guarantor.display_name().to_string(),
            caption: labels.guarantor.to_string(),
        });

        Some(Self {
            locale,
            title: labels.title.to_string(),
            date: format!("{}: {}", labels.date, long_date(locale, today)),
            tenant_heading: labels.tenant_info.to_string(),
            tenants,
            guarantor_heading: labels.guarantor_info.to_string(),
            guarantor: ApplicantReview {
                caption: None,
                client_type: guarantor.kind(),
                sections: sections_for(guarantor, locale, labels),
            },
            signatures,
        })
    }

    pub fn lines(&self) -> Vec<ReviewLine> {
        let mut lines = vec![
            ReviewLine::Title(self.title.clone()),
            ReviewLine::Caption(self.date.clone()),
            ReviewLine::Separator,
            ReviewLine::Heading(self.tenant_heading.clone()),
        ];

        for (index, tenant) in self.tenants.iter().enumerate() {
            if index > 0 {
                lines.push(ReviewLine::Separator);
            }
            push_applicant(&mut lines, tenant);
        }

        lines.push(ReviewLine::Separator);
        lines.push(ReviewLine::Heading(self.guarantor_heading.clone()));
        push_applicant(&mut lines, &self.guarantor);

        lines.push(ReviewLine::Separator);
        lines.extend(self.signatures.iter().map(|signature| ReviewLine::Signature {
            name: signature.name.clone(),
            caption: signature.caption.clone(),
        }));
        lines
    }
}

fn push_applicant(lines: &mut Vec<ReviewLine>, applicant: &ApplicantReview) {
    if let Some(caption) = &applicant.caption {
        lines.push(ReviewLine::Caption(caption.clone()));
    }
    for section in &applicant.sections {
        lines.push(ReviewLine::Section(section.title.clone()));
        lines.extend(section.items.iter().map(|item| ReviewLine::Item {
            label: item.label.clone(),
            value: item.value.clone(),
        }));
    }
}

/// `19 de octubre de 2026` or `October 19, 2026`.
pub fn long_date(locale: Locale, date: NaiveDate) -> String {
    let month = locale.messages().months[date.month0() as usize];
    match locale {
        Locale::Es => format!("{} de {} de {}", date.day(), month, date.year()),
        Locale::En => format!("{} {}, {}", month, date.day(), date.year()),
    }
}

/// Whole amounts print without decimals; fractions keep up to two places.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        0 => format!("${grouped}"),
        f if f % 10 == 0 => format!("${grouped}.{}", f / 10),
        f => format!("${grouped}.{f:02}"),
    }
}

struct SectionBuilder {
    title: String,
    items: Vec<ReviewItem>,
}

impl SectionBuilder {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            items: Vec::new(),
        }
    }

    fn item(mut self, label: &str, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            self.items.push(ReviewItem {
                label: label.to_string(),
                value: value.to_string(),
            });
        }
        self
    }

    fn build(self) -> Option<ReviewSection> {
        (!self.items.is_empty()).then_some(ReviewSection {
            title: self.title,
            items: self.items,
        })
    }
}

fn sections_for(draft: &ApplicantDraft, locale: Locale, labels: &ReviewLabels) -> Vec<ReviewSection> {
    let mut sections = match draft {
        ApplicantDraft::Individual(d) => individual_sections(d, locale, labels),
        ApplicantDraft::Company(d) => company_sections(d, labels),
    };
    sections.extend(documents_section(draft, labels));
    sections
}

fn individual_sections(
    d: &IndividualDraft,
    locale: Locale,
    labels: &ReviewLabels,
) -> Vec<ReviewSection> {
    let dob = match parse_calendar_date(&d.dob) {
        Some(date) => long_date(locale, date),
        None => d.dob.clone(),
    };
    let housing = match HousingType::parse(&d.housing_type) {
        Some(HousingType::Rented) => labels.rented,
        Some(HousingType::Own) => labels.own,
        None => "",
    };
    let status = match EmploymentStatus::parse(&d.employment_status) {
        Some(EmploymentStatus::Employed) => labels.employed,
        Some(EmploymentStatus::Unemployed) => labels.unemployed,
        Some(EmploymentStatus::Student) => labels.student,
        None => "",
    };
    let income = match parse_amount(&d.monthly_income) {
        Some(amount) => format_currency(amount),
        None => d.monthly_income.clone(),
    };

    [
        SectionBuilder::new(labels.personal_title)
            .item(labels.full_name, &d.full_name)
            .item(labels.email, &d.email)
            .item(labels.phone, &d.phone)
            .item(labels.dob, dob),
        SectionBuilder::new(labels.rental_title)
            .item(labels.current_address, &d.current_address)
            .item(labels.housing_type, housing)
            .item(labels.previous_address, &d.previous_address)
            .item(labels.landlord_name, &d.landlord_name)
            .item(labels.landlord_phone, &d.landlord_phone)
            .item(labels.reason_for_leaving, &d.reason_for_leaving),
        SectionBuilder::new(labels.employment_title)
            .item(labels.employment_status, status)
            .item(labels.employer, &d.employer)
            .item(labels.job_title, &d.job_title)
            .item(labels.monthly_income, income),
    ]
    .into_iter()
    .filter_map(SectionBuilder::build)
    .collect()
}

fn company_sections(d: &CompanyDraft, labels: &ReviewLabels) -> Vec<ReviewSection> {
    [
        SectionBuilder::new(labels.company_title)
            .item(labels.company_name, &d.company_name)
            .item(labels.company_tax_id, &d.company_tax_id)
            .item(labels.company_address, &d.company_address)
            .item(labels.company_activity, &d.company_activity)
            .item(labels.company_phone_office, &d.company_phone_office)
            .item(labels.company_phone_cell, &d.company_phone_cell),
        SectionBuilder::new(labels.signer_title)
            .item(labels.signer_name, &d.signer_name)
            .item(labels.signer_role, &d.signer_role)
            .item(labels.signer_id, &d.signer_id),
    ]
    .into_iter()
    .filter_map(SectionBuilder::build)
    .collect()
}

/// Localized name of a document slot.
pub fn document_label(slot: DocumentSlot, labels: &ReviewLabels) -> &'static str {
    match slot {
        DocumentSlot::WorkLetter => labels.work_letter,
        DocumentSlot::BankStatements => labels.bank_statements,
        DocumentSlot::IdentityCard => labels.identity_card,
        DocumentSlot::CreditReport => labels.credit_report,
        DocumentSlot::MercantileRegistry => labels.mercantile_registry,
        DocumentSlot::RepresentativeId => labels.representative_id,
        DocumentSlot::AssemblyAct => labels.assembly_act,
    }
}

fn documents_section(draft: &ApplicantDraft, labels: &ReviewLabels) -> Option<ReviewSection> {
    DocumentSlot::for_kind(draft.kind())
        .iter()
        .fold(SectionBuilder::new(labels.documents_title), |section, slot| {
            let file_name = draft
                .attachment(*slot)
                .map(|file| file.file_name.as_str())
                .unwrap_or_default();
            section.item(document_label(*slot, labels), file_name)
        })
        .build()
}
