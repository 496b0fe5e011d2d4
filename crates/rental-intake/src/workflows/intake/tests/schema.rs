use super::common::*;
use crate::workflows::intake::domain::{
    ApplicantDraft, ApplicantRecord, ClientKind, DocumentSlot, EmploymentStatus, HousingType,
    IndividualDraft, TenantCount,
};
use crate::workflows::intake::locale::Locale;
use crate::workflows::intake::schema::{TenantSetValidator, Validator};
use chrono::NaiveDate;

#[test]
fn homeowners_may_leave_prior_residence_blank() {
    for locale in [Locale::Es, Locale::En] {
        let validator = Validator::for_kind(locale.messages(), ClientKind::Individual);
        let draft = ApplicantDraft::Individual(homeowner("Ana Pérez"));
        assert!(validator.validate(&draft).is_ok(), "locale {locale:?}");
    }
}

#[test]
fn renters_must_supply_every_prior_residence_field() {
    let messages = Locale::Es.messages();
    let validator = Validator::for_kind(messages, ClientKind::Individual);

    let blankers: [(&str, fn(&mut IndividualDraft)); 4] = [
        ("previousAddress", |d| d.previous_address.clear()),
        ("landlordName", |d| d.landlord_name.clear()),
        ("landlordPhone", |d| d.landlord_phone = "   ".to_string()),
        ("reasonForLeaving", |d| d.reason_for_leaving.clear()),
    ];

    for (path, blank) in blankers {
        let mut draft = renter("Ana Pérez");
        blank(&mut draft);
        let errors = validator
            .validate(&ApplicantDraft::Individual(draft))
            .expect_err("missing prior residence field");
        assert_eq!(errors.paths(), vec![path]);
    }

    let errors = validator
        .validate(&ApplicantDraft::Individual(IndividualDraft {
            previous_address: String::new(),
            ..renter("Ana Pérez")
        }))
        .expect_err("renter without previous address");
    assert_eq!(
        errors.message_for("previousAddress"),
        Some(messages.validation.previous_address)
    );
}

#[test]
fn every_document_slot_is_required_and_non_empty() {
    let validator = Validator::for_kind(Locale::En.messages(), ClientKind::Individual);
    for slot in DocumentSlot::for_kind(ClientKind::Individual) {
        let mut draft = ApplicantDraft::Individual(homeowner("Ana Pérez"));
        assert!(draft.set_attachment(*slot, None));
        let errors = validator.validate(&draft).expect_err("missing document");
        assert_eq!(errors.paths(), vec![slot.field().name()]);

        let mut empty = attachment("vacio.pdf");
        empty.size_bytes = 0;
        assert!(draft.set_attachment(*slot, Some(empty)));
        let errors = validator.validate(&draft).expect_err("empty document");
        assert_eq!(errors.paths(), vec![slot.field().name()]);
    }

    let validator = Validator::for_kind(Locale::En.messages(), ClientKind::Company);
    for slot in DocumentSlot::for_kind(ClientKind::Company) {
        let mut draft = ApplicantDraft::Company(company("Inversiones Caribe"));
        assert!(draft.set_attachment(*slot, None));
        let errors = validator.validate(&draft).expect_err("missing document");
        assert_eq!(errors.paths(), vec![slot.field().name()]);
    }
}

#[test]
fn company_records_validate_without_personal_fields() {
    let validator = Validator::for_kind(Locale::Es.messages(), ClientKind::Company);
    let draft = ApplicantDraft::Company(company("Inversiones Caribe"));
    assert!(validator.validate(&draft).is_ok());

    let mut unsigned = company("Inversiones Caribe");
    unsigned.signer_id.clear();
    unsigned.company_phone_cell.clear();
    let errors = validator
        .validate(&ApplicantDraft::Company(unsigned))
        .expect_err("missing signer id");
    assert_eq!(errors.paths(), vec!["companyPhoneCell", "signerId"]);
}

#[test]
fn tenant_set_requires_exact_count() {
    let messages = Locale::Es.messages();
    let validator = TenantSetValidator::new(messages, ClientKind::Individual, TenantCount::Two);

    let one = vec![ApplicantDraft::Individual(homeowner("Ana Pérez"))];
    let errors = validator.validate(&one).expect_err("one of two tenants");
    assert_eq!(errors.paths(), vec!["tenants"]);
    assert_eq!(
        errors.message_for("tenants"),
        Some("Deben haber exactamente 2 inquilinos.")
    );

    let two = vec![
        ApplicantDraft::Individual(homeowner("Ana Pérez")),
        ApplicantDraft::Individual(renter("Pedro Pérez")),
    ];
    assert!(validator.validate(&two).is_ok());
}

#[test]
fn tenant_issues_are_indexed() {
    let validator =
        TenantSetValidator::new(Locale::En.messages(), ClientKind::Individual, TenantCount::Two);
    let second = IndividualDraft {
        email: "pedro at correo".to_string(),
        monthly_income: "-10".to_string(),
        ..homeowner("Pedro Pérez")
    };
    let tenants = vec![
        ApplicantDraft::Individual(homeowner("Ana Pérez")),
        ApplicantDraft::Individual(second),
    ];

    let errors = validator.validate(&tenants).expect_err("bad second tenant");
    assert_eq!(
        errors.paths(),
        vec!["tenants.1.email", "tenants.1.monthlyIncome"]
    );
}

#[test]
fn messages_follow_the_locale() {
    let blank = ApplicantDraft::Individual(IndividualDraft::default());
    let spanish = Validator::for_kind(Locale::Es.messages(), ClientKind::Individual)
        .validate(&blank)
        .expect_err("blank");
    let english = Validator::for_kind(Locale::En.messages(), ClientKind::Individual)
        .validate(&blank)
        .expect_err("blank");

    assert_eq!(spanish.paths(), english.paths());
    assert_ne!(spanish.message_for("email"), english.message_for("email"));
    assert_eq!(
        english.message_for("workLetter"),
        Some(Locale::En.messages().validation.file_required)
    );
}

#[test]
fn normalize_types_every_value() {
    let validator = Validator::for_kind(Locale::Es.messages(), ClientKind::Individual);
    let draft = ApplicantDraft::Individual(IndividualDraft {
        dob: "1990-04-12T00:00:00.000Z".to_string(),
        monthly_income: "45,000.50".to_string(),
        full_name: "  Ana Pérez ".to_string(),
        ..homeowner("Ana Pérez")
    });

    let record = validator.normalize(&draft, "tenants.0").expect("valid draft");
    let ApplicantRecord::Individual(applicant) = record else {
        panic!("expected an individual record");
    };
    assert_eq!(applicant.full_name, "Ana Pérez");
    assert_eq!(applicant.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 12).unwrap());
    assert_eq!(applicant.monthly_income, 45000.5);
    assert_eq!(applicant.housing_type, HousingType::Own);
    assert_eq!(applicant.employment_status, EmploymentStatus::Employed);
    assert!(applicant.prior_residence.is_none());
    assert_eq!(applicant.documents.len(), 4);
    assert_eq!(applicant.documents[0].slot, DocumentSlot::WorkLetter);
}

#[test]
fn normalize_prefixes_issue_paths() {
    let validator = Validator::for_kind(Locale::Es.messages(), ClientKind::Company);
    let mut draft = company("Inversiones Caribe");
    draft.company_name.clear();
    let errors = validator
        .normalize(&ApplicantDraft::Company(draft), "guarantor")
        .expect_err("missing company name");
    assert_eq!(errors.paths(), vec!["guarantor.companyName"]);
}
