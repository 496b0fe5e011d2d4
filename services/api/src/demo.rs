use crate::infra::{
    parse_date, parse_locale, InMemoryAttachmentStore, InMemorySessionRepository, LoggingBackend,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use rental_intake::error::AppError;
use rental_intake::workflows::intake::{
    agent_directory, ApplicantDraft, ApplicantRole, ClientKind, CompanyDraft, DocumentSlot,
    DocumentUpload, IndividualDraft, IntakeService, Locale, SessionId, TenantCount, WizardEvent,
};
use rental_intake::workflows::intake::review::ReviewLine;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Wizard language (es or en)
    #[arg(long, default_value = "es", value_parser = parse_locale)]
    pub(crate) locale: Locale,
    /// Date printed on the review (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Number of individual tenants on the application
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub(crate) tenants: u8,
    /// Use an individual guarantor instead of a company
    #[arg(long)]
    pub(crate) individual_guarantor: bool,
    /// Print every review line instead of the section outline
    #[arg(long)]
    pub(crate) full_review: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AgentsArgs {
    /// Directory language (es or en)
    #[arg(long, default_value = "es", value_parser = parse_locale)]
    pub(crate) locale: Locale,
}

type DemoService = IntakeService<InMemorySessionRepository, InMemoryAttachmentStore, LoggingBackend>;

pub(crate) fn run_agents(args: AgentsArgs) -> Result<(), AppError> {
    for agent in agent_directory(args.locale) {
        println!("- {} <{}>", agent.name, agent.email);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        locale,
        today,
        tenants,
        individual_guarantor,
        full_review,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let count = TenantCount::try_from(tenants).unwrap_or(TenantCount::One);

    let attachments = Arc::new(InMemoryAttachmentStore::default());
    let backend = Arc::new(LoggingBackend::default());
    let service: DemoService = IntakeService::new(
        Arc::new(InMemorySessionRepository::default()),
        attachments.clone(),
        backend.clone(),
        locale,
        "operaciones@alquiler.example",
    );

    println!("Rental intake demo ({})", locale.code());
    let session = service.start(Some(locale))?;
    let id = session.id.clone();
    println!("- Session {} opened at {}", id, session.wizard.stage());

    let agent = agent_directory(locale)
        .into_iter()
        .next()
        .map(|agent| agent.email)
        .unwrap_or_default();
    let mut events = vec![
        WizardEvent::Proceed,
        WizardEvent::ChooseAgent { email: agent },
        WizardEvent::ChooseTenantKind {
            kind: ClientKind::Individual,
        },
        WizardEvent::ChooseTenantCount { count },
    ];
    events.extend(
        demo_tenants()
            .into_iter()
            .take(count.get())
            .enumerate()
            .map(|(index, draft)| WizardEvent::UpdateTenant {
                index,
                draft: ApplicantDraft::Individual(draft),
            }),
    );
    events.extend([WizardEvent::NextStep, WizardEvent::NextStep, WizardEvent::NextStep]);
    apply_all(&service, &id, events)?;

    for index in 0..count.get() {
        upload_documents(&service, &id, ApplicantRole::Tenant, index, ClientKind::Individual)?;
    }

    let guarantor = if individual_guarantor {
        ApplicantDraft::Individual(demo_guarantor())
    } else {
        ApplicantDraft::Company(demo_company())
    };
    let guarantor_kind = guarantor.kind();
    apply_all(
        &service,
        &id,
        vec![
            WizardEvent::FinishForm,
            WizardEvent::ChooseGuarantorKind {
                kind: guarantor_kind,
            },
            WizardEvent::UpdateGuarantor { draft: guarantor },
        ],
    )?;
    upload_documents(&service, &id, ApplicantRole::Guarantor, 0, guarantor_kind)?;
    apply_all(&service, &id, vec![WizardEvent::FinishForm])?;
    println!(
        "- {} bytes of documents held for the session",
        attachments.stored_bytes()?
    );

    let review = service.review(&id, today)?;
    println!("\nReview");
    for line in review.lines() {
        match line {
            ReviewLine::Title(text) => println!("{}", text.to_uppercase()),
            ReviewLine::Heading(text) => println!("\n{text}"),
            ReviewLine::Caption(text) => println!("  {text}"),
            ReviewLine::Section(text) => println!("  [{text}]"),
            ReviewLine::Item { label, value } if full_review => println!("    {label}: {value}"),
            ReviewLine::Item { .. } | ReviewLine::Separator => {}
            ReviewLine::Signature { name, caption } => println!("  ____________ {name} ({caption})"),
        }
    }

    let exported = service.export(&id, today)?;
    println!(
        "\nExport: {} ({} page(s), {:.0}pt of content)",
        exported.file_name,
        exported.page_count(),
        exported.content_height
    );

    match service.submit(&id) {
        Ok(success) => {
            println!("\nHandoff: {}", success.message);
            println!("- Reference {}", success.receipt.reference);
            println!("- Notified {}", success.data.notify.join(", "));
            println!(
                "- Backend holds {} application(s)",
                backend.accepted().len()
            );
        }
        Err(err) => println!("\nHandoff failed: {err}"),
    }

    Ok(())
}

fn apply_all(
    service: &DemoService,
    id: &SessionId,
    events: Vec<WizardEvent>,
) -> Result<(), AppError> {
    for event in events {
        let label = event.label();
        let session = service.apply(id, event)?;
        let step = session
            .wizard
            .form()
            .map(|form| format!(" / step {}", form.step().key))
            .unwrap_or_default();
        println!("- {label} -> {}{step}", session.wizard.stage());
    }
    Ok(())
}

fn upload_documents(
    service: &DemoService,
    id: &SessionId,
    role: ApplicantRole,
    index: usize,
    kind: ClientKind,
) -> Result<(), AppError> {
    for slot in DocumentSlot::for_kind(kind) {
        let file_name = format!("{role}-{}-{}.pdf", index + 1, slot.field().name());
        let upload = DocumentUpload::new(file_name, None, b"%PDF-1.4 demo".to_vec());
        let (_, receipt) = service.upload(id, role, index, *slot, upload)?;
        println!(
            "  uploaded {} ({})",
            receipt.attachment.file_name, receipt.attachment.content_type
        );
    }
    Ok(())
}

fn demo_tenants() -> [IndividualDraft; 2] {
    [
        IndividualDraft {
            full_name: "Ana Pérez".to_string(),
            email: "ana.perez@correo.example".to_string(),
            phone: "809-555-0101".to_string(),
            dob: "1990-04-12".to_string(),
            current_address: "Calle El Conde 23, Santo Domingo".to_string(),
            housing_type: "rented".to_string(),
            previous_address: "Av. Independencia 101".to_string(),
            landlord_name: "Luis Gómez".to_string(),
            landlord_phone: "809-555-0199".to_string(),
            reason_for_leaving: "Más cerca del trabajo".to_string(),
            employment_status: "employed".to_string(),
            employer: "Banco Popular".to_string(),
            job_title: "Analista".to_string(),
            monthly_income: "45000".to_string(),
            ..IndividualDraft::default()
        },
        IndividualDraft {
            full_name: "Pedro Pérez".to_string(),
            email: "pedro.perez@correo.example".to_string(),
            phone: "809-555-0102".to_string(),
            dob: "1988-11-02".to_string(),
            current_address: "Calle El Conde 23, Santo Domingo".to_string(),
            housing_type: "own".to_string(),
            employment_status: "employed".to_string(),
            employer: "Claro".to_string(),
            job_title: "Ingeniero".to_string(),
            monthly_income: "52,500.75".to_string(),
            ..IndividualDraft::default()
        },
    ]
}

fn demo_guarantor() -> IndividualDraft {
    IndividualDraft {
        full_name: "Carmen Díaz".to_string(),
        email: "carmen.diaz@correo.example".to_string(),
        phone: "809-555-0150".to_string(),
        dob: "1965-01-30".to_string(),
        current_address: "Av. Sarasota 40".to_string(),
        housing_type: "own".to_string(),
        employment_status: "employed".to_string(),
        employer: "Farmacia Díaz".to_string(),
        job_title: "Propietaria".to_string(),
        monthly_income: "120000".to_string(),
        ..IndividualDraft::default()
    }
}

fn demo_company() -> CompanyDraft {
    CompanyDraft {
        company_name: "Inversiones Caribe SRL".to_string(),
        company_tax_id: "1-01-12345-6".to_string(),
        company_address: "Av. Winston Churchill 55".to_string(),
        company_activity: "Importación".to_string(),
        company_phone_office: "809-555-0300".to_string(),
        company_phone_cell: "829-555-0301".to_string(),
        signer_name: "Carmen Díaz".to_string(),
        signer_role: "Gerente General".to_string(),
        signer_id: "001-1234567-8".to_string(),
        ..CompanyDraft::default()
    }
}
