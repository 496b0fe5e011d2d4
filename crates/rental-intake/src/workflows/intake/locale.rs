//! Fixed two-locale message lookup.
//!
//! Nothing here is ambient: every validator, review projection, and handoff
//! receives a [`Locale`] (or the [`MessageBundle`] it resolves to) explicitly.

use serde::{Deserialize, Serialize};

use super::domain::Agent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

impl Locale {
    pub const fn code(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
        }
    }

    /// Accepts bare codes and region-tagged variants (`es-DO`, `en_US`).
    pub fn parse(value: &str) -> Option<Self> {
        let primary = value
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "es" => Some(Locale::Es),
            "en" => Some(Locale::En),
            _ => None,
        }
    }

    pub fn messages(self) -> &'static MessageBundle {
        match self {
            Locale::Es => &SPANISH,
            Locale::En => &ENGLISH,
        }
    }
}

/// Everything a locale contributes: validation messages, display labels, the
/// agent directory, and the instructions checklist.
#[derive(Debug)]
pub struct MessageBundle {
    pub validation: ValidationMessages,
    pub labels: ReviewLabels,
    pub instructions: InstructionsText,
    pub agents: &'static [AgentEntry],
    pub months: [&'static str; 12],
    pub submit_success: &'static str,
    pub submit_error: &'static str,
    pub incomplete_application: &'static str,
}

impl MessageBundle {
    pub fn agent_by_email(&self, email: &str) -> Option<Agent> {
        self.agents
            .iter()
            .find(|entry| entry.email.eq_ignore_ascii_case(email.trim()))
            .map(AgentEntry::to_agent)
    }

    pub fn agent_directory(&self) -> Vec<Agent> {
        self.agents.iter().map(AgentEntry::to_agent).collect()
    }

    /// `"{count}"` in the template is replaced with the expected tenant count.
    pub fn tenant_count_message(&self, count: usize) -> String {
        self.validation
            .tenant_count
            .replace("{count}", &count.to_string())
    }
}

#[derive(Debug)]
pub struct ValidationMessages {
    pub full_name: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub dob_required: &'static str,
    pub dob_invalid: &'static str,
    pub current_address: &'static str,
    pub housing_type: &'static str,
    pub previous_address: &'static str,
    pub landlord_name: &'static str,
    pub landlord_phone: &'static str,
    pub reason_for_leaving: &'static str,
    pub employment_status: &'static str,
    pub employer: &'static str,
    pub job_title: &'static str,
    pub monthly_income: &'static str,
    pub file_required: &'static str,
    pub company_name: &'static str,
    pub company_tax_id: &'static str,
    pub company_address: &'static str,
    pub company_activity: &'static str,
    pub signer_role: &'static str,
    pub signer_id: &'static str,
    pub client_type: &'static str,
    pub tenant_count: &'static str,
}

#[derive(Debug)]
pub struct ReviewLabels {
    pub title: &'static str,
    pub date: &'static str,
    pub tenant_info: &'static str,
    pub guarantor_info: &'static str,
    pub tenant: &'static str,
    pub guarantor: &'static str,
    pub personal_title: &'static str,
    pub full_name: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub dob: &'static str,
    pub rental_title: &'static str,
    pub current_address: &'static str,
    pub housing_type: &'static str,
    pub rented: &'static str,
    pub own: &'static str,
    pub previous_address: &'static str,
    pub landlord_name: &'static str,
    pub landlord_phone: &'static str,
    pub reason_for_leaving: &'static str,
    pub employment_title: &'static str,
    pub employment_status: &'static str,
    pub employed: &'static str,
    pub unemployed: &'static str,
    pub student: &'static str,
    pub employer: &'static str,
    pub job_title: &'static str,
    pub monthly_income: &'static str,
    pub company_title: &'static str,
    pub company_name: &'static str,
    pub company_tax_id: &'static str,
    pub company_address: &'static str,
    pub company_activity: &'static str,
    pub company_phone_office: &'static str,
    pub company_phone_cell: &'static str,
    pub signer_title: &'static str,
    pub signer_name: &'static str,
    pub signer_role: &'static str,
    pub signer_id: &'static str,
    pub documents_title: &'static str,
    pub work_letter: &'static str,
    pub bank_statements: &'static str,
    pub identity_card: &'static str,
    pub credit_report: &'static str,
    pub mercantile_registry: &'static str,
    pub representative_id: &'static str,
    pub assembly_act: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InstructionsText {
    pub title: &'static str,
    pub description: &'static str,
    pub individual_documents_title: &'static str,
    pub company_documents_title: &'static str,
    pub recommendations: [&'static str; 4],
}

#[derive(Debug, Clone, Copy)]
pub struct AgentEntry {
    pub name: &'static str,
    pub email: &'static str,
}

impl AgentEntry {
    pub fn to_agent(&self) -> Agent {
        Agent {
            name: self.name.to_string(),
            email: self.email.to_string(),
        }
    }
}

const AGENTS_ES: &[AgentEntry] = &[
    AgentEntry {
        name: "María Fernández",
        email: "maria.fernandez@alquiler.example",
    },
    AgentEntry {
        name: "José Ramírez",
        email: "jose.ramirez@alquiler.example",
    },
    AgentEntry {
        name: "Oficina Central",
        email: "oficina@alquiler.example",
    },
];

const AGENTS_EN: &[AgentEntry] = &[
    AgentEntry {
        name: "María Fernández",
        email: "maria.fernandez@alquiler.example",
    },
    AgentEntry {
        name: "José Ramírez",
        email: "jose.ramirez@alquiler.example",
    },
    AgentEntry {
        name: "Head Office",
        email: "oficina@alquiler.example",
    },
];

static SPANISH: MessageBundle = MessageBundle {
    validation: ValidationMessages {
        full_name: "El nombre completo es obligatorio.",
        email: "Introduce un correo electrónico válido.",
        phone: "El teléfono es obligatorio.",
        dob_required: "La fecha de nacimiento es obligatoria.",
        dob_invalid: "La fecha de nacimiento no es válida.",
        current_address: "La dirección actual es obligatoria.",
        housing_type: "Indica si alquilas o eres propietario.",
        previous_address: "La dirección anterior es obligatoria.",
        landlord_name: "El nombre del arrendador es obligatorio.",
        landlord_phone: "El teléfono del arrendador es obligatorio.",
        reason_for_leaving: "El motivo de la mudanza es obligatorio.",
        employment_status: "Selecciona tu situación laboral.",
        employer: "El empleador es obligatorio.",
        job_title: "El puesto es obligatorio.",
        monthly_income: "El ingreso mensual debe ser un número mayor o igual a 0.",
        file_required: "Este documento es obligatorio.",
        company_name: "El nombre de la empresa es obligatorio.",
        company_tax_id: "El RNC de la empresa es obligatorio.",
        company_address: "La dirección de la empresa es obligatoria.",
        company_activity: "La actividad de la empresa es obligatoria.",
        signer_role: "El cargo del firmante es obligatorio.",
        signer_id: "La cédula del firmante es obligatoria.",
        client_type: "El tipo de cliente no corresponde a este formulario.",
        tenant_count: "Deben haber exactamente {count} inquilinos.",
    },
    labels: ReviewLabels {
        title: "Solicitud de Alquiler",
        date: "Fecha",
        tenant_info: "Información del Inquilino",
        guarantor_info: "Información del Garante",
        tenant: "Inquilino",
        guarantor: "Garante",
        personal_title: "Información Personal",
        full_name: "Nombre completo",
        email: "Correo electrónico",
        phone: "Teléfono",
        dob: "Fecha de nacimiento",
        rental_title: "Historial de Alquiler",
        current_address: "Dirección actual",
        housing_type: "Situación de vivienda",
        rented: "Alquilada",
        own: "Propia",
        previous_address: "Dirección anterior",
        landlord_name: "Nombre del arrendador",
        landlord_phone: "Teléfono del arrendador",
        reason_for_leaving: "Motivo de la mudanza",
        employment_title: "Información Laboral",
        employment_status: "Situación laboral",
        employed: "Empleado",
        unemployed: "Desempleado",
        student: "Estudiante",
        employer: "Empleador",
        job_title: "Puesto",
        monthly_income: "Ingreso mensual",
        company_title: "Información de la Empresa",
        company_name: "Nombre de la empresa",
        company_tax_id: "RNC",
        company_address: "Dirección de la empresa",
        company_activity: "Actividad",
        company_phone_office: "Teléfono de oficina",
        company_phone_cell: "Teléfono celular",
        signer_title: "Información del Firmante",
        signer_name: "Nombre del firmante",
        signer_role: "Cargo",
        signer_id: "Cédula",
        documents_title: "Documentos",
        work_letter: "Carta de trabajo",
        bank_statements: "Estados bancarios",
        identity_card: "Cédula de identidad",
        credit_report: "Reporte de buró de crédito",
        mercantile_registry: "Registro mercantil",
        representative_id: "Cédula del representante",
        assembly_act: "Acta de asamblea",
    },
    instructions: InstructionsText {
        title: "Antes de comenzar",
        description: "Ten a mano los documentos requeridos para cada inquilino y el garante.",
        individual_documents_title: "Personas físicas",
        company_documents_title: "Empresas",
        recommendations: [
            "Formatos aceptados: PDF, JPG o PNG.",
            "Peso recomendado: menos de 5 MB por archivo.",
            "Tiempo estimado: 10 minutos.",
            "¿Dudas? Contacta a tu agente.",
        ],
    },
    agents: AGENTS_ES,
    months: [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ],
    submit_success: "¡Solicitud completa enviada con éxito!",
    submit_error: "No se pudo enviar la solicitud. Inténtalo de nuevo.",
    incomplete_application: "La aplicación está incompleta.",
};

static ENGLISH: MessageBundle = MessageBundle {
    validation: ValidationMessages {
        full_name: "Full name is required.",
        email: "Enter a valid email address.",
        phone: "Phone number is required.",
        dob_required: "Date of birth is required.",
        dob_invalid: "Date of birth is not a valid date.",
        current_address: "Current address is required.",
        housing_type: "Tell us whether you rent or own.",
        previous_address: "Previous address is required.",
        landlord_name: "Landlord name is required.",
        landlord_phone: "Landlord phone is required.",
        reason_for_leaving: "Reason for leaving is required.",
        employment_status: "Select your employment status.",
        employer: "Employer is required.",
        job_title: "Job title is required.",
        monthly_income: "Monthly income must be a number greater than or equal to 0.",
        file_required: "This document is required.",
        company_name: "Company name is required.",
        company_tax_id: "Company tax id is required.",
        company_address: "Company address is required.",
        company_activity: "Company activity is required.",
        signer_role: "Signer role is required.",
        signer_id: "Signer id is required.",
        client_type: "The client type does not match this form.",
        tenant_count: "There must be exactly {count} tenants.",
    },
    labels: ReviewLabels {
        title: "Rental Application",
        date: "Date",
        tenant_info: "Tenant Information",
        guarantor_info: "Guarantor Information",
        tenant: "Tenant",
        guarantor: "Guarantor",
        personal_title: "Personal Information",
        full_name: "Full name",
        email: "Email",
        phone: "Phone",
        dob: "Date of birth",
        rental_title: "Rental History",
        current_address: "Current address",
        housing_type: "Housing situation",
        rented: "Rented",
        own: "Owned",
        previous_address: "Previous address",
        landlord_name: "Landlord name",
        landlord_phone: "Landlord phone",
        reason_for_leaving: "Reason for leaving",
        employment_title: "Employment Information",
        employment_status: "Employment status",
        employed: "Employed",
        unemployed: "Unemployed",
        student: "Student",
        employer: "Employer",
        job_title: "Job title",
        monthly_income: "Monthly income",
        company_title: "Company Information",
        company_name: "Company name",
        company_tax_id: "Tax id",
        company_address: "Company address",
        company_activity: "Activity",
        company_phone_office: "Office phone",
        company_phone_cell: "Cell phone",
        signer_title: "Signer Information",
        signer_name: "Signer name",
        signer_role: "Role",
        signer_id: "Id number",
        documents_title: "Documents",
        work_letter: "Employment letter",
        bank_statements: "Bank statements",
        identity_card: "Identity card",
        credit_report: "Credit bureau report",
        mercantile_registry: "Mercantile registry",
        representative_id: "Representative id",
        assembly_act: "Shareholders' assembly minutes",
    },
    instructions: InstructionsText {
        title: "Before you start",
        description: "Have the required documents ready for every tenant and the guarantor.",
        individual_documents_title: "Individuals",
        company_documents_title: "Companies",
        recommendations: [
            "Accepted formats: PDF, JPG or PNG.",
            "Recommended size: under 5 MB per file.",
            "Estimated time: 10 minutes.",
            "Questions? Contact your agent.",
        ],
    },
    agents: AGENTS_EN,
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    submit_success: "Your complete application was submitted successfully!",
    submit_error: "We could not submit the application. Please try again.",
    incomplete_application: "The application is incomplete.",
};
