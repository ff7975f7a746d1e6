//! Outbound email composition.
//!
//! Field values arrive already escaped, so they are interpolated verbatim.

use crate::forms::{SanitizedApplication, SanitizedContact, SanitizedSubmission};

/// A message ready for the mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub subject: String,
    pub to_address: String,
    pub html_body: String,
}

const WRAPPER_STYLE: &str = "font-family: Arial, sans-serif; color: #333;";
const ACCENT: &str = "#007bff";

/// Build the message for a sanitized submission.
pub fn compose(submission: &SanitizedSubmission, to_address: &str) -> OutboundEmail {
    let (subject, html_body) = match submission {
        SanitizedSubmission::Contact(contact) => (
            format!("Form Submission: {}", contact.subject),
            contact_body(contact),
        ),
        SanitizedSubmission::WorkApplication(application) => (
            format!("Work Application: {}", application.applicant.full_name),
            application_body(application),
        ),
    };
    OutboundEmail {
        subject,
        to_address: to_address.to_string(),
        html_body,
    }
}

fn row(label: &str, value: &str) -> String {
    format!("\n    <p><strong>{}:</strong> {}</p>", label, value)
}

fn email_row(address: &str) -> String {
    format!(
        "\n    <p><strong>Email:</strong> <a href=\"mailto:{addr}\" style=\"color: {accent};\">{addr}</a></p>",
        addr = address,
        accent = ACCENT
    )
}

fn layout(heading: &str, rows: &[String]) -> String {
    let mut html = format!(
        "<div style=\"{}\">\n    <h2 style=\"color: {};\">{}</h2>",
        WRAPPER_STYLE, ACCENT, heading
    );
    for r in rows {
        html.push_str(r);
    }
    html.push_str("\n</div>");
    html
}

fn contact_body(contact: &SanitizedContact) -> String {
    let a = &contact.applicant;
    layout(
        "New Contact Form Submission",
        &[
            row("Name", &a.full_name),
            row("Phone", &a.phone_number),
            email_row(&a.email_address),
            row("Subject", &contact.subject),
            row("Message", &contact.message),
        ],
    )
}

fn application_body(application: &SanitizedApplication) -> String {
    let a = &application.applicant;
    layout(
        "New Work Application",
        &[
            row("Name", &a.full_name),
            row("Phone", &a.phone_number),
            email_row(&a.email_address),
            row("Right to Work", &application.right_to_work),
        ],
    )
}
