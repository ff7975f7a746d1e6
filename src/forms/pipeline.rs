//! Validation pipeline.
//!
//! Every rule runs independently; failures are collected in field
//! declaration order so clients can render inline errors deterministically.
//! A field contributes at most one error: its first failing rule.

use serde::Serialize;

use crate::forms::sanitize::{
    require_non_empty, validate_email, validate_name, validate_phone, Rejection,
};
use crate::forms::submission::{
    Applicant, ContactSubmission, SanitizedApplication, SanitizedContact, SanitizedSubmission,
    Submission, WorkApplicationSubmission,
};

/// Wire names of the submitted fields.
pub mod fields {
    pub const FULL_NAME: &str = "full-name";
    pub const PHONE_NUMBER: &str = "phone-number";
    pub const EMAIL_ADDRESS: &str = "email-address";
    pub const SUBJECT: &str = "subject";
    pub const MESSAGE: &str = "message";
    pub const RIGHT_TO_WORK: &str = "right-to-work";
    /// Anti-forgery token; never validated as form content.
    pub const CSRF_TOKEN: &str = "_csrf";
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// `Ok` carries the sanitized record, `Err` every field error in order.
pub type ValidationResult<T> = Result<T, Vec<FieldError>>;

#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn check(&mut self, field: &str, outcome: Result<String, Rejection>) -> Option<String> {
        match outcome {
            Ok(value) => Some(value),
            Err(reason) => {
                self.errors.push(FieldError {
                    field: field.to_string(),
                    message: reason.into_owned(),
                });
                None
            }
        }
    }

    fn applicant(
        &mut self,
        full_name: Option<&str>,
        phone_number: Option<&str>,
        email_address: Option<&str>,
    ) -> Option<Applicant> {
        let full_name = self.check(fields::FULL_NAME, validate_name(full_name.unwrap_or_default()));
        let phone_number =
            self.check(fields::PHONE_NUMBER, validate_phone(phone_number.unwrap_or_default()));
        let email_address =
            self.check(fields::EMAIL_ADDRESS, validate_email(email_address.unwrap_or_default()));
        Some(Applicant {
            full_name: full_name?,
            phone_number: phone_number?,
            email_address: email_address?,
        })
    }

    fn finish<T>(self, value: Option<T>) -> ValidationResult<T> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

/// Validate a contact inquiry.
pub fn validate_contact(raw: &ContactSubmission) -> ValidationResult<SanitizedContact> {
    let mut c = Collector::default();
    let applicant = c.applicant(
        raw.full_name.as_deref(),
        raw.phone_number.as_deref(),
        raw.email_address.as_deref(),
    );
    let subject = c.check(
        fields::SUBJECT,
        require_non_empty(raw.subject.as_deref().unwrap_or_default(), "Subject"),
    );
    let message = c.check(
        fields::MESSAGE,
        require_non_empty(raw.message.as_deref().unwrap_or_default(), "Message"),
    );

    let record = match (applicant, subject, message) {
        (Some(applicant), Some(subject), Some(message)) => Some(SanitizedContact {
            applicant,
            subject,
            message,
        }),
        _ => None,
    };
    c.finish(record)
}

/// Validate a work application.
pub fn validate_application(
    raw: &WorkApplicationSubmission,
) -> ValidationResult<SanitizedApplication> {
    let mut c = Collector::default();
    let applicant = c.applicant(
        raw.full_name.as_deref(),
        raw.phone_number.as_deref(),
        raw.email_address.as_deref(),
    );
    let right_to_work = c.check(
        fields::RIGHT_TO_WORK,
        require_non_empty(raw.right_to_work.as_deref().unwrap_or_default(), "Right to work"),
    );

    let record = match (applicant, right_to_work) {
        (Some(applicant), Some(right_to_work)) => Some(SanitizedApplication {
            applicant,
            right_to_work,
        }),
        _ => None,
    };
    c.finish(record)
}

/// Validate either kind of submission.
pub fn validate(submission: &Submission) -> ValidationResult<SanitizedSubmission> {
    match submission {
        Submission::Contact(raw) => validate_contact(raw).map(SanitizedSubmission::Contact),
        Submission::WorkApplication(raw) => {
            validate_application(raw).map(SanitizedSubmission::WorkApplication)
        }
    }
}
