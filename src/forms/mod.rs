//! Form handling subsystem.
//!
//! # Data Flow
//! ```text
//! raw submission (JSON or urlencoded body)
//!     → submission.rs (typed raw payload, optional fields)
//!     → pipeline.rs (per-field rules, errors collected in order)
//!         → sanitize.rs (trim, escape, name/required rules)
//!         → phone.rs (mobile plausibility)
//!         → email.rs (syntax + canonical form)
//!     → SanitizedSubmission | Vec<FieldError>
//! ```
//!
//! # Design Decisions
//! - All rules are pure functions; nothing here performs I/O
//! - Escaping happens before format checks, so markup never passes a rule
//! - Escaping is idempotent; already-escaped text is not escaped again

pub mod email;
pub mod phone;
pub mod pipeline;
pub mod sanitize;
pub mod submission;

pub use pipeline::{validate, validate_application, validate_contact, FieldError, ValidationResult};
pub use sanitize::sanitize_text;
pub use submission::{
    Applicant, ContactSubmission, RawFields, SanitizedApplication, SanitizedContact, SanitizedSubmission,
    Submission, SubmissionKind, WorkApplicationSubmission,
};
