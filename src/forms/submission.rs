//! Submission payloads, raw and sanitized.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::forms::pipeline::fields;

/// Which public form a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Contact,
    WorkApplication,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionKind::Contact => "contact",
            SubmissionKind::WorkApplication => "work_application",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field values as posted, keyed by wire name.
///
/// Only the first value of a repeated key is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields(HashMap<String, String>);

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value unless the key was already seen.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    fn owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

/// Contact inquiry as posted. Absent fields are `None` and are reported by
/// the pipeline like empty ones.
#[derive(Debug, Clone, Default)]
pub struct ContactSubmission {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub email_address: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl From<&RawFields> for ContactSubmission {
    fn from(raw: &RawFields) -> Self {
        Self {
            full_name: raw.owned(fields::FULL_NAME),
            phone_number: raw.owned(fields::PHONE_NUMBER),
            email_address: raw.owned(fields::EMAIL_ADDRESS),
            subject: raw.owned(fields::SUBJECT),
            message: raw.owned(fields::MESSAGE),
        }
    }
}

/// Work application as posted.
#[derive(Debug, Clone, Default)]
pub struct WorkApplicationSubmission {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub email_address: Option<String>,
    pub right_to_work: Option<String>,
}

impl From<&RawFields> for WorkApplicationSubmission {
    fn from(raw: &RawFields) -> Self {
        Self {
            full_name: raw.owned(fields::FULL_NAME),
            phone_number: raw.owned(fields::PHONE_NUMBER),
            email_address: raw.owned(fields::EMAIL_ADDRESS),
            right_to_work: raw.owned(fields::RIGHT_TO_WORK),
        }
    }
}

/// Either kind of raw submission.
#[derive(Debug, Clone)]
pub enum Submission {
    Contact(ContactSubmission),
    WorkApplication(WorkApplicationSubmission),
}

impl Submission {
    /// Pick the fields the given form declares; anything else is ignored.
    pub fn from_fields(kind: SubmissionKind, raw: &RawFields) -> Self {
        match kind {
            SubmissionKind::Contact => Submission::Contact(raw.into()),
            SubmissionKind::WorkApplication => Submission::WorkApplication(raw.into()),
        }
    }

    pub fn kind(&self) -> SubmissionKind {
        match self {
            Submission::Contact(_) => SubmissionKind::Contact,
            Submission::WorkApplication(_) => SubmissionKind::WorkApplication,
        }
    }
}

/// Fields shared by both forms, after sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicant {
    pub full_name: String,
    pub phone_number: String,
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedContact {
    pub applicant: Applicant,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedApplication {
    pub applicant: Applicant,
    pub right_to_work: String,
}

/// A submission whose every field passed its rule. Values are trimmed and
/// HTML-escaped; safe to interpolate into HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanitizedSubmission {
    Contact(SanitizedContact),
    WorkApplication(SanitizedApplication),
}

impl SanitizedSubmission {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            SanitizedSubmission::Contact(_) => SubmissionKind::Contact,
            SanitizedSubmission::WorkApplication(_) => SubmissionKind::WorkApplication,
        }
    }

    pub fn applicant(&self) -> &Applicant {
        match self {
            SanitizedSubmission::Contact(c) => &c.applicant,
            SanitizedSubmission::WorkApplication(a) => &a.applicant,
        }
    }
}
