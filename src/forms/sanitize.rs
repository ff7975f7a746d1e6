//! Field sanitizers and per-field rules.
//!
//! Every rule trims and HTML-escapes before checking, so whatever it returns
//! can be interpolated into an HTML email body as-is.

use std::borrow::Cow;

use crate::forms::{email, phone};

/// Reason a field was rejected, shown verbatim to the submitter.
pub type Rejection = Cow<'static, str>;

pub const NAME_REQUIRED: &str = "Name is required";
pub const NAME_LETTERS_ONLY: &str = "Name must contain only letters and spaces";
pub const PHONE_INVALID: &str = "Valid phone number is required";
pub const EMAIL_INVALID: &str = "Valid email is required";

/// Entities produced by [`escape_html`]. An `&` that already starts one of
/// these is left alone so escaping never doubles up.
const ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&#x27;"];

/// Escape `& < > " '` for embedding in HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, c) in input.char_indices() {
        match c {
            '&' if ENTITIES.iter().any(|e| input[i..].starts_with(e)) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trim surrounding whitespace, then HTML-escape.
pub fn sanitize_text(raw: &str) -> String {
    escape_html(raw.trim())
}

/// Letters and whitespace only, non-empty.
pub fn validate_name(raw: &str) -> Result<String, Rejection> {
    let name = sanitize_text(raw);
    if name.is_empty() {
        return Err(NAME_REQUIRED.into());
    }
    if !name.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace()) {
        return Err(NAME_LETTERS_ONLY.into());
    }
    Ok(name)
}

/// A plausible mobile number in any supported country format.
pub fn validate_phone(raw: &str) -> Result<String, Rejection> {
    let number = sanitize_text(raw);
    if phone::is_plausible_mobile(&number) {
        Ok(number)
    } else {
        Err(PHONE_INVALID.into())
    }
}

/// A syntactically valid address, returned in canonical form.
pub fn validate_email(raw: &str) -> Result<String, Rejection> {
    email::normalize(raw.trim())
        .map(|canonical| escape_html(&canonical))
        .ok_or_else(|| EMAIL_INVALID.into())
}

/// Non-empty after trimming and escaping. `label` names the field in the
/// rejection, e.g. "Subject" gives "Subject is required".
pub fn require_non_empty(raw: &str, label: &str) -> Result<String, Rejection> {
    let value = sanitize_text(raw);
    if value.is_empty() {
        Err(format!("{} is required", label).into())
    } else {
        Ok(value)
    }
}
