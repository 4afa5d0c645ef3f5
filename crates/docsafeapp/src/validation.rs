//! Rules a record must satisfy before it is written, and the structural checks
//! applied to an index when it is loaded.
//!
//! Write-side rules return [`ValidationError`] so a front end can tell the user which
//! rule failed. Load-side checks return a plain reason string that becomes part of a
//! `CorruptIndex` error.

use crate::error::ValidationError;
use crate::model::{Attachments, DocumentRecord};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashSet;

// Optional http(s) scheme, a dotted domain, an optional path. ASCII and case-sensitive.
static URL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$")
        .expect("URL pattern is valid")
});

pub fn is_valid_url(url: &str) -> bool {
    URL_SHAPE.is_match(url)
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Trims a reference URL and checks its shape. Blank input means "no URL".
pub fn normalize_url(url: Option<&str>) -> Result<Option<String>, ValidationError> {
    match url.map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if is_valid_url(url) => Ok(Some(url.to_string())),
        Some(url) => Err(ValidationError::InvalidUrl(url.to_string())),
    }
}

/// A stored file name must be a bare, visible file name: the index refers to
/// attachments relative to the attachment directory only.
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.trim() != name;
    if bad {
        return Err(ValidationError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

pub fn validate_attachments(attachments: &Attachments) -> Result<(), ValidationError> {
    for name in attachments.names() {
        validate_file_name(name)?;
    }
    if attachments.secondary() == Some(attachments.principal()) {
        return Err(ValidationError::DuplicateAttachment(
            attachments.principal().to_string(),
        ));
    }
    Ok(())
}

/// Field-level rules for a record about to be saved. Attachment existence is checked
/// by the manager, which has access to the store.
pub fn validate_record(record: &DocumentRecord) -> Result<(), ValidationError> {
    validate_name(&record.name)?;
    if let Some(url) = record.reference_url.as_deref() {
        if !is_valid_url(url) {
            return Err(ValidationError::InvalidUrl(url.to_string()));
        }
    }
    validate_attachments(&record.attachments)
}

/// Structural invariants of a whole index: unique ids, well-formed and store-wide
/// unique attachment names.
pub fn check_index(records: &[DocumentRecord]) -> Result<(), String> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();

    for record in records {
        if !ids.insert(record.id) {
            return Err(format!("duplicate document id {}", record.id));
        }
        for name in record.attachments.names() {
            validate_file_name(name).map_err(|e| format!("document {}: {}", record.id, e))?;
            if !names.insert(name) {
                return Err(format!(
                    "attachment {} is referenced more than once (document {})",
                    name, record.id
                ));
            }
        }
    }
    Ok(())
}
