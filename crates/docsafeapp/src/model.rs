//! # Domain Model: Document Records
//!
//! This module defines the data stored in a vault: [`DocumentRecord`], its
//! [`Attachments`], and the inputs used to create and change records
//! ([`DocumentDraft`], [`DocumentPatch`], [`AttachmentInput`]).
//!
//! ## Index Schema
//!
//! ```text
//! { "documents": [
//!   { "id": "<uuid>",
//!     "name": "Passport",
//!     "description": "",
//!     "referenceUrl": "https://example.com",      <-- omitted when absent
//!     "creationTimestamp": "2024-05-01T10:00:00Z",
//!     "expiryDate": "2030-05-01",
//!     "archiveFlag": false,
//!     "attachments": ["p1.jpg", "p1-back.jpg"] }  <-- principal, optional secondary
//! ] }
//! ```
//!
//! ## Attachment Slots
//!
//! Slot 0 is the *principal* attachment and is mandatory; slot 1 is the optional
//! *secondary* attachment (typically front and back of a physical document). The
//! in-memory [`Attachments`] type makes a record without a principal unrepresentable,
//! so the mandatory-principal rule is enforced by construction everywhere except at
//! the deserialization boundary, where it is checked.
//!
//! ## Legacy Field Names
//!
//! Older vaults stored records under `archivos` with Spanish keys (`id_archivo`,
//! `nombre`, `descripcion`, `url`, `fecha_creacion`, `share`, `imagenes`) and full
//! timestamps in `expiryDate`. Those are accepted on load; saving always writes the
//! canonical names above.
//!
//! ## Strictness
//!
//! Unknown fields are rejected. Re-saving a record with fields we do not understand
//! would silently drop them, so a vault written by a newer schema fails to load
//! instead of losing data.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentSlot {
    Principal,
    Secondary,
}

impl AttachmentSlot {
    pub const ALL: [AttachmentSlot; 2] = [AttachmentSlot::Principal, AttachmentSlot::Secondary];

    /// Position of the slot in the serialized `attachments` array.
    pub fn index(self) -> usize {
        match self {
            AttachmentSlot::Principal => 0,
            AttachmentSlot::Secondary => 1,
        }
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentSlot::Principal => write!(f, "principal"),
            AttachmentSlot::Secondary => write!(f, "secondary"),
        }
    }
}

impl FromStr for AttachmentSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "principal" | "front" | "0" => Ok(AttachmentSlot::Principal),
            "secondary" | "back" | "1" => Ok(AttachmentSlot::Secondary),
            other => Err(format!(
                "unknown attachment slot '{}' (expected principal or secondary)",
                other
            )),
        }
    }
}

/// The one or two stored file names attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attachments {
    principal: String,
    secondary: Option<String>,
}

impl Attachments {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn secondary(&self) -> Option<&str> {
        self.secondary.as_deref()
    }

    pub fn get(&self, slot: AttachmentSlot) -> Option<&str> {
        match slot {
            AttachmentSlot::Principal => Some(self.principal()),
            AttachmentSlot::Secondary => self.secondary(),
        }
    }

    /// File names in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.principal.as_str()).chain(self.secondary.as_deref())
    }

    /// Number of occupied slots: 1 or 2.
    pub fn count(&self) -> usize {
        if self.secondary.is_some() {
            2
        } else {
            1
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    /// Like [`contains`](Self::contains), ignoring ASCII case. On case-insensitive
    /// filesystems such names are the same file.
    pub fn collides_with(&self, name: &str) -> bool {
        self.names().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Puts `name` into `slot`, returning the name it replaced.
    pub(crate) fn set(&mut self, slot: AttachmentSlot, name: String) -> Option<String> {
        match slot {
            AttachmentSlot::Principal => Some(std::mem::replace(&mut self.principal, name)),
            AttachmentSlot::Secondary => self.secondary.replace(name),
        }
    }

    /// Removes the secondary attachment, returning its name.
    pub(crate) fn take_secondary(&mut self) -> Option<String> {
        self.secondary.take()
    }

    /// Drops the principal and moves the secondary into its place.
    ///
    /// Returns `None` (and leaves `self` unchanged) when there is no secondary to
    /// promote, since a record cannot exist without a principal.
    pub(crate) fn promote_secondary(&mut self) -> Option<String> {
        let secondary = self.secondary.take()?;
        Some(std::mem::replace(&mut self.principal, secondary))
    }
}

impl Serialize for Attachments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.count()))?;
        for name in self.names() {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Attachments {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older writers emitted `null` for empty slots, so tolerate it in the secondary position.
        let raw: Vec<Option<String>> = Vec::deserialize(deserializer)?;
        if raw.len() > 2 {
            return Err(de::Error::custom(format!(
                "expected at most 2 attachments, found {}",
                raw.len()
            )));
        }
        let mut slots = raw.into_iter();
        let principal = slots
            .next()
            .flatten()
            .ok_or_else(|| de::Error::custom("missing principal attachment"))?;
        Ok(Attachments {
            principal,
            secondary: slots.next().flatten(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DocumentRecord {
    #[serde(alias = "id_archivo")]
    pub id: Uuid,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(
        default,
        alias = "url",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub reference_url: Option<String>,
    #[serde(alias = "fecha_creacion")]
    pub creation_timestamp: DateTime<Utc>,
    #[serde(with = "expiry_date_format")]
    pub expiry_date: NaiveDate,
    #[serde(default, alias = "share")]
    pub archive_flag: bool,
    #[serde(alias = "imagenes")]
    pub attachments: Attachments,
}

impl DocumentRecord {
    pub fn attachment(&self, slot: AttachmentSlot) -> Option<&str> {
        self.attachments.get(slot)
    }

    /// Whether the expiry date is strictly before `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }
}

/// On-disk shape of the index file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexFile {
    #[serde(alias = "archivos")]
    pub documents: Vec<DocumentRecord>,
}

/// Parses an expiry date given either as `YYYY-MM-DD` or as a full RFC 3339 timestamp.
pub fn parse_expiry_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc).date_naive())
    })
}

mod expiry_date_format {
    use super::{parse_expiry_date, DATE_FORMAT};
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_expiry_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date: {}", raw)))
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Where an attachment for a draft or patch comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentInput {
    /// A file the caller already staged through the attachment store.
    Stored(String),
    /// An external file the manager ingests as part of the operation.
    Import(PathBuf),
}

impl AttachmentInput {
    pub fn stored(name: impl Into<String>) -> Self {
        AttachmentInput::Stored(name.into())
    }

    pub fn import(path: impl Into<PathBuf>) -> Self {
        AttachmentInput::Import(path.into())
    }
}

/// Everything needed to create a record. `id` and `creation_timestamp` are assigned
/// by the manager.
#[derive(Debug, Clone, Default)]
pub struct DocumentDraft {
    pub name: String,
    pub description: String,
    pub reference_url: Option<String>,
    /// Defaults to the creation date.
    pub expiry_date: Option<NaiveDate>,
    pub archive_flag: bool,
    pub principal: Option<AttachmentInput>,
    pub secondary: Option<AttachmentInput>,
}

impl DocumentDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = Some(url.into());
        self
    }

    pub fn with_expiry_date(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archive_flag = archived;
        self
    }

    pub fn with_principal(mut self, input: AttachmentInput) -> Self {
        self.principal = Some(input);
        self
    }

    pub fn with_secondary(mut self, input: AttachmentInput) -> Self {
        self.secondary = Some(input);
        self
    }
}

/// A partial change to a record. `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct DocumentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some(None)` clears the URL.
    pub reference_url: Option<Option<String>>,
    pub expiry_date: Option<NaiveDate>,
    pub archive_flag: Option<bool>,
    pub principal: Option<AttachmentInput>,
    pub secondary: Option<AttachmentInput>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = Some(Some(url.into()));
        self
    }

    pub fn clear_reference_url(mut self) -> Self {
        self.reference_url = Some(None);
        self
    }

    pub fn with_expiry_date(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archive_flag = Some(archived);
        self
    }

    pub fn with_attachment(mut self, slot: AttachmentSlot, input: AttachmentInput) -> Self {
        match slot {
            AttachmentSlot::Principal => self.principal = Some(input),
            AttachmentSlot::Secondary => self.secondary = Some(input),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.reference_url.is_none()
            && self.expiry_date.is_none()
            && self.archive_flag.is_none()
            && self.principal.is_none()
            && self.secondary.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFilter {
    #[default]
    All,
    Active,
    Archived,
}

impl RecordFilter {
    pub fn matches(self, record: &DocumentRecord) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Active => !record.archive_flag,
            RecordFilter::Archived => record.archive_flag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> DocumentRecord {
        DocumentRecord {
            id: Uuid::new_v4(),
            name: "Passport".to_string(),
            description: String::new(),
            reference_url: None,
            creation_timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
            archive_flag: false,
            attachments: Attachments::new("p1.jpg"),
        }
    }

    #[test]
    fn serializes_canonical_shape() {
        let record = sample_record();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["name"], "Passport");
        assert_eq!(value["expiryDate"], "2030-05-01");
        assert_eq!(value["archiveFlag"], false);
        assert_eq!(value["attachments"], serde_json::json!(["p1.jpg"]));
        assert!(value.get("referenceUrl").is_none());
    }

    #[test]
    fn secondary_serializes_as_second_element() {
        let mut record = sample_record();
        record.attachments = Attachments::new("front.jpg").with_secondary("back.jpg");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value["attachments"],
            serde_json::json!(["front.jpg", "back.jpg"])
        );
    }

    #[test]
    fn rejects_missing_principal() {
        let err = serde_json::from_str::<Attachments>(r#"[null, "back.jpg"]"#).unwrap_err();
        assert!(err.to_string().contains("missing principal"));

        assert!(serde_json::from_str::<Attachments>("[]").is_err());
    }

    #[test]
    fn rejects_more_than_two_attachments() {
        let err = serde_json::from_str::<Attachments>(r#"["a", "b", "c"]"#).unwrap_err();
        assert!(err.to_string().contains("at most 2"));
    }

    #[test]
    fn null_secondary_is_absent() {
        let attachments: Attachments = serde_json::from_str(r#"["a.jpg", null]"#).unwrap();
        assert_eq!(attachments.principal(), "a.jpg");
        assert_eq!(attachments.secondary(), None);
    }

    #[test]
    fn rejects_unknown_fields() {
        let json = r#"{
            "id": "0b6f6f4e-8d43-4c8b-9b53-0a1f0e7f4a10",
            "name": "Passport",
            "creationTimestamp": "2024-05-01T10:00:00Z",
            "expiryDate": "2030-05-01",
            "attachments": ["p1.jpg"],
            "color": "blue"
        }"#;
        assert!(serde_json::from_str::<DocumentRecord>(json).is_err());
    }

    #[test]
    fn accepts_legacy_field_names() {
        let json = r#"{ "archivos": [ {
            "id_archivo": "0b6f6f4e-8d43-4c8b-9b53-0a1f0e7f4a10",
            "nombre": "Licencia",
            "descripcion": "de conducir",
            "url": "",
            "fecha_creacion": "2023-01-15T08:30:00.000Z",
            "expiryDate": "2027-01-15T08:30:00.000Z",
            "share": true,
            "imagenes": ["camera_2023-01-15T08-30-00-000Z.jpg", null]
        } ] }"#;
        let index: IndexFile = serde_json::from_str(json).unwrap();
        let record = &index.documents[0];

        assert_eq!(record.name, "Licencia");
        assert_eq!(record.description, "de conducir");
        assert_eq!(record.reference_url, None);
        assert_eq!(
            record.expiry_date,
            NaiveDate::from_ymd_opt(2027, 1, 15).unwrap()
        );
        assert!(record.archive_flag);
        assert_eq!(record.attachments.count(), 1);

        // Re-serialization uses canonical names only.
        let out = serde_json::to_string(&index).unwrap();
        assert!(out.contains("\"documents\""));
        assert!(!out.contains("nombre"));
    }

    #[test]
    fn parse_expiry_date_accepts_both_forms() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(parse_expiry_date("2026-03-09"), Some(expected));
        assert_eq!(parse_expiry_date("2026-03-09T23:00:00Z"), Some(expected));
        assert_eq!(parse_expiry_date("next tuesday"), None);
    }

    #[test]
    fn promote_secondary_requires_secondary() {
        let mut only_principal = Attachments::new("a.jpg");
        assert_eq!(only_principal.promote_secondary(), None);
        assert_eq!(only_principal.principal(), "a.jpg");

        let mut both = Attachments::new("a.jpg").with_secondary("b.jpg");
        assert_eq!(both.promote_secondary(), Some("a.jpg".to_string()));
        assert_eq!(both.principal(), "b.jpg");
        assert_eq!(both.secondary(), None);
    }

    #[test]
    fn slot_parsing() {
        assert_eq!(
            "principal".parse::<AttachmentSlot>(),
            Ok(AttachmentSlot::Principal)
        );
        assert_eq!("Back".parse::<AttachmentSlot>(), Ok(AttachmentSlot::Secondary));
        assert!("third".parse::<AttachmentSlot>().is_err());
    }

    #[test]
    fn record_filter_matches_archive_flag() {
        let mut record = sample_record();
        assert!(RecordFilter::Active.matches(&record));
        assert!(!RecordFilter::Archived.matches(&record));
        record.archive_flag = true;
        assert!(RecordFilter::Archived.matches(&record));
        assert!(RecordFilter::All.matches(&record));
    }
}
