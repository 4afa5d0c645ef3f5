//! # Record Manager
//!
//! The only component that changes the index and the attachment directory together.
//! Every mutation is a read-modify-write over the whole index, run under one lock so
//! two cycles never interleave.
//!
//! ## Write Ordering
//!
//! The two stores cannot be updated in one transaction, so each operation orders its
//! steps so that an interruption can only ever leave an *orphaned file* behind, never
//! a record pointing at a missing file:
//!
//! | Operation | Order |
//! |-----------|-------|
//! | create / update | validate → stage new files → save index → delete replaced files |
//! | delete / remove attachment | validate → save index → delete files |
//!
//! Validation (names, URL shape, referenced files exist and are not owned by another
//! record) runs before anything is written. If the index save fails, files this call
//! ingested are removed again and the index is untouched. A failure to delete a file
//! *after* the index was saved does not fail the call: the change is committed, and
//! the file is logged and left for [`RecordManager::reclaim_orphans`].

use crate::error::{DocsafeError, Result, ValidationError};
use crate::guard::{ConsistencyGuard, ReclaimReport, ScanReport};
use crate::mime::ShareTarget;
use crate::model::{
    AttachmentInput, AttachmentSlot, Attachments, DocumentDraft, DocumentPatch, DocumentRecord,
    RecordFilter,
};
use crate::store::{AttachmentStore, IndexStore};
use crate::validation::{normalize_url, validate_file_name, validate_name, validate_record};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct RecordManager<I: IndexStore, A: AttachmentStore> {
    pub(crate) index: I,
    pub(crate) attachments: A,
    write_lock: Mutex<()>,
}

/// Files ingested during one operation, removed again if the operation fails.
struct Staging<'a, A: AttachmentStore> {
    store: &'a A,
    ingested: Vec<String>,
}

impl<'a, A: AttachmentStore> Staging<'a, A> {
    fn new(store: &'a A) -> Self {
        Self {
            store,
            ingested: Vec::new(),
        }
    }

    fn stage(&mut self, input: AttachmentInput) -> Result<String> {
        match input {
            AttachmentInput::Stored(name) => Ok(name),
            AttachmentInput::Import(path) => {
                let name = self.store.ingest(&path, None)?;
                self.ingested.push(name.clone());
                Ok(name)
            }
        }
    }

    fn rollback(self) {
        for name in self.ingested {
            if let Err(e) = self.store.delete(&name) {
                warn!(name = %name, error = %e, "staged attachment left behind as orphan");
            }
        }
    }
}

impl<I: IndexStore, A: AttachmentStore> RecordManager<I, A> {
    pub fn new(index: I, attachments: A) -> Self {
        Self {
            index,
            attachments,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // --- Reads ---

    pub fn load_all(&self) -> Result<Vec<DocumentRecord>> {
        self.index.load()
    }

    /// Records matching `filter`, oldest first.
    pub fn list(&self, filter: RecordFilter) -> Result<Vec<DocumentRecord>> {
        let mut records: Vec<DocumentRecord> = self
            .index
            .load()?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        records.sort_by_key(|r| r.creation_timestamp);
        Ok(records)
    }

    pub fn find(&self, id: Uuid) -> Result<DocumentRecord> {
        self.index
            .load()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(DocsafeError::RecordNotFound(id))
    }

    // --- Staging ---

    /// Copy an external file into the vault ahead of attaching it with
    /// [`AttachmentInput::Stored`]. Until then the file is an orphan.
    pub fn ingest(&self, source: &Path, preferred_name: Option<&str>) -> Result<String> {
        self.attachments.ingest(source, preferred_name)
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        self.attachments.resolve(name)
    }

    pub fn attachment_exists(&self, name: &str) -> bool {
        self.attachments.exists(name)
    }

    /// Path, MIME type and kind of one attachment, for sharing or opening it.
    /// `None` when the slot is empty.
    pub fn share_target(&self, id: Uuid, slot: AttachmentSlot) -> Result<Option<ShareTarget>> {
        let record = self.find(id)?;
        Ok(record
            .attachment(slot)
            .map(|name| ShareTarget::new(name, self.attachments.resolve(name))))
    }

    // --- Mutations ---

    pub fn create(&self, draft: DocumentDraft) -> Result<DocumentRecord> {
        validate_name(&draft.name)?;
        let reference_url = normalize_url(draft.reference_url.as_deref())?;
        let principal = draft.principal.ok_or(ValidationError::MissingPrincipal)?;
        precheck_inputs(&principal, draft.secondary.as_ref())?;

        let _guard = self.lock();
        let mut records = self.index.load()?;
        self.check_stored(&records, None, &principal)?;
        if let Some(secondary) = &draft.secondary {
            self.check_stored(&records, None, secondary)?;
        }

        let mut staging = Staging::new(&self.attachments);
        let staged = staging.stage(principal).and_then(|principal| {
            let mut attachments = Attachments::new(principal);
            if let Some(secondary) = draft.secondary {
                attachments = attachments.with_secondary(staging.stage(secondary)?);
            }
            Ok(attachments)
        });
        let attachments = match staged {
            Ok(attachments) => attachments,
            Err(e) => {
                staging.rollback();
                return Err(e);
            }
        };

        let now = Utc::now();
        let record = DocumentRecord {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            reference_url,
            creation_timestamp: now,
            expiry_date: draft.expiry_date.unwrap_or_else(|| now.date_naive()),
            archive_flag: draft.archive_flag,
            attachments,
        };

        records.push(record.clone());
        if let Err(e) = validate_record(&record)
            .map_err(DocsafeError::from)
            .and_then(|_| self.index.save_atomic(&records))
        {
            staging.rollback();
            return Err(e);
        }

        info!(id = %record.id, name = %record.name, "document created");
        Ok(record)
    }

    pub fn update(&self, id: Uuid, patch: DocumentPatch) -> Result<DocumentRecord> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        let reference_url = match &patch.reference_url {
            Some(url) => Some(normalize_url(url.as_deref())?),
            None => None,
        };
        if let Some(principal) = &patch.principal {
            precheck_inputs(principal, patch.secondary.as_ref())?;
        } else if let Some(secondary) = &patch.secondary {
            precheck_inputs(secondary, None)?;
        }

        let _guard = self.lock();
        let mut records = self.index.load()?;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(DocsafeError::RecordNotFound(id))?;
        if patch.is_empty() {
            return Ok(records[pos].clone());
        }
        for input in [&patch.principal, &patch.secondary].into_iter().flatten() {
            self.check_stored(&records, Some(id), input)?;
        }

        let previous = records[pos].clone();
        let mut updated = previous.clone();
        if let Some(name) = patch.name {
            updated.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            updated.description = description;
        }
        if let Some(url) = reference_url {
            updated.reference_url = url;
        }
        if let Some(date) = patch.expiry_date {
            updated.expiry_date = date;
        }
        if let Some(archived) = patch.archive_flag {
            updated.archive_flag = archived;
        }

        let mut staging = Staging::new(&self.attachments);
        let slots = [
            (AttachmentSlot::Principal, patch.principal),
            (AttachmentSlot::Secondary, patch.secondary),
        ];
        for (slot, input) in slots {
            let Some(input) = input else { continue };
            match staging.stage(input) {
                Ok(name) => {
                    updated.attachments.set(slot, name);
                }
                Err(e) => {
                    staging.rollback();
                    return Err(e);
                }
            }
        }

        if let Err(e) = validate_record(&updated) {
            staging.rollback();
            return Err(e.into());
        }

        records[pos] = updated.clone();
        if let Err(e) = self.index.save_atomic(&records) {
            staging.rollback();
            return Err(e);
        }

        let replaced: Vec<String> = previous
            .attachments
            .names()
            .filter(|name| !updated.attachments.collides_with(name))
            .map(str::to_string)
            .collect();
        self.discard(replaced);

        info!(id = %updated.id, name = %updated.name, "document updated");
        Ok(updated)
    }

    /// Remove a record and then its files. Returns the removed record.
    pub fn delete(&self, id: Uuid) -> Result<DocumentRecord> {
        let _guard = self.lock();
        let mut records = self.index.load()?;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(DocsafeError::RecordNotFound(id))?;
        let removed = records.remove(pos);

        self.index.save_atomic(&records)?;
        self.discard(removed.attachments.names().map(str::to_string));

        info!(id = %removed.id, name = %removed.name, "document deleted");
        Ok(removed)
    }

    /// Detach the file in `slot` and delete it.
    ///
    /// Removing the principal promotes the secondary into its place; with no secondary
    /// this fails with [`ValidationError::MissingPrincipal`]. Removing an empty
    /// secondary slot is a no-op.
    pub fn remove_attachment(&self, id: Uuid, slot: AttachmentSlot) -> Result<DocumentRecord> {
        let _guard = self.lock();
        let mut records = self.index.load()?;
        let pos = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(DocsafeError::RecordNotFound(id))?;

        let mut updated = records[pos].clone();
        let removed = match slot {
            AttachmentSlot::Secondary => updated.attachments.take_secondary(),
            AttachmentSlot::Principal => Some(
                updated
                    .attachments
                    .promote_secondary()
                    .ok_or(ValidationError::MissingPrincipal)?,
            ),
        };
        let Some(removed) = removed else {
            debug!(id = %id, slot = %slot, "slot already empty");
            return Ok(updated);
        };

        records[pos] = updated.clone();
        self.index.save_atomic(&records)?;
        self.discard([removed]);

        info!(id = %id, slot = %slot, "attachment removed");
        Ok(updated)
    }

    // --- Maintenance ---

    pub fn scan(&self) -> Result<ScanReport> {
        let _guard = self.lock();
        ConsistencyGuard::new(&self.index, &self.attachments).scan()
    }

    pub fn reclaim_orphans(&self) -> Result<ReclaimReport> {
        let _guard = self.lock();
        let report = ConsistencyGuard::new(&self.index, &self.attachments).reclaim_orphans()?;
        if !report.reclaimed.is_empty() {
            info!(count = report.reclaimed.len(), "orphaned attachments reclaimed");
        }
        Ok(report)
    }

    // --- Helpers ---

    /// A stored input must exist and must not belong to another record.
    fn check_stored(
        &self,
        records: &[DocumentRecord],
        owner: Option<Uuid>,
        input: &AttachmentInput,
    ) -> Result<()> {
        let AttachmentInput::Stored(name) = input else {
            return Ok(());
        };
        if !self.attachments.exists(name) {
            return Err(ValidationError::AttachmentNotFound(name.clone()).into());
        }
        let taken = records
            .iter()
            .any(|r| Some(r.id) != owner && r.attachments.collides_with(name));
        if taken {
            return Err(ValidationError::AttachmentInUse(name.clone()).into());
        }
        Ok(())
    }

    /// Post-commit cleanup. Failures leak an orphan, never a dangling reference.
    fn discard(&self, names: impl IntoIterator<Item = String>) {
        for name in names {
            if let Err(e) = self.attachments.delete(&name) {
                warn!(name = %name, error = %e, "attachment left behind as orphan");
            }
        }
    }
}

/// Checks on attachment inputs that need no I/O.
fn precheck_inputs(first: &AttachmentInput, second: Option<&AttachmentInput>) -> Result<()> {
    for input in std::iter::once(first).chain(second) {
        if let AttachmentInput::Stored(name) = input {
            validate_file_name(name)?;
        }
    }
    if let (AttachmentInput::Stored(a), Some(AttachmentInput::Stored(b))) = (first, second) {
        if a.eq_ignore_ascii_case(b) {
            return Err(ValidationError::DuplicateAttachment(a.clone()).into());
        }
    }
    Ok(())
}
