//! # Consistency Guard
//!
//! The index and the attachment directory can drift apart when a process dies
//! between the two halves of an operation. The manager orders its writes so the only
//! drift it can cause is an **orphaned file** (a stored file no record references).
//! A **dangling reference** (a record naming a file that is gone) means something
//! outside the manager touched the vault.
//!
//! - [`ConsistencyGuard::scan`] reports both kinds, read-only.
//! - [`ConsistencyGuard::reclaim_orphans`] deletes orphaned files. Dangling
//!   references are reported and never patched: deciding what a record should point
//!   to is a human's call.
//!
//! Run the guard through [`RecordManager::scan`](crate::manager::RecordManager::scan)
//! so it cannot race with a mutation that has staged a file but not yet committed it.

use crate::error::Result;
use crate::store::{AttachmentStore, IndexStore};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DanglingReference {
    pub id: Uuid,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub orphaned_files: BTreeSet<String>,
    pub dangling_references: BTreeSet<DanglingReference>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_files.is_empty() && self.dangling_references.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReclaimReport {
    pub reclaimed: Vec<String>,
    /// Orphans that could not be deleted.
    pub failed: Vec<String>,
    /// Reported only; never modified.
    pub dangling_references: BTreeSet<DanglingReference>,
}

pub struct ConsistencyGuard<'a, I: IndexStore, A: AttachmentStore> {
    index: &'a I,
    attachments: &'a A,
}

impl<'a, I: IndexStore, A: AttachmentStore> ConsistencyGuard<'a, I, A> {
    pub fn new(index: &'a I, attachments: &'a A) -> Self {
        Self { index, attachments }
    }

    pub fn scan(&self) -> Result<ScanReport> {
        let records = self.index.load()?;
        let files: BTreeSet<String> = self.attachments.list()?.into_iter().collect();

        let mut referenced = BTreeSet::new();
        let mut dangling_references = BTreeSet::new();
        for record in &records {
            for name in record.attachments.names() {
                referenced.insert(name);
                if !files.contains(name) {
                    dangling_references.insert(DanglingReference {
                        id: record.id,
                        file_name: name.to_string(),
                    });
                }
            }
        }

        let orphaned_files = files
            .iter()
            .filter(|name| !referenced.contains(name.as_str()))
            .cloned()
            .collect();

        let report = ScanReport {
            orphaned_files,
            dangling_references,
        };
        debug!(
            orphans = report.orphaned_files.len(),
            dangling = report.dangling_references.len(),
            "consistency scan finished"
        );
        Ok(report)
    }

    pub fn reclaim_orphans(&self) -> Result<ReclaimReport> {
        let scan = self.scan()?;
        let mut report = ReclaimReport {
            dangling_references: scan.dangling_references,
            ..Default::default()
        };

        for name in scan.orphaned_files {
            match self.attachments.delete(&name) {
                Ok(()) => report.reclaimed.push(name),
                Err(e) => {
                    warn!(name = %name, error = %e, "could not reclaim orphaned attachment");
                    report.failed.push(name);
                }
            }
        }
        Ok(report)
    }
}
