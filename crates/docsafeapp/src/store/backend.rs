use crate::error::Result;
use crate::model::DocumentRecord;
use std::path::{Path, PathBuf};

/// Whole-set persistence of the record index.
pub trait IndexStore {
    /// Load every record, in stored order.
    /// A missing index is an empty vault, not an error.
    fn load(&self) -> Result<Vec<DocumentRecord>>;

    /// Replace the stored set with `records`.
    /// MUST be atomic: on failure the previous index is left as it was.
    fn save_atomic(&self, records: &[DocumentRecord]) -> Result<()>;
}

/// Ownership of attachment bytes.
pub trait AttachmentStore {
    /// Copy `source` into the store and return the stored file name.
    ///
    /// The name is derived from `preferred_name`, else the source's own file name,
    /// else a capture-time name. An existing file is never overwritten.
    fn ingest(&self, source: &Path, preferred_name: Option<&str>) -> Result<String>;

    /// Remove a stored file. Removing a name that does not exist is a no-op.
    fn delete(&self, name: &str) -> Result<()>;

    /// Absolute location of a stored file. Pure path computation.
    fn resolve(&self, name: &str) -> PathBuf;

    fn exists(&self, name: &str) -> bool;

    /// Names of every stored file (for consistency scans).
    fn list(&self) -> Result<Vec<String>>;
}
