use super::backend::IndexStore;
use crate::error::{DocsafeError, Result};
use crate::model::{DocumentRecord, IndexFile};
use crate::validation::check_index;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

#[derive(Serialize)]
struct IndexFileRef<'a> {
    documents: &'a [DocumentRecord],
}

/// The record index as a single JSON file.
pub struct FsIndexStore {
    path: PathBuf,
}

impl FsIndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl Into<String>) -> DocsafeError {
        DocsafeError::CorruptIndex {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn write_tmp(tmp_path: &Path, content: &str) -> io::Result<()> {
        let mut file = File::create(tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    }
}

impl IndexStore for FsIndexStore {
    fn load(&self) -> Result<Vec<DocumentRecord>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no index yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(self.corrupt(format!("not valid UTF-8: {}", e)));
            }
            Err(e) => return Err(DocsafeError::Io(e)),
        };

        let index: IndexFile =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;
        check_index(&index.documents).map_err(|reason| self.corrupt(reason))?;

        debug!(path = %self.path.display(), records = index.documents.len(), "index loaded");
        Ok(index.documents)
    }

    fn save_atomic(&self, records: &[DocumentRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(DocsafeError::Io)?;

        let content = serde_json::to_string_pretty(&IndexFileRef { documents: records })
            .map_err(DocsafeError::Serialization)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("index");
        let tmp_path = dir.join(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));

        let written = Self::write_tmp(&tmp_path, &content)
            .and_then(|_| fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(DocsafeError::Io(e));
        }

        debug!(path = %self.path.display(), records = records.len(), "index saved");
        Ok(())
    }
}
